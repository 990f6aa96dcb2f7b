//! Liquidity weight distributions across a bin range
//!
//! Bins below the active bin hold token Y, bins above hold token X. The active
//! bin holds Y, and also holds X when the range has no bin above it. Each side's
//! weights are scaled so they sum to exactly [`PRECISION`].

use crate::bin_math::{get_bin_composition, BinComposition};
use crate::error::{LiquidityError, LiquidityResult};
use crate::types::{
    BinAmount, DistributionShape, DistributionWeights, LiquidityRange, TokenSide,
    DEFAULT_CURVE_PARAM, PRECISION,
};
use log::debug;
use rust_decimal::prelude::*;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

/// Resolution of kernel values before integer normalization
const KERNEL_SCALE: Decimal = dec!(1000000000000000000);

/// Compute per-bin weights for both tokens
pub fn compute_weights(
    range: LiquidityRange,
    shape: DistributionShape,
    amount_x: u64,
    amount_y: u64,
    active_bin_id: i32,
    curve_param: Option<Decimal>,
) -> LiquidityResult<DistributionWeights> {
    let alpha = curve_param.unwrap_or(DEFAULT_CURVE_PARAM);
    if shape != DistributionShape::Uniform && (alpha <= Decimal::ZERO || alpha > Decimal::ONE) {
        return Err(LiquidityError::InvalidCurveParameter(alpha.to_string()));
    }

    let has_bin_above = range.max_bin_id() > active_bin_id;
    let mut eligible_x = Vec::with_capacity(range.bin_count());
    let mut eligible_y = Vec::with_capacity(range.bin_count());

    for bin_id in range.bin_ids() {
        let (holds_x, holds_y) = match get_bin_composition(bin_id, active_bin_id) {
            BinComposition::YOnly => (false, true),
            BinComposition::XOnly => (true, false),
            BinComposition::Both => (!has_bin_above, true),
        };
        eligible_x.push(holds_x);
        eligible_y.push(holds_y);
    }

    let weight_x = side_weights(
        TokenSide::X,
        &range,
        &eligible_x,
        amount_x,
        active_bin_id,
        shape,
        alpha,
    )?;
    let weight_y = side_weights(
        TokenSide::Y,
        &range,
        &eligible_y,
        amount_y,
        active_bin_id,
        shape,
        alpha,
    )?;

    debug!(
        "{:?} distribution over {} (active {}): {} X bins, {} Y bins",
        shape,
        range,
        active_bin_id,
        weight_x.iter().filter(|w| **w > 0).count(),
        weight_y.iter().filter(|w| **w > 0).count()
    );

    Ok(DistributionWeights {
        min_bin_id: range.min_bin_id(),
        active_bin_id,
        weight_x,
        weight_y,
    })
}

fn side_weights(
    side: TokenSide,
    range: &LiquidityRange,
    eligible: &[bool],
    amount: u64,
    active_bin_id: i32,
    shape: DistributionShape,
    alpha: Decimal,
) -> LiquidityResult<Vec<u128>> {
    if amount == 0 {
        return Ok(vec![0; eligible.len()]);
    }

    let distances: Vec<Option<u64>> = range
        .bin_ids()
        .zip(eligible)
        .map(|(bin_id, &ok)| ok.then(|| (bin_id as i64 - active_bin_id as i64).unsigned_abs()))
        .collect();

    // Remainder lands on the eligible bin furthest from the active bin
    let tail = match side {
        TokenSide::X => eligible.iter().rposition(|ok| *ok),
        TokenSide::Y => eligible.iter().position(|ok| *ok),
    }
    .ok_or(LiquidityError::IncompatibleRange { side })?;

    let radius = distances.iter().flatten().copied().max().unwrap_or(0).max(1);

    let raw = distances
        .iter()
        .map(|distance| match distance {
            None => Ok(0),
            Some(d) => kernel(shape, *d, radius, alpha),
        })
        .collect::<LiquidityResult<Vec<u128>>>()?;

    normalize_weights(&raw, tail)
}

/// Unnormalized weight of a bin at `distance` from the active bin
fn kernel(shape: DistributionShape, distance: u64, radius: u64, alpha: Decimal) -> LiquidityResult<u128> {
    let invalid = || LiquidityError::InvalidCurveParameter(alpha.to_string());

    if alpha == Decimal::ONE {
        return Ok(1);
    }

    let position = match shape {
        DistributionShape::Uniform => return Ok(1),
        DistributionShape::Curve => Decimal::from(distance) / Decimal::from(radius),
        DistributionShape::BidAsk => {
            Decimal::from(radius.saturating_sub(distance)) / Decimal::from(radius)
        }
    };

    // alpha ^ (position^2), so the far end of the kernel weighs exactly alpha
    let exponent = alpha.checked_ln().ok_or_else(invalid)? * position * position;
    let value = exponent.checked_exp().ok_or_else(invalid)?;

    (value * KERNEL_SCALE)
        .trunc()
        .to_u128()
        .ok_or_else(invalid)
}

/// Rescale `raw` so it sums to exactly [`PRECISION`]
///
/// Entries are floored; the rounding remainder is added to `raw[tail]`.
pub(crate) fn normalize_weights(raw: &[u128], tail: usize) -> LiquidityResult<Vec<u128>> {
    let total: u128 = raw.iter().sum();
    if total == 0 {
        return Err(LiquidityError::ZeroTotalWeight);
    }

    let mut normalized: Vec<u128> = raw.iter().map(|w| w * PRECISION / total).collect();
    let assigned: u128 = normalized.iter().sum();
    normalized[tail] += PRECISION - assigned;

    Ok(normalized)
}

/// `amount * weight / PRECISION`, truncating
pub(crate) fn scale_amount(amount: u64, weight: u128) -> u64 {
    // weight <= PRECISION keeps the product below 2^128 and the result below 2^64
    (amount as u128 * weight / PRECISION) as u64
}

impl DistributionWeights {
    /// Token amounts each bin receives for the given totals
    pub fn amounts_per_bin(&self, amount_x: u64, amount_y: u64) -> Vec<BinAmount> {
        self.bin_ids()
            .into_iter()
            .zip(self.weight_x.iter().zip(&self.weight_y))
            .map(|(bin_id, (wx, wy))| BinAmount {
                bin_id,
                amount_x: scale_amount(amount_x, *wx),
                amount_y: scale_amount(amount_y, *wy),
            })
            .collect()
    }
}
