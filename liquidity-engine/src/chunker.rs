//! Gas-bounded chunking of liquidity operations
//!
//! A single add-liquidity call can only address a limited number of bins. Larger
//! distributions are split into consecutive groups of bins, each re-normalized
//! into a standalone request with a proportional share of the amounts.

use crate::distribution::{normalize_weights, scale_amount};
use crate::error::{LiquidityError, LiquidityResult};
use crate::types::{Chunk, DistributionWeights, LiquidityRange, TokenSide};
use log::debug;

/// Number of chunks needed to cover `bin_count` bins
pub fn chunk_count(bin_count: usize, bin_count_limit: u32) -> usize {
    if bin_count_limit == 0 {
        return 0;
    }
    bin_count.div_ceil(bin_count_limit as usize)
}

/// Split a distribution into chunks of at most `bin_count_limit` bins
///
/// Each chunk's amount is its weight share of the total, truncated, and its
/// minimum keeps the caller's `min / amount` ratio. Chunks come back in
/// ascending bin order.
pub fn chunk(
    weights: &DistributionWeights,
    amount_x: u64,
    amount_y: u64,
    amount_x_min: u64,
    amount_y_min: u64,
    bin_count_limit: u32,
) -> LiquidityResult<Vec<Chunk>> {
    if bin_count_limit == 0 {
        return Err(LiquidityError::InvalidBinCountLimit);
    }

    let bin_count = weights.bin_count();
    if bin_count == 0 || weights.weight_y.len() != bin_count {
        return Err(LiquidityError::EmptyRange {
            min_bin_id: weights.min_bin_id,
            max_bin_id: weights
                .min_bin_id
                .saturating_add(weights.weight_y.len().min(bin_count) as i32)
                .saturating_sub(1),
        });
    }

    check_minimum(TokenSide::X, amount_x, amount_x_min)?;
    check_minimum(TokenSide::Y, amount_y, amount_y_min)?;

    let range = LiquidityRange::new(weights.min_bin_id, weights.max_bin_id())?;

    if bin_count <= bin_count_limit as usize {
        return Ok(vec![Chunk {
            index: 0,
            count: 1,
            range,
            delta_ids: weights.delta_ids(),
            weight_x: weights.weight_x.clone(),
            weight_y: weights.weight_y.clone(),
            amount_x,
            amount_y,
            amount_x_min,
            amount_y_min,
        }]);
    }

    let count = chunk_count(bin_count, bin_count_limit);
    let delta_ids = weights.delta_ids();
    let limit = bin_count_limit as usize;
    let mut chunks = Vec::with_capacity(count);

    for (index, start) in (0..bin_count).step_by(limit).enumerate() {
        let end = (start + limit).min(bin_count);

        let (weight_x, chunk_x, chunk_x_min) = split_side(
            TokenSide::X,
            &weights.weights(TokenSide::X)[start..end],
            amount_x,
            amount_x_min,
        )?;
        let (weight_y, chunk_y, chunk_y_min) = split_side(
            TokenSide::Y,
            &weights.weights(TokenSide::Y)[start..end],
            amount_y,
            amount_y_min,
        )?;

        let chunk_range = LiquidityRange::new(
            weights.min_bin_id + start as i32,
            weights.min_bin_id + end as i32 - 1,
        )?;

        debug!(
            "chunk {}/{} {}: x={} (min {}), y={} (min {})",
            index + 1,
            count,
            chunk_range,
            chunk_x,
            chunk_x_min,
            chunk_y,
            chunk_y_min
        );

        chunks.push(Chunk {
            index,
            count,
            range: chunk_range,
            delta_ids: delta_ids[start..end].to_vec(),
            weight_x,
            weight_y,
            amount_x: chunk_x,
            amount_y: chunk_y,
            amount_x_min: chunk_x_min,
            amount_y_min: chunk_y_min,
        });
    }

    Ok(chunks)
}

fn check_minimum(side: TokenSide, amount: u64, minimum: u64) -> LiquidityResult<()> {
    if minimum > amount {
        return Err(LiquidityError::InvalidMinimum {
            side,
            amount,
            minimum,
        });
    }
    Ok(())
}

/// Re-normalized weights, amount share and minimum for one side of a group
fn split_side(
    side: TokenSide,
    group: &[u128],
    amount: u64,
    amount_min: u64,
) -> LiquidityResult<(Vec<u128>, u64, u64)> {
    let group_weight: u128 = group.iter().sum();
    if group_weight == 0 {
        return Ok((vec![0; group.len()], 0, 0));
    }

    let share = scale_amount(amount, group_weight);
    let share_min = if amount == 0 {
        0
    } else {
        (share as u128 * amount_min as u128 / amount as u128) as u64
    };

    // Same remainder rule as the full distribution: the bin furthest from active
    let tail = match side {
        TokenSide::X => group.iter().rposition(|w| *w > 0),
        TokenSide::Y => group.iter().position(|w| *w > 0),
    }
    .ok_or(LiquidityError::ZeroTotalWeight)?;

    Ok((normalize_weights(group, tail)?, share, share_min))
}
