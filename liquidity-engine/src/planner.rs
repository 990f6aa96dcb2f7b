//! Add-liquidity planning
//!
//! Turns a caller's [`AddLiquidityRequest`] into weights, slippage-adjusted
//! minimums and the ordered chunks to submit.

use crate::chunker::chunk;
use crate::distribution::compute_weights;
use crate::error::{LiquidityError, LiquidityResult};
use crate::types::{AddLiquidityRequest, Chunk, DistributionWeights, BASIS_POINT_MAX};
use log::info;
use serde::{Deserialize, Serialize};

/// Everything needed to submit an add-liquidity operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPlan {
    pub weights: DistributionWeights,
    pub amount_x: u64,
    pub amount_y: u64,
    pub amount_x_min: u64,
    pub amount_y_min: u64,
    pub chunks: Vec<Chunk>,
}

impl LiquidityPlan {
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

/// Minimum acceptable amount after applying a slippage tolerance
pub fn min_amount(amount: u64, slippage_bps: u16) -> LiquidityResult<u64> {
    if slippage_bps > BASIS_POINT_MAX {
        return Err(LiquidityError::InvalidSlippage(slippage_bps));
    }
    let kept = (BASIS_POINT_MAX - slippage_bps) as u128;
    Ok((amount as u128 * kept / BASIS_POINT_MAX as u128) as u64)
}

/// Build the full plan for `request` against the current active bin
pub fn plan_add_liquidity(
    request: &AddLiquidityRequest,
    active_bin_id: i32,
) -> LiquidityResult<LiquidityPlan> {
    let amount_x_min = min_amount(request.amount_x, request.slippage_tolerance_bps)?;
    let amount_y_min = min_amount(request.amount_y, request.slippage_tolerance_bps)?;

    let weights = compute_weights(
        request.range,
        request.shape,
        request.amount_x,
        request.amount_y,
        active_bin_id,
        request.curve_param,
    )?;

    let chunks = chunk(
        &weights,
        request.amount_x,
        request.amount_y,
        amount_x_min,
        amount_y_min,
        request.bin_count_limit,
    )?;

    info!(
        "Planned {:?} liquidity over {} bins {} in {} chunk(s)",
        request.shape,
        request.range.bin_count(),
        request.range,
        chunks.len()
    );

    Ok(LiquidityPlan {
        weights,
        amount_x: request.amount_x,
        amount_y: request.amount_y,
        amount_x_min,
        amount_y_min,
        chunks,
    })
}
