//! Error types for the liquidity engine

use crate::types::TokenSide;
use thiserror::Error;

/// Engine errors
///
/// Every pure computation returns one of these instead of panicking, so range
/// reducers and planners can keep their previous valid state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiquidityError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Empty bin range: min {min_bin_id} > max {max_bin_id}")]
    EmptyRange { min_bin_id: i32, max_bin_id: i32 },

    #[error("Range has no bin eligible for token {side} but amount is non-zero")]
    IncompatibleRange { side: TokenSide },

    #[error("Cannot normalize an all-zero weight vector")]
    ZeroTotalWeight,

    #[error("Chunk {index} failed after {completed} of {total} chunks completed: {reason}")]
    ChunkSubmissionFailed {
        index: usize,
        completed: usize,
        total: usize,
        reason: String,
    },

    #[error("Invalid bin step: {0}")]
    InvalidBinStep(u16),

    #[error("Price at bin {bin_id} is not representable")]
    PriceOutOfRange { bin_id: i32 },

    #[error("Curve parameter must be in (0, 1], got {0}")]
    InvalidCurveParameter(String),

    #[error("Bin count limit must be positive")]
    InvalidBinCountLimit,

    #[error("Slippage tolerance {0} bps exceeds 10000")]
    InvalidSlippage(u16),

    #[error("Minimum {minimum} exceeds amount {amount} for token {side}")]
    InvalidMinimum {
        side: TokenSide,
        amount: u64,
        minimum: u64,
    },
}

/// Result alias used across the engine
pub type LiquidityResult<T> = std::result::Result<T, LiquidityError>;
