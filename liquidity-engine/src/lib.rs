//! Bin liquidity engine for DLMM pools
//!
//! Pure, synchronous building blocks for managing liquidity in a bin-based
//! market maker:
//!
//! - [`bin_math`]: bin id and price conversion
//! - [`distribution`]: uniform, curve and bid-ask weight distributions
//! - [`range_sync`]: canonical range state behind the price/percent/bin-count fields
//! - [`chunker`]: splitting oversized operations into gas-bounded chunks
//! - [`planner`]: request to weights, minimums and chunks in one call
//! - [`submission`]: strictly sequential chunk submission with abort-on-failure

pub mod bin_math;
pub mod chunker;
pub mod distribution;
pub mod error;
pub mod planner;
pub mod range_sync;
pub mod submission;
pub mod types;

pub use bin_math::{bins_between_prices, BinPriceConverter, MIN_PRICE};
pub use chunker::{chunk, chunk_count};
pub use distribution::compute_weights;
pub use error::{LiquidityError, LiquidityResult};
pub use planner::{min_amount, plan_add_liquidity, LiquidityPlan};
pub use range_sync::{RangeAction, RangeSyncState, RangeView};
pub use submission::{
    ChunkSequencer, ChunkSubmitter, SubmissionReceipt, SubmissionReport, SubmissionState,
};
pub use types::*;
