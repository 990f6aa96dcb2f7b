//! Type definitions for the bin liquidity engine

use crate::error::{LiquidityError, LiquidityResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed denominator every weight vector is scaled to (1e18)
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// Basis points in 100%
pub const BASIS_POINT_MAX: u16 = 10_000;

/// Bin step bounds (in basis points)
pub const MIN_BIN_STEP: u16 = 1; // 0.01%
pub const MAX_BIN_STEP: u16 = 1000; // 10%

/// Edge weight of the curve and bid-ask kernels when none is given
pub const DEFAULT_CURVE_PARAM: Decimal = dec!(0.1);

/// Token side of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenSide {
    X,
    Y,
}

impl fmt::Display for TokenSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSide::X => write!(f, "X"),
            TokenSide::Y => write!(f, "Y"),
        }
    }
}

/// Which token prices are quoted in terms of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PriceBase {
    /// Price of one X in Y (natural bin orientation)
    #[default]
    X,
    /// Price of one Y in X (reciprocal)
    Y,
}

impl PriceBase {
    pub fn flipped(self) -> Self {
        match self {
            PriceBase::X => PriceBase::Y,
            PriceBase::Y => PriceBase::X,
        }
    }
}

impl FromStr for PriceBase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x" => Ok(PriceBase::X),
            "y" => Ok(PriceBase::Y),
            other => Err(format!("unknown price base: {}", other)),
        }
    }
}

/// Inclusive bin range, always `min_bin_id <= max_bin_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LiquidityRange {
    min_bin_id: i32,
    max_bin_id: i32,
}

impl LiquidityRange {
    pub fn new(min_bin_id: i32, max_bin_id: i32) -> LiquidityResult<Self> {
        if min_bin_id > max_bin_id {
            return Err(LiquidityError::EmptyRange {
                min_bin_id,
                max_bin_id,
            });
        }
        Ok(Self {
            min_bin_id,
            max_bin_id,
        })
    }

    /// Caller guarantees `min_bin_id <= max_bin_id`
    pub(crate) fn from_ordered(min_bin_id: i32, max_bin_id: i32) -> Self {
        debug_assert!(min_bin_id <= max_bin_id);
        Self {
            min_bin_id,
            max_bin_id,
        }
    }

    pub fn min_bin_id(&self) -> i32 {
        self.min_bin_id
    }

    pub fn max_bin_id(&self) -> i32 {
        self.max_bin_id
    }

    /// Number of bins covered
    pub fn bin_count(&self) -> usize {
        (self.max_bin_id as i64 - self.min_bin_id as i64 + 1) as usize
    }

    pub fn contains(&self, bin_id: i32) -> bool {
        (self.min_bin_id..=self.max_bin_id).contains(&bin_id)
    }

    pub fn bin_ids(&self) -> impl Iterator<Item = i32> {
        self.min_bin_id..=self.max_bin_id
    }
}

impl fmt::Display for LiquidityRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min_bin_id, self.max_bin_id)
    }
}

/// Liquidity distribution shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistributionShape {
    /// Equal weight per eligible bin
    #[default]
    Uniform,
    /// Concentrated around the active bin
    Curve,
    /// Concentrated at the range edges
    BidAsk,
}

impl FromStr for DistributionShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uniform" | "spot" => Ok(DistributionShape::Uniform),
            "curve" => Ok(DistributionShape::Curve),
            "bid-ask" | "bidask" | "bid_ask" => Ok(DistributionShape::BidAsk),
            other => Err(format!("unknown distribution shape: {}", other)),
        }
    }
}

/// Per-bin weights for both tokens, indexed by offset from `min_bin_id`
///
/// Each side either sums to exactly [`PRECISION`] or is all zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionWeights {
    pub min_bin_id: i32,
    pub active_bin_id: i32,
    pub weight_x: Vec<u128>,
    pub weight_y: Vec<u128>,
}

impl DistributionWeights {
    pub fn bin_count(&self) -> usize {
        self.weight_x.len()
    }

    pub fn max_bin_id(&self) -> i32 {
        self.min_bin_id + self.bin_count() as i32 - 1
    }

    pub fn bin_ids(&self) -> Vec<i32> {
        (0..self.bin_count())
            .map(|offset| self.min_bin_id + offset as i32)
            .collect()
    }

    /// Bin ids relative to the active bin, as submitted on-chain
    pub fn delta_ids(&self) -> Vec<i32> {
        self.bin_ids()
            .into_iter()
            .map(|bin_id| bin_id - self.active_bin_id)
            .collect()
    }

    pub fn sum_x(&self) -> u128 {
        self.weight_x.iter().sum()
    }

    pub fn sum_y(&self) -> u128 {
        self.weight_y.iter().sum()
    }

    pub fn weights(&self, side: TokenSide) -> &[u128] {
        match side {
            TokenSide::X => &self.weight_x,
            TokenSide::Y => &self.weight_y,
        }
    }
}

/// Caller's declared intent for an add-liquidity operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddLiquidityRequest {
    pub range: LiquidityRange,
    pub shape: DistributionShape,
    /// Kernel parameter for curve and bid-ask shapes
    pub curve_param: Option<Decimal>,
    pub amount_x: u64,
    pub amount_y: u64,
    pub slippage_tolerance_bps: u16,
    /// Maximum bins a single transaction may address
    pub bin_count_limit: u32,
}

/// One independently submittable slice of a liquidity operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Zero-based position in the submission order
    pub index: usize,
    /// Total number of chunks in the operation
    pub count: usize,
    pub range: LiquidityRange,
    pub delta_ids: Vec<i32>,
    pub weight_x: Vec<u128>,
    pub weight_y: Vec<u128>,
    pub amount_x: u64,
    pub amount_y: u64,
    pub amount_x_min: u64,
    pub amount_y_min: u64,
}

impl Chunk {
    pub fn bin_count(&self) -> usize {
        self.weight_x.len()
    }
}

/// Token amounts landing in a single bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinAmount {
    pub bin_id: i32,
    pub amount_x: u64,
    pub amount_y: u64,
}
