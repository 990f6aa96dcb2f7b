//! Range synchronizer
//!
//! The price range a user edits is stored once, as bin ids around the active
//! bin. Absolute prices, percentages from the current price, bin count and
//! slider offsets are projections of that state, recomputed on every read, so
//! no two of them can disagree.

use crate::bin_math::BinPriceConverter;
use crate::error::{LiquidityError, LiquidityResult};
use crate::types::{LiquidityRange, PriceBase};
use log::debug;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const PERCENT_DECIMALS: u32 = 6;

/// Canonical range state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSyncState {
    active_bin_id: i32,
    min_bin_id: i32,
    max_bin_id: i32,
    price_base: PriceBase,
}

/// User edits the synchronizer understands
///
/// Price and percent edits carry the raw text the user typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeAction {
    SetMinPriceAbsolute(String),
    SetMinPricePercent(String),
    SetMaxPriceAbsolute(String),
    SetMaxPricePercent(String),
    /// Extend the range upwards from the current min bin
    SetBinCount(u32),
    /// Bin distances from the active bin
    SetSliderOffsets { lo: i32, hi: i32 },
    /// Symmetric range of `bin_count` bins around the active bin
    Reset { bin_count: u32 },
    /// New active bin reported by the chain; the range stays put
    SetActiveBin(i32),
    SetPriceBase(PriceBase),
    /// Switch to the other quote side
    FlipPriceBase,
}

/// Every user-facing field, derived from [`RangeSyncState`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeView {
    pub price_base: PriceBase,
    pub current_price: Decimal,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub min_percent: Decimal,
    pub max_percent: Decimal,
    pub bin_count: u32,
    pub slider_lo: i32,
    pub slider_hi: i32,
}

/// Which bin edge the displayed min/max price field controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriceField {
    Min,
    Max,
}

impl RangeSyncState {
    /// Symmetric range of `bin_count` bins centred on `active_bin_id`
    pub fn centered(
        active_bin_id: i32,
        bin_count: u32,
        price_base: PriceBase,
    ) -> LiquidityResult<Self> {
        let (min_bin_id, max_bin_id) = centered_bounds(active_bin_id, bin_count)?;
        Ok(Self {
            active_bin_id,
            min_bin_id,
            max_bin_id,
            price_base,
        })
    }

    pub fn active_bin_id(&self) -> i32 {
        self.active_bin_id
    }

    pub fn min_bin_id(&self) -> i32 {
        self.min_bin_id
    }

    pub fn max_bin_id(&self) -> i32 {
        self.max_bin_id
    }

    pub fn price_base(&self) -> PriceBase {
        self.price_base
    }

    pub fn range(&self) -> LiquidityRange {
        LiquidityRange::from_ordered(self.min_bin_id, self.max_bin_id)
    }

    /// Apply an edit, returning the previous state unchanged if it is rejected
    pub fn apply(&self, converter: &BinPriceConverter, action: RangeAction) -> Self {
        match self.try_apply(converter, &action) {
            Ok(next) => next,
            Err(e) => {
                debug!("Ignoring range edit {:?}: {}", action, e);
                *self
            }
        }
    }

    /// Apply an edit, reporting why it was rejected
    pub fn try_apply(
        &self,
        converter: &BinPriceConverter,
        action: &RangeAction,
    ) -> LiquidityResult<Self> {
        let next = match action {
            RangeAction::SetMinPriceAbsolute(text) => {
                self.with_price(converter, PriceField::Min, parse_decimal(text)?)?
            }
            RangeAction::SetMaxPriceAbsolute(text) => {
                self.with_price(converter, PriceField::Max, parse_decimal(text)?)?
            }
            RangeAction::SetMinPricePercent(text) => {
                let price = self.price_from_percent(converter, parse_decimal(text)?)?;
                self.with_price(converter, PriceField::Min, price)?
            }
            RangeAction::SetMaxPricePercent(text) => {
                let price = self.price_from_percent(converter, parse_decimal(text)?)?;
                self.with_price(converter, PriceField::Max, price)?
            }
            RangeAction::SetBinCount(bin_count) => {
                let max_bin_id = (*bin_count as i64)
                    .checked_sub(1)
                    .filter(|extra| *extra >= 0)
                    .and_then(|extra| i32::try_from(self.min_bin_id as i64 + extra).ok())
                    .ok_or(LiquidityError::EmptyRange {
                        min_bin_id: self.min_bin_id,
                        max_bin_id: self.min_bin_id.saturating_sub(1),
                    })?;
                self.with_bins(self.min_bin_id, max_bin_id)?
            }
            RangeAction::SetSliderOffsets { lo, hi } => {
                let offset = |delta: i32| {
                    self.active_bin_id
                        .checked_add(delta)
                        .ok_or(LiquidityError::PriceOutOfRange {
                            bin_id: self.active_bin_id,
                        })
                };
                self.with_bins(offset(*lo)?, offset(*hi)?)?
            }
            RangeAction::Reset { bin_count } => {
                let (min_bin_id, max_bin_id) = centered_bounds(self.active_bin_id, *bin_count)?;
                self.with_bins(min_bin_id, max_bin_id)?
            }
            RangeAction::SetActiveBin(active_bin_id) => Self {
                active_bin_id: *active_bin_id,
                ..*self
            },
            RangeAction::SetPriceBase(price_base) => Self {
                price_base: *price_base,
                ..*self
            },
            RangeAction::FlipPriceBase => Self {
                price_base: self.price_base.flipped(),
                ..*self
            },
        };

        // Every accepted state must have representable projections
        next.view(converter)?;
        Ok(next)
    }

    /// Compute every projection of the state
    pub fn view(&self, converter: &BinPriceConverter) -> LiquidityResult<RangeView> {
        let base = self.price_base;
        let current_price = converter.price_from_bin_in(self.active_bin_id, base)?;
        let low_edge = converter.price_from_bin_in(self.min_bin_id, base)?;
        let high_edge = converter.price_from_bin_in(self.max_bin_id, base)?;

        // Quoting in Y reverses the price order of the bins
        let (min_price, max_price) = match base {
            PriceBase::X => (low_edge, high_edge),
            PriceBase::Y => (high_edge, low_edge),
        };

        Ok(RangeView {
            price_base: base,
            current_price,
            min_price,
            max_price,
            min_percent: percent_from(current_price, min_price, self.min_bin_id)?,
            max_percent: percent_from(current_price, max_price, self.max_bin_id)?,
            bin_count: (self.max_bin_id as i64 - self.min_bin_id as i64 + 1) as u32,
            slider_lo: self.min_bin_id - self.active_bin_id,
            slider_hi: self.max_bin_id - self.active_bin_id,
        })
    }

    fn with_bins(&self, min_bin_id: i32, max_bin_id: i32) -> LiquidityResult<Self> {
        if min_bin_id > max_bin_id {
            return Err(LiquidityError::EmptyRange {
                min_bin_id,
                max_bin_id,
            });
        }
        Ok(Self {
            min_bin_id,
            max_bin_id,
            ..*self
        })
    }

    fn with_price(
        &self,
        converter: &BinPriceConverter,
        field: PriceField,
        price: Decimal,
    ) -> LiquidityResult<Self> {
        let bin_id = converter.bin_from_price_in(price, self.price_base)?;

        match (field, self.price_base) {
            (PriceField::Min, PriceBase::X) | (PriceField::Max, PriceBase::Y) => {
                self.with_bins(bin_id, self.max_bin_id)
            }
            (PriceField::Max, PriceBase::X) | (PriceField::Min, PriceBase::Y) => {
                self.with_bins(self.min_bin_id, bin_id)
            }
        }
    }

    fn price_from_percent(
        &self,
        converter: &BinPriceConverter,
        percent: Decimal,
    ) -> LiquidityResult<Decimal> {
        let current = converter.price_from_bin_in(self.active_bin_id, self.price_base)?;
        let factor = Decimal::ONE + percent / Decimal::ONE_HUNDRED;
        current
            .checked_mul(factor)
            .filter(|price| *price > Decimal::ZERO)
            .ok_or_else(|| LiquidityError::InvalidPrice(format!("{}%", percent)))
    }
}

fn centered_bounds(active_bin_id: i32, bin_count: u32) -> LiquidityResult<(i32, i32)> {
    if bin_count == 0 {
        return Err(LiquidityError::EmptyRange {
            min_bin_id: active_bin_id,
            max_bin_id: active_bin_id.saturating_sub(1),
        });
    }

    // The extra bin of an even count goes below the active bin
    let below = (bin_count / 2) as i64;
    let above = bin_count as i64 - 1 - below;
    let min_bin_id = i32::try_from(active_bin_id as i64 - below);
    let max_bin_id = i32::try_from(active_bin_id as i64 + above);

    match (min_bin_id, max_bin_id) {
        (Ok(min_bin_id), Ok(max_bin_id)) => Ok((min_bin_id, max_bin_id)),
        _ => Err(LiquidityError::PriceOutOfRange {
            bin_id: active_bin_id,
        }),
    }
}

fn parse_decimal(text: &str) -> LiquidityResult<Decimal> {
    let trimmed = text.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| LiquidityError::InvalidPrice(text.to_string()))
}

/// Offset of `price` from `current` in percent
///
/// Edges far enough apart overflow `Decimal`; `bin_id` names the offending edge.
fn percent_from(current: Decimal, price: Decimal, bin_id: i32) -> LiquidityResult<Decimal> {
    price
        .checked_div(current)
        .and_then(|ratio| ratio.checked_sub(Decimal::ONE))
        .and_then(|offset| offset.checked_mul(Decimal::ONE_HUNDRED))
        .map(|percent| percent.round_dp(PERCENT_DECIMALS))
        .ok_or(LiquidityError::PriceOutOfRange { bin_id })
}
