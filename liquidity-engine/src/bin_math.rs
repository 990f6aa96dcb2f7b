//! Bin math utilities for DLMM calculations
//!
//! Prices follow `price(bin) = (1 + bin_step / 10000) ^ bin * 10^(decimals_x - decimals_y)`,
//! i.e. the price of one whole token X in whole token Y with bin 0 as reference.

use crate::error::{LiquidityError, LiquidityResult};
use crate::types::{PriceBase, BASIS_POINT_MAX, MAX_BIN_STEP, MIN_BIN_STEP};
use log::debug;
use rust_decimal::prelude::*;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Smallest quotable price; below it `Decimal` keeps fewer than 18 significant digits
pub const MIN_PRICE: Decimal = dec!(0.0000000001);

/// Converts between bin ids and prices for one pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinPriceConverter {
    bin_step: u16,
    decimals_x: u8,
    decimals_y: u8,
}

impl BinPriceConverter {
    /// Create converter for a pool with the given bin step and token decimals
    pub fn new(bin_step: u16, decimals_x: u8, decimals_y: u8) -> LiquidityResult<Self> {
        if !(MIN_BIN_STEP..=MAX_BIN_STEP).contains(&bin_step) {
            return Err(LiquidityError::InvalidBinStep(bin_step));
        }

        Ok(Self {
            bin_step,
            decimals_x,
            decimals_y,
        })
    }

    pub fn bin_step(&self) -> u16 {
        self.bin_step
    }

    /// Geometric ratio between adjacent bins
    pub fn base(&self) -> Decimal {
        Decimal::ONE + Decimal::from(self.bin_step) / Decimal::from(BASIS_POINT_MAX)
    }

    /// `10^(decimals_x - decimals_y)`, converts raw unit prices to whole token prices
    fn decimal_factor(&self) -> Decimal {
        let diff = self.decimals_x as i64 - self.decimals_y as i64;
        // Zero when the decimal gap exceeds Decimal's 28 digits
        Decimal::TEN.checked_powi(diff).unwrap_or(Decimal::ZERO)
    }

    /// Price of one X in Y at `bin_id`
    pub fn price_from_bin(&self, bin_id: i32) -> LiquidityResult<Decimal> {
        let raw = self
            .base()
            .checked_powi(bin_id as i64)
            .ok_or(LiquidityError::PriceOutOfRange { bin_id })?;

        let price = raw
            .checked_mul(self.decimal_factor())
            .ok_or(LiquidityError::PriceOutOfRange { bin_id })?;

        if price < MIN_PRICE {
            return Err(LiquidityError::PriceOutOfRange { bin_id });
        }

        Ok(price)
    }

    /// Nearest bin for a price of one X in Y
    ///
    /// Non-positive prices and prices whose bin would not fit an `i32` are
    /// rejected, never clamped.
    pub fn bin_from_price(&self, price: Decimal) -> LiquidityResult<i32> {
        if price <= Decimal::ZERO {
            return Err(LiquidityError::InvalidPrice(price.to_string()));
        }

        let factor = self.decimal_factor();
        let raw = price
            .checked_div(factor)
            .ok_or_else(|| LiquidityError::InvalidPrice(price.to_string()))?;

        let ln_raw = raw
            .checked_ln()
            .ok_or_else(|| LiquidityError::InvalidPrice(price.to_string()))?;
        let ln_base = self
            .base()
            .checked_ln()
            .ok_or(LiquidityError::InvalidBinStep(self.bin_step))?;

        let bin_id = ln_raw
            .checked_div(ln_base)
            .map(|ratio| ratio.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|ratio| ratio.to_i32())
            .ok_or_else(|| LiquidityError::InvalidPrice(price.to_string()))?;

        debug!("price {} -> bin {} (step {})", price, bin_id, self.bin_step);
        Ok(bin_id)
    }

    /// Price at `bin_id` quoted in the requested base
    pub fn price_from_bin_in(&self, bin_id: i32, base: PriceBase) -> LiquidityResult<Decimal> {
        let price = self.price_from_bin(bin_id)?;
        match base {
            PriceBase::X => Ok(price),
            PriceBase::Y => Decimal::ONE
                .checked_div(price)
                .filter(|inverse| *inverse >= MIN_PRICE)
                .ok_or(LiquidityError::PriceOutOfRange { bin_id }),
        }
    }

    /// Bin for a price quoted in the requested base
    pub fn bin_from_price_in(&self, price: Decimal, base: PriceBase) -> LiquidityResult<i32> {
        match base {
            PriceBase::X => self.bin_from_price(price),
            PriceBase::Y => {
                if price <= Decimal::ZERO {
                    return Err(LiquidityError::InvalidPrice(price.to_string()));
                }
                let inverse = Decimal::ONE
                    .checked_div(price)
                    .ok_or_else(|| LiquidityError::InvalidPrice(price.to_string()))?;
                self.bin_from_price(inverse)
            }
        }
    }

    /// Lower and upper price bound of a bin
    pub fn bin_price_range(&self, bin_id: i32) -> LiquidityResult<(Decimal, Decimal)> {
        let lower = self.price_from_bin(bin_id)?;
        let upper = self.price_from_bin(
            bin_id
                .checked_add(1)
                .ok_or(LiquidityError::PriceOutOfRange { bin_id })?,
        )?;
        Ok((lower, upper))
    }
}

/// Signed number of bins from `price1` to `price2`
pub fn bins_between_prices(
    converter: &BinPriceConverter,
    price1: Decimal,
    price2: Decimal,
) -> LiquidityResult<i32> {
    let from = converter.bin_from_price(price1)?;
    let to = converter.bin_from_price(price2)?;
    to.checked_sub(from)
        .ok_or_else(|| LiquidityError::InvalidPrice(price2.to_string()))
}

/// Which tokens a bin can hold relative to the active bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinComposition {
    /// Below the active bin: token Y only
    YOnly,
    /// The active bin: either token
    Both,
    /// Above the active bin: token X only
    XOnly,
}

/// Get composition at bin
pub fn get_bin_composition(bin_id: i32, active_bin_id: i32) -> BinComposition {
    if bin_id < active_bin_id {
        BinComposition::YOnly
    } else if bin_id > active_bin_id {
        BinComposition::XOnly
    } else {
        BinComposition::Both
    }
}
