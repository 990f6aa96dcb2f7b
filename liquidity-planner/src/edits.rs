//! Parsing of `--edit key=value` range edits

use anyhow::{anyhow, Context, Result};
use dlmm_liquidity_engine::{PriceBase, RangeAction};

/// Parse one edit such as `min-price=1.25` or `slider=-5,10`
///
/// Values for price and percent edits are passed through as typed; the range
/// synchronizer decides whether they are usable.
pub fn parse_edit(edit: &str) -> Result<RangeAction> {
    let (key, value) = edit
        .split_once('=')
        .ok_or_else(|| anyhow!("edit must look like key=value: {}", edit))?;
    let value = value.trim();

    let action = match key.trim().to_lowercase().as_str() {
        "min-price" => RangeAction::SetMinPriceAbsolute(value.to_string()),
        "max-price" => RangeAction::SetMaxPriceAbsolute(value.to_string()),
        "min-percent" => RangeAction::SetMinPricePercent(value.to_string()),
        "max-percent" => RangeAction::SetMaxPricePercent(value.to_string()),
        "bins" => RangeAction::SetBinCount(value.parse().context("bins expects a count")?),
        "slider" => {
            let (lo, hi) = value
                .split_once(',')
                .ok_or_else(|| anyhow!("slider expects lo,hi"))?;
            RangeAction::SetSliderOffsets {
                lo: lo.trim().parse().context("invalid slider low offset")?,
                hi: hi.trim().parse().context("invalid slider high offset")?,
            }
        }
        "reset" => RangeAction::Reset {
            bin_count: value.parse().context("reset expects a bin count")?,
        },
        "active" => RangeAction::SetActiveBin(value.parse().context("active expects a bin id")?),
        "base" if value.eq_ignore_ascii_case("flip") => RangeAction::FlipPriceBase,
        "base" => RangeAction::SetPriceBase(value.parse::<PriceBase>().map_err(|e| anyhow!(e))?),
        other => return Err(anyhow!("unknown range edit: {}", other)),
    };

    Ok(action)
}
