//! Planner configuration
//!
//! Values come from an optional TOML file, then `PLANNER_*` environment
//! variables. Command line flags override both.

use anyhow::{Context, Result};
use config::{Config, Environment, File as ConfigFile};
use dlmm_liquidity_engine::{BinPriceConverter, DistributionShape, DEFAULT_CURVE_PARAM};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Effective planner settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Pool bin step in basis points
    pub bin_step: u16,
    /// Token X decimals
    pub decimals_x: u8,
    /// Token Y decimals
    pub decimals_y: u8,
    /// Bins in a freshly reset range
    pub default_bin_count: u32,
    /// Maximum bins per add-liquidity transaction
    pub bin_count_limit: u32,
    /// Slippage tolerance in basis points
    pub slippage_bps: u16,
    /// Edge weight for curve and bid-ask shapes
    pub curve_param: Decimal,
    /// Default distribution shape
    pub shape: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            bin_step: 25,
            decimals_x: 9,
            decimals_y: 6,
            default_bin_count: 69,
            bin_count_limit: 50,
            slippage_bps: 50,
            curve_param: DEFAULT_CURVE_PARAM,
            shape: "uniform".to_string(),
        }
    }
}

impl PlannerConfig {
    pub fn converter(&self) -> Result<BinPriceConverter> {
        BinPriceConverter::new(self.bin_step, self.decimals_x, self.decimals_y)
            .context("invalid pool parameters")
    }

    pub fn default_shape(&self) -> Result<DistributionShape> {
        self.shape
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .context("invalid shape in configuration")
    }
}

/// Load configuration from file and environment
pub fn load_config(config_path: &Path) -> Result<PlannerConfig> {
    let mut builder = Config::builder();

    if config_path.exists() {
        builder = builder.add_source(ConfigFile::from(config_path.to_path_buf()));
    }

    let config = builder
        .add_source(Environment::with_prefix("PLANNER"))
        .build()
        .with_context(|| format!("failed to read {}", config_path.display()))?;

    let planner_config: PlannerConfig = config.try_deserialize()?;
    Ok(planner_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(config.bin_step, PlannerConfig::default().bin_step);
        assert_eq!(config.default_shape().unwrap(), DistributionShape::Uniform);
    }

    #[test]
    fn test_partial_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("planner-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "bin_step = 10\nshape = \"bid-ask\"\nbin_count_limit = 7").unwrap();

        let config = load_config(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.bin_step, 10);
        assert_eq!(config.bin_count_limit, 7);
        assert_eq!(config.decimals_x, 9);
        assert_eq!(config.default_shape().unwrap(), DistributionShape::BidAsk);
        assert!(config.converter().is_ok());
    }

    #[test]
    fn test_defaults_render_as_toml() {
        let rendered = toml::to_string_pretty(&PlannerConfig::default()).unwrap();
        assert!(rendered.contains("bin_step = 25"));
        assert!(rendered.contains("shape = \"uniform\""));
    }
}
