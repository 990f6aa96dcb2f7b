use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use dlmm_liquidity_engine::{
    bins_between_prices, compute_weights, plan_add_liquidity, AddLiquidityRequest,
    BinPriceConverter, ChunkSequencer, DistributionShape, LiquidityPlan, LiquidityRange, PriceBase,
    RangeSyncState,
};
use log::{info, warn};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;

mod config;
mod edits;
mod mock_submitter;

use config::{load_config, PlannerConfig};
use edits::parse_edit;
use mock_submitter::MockChainSubmitter;

#[derive(Parser)]
#[command(name = "liquidity-planner")]
#[command(about = "Plan and simulate add-liquidity operations on a Saros DLMM pool")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "planner.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price of a bin
    Price {
        #[arg(long, allow_hyphen_values = true)]
        bin_id: i32,
        #[arg(long, default_value = "x")]
        base: PriceBase,
        #[command(flatten)]
        pool: PoolArgs,
    },
    /// Nearest bin for a price
    Bin {
        #[arg(long)]
        price: String,
        #[arg(long, default_value = "x")]
        base: PriceBase,
        #[command(flatten)]
        pool: PoolArgs,
    },
    /// Signed bin distance between two prices
    Span {
        #[arg(long)]
        from_price: String,
        #[arg(long)]
        to_price: String,
        #[command(flatten)]
        pool: PoolArgs,
    },
    /// Per-bin weights and token amounts for a range
    Distribute {
        #[command(flatten)]
        liquidity: LiquidityArgs,
    },
    /// Weights, minimums and chunks for an add-liquidity operation
    Plan {
        #[command(flatten)]
        liquidity: LiquidityArgs,
    },
    /// Apply range edits and show every synchronized field
    Range {
        #[arg(long, allow_hyphen_values = true)]
        active_bin: i32,
        /// Bins in the initial centered range
        #[arg(long)]
        bins: Option<u32>,
        #[arg(long, default_value = "x")]
        base: PriceBase,
        /// Edits applied in order, e.g. min-price=1.2 or slider=-5,10
        #[arg(long = "edit", allow_hyphen_values = true)]
        edits: Vec<String>,
        #[command(flatten)]
        pool: PoolArgs,
    },
    /// Plan, then submit chunks against a mock chain
    Submit {
        #[command(flatten)]
        liquidity: LiquidityArgs,
        /// Make this chunk index fail
        #[arg(long)]
        fail_at: Option<usize>,
        /// Retry from the failed chunk once
        #[arg(long)]
        resume: bool,
        #[arg(long, default_value = "200")]
        latency_ms: u64,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
}

/// Pool parameters, falling back to configuration
#[derive(Args)]
struct PoolArgs {
    #[arg(long)]
    bin_step: Option<u16>,
    #[arg(long)]
    decimals_x: Option<u8>,
    #[arg(long)]
    decimals_y: Option<u8>,
}

impl PoolArgs {
    fn converter(&self, config: &PlannerConfig) -> Result<BinPriceConverter> {
        PlannerConfig {
            bin_step: self.bin_step.unwrap_or(config.bin_step),
            decimals_x: self.decimals_x.unwrap_or(config.decimals_x),
            decimals_y: self.decimals_y.unwrap_or(config.decimals_y),
            ..config.clone()
        }
        .converter()
    }
}

#[derive(Args)]
struct LiquidityArgs {
    #[arg(long, allow_hyphen_values = true)]
    min_bin: i32,
    #[arg(long, allow_hyphen_values = true)]
    max_bin: i32,
    #[arg(long, allow_hyphen_values = true)]
    active_bin: i32,
    #[arg(long, default_value = "0")]
    amount_x: u64,
    #[arg(long, default_value = "0")]
    amount_y: u64,
    /// uniform, curve or bid-ask
    #[arg(long)]
    shape: Option<DistributionShape>,
    #[arg(long)]
    curve_param: Option<String>,
    #[arg(long)]
    slippage_bps: Option<u16>,
    /// Maximum bins per transaction
    #[arg(long)]
    bin_limit: Option<u32>,
}

impl LiquidityArgs {
    fn range(&self) -> Result<LiquidityRange> {
        LiquidityRange::new(self.min_bin, self.max_bin).context("invalid bin range")
    }

    fn shape(&self, config: &PlannerConfig) -> Result<DistributionShape> {
        match self.shape {
            Some(shape) => Ok(shape),
            None => config.default_shape(),
        }
    }

    fn curve_param(&self, config: &PlannerConfig) -> Result<Decimal> {
        match &self.curve_param {
            Some(text) => {
                Decimal::from_str(text).with_context(|| format!("invalid curve parameter: {}", text))
            }
            None => Ok(config.curve_param),
        }
    }

    fn request(&self, config: &PlannerConfig) -> Result<AddLiquidityRequest> {
        Ok(AddLiquidityRequest {
            range: self.range()?,
            shape: self.shape(config)?,
            curve_param: Some(self.curve_param(config)?),
            amount_x: self.amount_x,
            amount_y: self.amount_y,
            slippage_tolerance_bps: self.slippage_bps.unwrap_or(config.slippage_bps),
            bin_count_limit: self.bin_limit.unwrap_or(config.bin_count_limit),
        })
    }
}

fn parse_price(text: &str) -> Result<Decimal> {
    Decimal::from_str(text).with_context(|| format!("invalid price: {}", text))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_plan(plan: &LiquidityPlan) {
    println!(
        "Bins {}..={} ({} bins), active {}",
        plan.weights.min_bin_id,
        plan.weights.max_bin_id(),
        plan.weights.bin_count(),
        plan.weights.active_bin_id
    );
    println!(
        "Amounts: x={} (min {}), y={} (min {})",
        plan.amount_x, plan.amount_x_min, plan.amount_y, plan.amount_y_min
    );
    println!("{} chunk(s):", plan.chunk_count());
    for chunk in &plan.chunks {
        println!(
            "  #{} bins {} x={} (min {}) y={} (min {})",
            chunk.index,
            chunk.range,
            chunk.amount_x,
            chunk.amount_x_min,
            chunk.amount_y,
            chunk.amount_y_min
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Price { bin_id, base, pool } => {
            let converter = pool.converter(&config)?;
            let price = converter.price_from_bin_in(bin_id, base)?;
            if cli.json {
                print_json(&serde_json::json!({ "bin_id": bin_id, "base": base, "price": price }))?;
            } else {
                println!("Bin {} price: {}", bin_id, price);
            }
        }
        Commands::Bin { price, base, pool } => {
            let converter = pool.converter(&config)?;
            let price = parse_price(&price)?;
            let bin_id = converter.bin_from_price_in(price, base)?;
            let (lower, upper) = converter.bin_price_range(bin_id)?;
            if cli.json {
                print_json(&serde_json::json!({
                    "bin_id": bin_id,
                    "lower_price": lower,
                    "upper_price": upper,
                }))?;
            } else {
                println!("Nearest bin: {}", bin_id);
                println!("Bin covers prices {} to {}", lower, upper);
            }
        }
        Commands::Span {
            from_price,
            to_price,
            pool,
        } => {
            let converter = pool.converter(&config)?;
            let bins =
                bins_between_prices(&converter, parse_price(&from_price)?, parse_price(&to_price)?)?;
            if cli.json {
                print_json(&serde_json::json!({ "bins": bins }))?;
            } else {
                println!("{} bins from {} to {}", bins, from_price, to_price);
            }
        }
        Commands::Distribute { liquidity } => {
            let weights = compute_weights(
                liquidity.range()?,
                liquidity.shape(&config)?,
                liquidity.amount_x,
                liquidity.amount_y,
                liquidity.active_bin,
                Some(liquidity.curve_param(&config)?),
            )?;
            let amounts = weights.amounts_per_bin(liquidity.amount_x, liquidity.amount_y);

            if cli.json {
                print_json(&serde_json::json!({ "weights": weights, "amounts": amounts }))?;
            } else {
                println!("{:>8} {:>20} {:>20} {:>12} {:>12}", "bin", "weight_x", "weight_y", "x", "y");
                for (offset, amount) in amounts.iter().enumerate() {
                    println!(
                        "{:>8} {:>20} {:>20} {:>12} {:>12}",
                        amount.bin_id,
                        weights.weight_x[offset],
                        weights.weight_y[offset],
                        amount.amount_x,
                        amount.amount_y
                    );
                }
            }
        }
        Commands::Plan { liquidity } => {
            let request = liquidity.request(&config)?;
            let plan = plan_add_liquidity(&request, liquidity.active_bin)?;
            if cli.json {
                print_json(&plan)?;
            } else {
                print_plan(&plan);
            }
        }
        Commands::Range {
            active_bin,
            bins,
            base,
            edits,
            pool,
        } => {
            let converter = pool.converter(&config)?;
            let mut state = RangeSyncState::centered(
                active_bin,
                bins.unwrap_or(config.default_bin_count),
                base,
            )?;

            for edit in &edits {
                let action = parse_edit(edit)?;
                let next = state.apply(&converter, action);
                if next == state {
                    warn!("Edit {} left the range unchanged", edit);
                }
                state = next;
            }

            let view = state.view(&converter)?;
            if cli.json {
                print_json(&view)?;
            } else {
                println!("Range {} (base {:?})", state.range(), view.price_base);
                println!("Current price: {}", view.current_price);
                println!("Min price: {} ({}%)", view.min_price, view.min_percent);
                println!("Max price: {} ({}%)", view.max_price, view.max_percent);
                println!("Bins: {}", view.bin_count);
                println!("Slider: {}..{}", view.slider_lo, view.slider_hi);
            }
        }
        Commands::Submit {
            liquidity,
            fail_at,
            resume,
            latency_ms,
        } => {
            let request = liquidity.request(&config)?;
            let plan = plan_add_liquidity(&request, liquidity.active_bin)?;
            info!("Submitting {} chunk(s) to mock chain", plan.chunk_count());

            let mut submitter = MockChainSubmitter::new(fail_at, latency_ms);
            let mut sequencer = ChunkSequencer::new(plan.chunks);
            let mut report = sequencer.run(&mut submitter).await;

            if resume && !report.is_complete() {
                // The injected failure only fires once
                submitter = MockChainSubmitter::new(None, latency_ms);
                report = sequencer.resume(&mut submitter).await;
            }

            if cli.json {
                print_json(&serde_json::json!({
                    "completed": report.completed,
                    "total": report.total,
                    "receipts": report.receipts,
                    "error": report.failure.as_ref().map(|e| e.to_string()),
                }))?;
            } else {
                for receipt in &report.receipts {
                    println!("Chunk {} confirmed: {}", receipt.chunk_index, receipt.signature);
                }
                println!("{}", report.summary());
            }

            if let Some(failure) = report.failure {
                return Err(anyhow!(failure));
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if cli.json {
                    print_json(&config)?;
                } else {
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }
        },
    }

    Ok(())
}
