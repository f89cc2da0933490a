use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::info;
use pair_backtest::commands::{
    backtest::{self, BacktestOptions},
    sweep::{self, SweepOptions},
};
use pair_backtest::config::{
    DEFAULT_INITIAL_CASH, DEFAULT_N_DAYS, DEFAULT_POSITION_SIZE, DEFAULT_STD_THRESHOLD,
    DEFAULT_TRANSACTION_COST,
};
use std::path::PathBuf;

const DEFAULT_STRATEGY: &str = "future_pairs_strategy";

#[derive(Parser)]
#[command(name = "pair-backtest")]
#[command(about = "Daily pair-trading backtests over two price histories")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one backtest and print its performance summary
    Backtest {
        /// CSV with the traded asset (Date + Close/Last/Price columns)
        #[arg(long = "asset-a", value_name = "PATH")]
        asset_a: PathBuf,
        /// CSV with the asset whose statistics drive the signal
        #[arg(long = "asset-b", value_name = "PATH")]
        asset_b: PathBuf,
        #[arg(long, default_value = DEFAULT_STRATEGY)]
        strategy: String,
        /// Rolling window length in days
        #[arg(long, default_value_t = DEFAULT_N_DAYS)]
        n_days: usize,
        #[arg(long, default_value_t = DEFAULT_STD_THRESHOLD, allow_hyphen_values = true)]
        std_rise: f64,
        #[arg(long, default_value_t = DEFAULT_STD_THRESHOLD, allow_hyphen_values = true)]
        std_drop: f64,
        #[arg(long, default_value_t = DEFAULT_POSITION_SIZE)]
        long_size: f64,
        #[arg(long, default_value_t = DEFAULT_POSITION_SIZE)]
        short_size: f64,
        #[arg(long, default_value_t = DEFAULT_INITIAL_CASH)]
        cash: f64,
        /// Flat cost per trade
        #[arg(long, default_value_t = DEFAULT_TRANSACTION_COST)]
        transaction_cost: f64,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Backtest every combination of the given parameter lists in parallel
    Sweep {
        #[arg(long = "asset-a", value_name = "PATH")]
        asset_a: PathBuf,
        #[arg(long = "asset-b", value_name = "PATH")]
        asset_b: PathBuf,
        #[arg(long, default_value = DEFAULT_STRATEGY)]
        strategy: String,
        /// Parameter list as KEY=V1,V2,... or KEY=MIN:MAX:STEP (repeatable), e.g. n_days=5,10,20
        #[arg(long = "param", value_name = "KEY=VALUES")]
        params: Vec<String>,
        #[arg(long, default_value_t = DEFAULT_INITIAL_CASH)]
        cash: f64,
        #[arg(long, default_value_t = DEFAULT_TRANSACTION_COST)]
        transaction_cost: f64,
        /// Number of best parameter sets to print
        #[arg(long, default_value_t = 10)]
        top: usize,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let Cli { command } = Cli::parse();

    info!("Starting pair-backtest. Simulation only, not financial advice.");

    match command {
        Commands::Backtest {
            asset_a,
            asset_b,
            strategy,
            n_days,
            std_rise,
            std_drop,
            long_size,
            short_size,
            cash,
            transaction_cost,
            json,
        } => {
            backtest::run(&BacktestOptions {
                asset_a,
                asset_b,
                strategy,
                n_days,
                std_rise,
                std_drop,
                long_size,
                short_size,
                initial_cash: cash,
                transaction_cost,
                json,
            })?;
        }
        Commands::Sweep {
            asset_a,
            asset_b,
            strategy,
            params,
            cash,
            transaction_cost,
            top,
            json,
        } => {
            let axes = params
                .iter()
                .map(|raw| parse_axis(raw))
                .collect::<Result<Vec<_>>>()?;
            sweep::run(&SweepOptions {
                asset_a,
                asset_b,
                strategy,
                axes,
                initial_cash: cash,
                transaction_cost,
                top,
                json,
            })?;
        }
    }

    Ok(())
}

fn parse_axis(raw: &str) -> Result<(String, String)> {
    let (key, values) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("--param expects KEY=V1,V2,... (got {})", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("--param is missing a parameter name (got {})", raw));
    }
    Ok((key.to_string(), values.to_string()))
}
