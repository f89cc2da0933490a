use crate::config::{EngineConfig, PairStrategyConfig};
use crate::data_context::{load_futures_pair, price_column_key};
use crate::engine::Backtest;
use crate::performance::PerformanceCalculator;
use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct BacktestOptions {
    pub asset_a: PathBuf,
    pub asset_b: PathBuf,
    pub strategy: String,
    pub n_days: usize,
    pub std_rise: f64,
    pub std_drop: f64,
    pub long_size: f64,
    pub short_size: f64,
    pub initial_cash: f64,
    pub transaction_cost: f64,
    pub json: bool,
}

impl BacktestOptions {
    pub fn strategy_config(&self) -> PairStrategyConfig {
        PairStrategyConfig {
            asset_a: price_column_key("A"),
            asset_b: price_column_key("B"),
            n_days: self.n_days,
            std_rise: self.std_rise,
            std_drop: self.std_drop,
            long_size: self.long_size,
            short_size: self.short_size,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            initial_cash: self.initial_cash,
            transaction_cost: self.transaction_cost,
        }
    }
}

pub fn run(options: &BacktestOptions) -> Result<()> {
    let table = load_futures_pair(&options.asset_a, &options.asset_b).with_context(|| {
        format!(
            "Failed to load price history from {} and {}",
            options.asset_a.display(),
            options.asset_b.display()
        )
    })?;

    info!(
        "Running {} over {} trading days",
        options.strategy,
        table.len()
    );
    let backtest = Backtest::from_strategy_name(
        &table,
        &options.strategy,
        &options.strategy_config(),
        options.engine_config(),
    )?;
    let summary = PerformanceCalculator::summarize(&backtest);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }

    Ok(())
}
