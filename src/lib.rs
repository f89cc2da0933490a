pub mod commands;
pub mod config;
pub mod data_context;
pub mod engine;
pub mod error;
pub mod models;
pub mod optimizer;
pub mod param_utils;
pub mod performance;
pub mod signals;
pub mod strategy;
pub mod strategy_utils;
pub mod tracker;

pub use config::{EngineConfig, PairStrategyConfig};
pub use engine::Backtest;
pub use error::{BacktestError, Result};
pub use models::{BacktestResults, PriceRow, PriceTable};
pub use performance::{PerformanceCalculator, PerformanceSummary};
pub use strategy::{create_strategy, Strategy, StrategyKind};
