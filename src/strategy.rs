use crate::config::PairStrategyConfig;
use crate::error::{BacktestError, Result};
use crate::models::{OrderDirective, PriceRow};
use chrono::NaiveDate;
use std::fmt;

pub trait Strategy {
    fn name(&self) -> &str;
    /// Returns the asset to act on and what to do with it today.
    fn decide(&mut self, date: NaiveDate, row: &PriceRow) -> (String, OrderDirective);
}

#[path = "strategies/futures_pair.rs"]
pub mod futures_pair;

pub use futures_pair::FuturesStdPairStrategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    FuturesPairs,
}

impl StrategyKind {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "future_pairs_strategy" | "futurepairsstrategy" => Ok(Self::FuturesPairs),
            _ => Err(BacktestError::configuration(format!(
                "Strategy \"{}\" not recognized",
                raw
            ))),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FuturesPairs => "future_pairs_strategy",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn create_strategy(
    kind: StrategyKind,
    config: &PairStrategyConfig,
) -> Result<Box<dyn Strategy + Send>> {
    config.validate()?;
    match kind {
        StrategyKind::FuturesPairs => Ok(Box::new(FuturesStdPairStrategy::new(config))),
    }
}
