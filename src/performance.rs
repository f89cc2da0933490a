use crate::engine::Backtest;
use crate::models::BacktestResults;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub strategy: String,
    pub trading_days: usize,
    pub final_value: f64,
    pub cumulative_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub trades_executed: usize,
    pub missed_trades_due_to_cash: usize,
}

impl fmt::Display for PerformanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} summary", self.strategy)?;
        writeln!(f, "Annualized return: {}", self.annualized_return)?;
        writeln!(f, "Sharpe ratio: {}", self.sharpe_ratio)?;
        write!(f, "Max drawdown: {}", self.max_drawdown)
    }
}

pub struct PerformanceCalculator;

impl PerformanceCalculator {
    pub fn summarize(backtest: &Backtest) -> PerformanceSummary {
        let results = backtest.results();
        let daily_returns = Self::daily_returns(&results.cumulative_pnl());
        let cumulative_return = Self::cumulative_return(&daily_returns);

        PerformanceSummary {
            strategy: backtest.strategy_name().to_string(),
            trading_days: results.len(),
            final_value: backtest.final_value(),
            cumulative_return,
            annualized_return: Self::annualized_return(cumulative_return, results.len()),
            sharpe_ratio: Self::calculate_sharpe_ratio(&daily_returns),
            max_drawdown: Self::calculate_max_drawdown(results),
            trades_executed: backtest.trades_executed(),
            missed_trades_due_to_cash: backtest.missed_trades_due_to_cash(),
        }
    }

    /// Day-over-day percent change; the first day and any non-finite change are 0.
    pub fn daily_returns(pnl: &[f64]) -> Vec<f64> {
        let mut returns = Vec::with_capacity(pnl.len());
        if pnl.is_empty() {
            return returns;
        }
        returns.push(0.0);
        for window in pnl.windows(2) {
            let change = window[1] / window[0] - 1.0;
            returns.push(if change.is_finite() { change } else { 0.0 });
        }
        returns
    }

    pub fn cumulative_return(daily_returns: &[f64]) -> f64 {
        daily_returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
    }

    pub fn annualized_return(cumulative_return: f64, trading_days: usize) -> f64 {
        if trading_days == 0 {
            return 0.0;
        }
        (1.0 + cumulative_return).powf(TRADING_DAYS_PER_YEAR / trading_days as f64) - 1.0
    }

    /// Mean over sample standard deviation of daily returns, annualized.
    pub fn calculate_sharpe_ratio(daily_returns: &[f64]) -> f64 {
        if daily_returns.len() < 2 {
            return 0.0;
        }

        let mean_return = daily_returns.mean();
        let std_dev = daily_returns.std_dev();

        if std_dev == 0.0 || !std_dev.is_finite() {
            return 0.0;
        }

        (mean_return / std_dev) * TRADING_DAYS_PER_YEAR.sqrt()
    }

    pub fn calculate_max_drawdown(results: &BacktestResults) -> f64 {
        results
            .drawdown()
            .into_iter()
            .filter(|d| !d.is_nan())
            .fold(None, |max: Option<f64>, d| Some(max.map_or(d, |m| m.max(d))))
            .unwrap_or(0.0)
    }
}
