pub mod backtest;
pub mod sweep;
