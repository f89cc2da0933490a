use crate::error::{BacktestError, Result};
use crate::param_utils::{get_param, get_param_any, get_param_usize};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_INITIAL_CASH: f64 = 1_000_000.0;
pub const DEFAULT_TRANSACTION_COST: f64 = 0.1;
pub const DEFAULT_N_DAYS: usize = 20;
/// Longest accepted rolling window, in trading days.
pub const MAX_N_DAYS: usize = 100_000;
pub const DEFAULT_STD_THRESHOLD: f64 = 1.0;
pub const DEFAULT_POSITION_SIZE: f64 = 10.0;
pub const DEFAULT_ASSET_A: &str = "A Price";
pub const DEFAULT_ASSET_B: &str = "B Price";

/// Parameters of the standard-deviation pair strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairStrategyConfig {
    /// Traded asset
    pub asset_a: String,
    /// Asset whose rolling statistics drive the signal
    pub asset_b: String,
    pub n_days: usize,
    pub std_rise: f64,
    pub std_drop: f64,
    pub long_size: f64,
    pub short_size: f64,
}

impl Default for PairStrategyConfig {
    fn default() -> Self {
        Self {
            asset_a: DEFAULT_ASSET_A.to_string(),
            asset_b: DEFAULT_ASSET_B.to_string(),
            n_days: DEFAULT_N_DAYS,
            std_rise: DEFAULT_STD_THRESHOLD,
            std_drop: DEFAULT_STD_THRESHOLD,
            long_size: DEFAULT_POSITION_SIZE,
            short_size: DEFAULT_POSITION_SIZE,
        }
    }
}

impl PairStrategyConfig {
    /// Create a validated config from a parameter map; missing keys use defaults.
    pub fn from_parameters(
        asset_a: &str,
        asset_b: &str,
        parameters: &HashMap<String, f64>,
    ) -> Result<Self> {
        let config = Self {
            asset_a: asset_a.to_string(),
            asset_b: asset_b.to_string(),
            n_days: get_param_usize(parameters, "n_days", DEFAULT_N_DAYS)?,
            std_rise: get_param(parameters, "std_rise", DEFAULT_STD_THRESHOLD),
            std_drop: get_param(parameters, "std_drop", DEFAULT_STD_THRESHOLD),
            long_size: get_param(parameters, "long_size", DEFAULT_POSITION_SIZE),
            short_size: get_param(parameters, "short_size", DEFAULT_POSITION_SIZE),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.asset_a.trim().is_empty() || self.asset_b.trim().is_empty() {
            return Err(BacktestError::configuration(
                "asset_a and asset_b must name price columns",
            ));
        }
        if self.n_days == 0 || self.n_days > MAX_N_DAYS {
            return Err(BacktestError::configuration(format!(
                "n_days must be between 1 and {} (value: {})",
                MAX_N_DAYS, self.n_days
            )));
        }
        require_finite("std_rise", self.std_rise)?;
        require_finite("std_drop", self.std_drop)?;
        require_non_negative("long_size", self.long_size)?;
        require_non_negative("short_size", self.short_size)?;
        Ok(())
    }
}

/// Ledger settings for a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_cash: f64,
    pub transaction_cost: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_cash: DEFAULT_INITIAL_CASH,
            transaction_cost: DEFAULT_TRANSACTION_COST,
        }
    }
}

impl EngineConfig {
    /// Accepts `transaction_cost` or the short alias `C`.
    pub fn from_parameters(parameters: &HashMap<String, f64>) -> Result<Self> {
        let config = Self {
            initial_cash: get_param(parameters, "initial_cash", DEFAULT_INITIAL_CASH),
            transaction_cost: get_param_any(
                parameters,
                &["transaction_cost", "C"],
                DEFAULT_TRANSACTION_COST,
            ),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        require_finite("initial_cash", self.initial_cash)?;
        require_non_negative("transaction_cost", self.transaction_cost)?;
        Ok(())
    }
}

fn require_finite(key: &str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(BacktestError::configuration(format!(
            "{} must be finite (value: {})",
            key, value
        )));
    }
    Ok(value)
}

fn require_non_negative(key: &str, value: f64) -> Result<f64> {
    require_finite(key, value)?;
    if value < 0.0 {
        return Err(BacktestError::configuration(format!(
            "{} must be >= 0 (value: {})",
            key, value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn strategy_config_reads_parameters_with_defaults() {
        let config = PairStrategyConfig::from_parameters(
            "A",
            "B",
            &params(&[("n_days", 2.0), ("std_rise", 0.5), ("std_drop", 0.25)]),
        )
        .unwrap();

        assert_eq!(config.n_days, 2);
        assert_eq!(config.std_rise, 0.5);
        assert_eq!(config.std_drop, 0.25);
        assert_eq!(config.long_size, DEFAULT_POSITION_SIZE);
        assert_eq!(config.short_size, DEFAULT_POSITION_SIZE);
    }

    #[test]
    fn rejects_zero_window_and_bad_numbers() {
        let zero = PairStrategyConfig::from_parameters("A", "B", &params(&[("n_days", 0.0)]));
        assert!(matches!(zero, Err(BacktestError::Configuration(_))));

        let nan = PairStrategyConfig::from_parameters("A", "B", &params(&[("std_rise", f64::NAN)]));
        assert!(matches!(nan, Err(BacktestError::Configuration(_))));

        let negative =
            PairStrategyConfig::from_parameters("A", "B", &params(&[("short_size", -1.0)]));
        assert!(matches!(negative, Err(BacktestError::Configuration(_))));

        let blank = PairStrategyConfig::from_parameters(" ", "B", &HashMap::new());
        assert!(matches!(blank, Err(BacktestError::Configuration(_))));
    }

    #[test]
    fn rejects_windows_beyond_the_limit() {
        let huge = PairStrategyConfig::from_parameters("A", "B", &params(&[("n_days", 1e30)]));
        assert!(matches!(huge, Err(BacktestError::Configuration(_))));

        let too_long = PairStrategyConfig {
            n_days: MAX_N_DAYS + 1,
            ..PairStrategyConfig::default()
        };
        assert!(matches!(too_long.validate(), Err(BacktestError::Configuration(_))));

        let longest = PairStrategyConfig {
            n_days: MAX_N_DAYS,
            ..PairStrategyConfig::default()
        };
        assert!(longest.validate().is_ok());
    }

    #[test]
    fn engine_config_accepts_cost_alias() {
        let config = EngineConfig::from_parameters(&params(&[("C", 0.25)])).unwrap();
        assert_eq!(config.transaction_cost, 0.25);
        assert_eq!(config.initial_cash, DEFAULT_INITIAL_CASH);

        let bad = EngineConfig::from_parameters(&params(&[("transaction_cost", -0.1)]));
        assert!(bad.is_err());
    }
}
