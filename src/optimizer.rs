use crate::config::{EngineConfig, PairStrategyConfig};
use crate::engine::Backtest;
use crate::error::Result;
use crate::models::PriceTable;
use crate::param_utils::{expand_parameter_grid, parameter_signature};
use crate::performance::{PerformanceCalculator, PerformanceSummary};
use crate::strategy::{create_strategy, StrategyKind};
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    pub parameters: HashMap<String, f64>,
    pub summary: PerformanceSummary,
}

/// Runs one independent backtest per grid point and ranks them by Sharpe ratio.
pub struct ParameterSweep<'a> {
    table: &'a PriceTable,
    kind: StrategyKind,
    asset_a: String,
    asset_b: String,
    base_parameters: HashMap<String, f64>,
}

impl<'a> ParameterSweep<'a> {
    pub fn new(
        table: &'a PriceTable,
        kind: StrategyKind,
        asset_a: &str,
        asset_b: &str,
        base_parameters: HashMap<String, f64>,
    ) -> Self {
        Self {
            table,
            kind,
            asset_a: asset_a.to_string(),
            asset_b: asset_b.to_string(),
            base_parameters,
        }
    }

    pub fn run(&self, axes: &[(String, Vec<f64>)]) -> Result<Vec<SweepResult>> {
        let grid = expand_parameter_grid(&self.base_parameters, axes);

        // Validate everything up front so a bad axis fails before any work starts.
        let jobs = grid
            .into_iter()
            .map(|parameters| {
                let strategy_config =
                    PairStrategyConfig::from_parameters(&self.asset_a, &self.asset_b, &parameters)?;
                let engine_config = EngineConfig::from_parameters(&parameters)?;
                Ok((parameters, strategy_config, engine_config))
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Sweeping {} parameter set{} for {}",
            jobs.len(),
            if jobs.len() == 1 { "" } else { "s" },
            self.kind
        );
        let started = Instant::now();

        let mut results = jobs
            .into_par_iter()
            .map(|(parameters, strategy_config, engine_config)| {
                let mut strategy = create_strategy(self.kind, &strategy_config)?;
                let backtest = Backtest::new(self.table, strategy.as_mut(), engine_config);
                Ok(SweepResult {
                    summary: PerformanceCalculator::summarize(&backtest),
                    parameters,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        results.sort_by(|a, b| compare_by_sharpe(&b.summary, &a.summary));

        if let Some(best) = results.first() {
            info!(
                "Sweep finished in {:.2}s; best Sharpe {:.4} with {}",
                started.elapsed().as_secs_f64(),
                best.summary.sharpe_ratio,
                parameter_signature(&best.parameters)
            );
        } else {
            warn!("Sweep produced no results");
        }

        Ok(results)
    }
}

fn objective_score(summary: &PerformanceSummary) -> f64 {
    if summary.sharpe_ratio.is_finite() {
        summary.sharpe_ratio
    } else {
        f64::NEG_INFINITY
    }
}

fn compare_by_sharpe(a: &PerformanceSummary, b: &PerformanceSummary) -> Ordering {
    objective_score(a)
        .partial_cmp(&objective_score(b))
        .unwrap_or(Ordering::Equal)
}
