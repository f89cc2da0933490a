use crate::data_context::{load_futures_pair, price_column_key};
use crate::optimizer::ParameterSweep;
use crate::param_utils::{parameter_signature, parse_value_list};
use crate::strategy::StrategyKind;
use anyhow::{Context, Result};
use log::info;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct SweepOptions {
    pub asset_a: PathBuf,
    pub asset_b: PathBuf,
    pub strategy: String,
    /// Raw `key -> "v1,v2,..."` lists, expanded in the order given.
    pub axes: Vec<(String, String)>,
    pub initial_cash: f64,
    pub transaction_cost: f64,
    pub top: usize,
    pub json: bool,
}

pub fn run(options: &SweepOptions) -> Result<()> {
    let kind = StrategyKind::parse(&options.strategy)?;
    let axes = options
        .axes
        .iter()
        .map(|(key, raw)| Ok((key.clone(), parse_value_list(key, raw)?)))
        .collect::<Result<Vec<_>>>()?;

    let table = load_futures_pair(&options.asset_a, &options.asset_b).with_context(|| {
        format!(
            "Failed to load price history from {} and {}",
            options.asset_a.display(),
            options.asset_b.display()
        )
    })?;

    let mut base = HashMap::new();
    base.insert("initial_cash".to_string(), options.initial_cash);
    base.insert("transaction_cost".to_string(), options.transaction_cost);

    let sweep = ParameterSweep::new(
        &table,
        kind,
        &price_column_key("A"),
        &price_column_key("B"),
        base,
    );
    let results = sweep.run(&axes)?;
    let shown = &results[..options.top.min(results.len())];
    info!("Showing {} of {} parameter sets", shown.len(), results.len());

    if options.json {
        println!("{}", serde_json::to_string_pretty(shown)?);
        return Ok(());
    }

    for (rank, result) in shown.iter().enumerate() {
        println!(
            "#{} {} sharpe={:.4} annualized={:.4} max_drawdown={:.6} final_value={:.2}",
            rank + 1,
            parameter_signature(&result.parameters),
            result.summary.sharpe_ratio,
            result.summary.annualized_return,
            result.summary.max_drawdown,
            result.summary.final_value
        );
    }

    Ok(())
}
