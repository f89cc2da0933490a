use crate::error::{BacktestError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParameterRange {
    /// Values from `min` to `max` inclusive in `step` increments.
    pub fn values(&self) -> Vec<f64> {
        if !self.step.is_finite() || self.step <= 0.0 || self.max < self.min {
            return vec![self.min];
        }
        let count = ((self.max - self.min) / self.step + 1e-9).floor() as usize + 1;
        (0..count)
            .map(|i| (self.min + i as f64 * self.step).min(self.max))
            .collect()
    }
}

/// Get a parameter value with a default fallback
pub fn get_param(params: &HashMap<String, f64>, key: &str, default: f64) -> f64 {
    params.get(key).copied().unwrap_or(default)
}

/// Get a parameter rounded to usize; negative, non-finite or out-of-range
/// values are a configuration error.
pub fn get_param_usize(params: &HashMap<String, f64>, key: &str, default: usize) -> Result<usize> {
    match params.get(key).copied() {
        None => Ok(default),
        Some(value) if value.is_finite() && value >= 0.0 && value.round() < usize::MAX as f64 => {
            Ok(value.round() as usize)
        }
        Some(value) => Err(BacktestError::configuration(format!(
            "Parameter {} must be a non-negative integer (value: {})",
            key, value
        ))),
    }
}

/// First present key wins; used for parameters with legacy aliases.
pub fn get_param_any(params: &HashMap<String, f64>, keys: &[&str], default: f64) -> f64 {
    keys.iter()
        .find_map(|key| params.get(*key).copied())
        .unwrap_or(default)
}

pub fn parameter_signature(parameters: &HashMap<String, f64>) -> String {
    let sorted: BTreeMap<_, _> = parameters.iter().collect();
    format!("{:?}", sorted)
}

/// Parses `"5,10 20"`, `"[0.5, 1.0]"` or a `"min:max:step"` range into a list
/// of finite numbers.
pub fn parse_value_list(key: &str, raw: &str) -> Result<Vec<f64>> {
    let trimmed = raw.trim().trim_matches(|c| c == '[' || c == ']');
    if trimmed.contains(':') {
        return parse_range(key, raw, trimmed).map(|range| range.values());
    }
    let mut values = Vec::new();

    for part in trimmed.split(|c: char| c == ',' || c.is_whitespace()) {
        let entry = part.trim();
        if entry.is_empty() {
            continue;
        }
        let value = entry.parse::<f64>().map_err(|_| {
            BacktestError::configuration(format!(
                "{} must be a list of numbers (value: {})",
                key, raw
            ))
        })?;
        if !value.is_finite() {
            return Err(BacktestError::configuration(format!(
                "{} must contain only finite numbers (value: {})",
                key, raw
            )));
        }
        values.push(value);
    }

    if values.is_empty() {
        return Err(BacktestError::configuration(format!(
            "{} must contain at least one number (value: {})",
            key, raw
        )));
    }

    Ok(values)
}

fn parse_range(key: &str, raw: &str, trimmed: &str) -> Result<ParameterRange> {
    let bounds = trimmed
        .split(':')
        .map(|part| part.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f64>>>();
    match bounds.as_deref() {
        Some(&[min, max, step]) if step > 0.0 && max >= min => {
            Ok(ParameterRange { min, max, step })
        }
        _ => Err(BacktestError::configuration(format!(
            "{} range must be min:max:step with step > 0 and max >= min (value: {})",
            key, raw
        ))),
    }
}

/// Cartesian product of the given axes on top of `base`. Axes are expanded in
/// the order given so the output order is stable.
pub fn expand_parameter_grid(
    base: &HashMap<String, f64>,
    axes: &[(String, Vec<f64>)],
) -> Vec<HashMap<String, f64>> {
    let mut grid = vec![base.clone()];
    for (key, values) in axes {
        if values.is_empty() {
            continue;
        }
        let mut next = Vec::with_capacity(grid.len() * values.len());
        for params in &grid {
            for &value in values {
                let mut variation = params.clone();
                variation.insert(key.clone(), value);
                next.push(variation);
            }
        }
        grid = next;
    }
    grid
}
