use crate::error::{BacktestError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const CUMULATIVE_PNL_COLUMN: &str = "Cumulative_Pnl";
pub const DRAWDOWN_COLUMN: &str = "Drawdown";

/// One trading day of prices. Assets without a value read back as NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub date: NaiveDate,
    prices: HashMap<String, f64>,
}

impl PriceRow {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            prices: HashMap::new(),
        }
    }

    pub fn with_price(mut self, asset: &str, price: f64) -> Self {
        self.set_price(asset, price);
        self
    }

    pub fn set_price(&mut self, asset: &str, price: f64) {
        self.prices.insert(asset.to_string(), price);
    }

    pub fn price(&self, asset: &str) -> f64 {
        self.prices.get(asset).copied().unwrap_or(f64::NAN)
    }

    pub fn has_price(&self, asset: &str) -> bool {
        !self.price(asset).is_nan()
    }
}

/// Time-ordered price history, one column per asset.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    columns: Vec<String>,
    rows: Vec<PriceRow>,
}

impl PriceTable {
    pub fn new(columns: Vec<String>, rows: Vec<PriceRow>) -> Result<Self> {
        for pair in rows.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(BacktestError::data(format!(
                    "Price rows must be in strictly ascending date order ({} follows {})",
                    pair[1].date, pair[0].date
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Builds a table from parallel date / value vectors; `values[i][j]` is the
    /// price of `columns[j]` on `dates[i]`.
    pub fn from_columns(
        columns: &[&str],
        dates: &[NaiveDate],
        values: &[Vec<f64>],
    ) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(BacktestError::data(format!(
                "Expected {} value rows to match dates, got {}",
                dates.len(),
                values.len()
            )));
        }

        let mut rows = Vec::with_capacity(dates.len());
        for (date, row_values) in dates.iter().zip(values) {
            if row_values.len() != columns.len() {
                return Err(BacktestError::data(format!(
                    "Row for {} has {} values but the table has {} columns",
                    date,
                    row_values.len(),
                    columns.len()
                )));
            }
            let mut row = PriceRow::new(*date);
            for (column, &price) in columns.iter().zip(row_values) {
                row.set_price(column, price);
            }
            rows.push(row);
        }

        Self::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, asset: &str) -> bool {
        self.columns.iter().any(|column| column == asset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

/// What a strategy asks the engine to do with its asset today.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderDirective {
    Open { direction: Direction, size: f64 },
    Close,
    NoOp,
}

impl OrderDirective {
    /// Signed quantity for open orders (positive = long).
    pub fn signed_size(&self) -> Option<f64> {
        match self {
            OrderDirective::Open { direction, size } => Some(direction.sign() * size.abs()),
            OrderDirective::Close | OrderDirective::NoOp => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            OrderDirective::Open { direction, size } => {
                format!("open_{} {}", direction.as_str(), size)
            }
            OrderDirective::Close => "close".to_string(),
            OrderDirective::NoOp => "noop".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalDirection {
    Up,
    Down,
    Neutral,
}

impl SignalDirection {
    pub fn value(self) -> f64 {
        match self {
            SignalDirection::Up => 1.0,
            SignalDirection::Down => -1.0,
            SignalDirection::Neutral => 0.0,
        }
    }
}

/// Ledger state after one simulated day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    pub date: NaiveDate,
    pub asset: String,
    pub order: OrderDirective,
    pub price: f64,
    pub cash: f64,
    pub position_size: f64,
    pub position_value: f64,
    pub total_value: f64,
    pub drawdown: f64,
    pub traded: bool,
    pub missed_trade_due_to_cash: bool,
    pub price_missing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub date: NaiveDate,
    pub prices: Vec<f64>,
    pub cumulative_pnl: f64,
    pub drawdown: f64,
}

/// Input prices augmented with the `Cumulative_Pnl` and `Drawdown` columns.
#[derive(Debug, Clone, Default)]
pub struct BacktestResults {
    pub price_columns: Vec<String>,
    pub rows: Vec<ResultRow>,
}

impl BacktestResults {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<String> {
        let mut names = self.price_columns.clone();
        names.push(CUMULATIVE_PNL_COLUMN.to_string());
        names.push(DRAWDOWN_COLUMN.to_string());
        names
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        match name {
            CUMULATIVE_PNL_COLUMN => Some(self.cumulative_pnl()),
            DRAWDOWN_COLUMN => Some(self.drawdown()),
            _ => {
                let index = self.price_columns.iter().position(|c| c == name)?;
                Some(self.rows.iter().map(|row| row.prices[index]).collect())
            }
        }
    }

    pub fn cumulative_pnl(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.cumulative_pnl).collect()
    }

    pub fn drawdown(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.drawdown).collect()
    }
}
