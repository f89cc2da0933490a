use crate::error::{BacktestError, Result};
use crate::models::{PriceRow, PriceTable};
use chrono::NaiveDate;
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const DATE_COLUMN: &str = "Date";
pub const DATE_FORMAT: &str = "%d/%m/%Y";
/// Header names accepted as the price column, in order of preference.
pub const PRICE_COLUMNS: [&str; 3] = ["Close", "Last", "Price"];

/// Column name a dataset key is stored under in the merged table.
pub fn price_column_key(key: &str) -> String {
    format!("{} Price", key)
}

/// One asset's price history keyed by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    pub key: String,
    pub prices: BTreeMap<NaiveDate, f64>,
}

impl PriceSeries {
    /// Reads a `Date` + `Close`/`Last`/`Price` CSV. Empty or unparseable prices
    /// become NaN; unparseable dates are an error.
    pub fn from_reader<R: Read>(key: &str, reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let date_index = headers
            .iter()
            .position(|h| h == DATE_COLUMN)
            .ok_or_else(|| {
                BacktestError::data(format!("{}: missing {} column", key, DATE_COLUMN))
            })?;
        let price_index = PRICE_COLUMNS
            .iter()
            .find_map(|name| headers.iter().position(|h| h == *name))
            .ok_or_else(|| {
                BacktestError::data(format!(
                    "{}: missing price column (expected one of {:?})",
                    key, PRICE_COLUMNS
                ))
            })?;

        let mut prices = BTreeMap::new();
        for (line, record) in csv_reader.records().enumerate() {
            let record = record?;
            let raw_date = record.get(date_index).unwrap_or_default();
            let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|_| {
                BacktestError::data(format!(
                    "{}: row {} has date {:?}, expected DD/MM/YYYY",
                    key,
                    line + 1,
                    raw_date
                ))
            })?;
            let price = record
                .get(price_index)
                .and_then(|raw| raw.parse::<f64>().ok())
                .unwrap_or(f64::NAN);

            if prices.insert(date, price).is_some() {
                warn!("{}: duplicate row for {}, keeping the later one", key, date);
            }
        }

        Ok(Self {
            key: key.to_string(),
            prices,
        })
    }

    pub fn from_path(key: &str, path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            BacktestError::data(format!("{}: cannot open {}: {}", key, path.display(), e))
        })?;
        let series = Self::from_reader(key, file)?;
        info!(
            "Loaded {} prices for {} from {}",
            series.prices.len(),
            key,
            path.display()
        );
        Ok(series)
    }

    pub fn column_name(&self) -> String {
        price_column_key(&self.key)
    }
}

/// Outer-joins the series on date; a series without a row for a date
/// contributes NaN.
pub fn merge_price_series(series: &[PriceSeries]) -> Result<PriceTable> {
    if series.is_empty() {
        return Err(BacktestError::data("No price series to merge"));
    }

    let columns: Vec<String> = series.iter().map(PriceSeries::column_name).collect();
    let dates: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|s| s.prices.keys().copied())
        .collect();

    let rows = dates
        .into_iter()
        .map(|date| {
            let mut row = PriceRow::new(date);
            for (column, s) in columns.iter().zip(series) {
                row.set_price(column, s.prices.get(&date).copied().unwrap_or(f64::NAN));
            }
            row
        })
        .collect();

    PriceTable::new(columns, rows)
}

pub fn load_csv_dataset(sources: &[(&str, &Path)]) -> Result<PriceTable> {
    let series = sources
        .iter()
        .map(|(key, path)| PriceSeries::from_path(key, path))
        .collect::<Result<Vec<_>>>()?;
    let table = merge_price_series(&series)?;
    info!(
        "Merged {} series into {} trading days",
        table.columns().len(),
        table.len()
    );
    Ok(table)
}

/// Two-asset dataset with columns `A Price` and `B Price`.
pub fn load_futures_pair(path_a: &Path, path_b: &Path) -> Result<PriceTable> {
    load_csv_dataset(&[("A", path_a), ("B", path_b)])
}
