use crate::config::{EngineConfig, PairStrategyConfig};
use crate::error::Result;
use crate::models::{BacktestResults, LedgerSnapshot, OrderDirective, PriceTable, ResultRow};
use crate::strategy::{create_strategy, Strategy, StrategyKind};
use log::{debug, info, warn};

/// Cash and position state of a single-instrument account.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub cash: f64,
    pub position_size: f64,
    pub position_value: f64,
    /// Running peak used for drawdown; seeded with the initial cash and
    /// compared against cumulative profit afterwards.
    pub max_value_seen: f64,
    previous_price: f64,
}

impl Ledger {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            position_size: 0.0,
            position_value: 0.0,
            max_value_seen: initial_cash,
            previous_price: f64::NAN,
        }
    }

    pub fn total_value(&self) -> f64 {
        self.position_value + self.cash
    }

    /// Last observed price of the traded asset (NaN before the first one).
    pub fn previous_price(&self) -> f64 {
        self.previous_price
    }

    fn day_return(&self, price: f64) -> f64 {
        if self.previous_price == 0.0 || price.is_nan() || self.previous_price.is_nan() {
            0.0
        } else {
            price / self.previous_price - 1.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settlement {
    Traded,
    MissedDueToCash,
    Idle,
}

/// One forward pass of a strategy over a price table.
///
/// The whole simulation runs inside the constructor; afterwards the ledger and
/// series are read-only.
#[derive(Debug, Clone)]
pub struct Backtest {
    strategy_name: String,
    config: EngineConfig,
    ledger: Ledger,
    pnl: Vec<f64>,
    drawdown: Vec<f64>,
    daily_snapshots: Vec<LedgerSnapshot>,
    results: BacktestResults,
    trades_executed: usize,
    missed_trades_due_to_cash: usize,
}

impl Backtest {
    pub fn new(table: &PriceTable, strategy: &mut dyn Strategy, config: EngineConfig) -> Self {
        let mut backtest = Self {
            strategy_name: strategy.name().to_string(),
            config,
            ledger: Ledger::new(config.initial_cash),
            pnl: Vec::with_capacity(table.len()),
            drawdown: Vec::with_capacity(table.len()),
            daily_snapshots: Vec::with_capacity(table.len()),
            results: BacktestResults {
                price_columns: table.columns().to_vec(),
                rows: Vec::with_capacity(table.len()),
            },
            trades_executed: 0,
            missed_trades_due_to_cash: 0,
        };
        backtest.run(table, strategy);
        backtest
    }

    /// Resolves `strategy_name` and runs it; unknown names are a configuration error.
    pub fn from_strategy_name(
        table: &PriceTable,
        strategy_name: &str,
        strategy_config: &PairStrategyConfig,
        config: EngineConfig,
    ) -> Result<Self> {
        let kind = StrategyKind::parse(strategy_name)?;
        config.validate()?;
        let mut strategy = create_strategy(kind, strategy_config)?;
        Ok(Self::new(table, strategy.as_mut(), config))
    }

    fn run(&mut self, table: &PriceTable, strategy: &mut dyn Strategy) {
        if table.is_empty() {
            warn!("No price rows to simulate for {}", self.strategy_name);
            return;
        }

        let mut warned_missing_columns: Vec<String> = Vec::new();

        for row in table.rows() {
            let (asset, order) = strategy.decide(row.date, row);
            let price = row.price(&asset);

            if !table.has_column(&asset) && !warned_missing_columns.contains(&asset) {
                warn!(
                    "{} traded {} which is not a column of the price table; every day will be treated as missing",
                    self.strategy_name, asset
                );
                warned_missing_columns.push(asset.clone());
            }

            let snapshot = if price.is_nan() {
                self.record_missing_day(row.date, asset, order)
            } else {
                self.settle_day(row.date, asset, order, price)
            };

            self.results.rows.push(ResultRow {
                date: row.date,
                prices: table.columns().iter().map(|c| row.price(c)).collect(),
                cumulative_pnl: snapshot.total_value,
                drawdown: snapshot.drawdown,
            });
            self.daily_snapshots.push(snapshot);
        }

        info!(
            "{} finished over {} days: final value {:.2} ({} trades, {} missed due to cash)",
            self.strategy_name,
            self.pnl.len(),
            self.ledger.total_value(),
            self.trades_executed,
            self.missed_trades_due_to_cash
        );
    }

    fn record_missing_day(
        &mut self,
        date: chrono::NaiveDate,
        asset: String,
        order: OrderDirective,
    ) -> LedgerSnapshot {
        let total_value = self.ledger.total_value();
        self.pnl.push(total_value);
        self.drawdown.push(0.0);
        debug!("{}: no price for {}, carrying value {:.2}", date, asset, total_value);

        LedgerSnapshot {
            date,
            asset,
            order,
            price: f64::NAN,
            cash: self.ledger.cash,
            position_size: self.ledger.position_size,
            position_value: self.ledger.position_value,
            total_value,
            drawdown: 0.0,
            traded: false,
            missed_trade_due_to_cash: false,
            price_missing: true,
        }
    }

    fn settle_day(
        &mut self,
        date: chrono::NaiveDate,
        asset: String,
        order: OrderDirective,
        price: f64,
    ) -> LedgerSnapshot {
        let day_return = self.ledger.day_return(price);
        self.ledger.previous_price = price;

        // Mark-to-market scales by position size on top of the position value.
        let ledger = &mut self.ledger;
        ledger.position_value += ledger.position_value * day_return * ledger.position_size;

        let settlement = self.apply_order(&order, price);
        match settlement {
            Settlement::Traded => self.trades_executed += 1,
            Settlement::MissedDueToCash => {
                self.missed_trades_due_to_cash += 1;
                debug!(
                    "{}: skipped {} on {} at {:.4}, cash {:.2} is insufficient",
                    date,
                    order.label(),
                    asset,
                    price,
                    self.ledger.cash
                );
            }
            Settlement::Idle => {}
        }

        let total_value = self.ledger.total_value();
        self.pnl.push(total_value);

        let profit = total_value - self.config.initial_cash;
        self.ledger.max_value_seen = self.ledger.max_value_seen.max(profit);
        let drawdown = (self.ledger.max_value_seen - total_value) / self.ledger.max_value_seen;
        self.drawdown.push(drawdown);

        LedgerSnapshot {
            date,
            asset,
            order,
            price,
            cash: self.ledger.cash,
            position_size: self.ledger.position_size,
            position_value: self.ledger.position_value,
            total_value,
            drawdown,
            traded: settlement == Settlement::Traded,
            missed_trade_due_to_cash: settlement == Settlement::MissedDueToCash,
            price_missing: false,
        }
    }

    fn apply_order(&mut self, order: &OrderDirective, price: f64) -> Settlement {
        let cost = self.config.transaction_cost;
        let ledger = &mut self.ledger;

        match order {
            OrderDirective::Close => {
                // position_size is left as is; only the value is realised
                ledger.cash += ledger.position_value - cost;
                ledger.position_value = 0.0;
                Settlement::Traded
            }
            OrderDirective::Open { .. } => {
                let size = order.signed_size().unwrap_or(0.0);
                let notional = size.abs() * price;
                if ledger.cash >= notional + cost {
                    ledger.cash -= notional - cost;
                    ledger.position_size += size;
                    ledger.position_value += size * price;
                    Settlement::Traded
                } else {
                    Settlement::MissedDueToCash
                }
            }
            OrderDirective::NoOp => Settlement::Idle,
        }
    }

    pub fn strategy_name(&self) -> &str {
        &self.strategy_name
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn cash(&self) -> f64 {
        self.ledger.cash
    }

    pub fn position_size(&self) -> f64 {
        self.ledger.position_size
    }

    pub fn position_value(&self) -> f64 {
        self.ledger.position_value
    }

    pub fn final_value(&self) -> f64 {
        self.ledger.total_value()
    }

    pub fn pnl(&self) -> &[f64] {
        &self.pnl
    }

    pub fn drawdown(&self) -> &[f64] {
        &self.drawdown
    }

    pub fn daily_snapshots(&self) -> &[LedgerSnapshot] {
        &self.daily_snapshots
    }

    pub fn results(&self) -> &BacktestResults {
        &self.results
    }

    pub fn trades_executed(&self) -> usize {
        self.trades_executed
    }

    pub fn missed_trades_due_to_cash(&self) -> usize {
        self.missed_trades_due_to_cash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BacktestError;
    use crate::models::{PriceRow, CUMULATIVE_PNL_COLUMN, DRAWDOWN_COLUMN};
    use crate::strategy_utils::{close_order, long_order, short_order};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn create_date(offset: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 7, 1 + offset).unwrap()
    }

    fn table(prices: &[f64]) -> PriceTable {
        let dates: Vec<NaiveDate> = (0..prices.len() as u32).map(create_date).collect();
        let values: Vec<Vec<f64>> = prices.iter().map(|&p| vec![p]).collect();
        PriceTable::from_columns(&["X"], &dates, &values).unwrap()
    }

    /// Replays a fixed order per date.
    struct MockStrategy {
        orders: HashMap<NaiveDate, OrderDirective>,
    }

    impl MockStrategy {
        fn new(orders: &[(u32, OrderDirective)]) -> Self {
            Self {
                orders: orders
                    .iter()
                    .map(|(offset, order)| (create_date(*offset), *order))
                    .collect(),
            }
        }
    }

    impl Strategy for MockStrategy {
        fn name(&self) -> &str {
            "mock_strategy"
        }

        fn decide(&mut self, date: NaiveDate, _row: &PriceRow) -> (String, OrderDirective) {
            let order = self.orders.get(&date).copied().unwrap_or(OrderDirective::NoOp);
            ("X".to_string(), order)
        }
    }

    fn engine_config(initial_cash: f64, transaction_cost: f64) -> EngineConfig {
        EngineConfig {
            initial_cash,
            transaction_cost,
        }
    }

    #[test]
    fn open_long_debits_notional_minus_cost() {
        let mut strategy = MockStrategy::new(&[(0, long_order(10.0))]);
        let backtest = Backtest::new(&table(&[50.0]), &mut strategy, engine_config(1_000.0, 0.1));

        // cost reduces the debit: 1000 - (10 * 50 - 0.1)
        assert!((backtest.cash() - 500.1).abs() < 1e-9);
        assert_eq!(backtest.position_size(), 10.0);
        assert!((backtest.position_value() - 500.0).abs() < 1e-9);
        assert_eq!(backtest.trades_executed(), 1);
    }

    #[test]
    fn open_short_uses_absolute_notional_for_cash() {
        let mut strategy = MockStrategy::new(&[(0, short_order(4.0))]);
        let backtest = Backtest::new(&table(&[25.0]), &mut strategy, engine_config(1_000.0, 1.0));

        assert!((backtest.cash() - 901.0).abs() < 1e-9);
        assert_eq!(backtest.position_size(), -4.0);
        assert!((backtest.position_value() + 100.0).abs() < 1e-9);
    }

    #[test]
    fn close_realises_value_minus_cost_and_keeps_size() {
        let mut strategy = MockStrategy::new(&[(0, long_order(2.0)), (1, close_order())]);
        let backtest = Backtest::new(
            &table(&[100.0, 100.0]),
            &mut strategy,
            engine_config(1_000.0, 0.5),
        );

        let opened = &backtest.daily_snapshots()[0];
        let closed = &backtest.daily_snapshots()[1];
        assert!((closed.cash - (opened.cash + opened.position_value - 0.5)).abs() < 1e-9);
        assert_eq!(closed.position_value, 0.0);
        assert_eq!(closed.position_size, 2.0);
    }

    #[test]
    fn mark_to_market_scales_by_position_size() {
        let mut strategy = MockStrategy::new(&[(0, long_order(2.0))]);
        let backtest = Backtest::new(
            &table(&[100.0, 110.0]),
            &mut strategy,
            engine_config(1_000.0, 0.0),
        );

        // 200 + 200 * 0.1 * 2
        assert!((backtest.position_value() - 240.0).abs() < 1e-9);
        assert!((backtest.cash() - 800.0).abs() < 1e-9);
        assert!((backtest.final_value() - 1_040.0).abs() < 1e-9);
    }

    #[test]
    fn insufficient_cash_skips_trade() {
        let mut strategy = MockStrategy::new(&[(0, long_order(10.0))]);
        let backtest = Backtest::new(&table(&[100.0]), &mut strategy, engine_config(1_000.0, 0.1));

        assert_eq!(backtest.cash(), 1_000.0);
        assert_eq!(backtest.position_size(), 0.0);
        assert_eq!(backtest.trades_executed(), 0);
        assert_eq!(backtest.missed_trades_due_to_cash(), 1);
        assert!(backtest.daily_snapshots()[0].missed_trade_due_to_cash);
    }

    #[test]
    fn missing_price_carries_value_with_zero_drawdown() {
        let mut strategy = MockStrategy::new(&[(0, long_order(1.0)), (1, close_order())]);
        let backtest = Backtest::new(
            &table(&[10.0, f64::NAN, 20.0]),
            &mut strategy,
            engine_config(100.0, 0.0),
        );

        assert_eq!(backtest.pnl().len(), 3);
        assert_eq!(backtest.pnl()[1], backtest.pnl()[0]);
        assert_eq!(backtest.drawdown()[1], 0.0);
        assert!(backtest.daily_snapshots()[1].price_missing);
        // the skipped close never happened
        assert!((backtest.position_value() - 20.0).abs() < 1e-9);
        // return on day 3 is measured against day 1, the last observed price
        assert_eq!(backtest.ledger().previous_price(), 20.0);
    }

    #[test]
    fn pnl_matches_cash_plus_position_every_day() {
        let mut strategy = MockStrategy::new(&[
            (0, long_order(3.0)),
            (2, short_order(5.0)),
            (3, close_order()),
            (4, long_order(1.0)),
        ]);
        let backtest = Backtest::new(
            &table(&[10.0, 12.0, 9.0, 11.0, 10.0, 13.0]),
            &mut strategy,
            engine_config(500.0, 0.25),
        );

        for (snapshot, &pnl) in backtest.daily_snapshots().iter().zip(backtest.pnl()) {
            assert_eq!(snapshot.cash + snapshot.position_value, pnl);
            assert_eq!(snapshot.total_value, pnl);
        }
        assert_eq!(backtest.final_value(), *backtest.pnl().last().unwrap());
    }

    #[test]
    fn drawdown_is_relative_to_initial_cash_peak() {
        let mut strategy = MockStrategy::new(&[(0, close_order()), (1, close_order())]);
        let backtest = Backtest::new(
            &table(&[10.0, 10.0]),
            &mut strategy,
            engine_config(1_000.0, 10.0),
        );

        assert!((backtest.drawdown()[0] - 0.01).abs() < 1e-12);
        assert!((backtest.drawdown()[1] - 0.02).abs() < 1e-12);
        assert!(backtest
            .drawdown()
            .iter()
            .all(|d| (0.0..=1.0).contains(d)));
    }

    #[test]
    fn results_table_appends_pnl_and_drawdown_columns() {
        let mut strategy = MockStrategy::new(&[]);
        let backtest = Backtest::new(&table(&[1.0, 2.0]), &mut strategy, EngineConfig::default());
        let results = backtest.results();

        assert_eq!(
            results.column_names(),
            vec!["X".to_string(), CUMULATIVE_PNL_COLUMN.to_string(), DRAWDOWN_COLUMN.to_string()]
        );
        assert_eq!(results.column("X").unwrap(), vec![1.0, 2.0]);
        assert_eq!(results.cumulative_pnl(), backtest.pnl().to_vec());
        assert_eq!(results.drawdown(), backtest.drawdown().to_vec());
    }

    #[test]
    fn empty_table_produces_empty_series() {
        let mut strategy = MockStrategy::new(&[]);
        let backtest = Backtest::new(&PriceTable::default(), &mut strategy, EngineConfig::default());
        assert!(backtest.pnl().is_empty());
        assert!(backtest.results().is_empty());
        assert_eq!(backtest.final_value(), EngineConfig::default().initial_cash);
    }

    #[test]
    fn unknown_strategy_name_fails_at_construction() {
        let err = Backtest::from_strategy_name(
            &table(&[1.0]),
            "buy_the_dip",
            &PairStrategyConfig::default(),
            EngineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BacktestError::Configuration(_)));
    }
}
