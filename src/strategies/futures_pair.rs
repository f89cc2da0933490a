use crate::config::PairStrategyConfig;
use crate::models::*;
use crate::signals::{Signal, StdDevPairSignal};
use crate::strategy_utils::{close_order, long_order, short_order};
use chrono::NaiveDate;

/// Goes long or short `asset_a` on a pair signal and flattens on neutral days.
pub struct FuturesStdPairStrategy {
    signal: StdDevPairSignal,
    long_size: f64,
    short_size: f64,
}

impl FuturesStdPairStrategy {
    pub fn new(config: &PairStrategyConfig) -> Self {
        Self {
            signal: StdDevPairSignal::new(
                &config.asset_a,
                &config.asset_b,
                config.n_days,
                config.std_rise,
                config.std_drop,
            ),
            long_size: config.long_size,
            short_size: config.short_size,
        }
    }

    pub fn signal(&self) -> &StdDevPairSignal {
        &self.signal
    }
}

impl super::Strategy for FuturesStdPairStrategy {
    fn name(&self) -> &str {
        "FuturesStdPairStrategy"
    }

    fn decide(&mut self, date: NaiveDate, row: &PriceRow) -> (String, OrderDirective) {
        let (asset, direction) = self.signal.evaluate(date, row);

        let order = match direction {
            SignalDirection::Up => long_order(self.long_size),
            SignalDirection::Down => short_order(self.short_size),
            SignalDirection::Neutral => close_order(),
        };

        (asset, order)
    }
}
