use crate::models::{PriceRow, SignalDirection};
use crate::tracker::RollingTracker;
use chrono::NaiveDate;
use log::trace;

/// Produces a directional signal for one asset from a day's prices.
pub trait Signal {
    fn evaluate(&mut self, date: NaiveDate, row: &PriceRow) -> (String, SignalDirection);
}

/// Trades `asset_a` off the day-over-day moves of `asset_b`.
///
/// A move of `asset_b` larger than its rolling variance scaled by `std_rise`
/// signals up, a fall below the negated variance scaled by `std_drop` signals
/// down. The comparison deliberately uses the variance itself, not its square
/// root.
pub struct StdDevPairSignal {
    asset_a: String,
    asset_b: String,
    std_rise: f64,
    std_drop: f64,
    tracker: RollingTracker,
}

impl StdDevPairSignal {
    pub fn new(asset_a: &str, asset_b: &str, n_days: usize, std_rise: f64, std_drop: f64) -> Self {
        Self {
            asset_a: asset_a.to_string(),
            asset_b: asset_b.to_string(),
            std_rise,
            std_drop,
            tracker: RollingTracker::new(n_days),
        }
    }

    pub fn tracker(&self) -> &RollingTracker {
        &self.tracker
    }

    pub fn traded_asset(&self) -> &str {
        &self.asset_a
    }

    pub fn tracked_asset(&self) -> &str {
        &self.asset_b
    }
}

impl Signal for StdDevPairSignal {
    fn evaluate(&mut self, date: NaiveDate, row: &PriceRow) -> (String, SignalDirection) {
        let current_price = row.price(&self.asset_b);

        // Missing prices never reach the tracker, so the dispersion check only
        // fires for a tracker that was fed a NaN from outside this signal.
        if current_price.is_nan()
            || !row.has_price(&self.asset_a)
            || self.tracker.has_undefined_dispersion()
        {
            return (self.asset_a.clone(), SignalDirection::Neutral);
        }

        self.tracker.update(date, current_price);
        let variance = self.tracker.variance();
        let day_return = self.tracker.day_return();

        let mut direction = SignalDirection::Neutral;
        if variance * self.std_rise < day_return {
            direction = SignalDirection::Up;
        }
        if day_return < -variance * self.std_drop {
            direction = SignalDirection::Down;
        }

        trace!(
            "{} {}: variance={:.6} day_return={:.6} -> {}",
            date,
            self.asset_b,
            variance,
            day_return,
            direction.value()
        );

        (self.asset_a.clone(), direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(offset: u32, a: f64, b: f64) -> (NaiveDate, PriceRow) {
        let date = NaiveDate::from_ymd_opt(2020, 6, 1 + offset).unwrap();
        (date, PriceRow::new(date).with_price("A", a).with_price("B", b))
    }

    fn run(signal: &mut StdDevPairSignal, prices: &[(f64, f64)]) -> Vec<SignalDirection> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &(a, b))| {
                let (date, row) = row(i as u32, a, b);
                let (asset, direction) = signal.evaluate(date, &row);
                assert_eq!(asset, "A");
                direction
            })
            .collect()
    }

    #[test]
    fn neutral_while_window_fills() {
        let mut signal = StdDevPairSignal::new("A", "B", 3, 0.5, 0.5);
        let directions = run(&mut signal, &[(10.0, 10.0), (10.0, 20.0), (10.0, 5.0)]);
        assert!(directions.iter().all(|d| *d == SignalDirection::Neutral));
        assert_eq!(signal.tracker().window().len(), 3);
        assert!(signal.tracker().variance().is_nan());
    }

    #[test]
    fn rise_and_drop_compare_against_variance() {
        let mut signal = StdDevPairSignal::new("A", "B", 2, 0.5, 0.5);
        let directions = run(
            &mut signal,
            &[
                (10.0, 10.0),
                (10.0, 10.0),
                (10.0, 10.0),
                (10.0, 10.5),
                (10.0, 10.5),
                (10.0, 10.0),
            ],
        );
        // variance 0.0625 * 0.5 < +5% return, then -4.76% < -0.03125
        assert_eq!(
            directions,
            vec![
                SignalDirection::Neutral,
                SignalDirection::Neutral,
                SignalDirection::Neutral,
                SignalDirection::Up,
                SignalDirection::Neutral,
                SignalDirection::Down,
            ]
        );
    }

    #[test]
    fn large_variance_suppresses_signals() {
        let mut signal = StdDevPairSignal::new("A", "B", 2, 0.5, 0.5);
        let directions = run(
            &mut signal,
            &[(10.0, 10.0), (11.0, 9.0), (9.0, 12.0), (10.0, 10.0)],
        );
        assert!(directions.iter().all(|d| *d == SignalDirection::Neutral));
    }

    #[test]
    fn missing_price_is_neutral_and_skips_tracker() {
        let mut signal = StdDevPairSignal::new("A", "B", 2, 0.5, 0.5);
        run(&mut signal, &[(10.0, 10.0), (10.0, 10.0)]);
        let window_before = signal.tracker().window().clone();

        let directions = run(&mut signal, &[(f64::NAN, 12.0), (10.0, f64::NAN)]);
        assert!(directions.iter().all(|d| *d == SignalDirection::Neutral));
        assert_eq!(signal.tracker().window(), &window_before);
    }

    #[test]
    fn gaps_never_leave_dispersion_undefined() {
        let mut signal = StdDevPairSignal::new("A", "B", 2, 0.5, 0.5);
        run(
            &mut signal,
            &[
                (10.0, 10.0),
                (10.0, f64::NAN),
                (10.0, 10.0),
                (f64::NAN, 10.5),
                (10.0, 10.0),
            ],
        );
        assert!(signal.tracker().is_ready());
        assert!(!signal.tracker().has_undefined_dispersion());
        assert!(signal.tracker().window().iter().all(|p| !p.is_nan()));
    }

    #[test]
    fn drop_wins_when_both_thresholds_trigger() {
        // negative thresholds make both comparisons true once variance > 0
        let mut signal = StdDevPairSignal::new("A", "B", 2, -1.0, -1.0);
        let directions = run(&mut signal, &[(10.0, 10.0), (10.0, 10.0), (10.0, 12.0)]);
        assert_eq!(directions[2], SignalDirection::Down);
    }
}
