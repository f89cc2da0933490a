use chrono::NaiveDate;
use std::collections::VecDeque;

/// Rolling price statistics for a single asset.
///
/// Statistics are only produced once more than `n` prices have been seen; the
/// oldest price is evicted first so they always describe the `n` most recent
/// observations. Any missing (NaN) price in the window makes both the mean and
/// the variance NaN.
#[derive(Debug, Clone)]
pub struct RollingTracker {
    n: usize,
    window: VecDeque<f64>,
    mean: f64,
    variance: f64,
    day_return: f64,
    previous_price: f64,
    previous_date: Option<NaiveDate>,
    ready: bool,
}

impl RollingTracker {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            window: VecDeque::new(),
            mean: f64::NAN,
            variance: f64::NAN,
            day_return: 0.0,
            previous_price: 0.0,
            previous_date: None,
            ready: false,
        }
    }

    pub fn update(&mut self, date: NaiveDate, price: f64) {
        self.window.push_back(price);
        if self.window.len() <= self.n {
            return;
        }
        self.window.pop_front();

        if self.window.iter().any(|value| value.is_nan()) {
            self.mean = f64::NAN;
            self.variance = f64::NAN;
        } else {
            let len = self.window.len() as f64;
            let mean = self.window.iter().sum::<f64>() / len;
            let squared_errors: f64 = self
                .window
                .iter()
                .map(|value| (value - mean).powi(2))
                .sum();
            self.mean = mean;
            self.variance = squared_errors / len;
        }

        self.day_return = if self.previous_price == 0.0 {
            0.0
        } else if !price.is_nan() && !self.previous_price.is_nan() {
            price / self.previous_price - 1.0
        } else {
            f64::NAN
        };
        self.previous_price = price;
        self.previous_date = Some(date);
        self.ready = true;
    }

    pub fn window_size(&self) -> usize {
        self.n
    }

    pub fn window(&self) -> &VecDeque<f64> {
        &self.window
    }

    /// True once the statistics path has run at least once.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// True when statistics exist but were poisoned by a missing price.
    pub fn has_undefined_dispersion(&self) -> bool {
        self.ready && self.variance.is_nan()
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance of the window.
    pub fn variance(&self) -> f64 {
        self.variance
    }

    pub fn day_return(&self) -> f64 {
        self.day_return
    }

    pub fn previous_price(&self) -> f64 {
        self.previous_price
    }

    pub fn previous_date(&self) -> Option<NaiveDate> {
        self.previous_date
    }
}
