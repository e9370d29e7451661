//! Trailing Moving Average

use crate::series::ObservationPoint;
use std::collections::VecDeque;

/// Default trailing window (days)
pub const DEFAULT_WINDOW: usize = 7;

/// Sliding window mean over the last `size` values.
///
/// Until the window fills, the mean covers only the values seen so far.
pub struct TrailingMean {
    window: VecDeque<f64>,
    size: usize,
}

impl TrailingMean {
    /// Create a new trailing mean with the given window size (0 is treated as 1)
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            window: VecDeque::with_capacity(size),
            size,
        }
    }

    /// Push a value and return the mean of the current window
    pub fn push(&mut self, value: f64) -> f64 {
        if self.window.len() == self.size {
            self.window.pop_front();
        }
        self.window.push_back(value);

        // Sum the window each time so results never accumulate drift
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    /// Number of values currently in the window
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

/// Trailing moving average aligned 1:1 with `series`.
///
/// Output `i` is the mean of `series[max(0, i - window + 1)..=i]`.
pub fn moving_average(series: &[ObservationPoint], window: usize) -> Vec<ObservationPoint> {
    let mut mean = TrailingMean::new(window);
    series
        .iter()
        .map(|p| ObservationPoint {
            timestamp: p.timestamp,
            value: mean.push(p.value),
        })
        .collect()
}
