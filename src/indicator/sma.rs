use std::collections::VecDeque;

/// Trailing arithmetic mean over a fixed window, O(1) per push.
/// Yields a value only once the window is full.
#[derive(Debug, Clone)]
pub struct TrailingMean {
    window: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl TrailingMean {
    pub fn new(window: usize) -> Self {
        assert!(window > 0, "window must be > 0");
        Self {
            window,
            values: VecDeque::with_capacity(window + 1),
            sum: 0.0,
        }
    }

    /// Push a value and return the mean of the trailing window, if full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        self.values.push_back(value);
        self.sum += value;
        if self.values.len() > self.window {
            if let Some(evicted) = self.values.pop_front() {
                self.sum -= evicted;
            }
        }
        self.value()
    }

    pub fn value(&self) -> Option<f64> {
        if self.values.len() == self.window {
            Some(self.sum / self.window as f64)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.values.clear();
        self.sum = 0.0;
    }
}
