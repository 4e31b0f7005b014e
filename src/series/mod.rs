//! Bounded rolling price history and derived returns.

use crate::models::PriceSample;
use std::collections::VecDeque;

/// Fixed-capacity FIFO buffer of price samples.
///
/// Eviction of the oldest sample on overflow is silent and lossy by design;
/// bounded memory is the goal, not full history. The buffer is owned by the
/// tick loop, which is its only writer - consumers get owned snapshots.
#[derive(Debug)]
pub struct RollingSeries {
    samples: VecDeque<PriceSample>,
    capacity: usize,
}

impl RollingSeries {
    /// Create a series holding at most `capacity` samples.
    ///
    /// # Panics
    /// Panics on zero capacity; config validation rejects that before any
    /// series is built, so hitting it here is a programmer error.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "RollingSeries capacity must be positive");
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one sample, evicting the oldest when at capacity.
    /// Always succeeds.
    pub fn append(&mut self, sample: PriceSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Owned, ordered copy of the current contents. Safe to evaluate against
    /// without racing future appends.
    pub fn snapshot(&self) -> Vec<PriceSample> {
        self.samples.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Simple returns over a snapshot: r_i = (p_i - p_{i-1}) / p_{i-1}.
///
/// Ephemeral - recomputed per evaluation, never stored. Empty or
/// single-sample input yields an empty vector.
pub fn simple_returns(samples: &[PriceSample]) -> Vec<f64> {
    samples
        .windows(2)
        .map(|w| (w[1].price - w[0].price) / w[0].price)
        .collect()
}
