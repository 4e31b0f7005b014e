//! Statistical outlier check over a window of returns.

/// Classifier for the most recent return in a window.
///
/// Implementations refit on every call rather than carrying model state.
/// That trades compute for statelessness, which is acceptable here: the
/// window is small and ticks are seconds apart. Swapping in an incremental
/// detector only requires a new impl of this trait.
pub trait AnomalyDetector: Send + Sync {
    /// True iff the last value of `returns` is an outlier relative to the
    /// values before it. Must return false when the window is too short to
    /// model a distribution.
    fn is_anomalous(&self, returns: &[f64]) -> bool;
}

/// Z-score detector with a contamination-derived threshold.
///
/// Fits mean/std on all values but the last, scores every value as
/// |x - mean| / std, and flags the last value iff its score exceeds the
/// empirical (1 - contamination) quantile of the training scores.
#[derive(Debug, Clone)]
pub struct ZScoreDetector {
    min_samples: usize,
    contamination: f64,
}

impl ZScoreDetector {
    pub fn new(min_samples: usize, contamination: f64) -> Self {
        Self {
            min_samples,
            contamination,
        }
    }
}

impl Default for ZScoreDetector {
    fn default() -> Self {
        Self::new(30, 0.02)
    }
}

impl AnomalyDetector for ZScoreDetector {
    fn is_anomalous(&self, returns: &[f64]) -> bool {
        if returns.len() < self.min_samples {
            return false;
        }

        let (train, last) = returns.split_at(returns.len() - 1);
        let last = last[0];

        let (mean, std) = mean_std(train);
        let std_safe = if std <= 0.0 { 1e-9 } else { std };

        let mut train_scores: Vec<f64> =
            train.iter().map(|r| (r - mean).abs() / std_safe).collect();
        train_scores.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        // Empirical (1 - contamination) quantile of the historical scores.
        let q = (1.0 - self.contamination).clamp(0.0, 1.0);
        let idx = ((train_scores.len() as f64 * q).ceil() as usize)
            .saturating_sub(1)
            .min(train_scores.len() - 1);
        let threshold = train_scores[idx];

        let last_score = (last - mean).abs() / std_safe;
        last_score > threshold
    }
}

fn mean_std(vals: &[f64]) -> (f64, f64) {
    if vals.is_empty() {
        return (0.0, 0.0);
    }
    let n = vals.len() as f64;
    let mean = vals.iter().sum::<f64>() / n;
    let sq_diff: f64 = vals.iter().map(|v| (v - mean).powi(2)).sum();
    (mean, (sq_diff / n).sqrt())
}
