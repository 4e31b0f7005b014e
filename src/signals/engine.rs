//! Moving-average crossover engine with state-aware suppression.

use crate::models::{Direction, EvaluationResult, PriceSample, SignalCall};
use crate::series::simple_returns;
use crate::signals::anomaly::AnomalyDetector;

/// Evaluates each rolling-series snapshot into a directional call.
///
/// The engine carries exactly one piece of state between ticks: the last
/// emitted direction, used to suppress repeat calls while a trend persists.
/// Only transitions are newsworthy. The tick loop is the sole owner and
/// writer, so evaluations are strictly ordered and each one sees the state
/// left by the previous one.
pub struct SignalEngine {
    short_window: usize,
    long_window: usize,
    anomaly_window: usize,
    detector: Box<dyn AnomalyDetector>,
    last_signal: Option<Direction>,
}

impl SignalEngine {
    pub fn new(
        short_window: usize,
        long_window: usize,
        anomaly_window: usize,
        detector: Box<dyn AnomalyDetector>,
    ) -> Self {
        Self {
            short_window,
            long_window,
            anomaly_window,
            detector,
            last_signal: None,
        }
    }

    /// Samples required before the engine produces averages at all.
    pub fn min_samples(&self) -> usize {
        self.long_window + 1
    }

    /// Last emitted direction, if any. Updated only by [`evaluate`].
    ///
    /// [`evaluate`]: SignalEngine::evaluate
    pub fn last_signal(&self) -> Option<Direction> {
        self.last_signal
    }

    /// Pure evaluation of a snapshot against the current state.
    ///
    /// Does not mutate the engine; calling it twice on the same snapshot
    /// yields the same result. With fewer than `long_window + 1` samples the
    /// result is signal = none with no averages - thin history is a defined
    /// state, not an error.
    pub fn decide(&self, snapshot: &[PriceSample]) -> EvaluationResult {
        if snapshot.len() < self.min_samples() {
            return EvaluationResult::insufficient_history();
        }

        let ma_short = trailing_mean(snapshot, self.short_window);
        let ma_long = trailing_mean(snapshot, self.long_window);

        let returns = simple_returns(snapshot);
        let anomalous = if returns.len() >= self.anomaly_window {
            self.detector
                .is_anomalous(&returns[returns.len() - self.anomaly_window..])
        } else {
            // Too few returns to model a distribution; never blocks a signal.
            false
        };

        // Crossover with suppression: a repeat of the last emitted direction
        // is withheld, and exact equality of the averages emits nothing.
        let candidate = if ma_short > ma_long && self.last_signal != Some(Direction::Buy) {
            Some(Direction::Buy)
        } else if ma_short < ma_long && self.last_signal != Some(Direction::Sell) {
            Some(Direction::Sell)
        } else {
            None
        };

        EvaluationResult {
            signal: candidate.map(|direction| SignalCall::new(direction, anomalous)),
            ma_short: Some(ma_short),
            ma_long: Some(ma_long),
            anomalous,
        }
    }

    /// Evaluate a snapshot and commit the emitted direction.
    ///
    /// The risky qualifier is stripped before the state update: a
    /// `BUY-RISKY` still arms suppression of the next plain `BUY`.
    pub fn evaluate(&mut self, snapshot: &[PriceSample]) -> EvaluationResult {
        let result = self.decide(snapshot);
        if let Some(signal) = result.signal {
            self.last_signal = Some(signal.direction);
        }
        result
    }
}

/// Simple moving average over the trailing `window` samples.
fn trailing_mean(samples: &[PriceSample], window: usize) -> f64 {
    let tail = &samples[samples.len() - window..];
    tail.iter().map(|s| s.price).sum::<f64>() / window as f64
}
