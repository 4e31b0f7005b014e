use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single observation from the price feed.
///
/// Immutable once created; `price` is expected to be positive and finite
/// (the price source filters anything else out before a sample is built).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl PriceSample {
    pub fn new(price: f64, timestamp: DateTime<Utc>) -> Self {
        Self { price, timestamp }
    }

    /// Timestamp as fractional epoch seconds, matching the wire contract.
    pub fn epoch_seconds(&self) -> f64 {
        self.timestamp.timestamp_millis() as f64 / 1000.0
    }
}

/// Directional call produced by a moving-average crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }
}

/// A directional signal, optionally qualified as risky when the latest
/// return is anomalous relative to recent history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCall {
    pub direction: Direction,
    pub risky: bool,
}

impl SignalCall {
    pub fn new(direction: Direction, risky: bool) -> Self {
        Self { direction, risky }
    }

    /// Stable wire label: `BUY`, `SELL`, `BUY-RISKY`, `SELL-RISKY`.
    pub fn label(&self) -> String {
        if self.risky {
            format!("{}-RISKY", self.direction.as_str())
        } else {
            self.direction.as_str().to_string()
        }
    }
}

/// Outcome of one engine evaluation. Produced fresh each tick, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub signal: Option<SignalCall>,
    pub ma_short: Option<f64>,
    pub ma_long: Option<f64>,
    pub anomalous: bool,
}

impl EvaluationResult {
    /// Result for a snapshot with insufficient history. Not an error.
    pub fn insufficient_history() -> Self {
        Self {
            signal: None,
            ma_short: None,
            ma_long: None,
            anomalous: false,
        }
    }
}

/// Wire payload pushed to every subscriber each successful tick.
///
/// Field names are a stable contract; do not rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickPayload {
    pub price: f64,
    /// Epoch seconds, fractional.
    pub timestamp: f64,
    pub signal: Option<String>,
    pub ma_short: Option<f64>,
    pub ma_long: Option<f64>,
    pub anomalous: Option<bool>,
}

impl TickPayload {
    pub fn from_evaluation(sample: &PriceSample, result: &EvaluationResult) -> Self {
        // Warm-up ticks have no averages and no anomaly verdict either; the
        // wire carries null there, not false.
        let evaluated = result.ma_long.is_some();
        Self {
            price: sample.price,
            timestamp: sample.epoch_seconds(),
            signal: result.signal.map(|s| s.label()),
            ma_short: result.ma_short,
            ma_long: result.ma_long,
            anomalous: evaluated.then_some(result.anomalous),
        }
    }
}

/// One-time handshake sent to a subscriber on connect. No backlog follows;
/// the subscriber only sees ticks published after it joined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeEvent {
    pub message: String,
    pub symbol: String,
}

impl WelcomeEvent {
    pub fn new(symbol: &str) -> Self {
        Self {
            message: "connected to marketpulse stream".to_string(),
            symbol: symbol.to_string(),
        }
    }
}
