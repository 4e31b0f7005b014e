//! Signal evaluation interfaces.

pub mod anomaly;
pub mod engine;

pub use anomaly::{AnomalyDetector, ZScoreDetector};
pub use engine::SignalEngine;
