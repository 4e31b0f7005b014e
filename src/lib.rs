//! Marketpulse - streaming market-signal pipeline
//!
//! Polls an upstream price feed on a fixed cadence, keeps a bounded rolling
//! price history, derives moving-average crossover and anomaly signals, and
//! broadcasts each tick's result to connected WebSocket subscribers.

pub mod config;
pub mod core;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod secrets;
pub mod series;
pub mod services;
pub mod signals;
