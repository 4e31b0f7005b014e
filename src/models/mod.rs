//! Shared data models spanning the pipeline layers.

pub mod market;

pub use market::{
    Direction, EvaluationResult, PriceSample, SignalCall, TickPayload, WelcomeEvent,
};
