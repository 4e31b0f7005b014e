//! Core application primitives (tick loop, HTTP surface)

pub mod http;
pub mod scheduler;

pub use http::*;
pub use scheduler::*;
