//! External collaborators: the upstream price feed and the fan-out transport.

pub mod price_source;
pub mod publish;

pub use price_source::{BinancePriceSource, PriceSource};
pub use publish::{BroadcastPublisher, Publisher};
