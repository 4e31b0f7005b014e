//! Upstream price feed interface and the Binance REST implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

/// Source of price samples for one symbol.
///
/// Any transport, status, or parse failure surfaces as `None`, never as an
/// error - a missed sample just skips the tick.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Option<f64>;
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: String,
}

/// Binance spot ticker source with a bounded request timeout.
pub struct BinancePriceSource {
    client: reqwest::Client,
    base_url: String,
}

impl BinancePriceSource {
    /// `base_url` is injectable so tests can point at a local mock server.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PriceSource for BinancePriceSource {
    async fn fetch(&self, symbol: &str) -> Option<f64> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);

        let response = match self
            .client
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "price fetch failed");
                return None;
            }
        };

        let response = match response.error_for_status() {
            Ok(r) => r,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "price feed returned error status");
                return None;
            }
        };

        let ticker: TickerPrice = match response.json().await {
            Ok(t) => t,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "price feed returned unparseable body");
                return None;
            }
        };

        match ticker.price.parse::<f64>() {
            Ok(price) if price.is_finite() && price > 0.0 => Some(price),
            Ok(price) => {
                warn!(symbol = %symbol, price = price, "price feed returned non-positive price");
                None
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "price field is not numeric");
                None
            }
        }
    }
}
