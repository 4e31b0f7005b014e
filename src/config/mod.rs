//! Runtime configuration loaded from the environment.
//!
//! Values come from the process environment (optionally seeded from a
//! decrypted secrets file, see [`crate::secrets`]); anything unset falls back
//! to the documented defaults. Validation failures are fatal at startup -
//! invalid windows are never silently clamped.

use std::env;

pub type ConfigError = Box<dyn std::error::Error + Send + Sync>;

/// Environment name used to pick log formatting (`production` vs sandbox).
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string())
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream ticker symbol.
    pub symbol: String,
    /// Base URL of the price feed API.
    pub price_feed_url: String,
    /// Seconds between ticks.
    pub poll_interval_secs: f64,
    /// Rolling history capacity in samples.
    pub price_window: usize,
    /// Short moving-average window.
    pub ma_short_window: usize,
    /// Long moving-average window.
    pub ma_long_window: usize,
    /// Minimum returns before the anomaly model is consulted.
    pub anomaly_min_samples: usize,
    /// Expected outlier fraction in the historical returns.
    pub anomaly_contamination: f64,
    /// Trailing returns handed to the anomaly detector.
    pub anomaly_window: usize,
    /// Upstream fetch timeout in seconds.
    pub fetch_timeout_secs: u64,
    /// HTTP server port.
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            price_feed_url: "https://api.binance.com".to_string(),
            poll_interval_secs: 5.0,
            price_window: 200,
            ma_short_window: 5,
            ma_long_window: 20,
            anomaly_min_samples: 30,
            anomaly_contamination: 0.02,
            anomaly_window: 50,
            fetch_timeout_secs: 10,
            port: 8080,
        }
    }
}

impl Config {
    /// Build a config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            symbol: env::var("SYMBOL").unwrap_or(defaults.symbol),
            price_feed_url: env::var("PRICE_FEED_URL").unwrap_or(defaults.price_feed_url),
            poll_interval_secs: parse_env("POLL_INTERVAL_SECONDS", defaults.poll_interval_secs),
            price_window: parse_env("PRICE_WINDOW", defaults.price_window),
            ma_short_window: parse_env("MA_SHORT_WINDOW", defaults.ma_short_window),
            ma_long_window: parse_env("MA_LONG_WINDOW", defaults.ma_long_window),
            anomaly_min_samples: parse_env("ANOMALY_MIN_SAMPLES", defaults.anomaly_min_samples),
            anomaly_contamination: parse_env(
                "ANOMALY_CONTAMINATION",
                defaults.anomaly_contamination,
            ),
            anomaly_window: parse_env("ANOMALY_WINDOW", defaults.anomaly_window),
            fetch_timeout_secs: parse_env("FETCH_TIMEOUT_SECONDS", defaults.fetch_timeout_secs),
            port: parse_env("PORT", defaults.port),
        }
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.price_window == 0 {
            return Err(invalid("PRICE_WINDOW must be positive"));
        }
        if self.ma_short_window == 0 || self.ma_long_window == 0 {
            return Err(invalid("moving-average windows must be positive"));
        }
        if self.ma_short_window >= self.ma_long_window {
            return Err(invalid(
                "MA_SHORT_WINDOW must be strictly smaller than MA_LONG_WINDOW",
            ));
        }
        if self.ma_long_window >= self.price_window {
            return Err(invalid(
                "MA_LONG_WINDOW must be smaller than PRICE_WINDOW",
            ));
        }
        if !(self.poll_interval_secs > 0.0) {
            return Err(invalid("POLL_INTERVAL_SECONDS must be positive"));
        }
        if !(self.anomaly_contamination > 0.0 && self.anomaly_contamination < 1.0) {
            return Err(invalid(
                "ANOMALY_CONTAMINATION must be strictly between 0 and 1",
            ));
        }
        if self.anomaly_min_samples < 2 {
            return Err(invalid("ANOMALY_MIN_SAMPLES must be at least 2"));
        }
        if self.anomaly_window == 0 {
            return Err(invalid("ANOMALY_WINDOW must be positive"));
        }
        if self.anomaly_window < self.anomaly_min_samples {
            // a window the detector can never fill would silently disable
            // anomaly detection for good
            return Err(invalid(
                "ANOMALY_WINDOW must be at least ANOMALY_MIN_SAMPLES",
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(invalid("FETCH_TIMEOUT_SECONDS must be positive"));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn invalid(msg: &str) -> ConfigError {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        msg.to_string(),
    ))
}
