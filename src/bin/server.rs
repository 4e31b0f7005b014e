//! Marketpulse server
//!
//! Runs the tick scheduler (price fetch -> rolling history -> signal
//! evaluation) alongside the HTTP server exposing /health, /metrics, and
//! the /ws tick stream.

use dotenvy::dotenv;
use marketpulse::config::Config;
use marketpulse::core::http::{start_server, AppState};
use marketpulse::core::scheduler::TickScheduler;
use marketpulse::logging;
use marketpulse::metrics::Metrics;
use marketpulse::secrets;
use marketpulse::services::{BinancePriceSource, BroadcastPublisher};
use std::env;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

const BROADCAST_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    logging::init_logging();

    // Encrypted secrets feed the same env-based config surface as dotenv.
    let key_path = env::var("SECRETS_KEY_FILE").unwrap_or_else(|_| "key.key".to_string());
    let enc_path = env::var("SECRETS_ENV_FILE").unwrap_or_else(|_| ".env.enc".to_string());
    match secrets::load_key(&key_path).and_then(|key| secrets::load_encrypted_env(&enc_path, &key))
    {
        Ok(vars) => {
            if !vars.is_empty() {
                info!(count = vars.len(), "loaded encrypted configuration values");
            }
            secrets::apply_env(&vars);
        }
        Err(e) => {
            warn!(error = %e, "could not load encrypted configuration, continuing without it");
        }
    }

    let config = Config::from_env();
    config.validate()?;

    info!(
        symbol = %config.symbol,
        interval_secs = config.poll_interval_secs,
        window = config.price_window,
        ma = %format!("{}/{}", config.ma_short_window, config.ma_long_window),
        "starting marketpulse"
    );

    let metrics = Arc::new(Metrics::new()?);
    let publisher = Arc::new(BroadcastPublisher::new(BROADCAST_CAPACITY));
    let source = Arc::new(BinancePriceSource::new(
        &config.price_feed_url,
        config.fetch_timeout_secs,
    )?);

    let state = AppState::new(metrics.clone(), publisher.sender(), config.symbol.clone());
    let port = config.port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(state, port).await {
            error!(error = %e, "HTTP server error");
        }
    });

    let scheduler = TickScheduler::new(config, source, publisher, metrics);
    scheduler.start().await?;

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
        _ = server_handle => {
            error!("HTTP server stopped unexpectedly");
        }
    }

    scheduler.stop().await;
    info!("marketpulse stopped");

    Ok(())
}
