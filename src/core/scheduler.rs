//! Fixed-interval tick loop driving fetch -> append -> evaluate -> publish.

use crate::config::Config;
use crate::metrics::Metrics;
use crate::models::{PriceSample, TickPayload};
use crate::series::RollingSeries;
use crate::services::{PriceSource, Publisher};
use crate::signals::{SignalEngine, ZScoreDetector};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Drives the pipeline cadence.
///
/// The spawned task exclusively owns the rolling series and the signal
/// engine, so appends and state updates need no locking and evaluations are
/// strictly ordered by arrival tick. The stop signal is observed at tick
/// boundaries only; a tick that is mid-flight finishes its computation but
/// will not publish once stop has been requested.
pub struct TickScheduler {
    config: Config,
    source: Arc<dyn PriceSource>,
    publisher: Arc<dyn Publisher>,
    metrics: Arc<Metrics>,
    state: Arc<RwLock<SchedulerState>>,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
    stop_tx: watch::Sender<bool>,
}

impl TickScheduler {
    pub fn new(
        config: Config,
        source: Arc<dyn PriceSource>,
        publisher: Arc<dyn Publisher>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let (stop_tx, _stop_rx) = watch::channel(false);
        Self {
            config,
            source,
            publisher,
            metrics,
            state: Arc::new(RwLock::new(SchedulerState::Idle)),
            handle: Arc::new(RwLock::new(None)),
            stop_tx,
        }
    }

    /// Start the tick loop. Valid only from the idle state; a scheduler is
    /// not restartable after stop.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        {
            let mut state = self.state.write().await;
            if *state != SchedulerState::Idle {
                return Err(Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("scheduler cannot start from {:?} state", *state),
                )));
            }
            *state = SchedulerState::Running;
        }

        let config = self.config.clone();
        let source = self.source.clone();
        let publisher = self.publisher.clone();
        let metrics = self.metrics.clone();
        let state = self.state.clone();
        let mut stop_rx = self.stop_tx.subscribe();

        let handle = tokio::spawn(async move {
            // stop() may have raced ahead of the spawn
            if *stop_rx.borrow() {
                *state.write().await = SchedulerState::Stopped;
                return;
            }

            let mut series = RollingSeries::with_capacity(config.price_window);
            let mut engine = SignalEngine::new(
                config.ma_short_window,
                config.ma_long_window,
                config.anomaly_window,
                Box::new(ZScoreDetector::new(
                    config.anomaly_min_samples,
                    config.anomaly_contamination,
                )),
            );

            let mut ticker = interval(Duration::from_secs_f64(config.poll_interval_secs));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                symbol = %config.symbol,
                interval_secs = config.poll_interval_secs,
                "tick scheduler started"
            );

            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        run_tick(
                            &config,
                            source.as_ref(),
                            publisher.as_ref(),
                            &metrics,
                            &mut series,
                            &mut engine,
                            &stop_rx,
                        )
                        .await;
                        if *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            *state.write().await = SchedulerState::Stopped;
            info!("tick scheduler stopped");
        });

        {
            let mut h = self.handle.write().await;
            *h = Some(handle);
        }

        Ok(())
    }

    /// Request shutdown and wait for the loop to observe it. Idempotent;
    /// completes within one interval's bound.
    pub async fn stop(&self) {
        let _ = self.stop_tx.send(true);
        let handle = {
            let mut h = self.handle.write().await;
            h.take()
        };
        if let Some(h) = handle {
            let _ = h.await;
        }
    }

    pub async fn state(&self) -> SchedulerState {
        *self.state.read().await
    }

    pub async fn is_running(&self) -> bool {
        self.state().await == SchedulerState::Running
    }
}

/// One tick: fetch, and on success append + evaluate + publish. On fetch
/// failure the tick is skipped entirely - no partial or synthetic sample,
/// no payload - and the loop carries on.
async fn run_tick(
    config: &Config,
    source: &dyn PriceSource,
    publisher: &dyn Publisher,
    metrics: &Metrics,
    series: &mut RollingSeries,
    engine: &mut SignalEngine,
    stop_rx: &watch::Receiver<bool>,
) {
    let Some(price) = source.fetch(&config.symbol).await else {
        metrics.fetch_failures_total.inc();
        warn!(symbol = %config.symbol, "no price this tick, skipping");
        return;
    };

    let sample = PriceSample::new(price, Utc::now());
    series.append(sample);

    let timer = metrics.evaluation_duration_seconds.start_timer();
    let snapshot = series.snapshot();
    let result = engine.evaluate(&snapshot);
    timer.observe_duration();

    metrics.ticks_total.inc();
    if result.signal.is_some() {
        metrics.signals_emitted_total.inc();
    }

    // The fetch may have straddled a stop request; drop the payload then.
    if *stop_rx.borrow() {
        debug!("stop requested mid-tick, payload not published");
        return;
    }

    let payload = TickPayload::from_evaluation(&sample, &result);
    publisher.broadcast(&payload);
    metrics.broadcasts_total.inc();

    match &payload.signal {
        Some(signal) => info!(
            symbol = %config.symbol,
            price = price,
            signal = %signal,
            anomalous = result.anomalous,
            "tick published with signal"
        ),
        None => debug!(
            symbol = %config.symbol,
            price = price,
            samples = series.len(),
            "tick published"
        ),
    }
}
