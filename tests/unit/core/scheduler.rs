//! Unit tests for the tick scheduler

use async_trait::async_trait;
use marketpulse::config::Config;
use marketpulse::core::scheduler::{SchedulerState, TickScheduler};
use marketpulse::metrics::Metrics;
use marketpulse::models::TickPayload;
use marketpulse::services::{PriceSource, Publisher};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};

/// Source that replays a fixed script, then keeps failing.
struct ScriptedSource {
    script: Mutex<VecDeque<Option<f64>>>,
}

impl ScriptedSource {
    fn new(script: Vec<Option<f64>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl PriceSource for ScriptedSource {
    async fn fetch(&self, _symbol: &str) -> Option<f64> {
        self.script.lock().unwrap().pop_front().flatten()
    }
}

/// Publisher that records every payload it is handed.
#[derive(Default)]
struct CollectingPublisher {
    payloads: Mutex<Vec<TickPayload>>,
}

impl CollectingPublisher {
    fn collected(&self) -> Vec<TickPayload> {
        self.payloads.lock().unwrap().clone()
    }
}

impl Publisher for CollectingPublisher {
    fn broadcast(&self, payload: &TickPayload) {
        self.payloads.lock().unwrap().push(payload.clone());
    }
}

fn test_config() -> Config {
    Config {
        poll_interval_secs: 0.01,
        ..Config::default()
    }
}

#[tokio::test(start_paused = true)]
async fn fetch_failures_skip_the_tick_entirely() {
    let source = Arc::new(ScriptedSource::new(vec![None, None, None]));
    let publisher = Arc::new(CollectingPublisher::default());
    let metrics = Arc::new(Metrics::new().unwrap());

    let scheduler = TickScheduler::new(
        test_config(),
        source,
        publisher.clone(),
        metrics.clone(),
    );
    scheduler.start().await.unwrap();

    // three failing ticks plus slack
    sleep(Duration::from_millis(50)).await;
    scheduler.stop().await;

    assert!(publisher.collected().is_empty(), "no broadcasts on failed ticks");
    assert_eq!(metrics.ticks_total.get(), 0);
    assert!(metrics.fetch_failures_total.get() >= 3);
}

#[tokio::test(start_paused = true)]
async fn successful_ticks_publish_in_order() {
    let prices: Vec<Option<f64>> = (0..25).map(|i| Some(100.0 + i as f64)).collect();
    let source = Arc::new(ScriptedSource::new(prices));
    let publisher = Arc::new(CollectingPublisher::default());
    let metrics = Arc::new(Metrics::new().unwrap());

    let scheduler = TickScheduler::new(
        test_config(),
        source,
        publisher.clone(),
        metrics.clone(),
    );
    scheduler.start().await.unwrap();

    sleep(Duration::from_millis(300)).await;
    scheduler.stop().await;

    let payloads = publisher.collected();
    assert_eq!(payloads.len(), 25);
    assert_eq!(metrics.ticks_total.get(), 25);

    // warm-up ticks carry no averages and no signal
    for payload in &payloads[..20] {
        assert_eq!(payload.signal, None);
        assert_eq!(payload.ma_short, None);
        assert_eq!(payload.ma_long, None);
    }

    // the 21st sample crosses the warm-up threshold in a clean uptrend
    let first_signal = payloads[20].signal.as_deref().expect("signal at tick 21");
    assert!(first_signal.starts_with("BUY"));
    assert!(payloads[20].ma_short.unwrap() > payloads[20].ma_long.unwrap());

    // trend persists, so the call is not repeated
    for payload in &payloads[21..] {
        assert_eq!(payload.signal, None);
        assert!(payload.ma_short.is_some());
    }

    assert_eq!(metrics.signals_emitted_total.get(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent_and_final() {
    let source = Arc::new(ScriptedSource::new(vec![Some(100.0); 100]));
    let publisher = Arc::new(CollectingPublisher::default());
    let metrics = Arc::new(Metrics::new().unwrap());

    let scheduler = TickScheduler::new(test_config(), source, publisher.clone(), metrics);
    assert_eq!(scheduler.state().await, SchedulerState::Idle);

    scheduler.start().await.unwrap();
    assert!(scheduler.is_running().await);

    scheduler.stop().await;
    assert_eq!(scheduler.state().await, SchedulerState::Stopped);
    scheduler.stop().await; // second stop is a no-op

    // no publishes arrive after stop
    let count = publisher.collected().len();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(publisher.collected().len(), count);

    // a stopped scheduler does not restart
    assert!(scheduler.start().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn start_twice_is_rejected() {
    let source = Arc::new(ScriptedSource::new(vec![]));
    let publisher = Arc::new(CollectingPublisher::default());
    let metrics = Arc::new(Metrics::new().unwrap());

    let scheduler = TickScheduler::new(test_config(), source, publisher, metrics);
    scheduler.start().await.unwrap();
    assert!(scheduler.start().await.is_err());
    scheduler.stop().await;
}
