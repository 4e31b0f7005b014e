//! Prometheus metrics for the tick loop and HTTP surface.

use prometheus::{Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub ticks_total: IntCounter,
    pub fetch_failures_total: IntCounter,
    pub signals_emitted_total: IntCounter,
    pub broadcasts_total: IntCounter,
    pub ws_clients: Gauge,
    pub evaluation_duration_seconds: Histogram,
    pub http_requests_total: IntCounter,
    pub http_requests_in_flight: IntGauge,
    pub http_request_duration_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let ticks_total =
            IntCounter::new("ticks_total", "Scheduler ticks that fetched a price")?;
        let fetch_failures_total =
            IntCounter::new("fetch_failures_total", "Ticks skipped on fetch failure")?;
        let signals_emitted_total =
            IntCounter::new("signals_emitted_total", "Directional signals emitted")?;
        let broadcasts_total =
            IntCounter::new("broadcasts_total", "Tick payloads handed to the publisher")?;
        let ws_clients = Gauge::new("ws_clients", "Currently connected subscribers")?;
        let evaluation_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "evaluation_duration_seconds",
            "Time spent in one engine evaluation",
        ))?;
        let http_requests_total =
            IntCounter::new("http_requests_total", "HTTP requests served")?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests currently in flight")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency",
        ))?;

        registry.register(Box::new(ticks_total.clone()))?;
        registry.register(Box::new(fetch_failures_total.clone()))?;
        registry.register(Box::new(signals_emitted_total.clone()))?;
        registry.register(Box::new(broadcasts_total.clone()))?;
        registry.register(Box::new(ws_clients.clone()))?;
        registry.register(Box::new(evaluation_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            ticks_total,
            fetch_failures_total,
            signals_emitted_total,
            broadcasts_total,
            ws_clients,
            evaluation_duration_seconds,
            http_requests_total,
            http_requests_in_flight,
            http_request_duration_seconds,
        })
    }

    /// Export all registered metrics in the Prometheus text format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
