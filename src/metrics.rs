// src/metrics.rs
//
// Metrics sinks for the control core.
//
// The transport client and episode controller are handed an injected
// `MetricsSink`; recording is fire-and-forget and must never fail or
// block the call that emits it.
//
// - NoopMetrics:  discards everything.
// - StatsMetrics: in-memory Welford summaries, for harness end-of-run
//                 reporting and tests.
// - PromMetrics:  Prometheus registry for scraping/export.

use std::sync::Mutex;

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// One-way notifications from the control core to a metrics collector.
/// The core never reads results back.
pub trait MetricsSink: Send + Sync {
    /// Duration of one observation round trip.
    fn record_observation_latency(&self, ms: f64);
    /// Duration of one action-submission round trip.
    fn record_action_latency(&self, ms: f64);
    /// A recovered error, keyed by taxonomy label
    /// ("timeout", "channel", "malformed_reply", "unavailable", ...).
    fn record_error(&self, kind: &str, message: &str);
    /// A failed connect / reconnect attempt.
    fn record_connection_failure(&self);
}

/// Sink that discards all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_observation_latency(&self, _ms: f64) {}
    fn record_action_latency(&self, _ms: f64) {}
    fn record_error(&self, _kind: &str, _message: &str) {}
    fn record_connection_failure(&self) {}
}

/// Welford running mean/variance + min/max. Deterministic, no deps.
#[derive(Debug, Clone, Copy)]
pub struct OnlineStats {
    n: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for OnlineStats {
    fn default() -> Self {
        Self {
            n: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl OnlineStats {
    /// Adds a sample if finite. Non-finite samples are ignored.
    pub fn add(&mut self, x: f64) {
        if !x.is_finite() {
            return;
        }

        self.n += 1;
        self.min = self.min.min(x);
        self.max = self.max.max(x);

        // Welford online variance.
        let delta = x - self.mean;
        self.mean += delta / (self.n as f64);
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn mean(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn min(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.min
        }
    }

    pub fn max(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.max
        }
    }

    pub fn stddev_population(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            (self.m2 / (self.n as f64)).sqrt()
        }
    }
}

#[derive(Debug, Default)]
struct StatsInner {
    observation_ms: OnlineStats,
    action_ms: OnlineStats,
    errors: u64,
    connection_failures: u64,
    last_error: Option<(String, String)>,
}

/// Point-in-time copy of the recorded aggregates.
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub observation_ms: OnlineStats,
    pub action_ms: OnlineStats,
    pub errors: u64,
    pub connection_failures: u64,
    pub last_error: Option<(String, String)>,
}

/// In-memory sink with Welford latency summaries.
#[derive(Debug, Default)]
pub struct StatsMetrics {
    inner: Mutex<StatsInner>,
}

impl StatsMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> MetricsSummary {
        let inner = self.inner.lock().expect("stats metrics lock");
        MetricsSummary {
            observation_ms: inner.observation_ms,
            action_ms: inner.action_ms,
            errors: inner.errors,
            connection_failures: inner.connection_failures,
            last_error: inner.last_error.clone(),
        }
    }
}

impl MetricsSink for StatsMetrics {
    fn record_observation_latency(&self, ms: f64) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.observation_ms.add(ms);
        }
    }

    fn record_action_latency(&self, ms: f64) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.action_ms.add(ms);
        }
    }

    fn record_error(&self, kind: &str, message: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.errors += 1;
            inner.last_error = Some((kind.to_string(), message.to_string()));
        }
    }

    fn record_connection_failure(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.connection_failures += 1;
        }
    }
}

/// Prometheus-backed sink.
pub struct PromMetrics {
    registry: Registry,
    observation_latency_ms: Histogram,
    action_latency_ms: Histogram,
    errors_total: IntCounter,
    errors_by_kind: IntCounterVec,
    connection_failures: IntCounter,
}

impl PromMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let observation_latency_ms = Histogram::with_opts(
            HistogramOpts::new(
                "bridgebot_observation_latency_ms",
                "Observation round-trip latency (ms)",
            )
            .buckets(vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0, 5000.0]),
        )
        .expect("observation latency histogram");
        let action_latency_ms = Histogram::with_opts(
            HistogramOpts::new(
                "bridgebot_action_latency_ms",
                "Action round-trip latency (ms)",
            )
            .buckets(vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0, 5000.0]),
        )
        .expect("action latency histogram");
        let errors_total =
            IntCounter::with_opts(Opts::new("bridgebot_errors_total", "Recovered errors total"))
                .expect("errors counter");
        let errors_by_kind = IntCounterVec::new(
            Opts::new("bridgebot_errors_by_kind", "Recovered errors by kind"),
            &["kind"],
        )
        .expect("errors by kind");
        let connection_failures = IntCounter::with_opts(Opts::new(
            "bridgebot_connection_failures",
            "Failed connect/reconnect attempts",
        ))
        .expect("connection failure counter");

        registry
            .register(Box::new(observation_latency_ms.clone()))
            .expect("register observation latency");
        registry
            .register(Box::new(action_latency_ms.clone()))
            .expect("register action latency");
        registry
            .register(Box::new(errors_total.clone()))
            .expect("register errors total");
        registry
            .register(Box::new(errors_by_kind.clone()))
            .expect("register errors by kind");
        registry
            .register(Box::new(connection_failures.clone()))
            .expect("register connection failures");

        Self {
            registry,
            observation_latency_ms,
            action_latency_ms,
            errors_total,
            errors_by_kind,
            connection_failures,
        }
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if encoder
            .encode(&self.registry.gather(), &mut buf)
            .is_err()
        {
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

impl Default for PromMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSink for PromMetrics {
    fn record_observation_latency(&self, ms: f64) {
        self.observation_latency_ms.observe(ms);
    }

    fn record_action_latency(&self, ms: f64) {
        self.action_latency_ms.observe(ms);
    }

    fn record_error(&self, kind: &str, _message: &str) {
        self.errors_total.inc();
        self.errors_by_kind.with_label_values(&[kind]).inc();
    }

    fn record_connection_failure(&self) {
        self.connection_failures.inc();
    }
}
