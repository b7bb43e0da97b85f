//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Record request and downstream-call metrics through the `metrics` facade
//! - Optionally expose them on a Prometheus scrape endpoint
//! - Keep an in-process per-route tally for the `/metrics` snapshot
//!
//! # Metrics
//! - `service_requests_total` (counter): requests by method, route, status
//! - `service_request_duration_seconds` (histogram): latency distribution
//! - `downstream_calls_total` (counter): downstream calls by name, outcome

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Serialize;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("service_requests_total", &labels).increment(1);
    metrics::histogram!("service_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of a downstream call.
pub fn record_downstream_call(name: &str, outcome: &'static str) {
    metrics::counter!(
        "downstream_calls_total",
        "call" => name.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

#[derive(Debug, Default)]
struct RouteStats {
    requests: AtomicU64,
    errors: AtomicU64,
    total_micros: AtomicU64,
}

/// Per-route tally served by the `/metrics` endpoint.
#[derive(Debug)]
pub struct RequestMetrics {
    service: String,
    started: Instant,
    routes: DashMap<String, RouteStats>,
}

/// Point-in-time view of [`RequestMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub service: String,
    pub uptime_secs: u64,
    pub total_requests: u64,
    pub total_errors: u64,
    pub routes: Vec<RouteSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSnapshot {
    pub route: String,
    pub requests: u64,
    pub errors: u64,
    pub mean_latency_ms: f64,
}

impl RequestMetrics {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            started: Instant::now(),
            routes: DashMap::new(),
        }
    }

    /// Count one request. Status codes >= 400 count as errors.
    pub fn observe(&self, route: &str, status: u16, elapsed: Duration) {
        let stats = self.routes.entry(route.to_string()).or_default();
        stats.requests.fetch_add(1, Ordering::Relaxed);
        if status >= 400 {
            stats.errors.fetch_add(1, Ordering::Relaxed);
        }
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        stats.total_micros.fetch_add(micros, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut routes: Vec<RouteSnapshot> = self
            .routes
            .iter()
            .map(|r| {
                let requests = r.requests.load(Ordering::Relaxed);
                let total_micros = r.total_micros.load(Ordering::Relaxed);
                RouteSnapshot {
                    route: r.key().clone(),
                    requests,
                    errors: r.errors.load(Ordering::Relaxed),
                    mean_latency_ms: if requests == 0 {
                        0.0
                    } else {
                        total_micros as f64 / requests as f64 / 1000.0
                    },
                }
            })
            .collect();
        routes.sort_by(|a, b| a.route.cmp(&b.route));

        MetricsSnapshot {
            service: self.service.clone(),
            uptime_secs: self.started.elapsed().as_secs(),
            total_requests: routes.iter().map(|r| r.requests).sum(),
            total_errors: routes.iter().map(|r| r.errors).sum(),
            routes,
        }
    }
}
