//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - Active real-time connections by topic kind
//! - Inbound frames by topic kind and frame kind
//! - Broadcast deliveries and slow-consumer evictions
//! - Persistence failures hit on the real-time path

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace("platform_service"),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// Active real-time connections gauge
pub static REALTIME_CONNECTIONS_ACTIVE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "realtime_connections_active",
            "Number of active real-time connections",
        )
        .namespace("platform_service"),
        &["topic"], // "chat", "call"
    )
    .expect("Failed to create REALTIME_CONNECTIONS_ACTIVE metric")
});

/// Inbound frames by kind
pub static REALTIME_FRAMES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("realtime_frames_total", "Inbound real-time frames by kind")
            .namespace("platform_service"),
        &["topic", "kind"],
    )
    .expect("Failed to create REALTIME_FRAMES_TOTAL metric")
});

/// Successful enqueues onto outbound queues
pub static BROADCAST_DELIVERIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "broadcast_deliveries_total",
            "Payloads enqueued onto connection outbound queues",
        )
        .namespace("platform_service"),
        &["topic"],
    )
    .expect("Failed to create BROADCAST_DELIVERIES_TOTAL metric")
});

/// Connections evicted because their outbound queue was full or closed
pub static BROADCAST_EVICTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "broadcast_evictions_total",
            "Connections evicted during broadcast",
        )
        .namespace("platform_service"),
        &["topic"],
    )
    .expect("Failed to create BROADCAST_EVICTIONS_TOTAL metric")
});

/// Persistence failures on the real-time path
pub static PERSISTENCE_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "persistence_failures_total",
            "Persistence gateway failures hit while routing frames",
        )
        .namespace("platform_service"),
        &["operation"],
    )
    .expect("Failed to create PERSISTENCE_FAILURES_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(REALTIME_CONNECTIONS_ACTIVE.clone()))
        .expect("Failed to register REALTIME_CONNECTIONS_ACTIVE");
    registry
        .register(Box::new(REALTIME_FRAMES_TOTAL.clone()))
        .expect("Failed to register REALTIME_FRAMES_TOTAL");
    registry
        .register(Box::new(BROADCAST_DELIVERIES_TOTAL.clone()))
        .expect("Failed to register BROADCAST_DELIVERIES_TOTAL");
    registry
        .register(Box::new(BROADCAST_EVICTIONS_TOTAL.clone()))
        .expect("Failed to register BROADCAST_EVICTIONS_TOTAL");
    registry
        .register(Box::new(PERSISTENCE_FAILURES_TOTAL.clone()))
        .expect("Failed to register PERSISTENCE_FAILURES_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16) {
    let status = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, status.as_str()])
        .inc();
}

/// Track a connection entering or leaving the active set
pub fn connection_opened(topic: &str) {
    REALTIME_CONNECTIONS_ACTIVE.with_label_values(&[topic]).inc();
}

pub fn connection_closed(topic: &str) {
    REALTIME_CONNECTIONS_ACTIVE.with_label_values(&[topic]).dec();
}

/// Helper to record an inbound frame
pub fn record_frame(topic: &str, kind: &str) {
    REALTIME_FRAMES_TOTAL.with_label_values(&[topic, kind]).inc();
}

/// Helper to record the outcome of one broadcast
pub fn record_broadcast(topic: &str, delivered: usize, evicted: usize) {
    if delivered > 0 {
        BROADCAST_DELIVERIES_TOTAL
            .with_label_values(&[topic])
            .inc_by(delivered as u64);
    }
    if evicted > 0 {
        BROADCAST_EVICTIONS_TOTAL
            .with_label_values(&[topic])
            .inc_by(evicted as u64);
    }
}

/// Helper to record a persistence failure
pub fn record_persistence_failure(operation: &str) {
    PERSISTENCE_FAILURES_TOTAL
        .with_label_values(&[operation])
        .inc();
}
