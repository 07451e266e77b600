//! Prometheus metrics endpoint
//!
//! Exposes application metrics in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    // Force initialization of the lazy static
    let _ = &*PROMETHEUS_HANDLE;

    register_metrics();
}

fn register_metrics() {
    metrics::describe_counter!(
        "chatgate_requests_total",
        "Total number of proxied requests"
    );
    metrics::describe_counter!(
        "chatgate_rejections_total",
        "Requests that ended with an error payload, by kind"
    );
    metrics::describe_histogram!(
        "chatgate_request_duration_seconds",
        "Request duration in seconds"
    );
}

/// Prometheus metrics endpoint handler
///
/// Returns metrics in Prometheus text format for scraping.
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record a request
pub fn record_request(status: &str, path: &str, duration_secs: f64) {
    metrics::counter!("chatgate_requests_total", "status" => status.to_string(), "path" => path.to_string())
        .increment(1);
    metrics::histogram!("chatgate_request_duration_seconds", "path" => path.to_string())
        .record(duration_secs);
}

/// Record a request that ended with an error payload
pub fn record_rejection(kind: &str, path: &str) {
    metrics::counter!(
        "chatgate_rejections_total",
        "kind" => kind.to_string(),
        "path" => path.to_string()
    )
    .increment(1);
}
