//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total{path, method}` (counter): requests entering the pipeline
//! - `gateway_cache_lookups_total{result}` (counter): `hit` or `miss`
//! - `gateway_upstream_responses_total{pool, status}` (counter): relayed upstream statuses
//! - `gateway_auth_rejections_total` (counter)
//! - `gateway_rate_limited_total` (counter)
//! - `gateway_load_alerts_total{service}` (counter)
//! - `gateway_requests_per_interval` (gauge): last Load Monitor sample

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and return a handle for `/metrics`.
pub fn setup_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

pub fn record_request(path: &str, method: &str) {
    counter!(
        "http_requests_total",
        "path" => path.to_string(),
        "method" => method.to_string()
    )
    .increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("gateway_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_upstream_response(pool: &str, status: u16) {
    counter!(
        "gateway_upstream_responses_total",
        "pool" => pool.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_auth_rejection() {
    counter!("gateway_auth_rejections_total").increment(1);
}

pub fn record_rate_limited() {
    counter!("gateway_rate_limited_total").increment(1);
}

pub fn record_load_alert(service: &str) {
    counter!("gateway_load_alerts_total", "service" => service.to_string()).increment(1);
}

pub fn record_load_sample(requests: u64) {
    gauge!("gateway_requests_per_interval").set(requests as f64);
}
