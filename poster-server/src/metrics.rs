//! Prometheus metrics for poster-server.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics` endpoint.

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

const HTTP_REQUESTS_TOTAL: &str = "poster_http_requests_total";
const HTTP_REQUEST_DURATION: &str = "poster_http_request_duration_seconds";
const EXPORTS_TOTAL: &str = "poster_exports_total";
const EXPORT_DURATION: &str = "poster_export_duration_seconds";
const POSTERS_STORED: &str = "poster_posters_stored";
const STORAGE_OPS_TOTAL: &str = "poster_storage_ops_total";
const VALIDATION_FAILURES_TOTAL: &str = "poster_validation_failures_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Prometheus metrics endpoint.
#[tracing::instrument(name = "metrics", skip(handle))]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}

/// Middleware recording count and latency of every request.
pub async fn track_http(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());
    let response = next.run(request).await;
    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

/// Record an HTTP request.
///
/// # Arguments
///
/// * `method` - HTTP method (GET, POST, etc.)
/// * `path` - Matched route
/// * `status` - HTTP status code
/// * `duration_secs` - Request duration in seconds
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        HTTP_REQUEST_DURATION,
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

/// Record a finished export.
///
/// # Arguments
///
/// * `editor` - Editor identifier
/// * `format` - Output extension (png, jpg, svg, gif)
/// * `duration_secs` - Render and encode time in seconds
pub fn record_export(editor: &str, format: &str, duration_secs: f64) {
    counter!(
        EXPORTS_TOTAL,
        "editor" => editor.to_string(),
        "format" => format.to_string()
    )
    .increment(1);
    histogram!(EXPORT_DURATION, "editor" => editor.to_string()).record(duration_secs);
}

/// Update the number of posters held by local storage.
#[allow(clippy::cast_precision_loss)]
pub fn set_posters_stored(count: usize) {
    gauge!(POSTERS_STORED).set(count as f64);
}

/// Record a storage operation.
///
/// # Arguments
///
/// * `op` - "save", "list" or "delete"
/// * `success` - Whether the operation succeeded
pub fn record_storage_op(op: &str, success: bool) {
    counter!(
        STORAGE_OPS_TOTAL,
        "op" => op.to_string(),
        "success" => success.to_string()
    )
    .increment(1);
}

/// Record an input validation failure.
///
/// # Arguments
///
/// * `validation_type` - Field that failed (poster_id, seed, size, ...)
pub fn record_validation_failure(validation_type: &str) {
    counter!(
        VALIDATION_FAILURES_TOTAL,
        "type" => validation_type.to_string()
    )
    .increment(1);
}
