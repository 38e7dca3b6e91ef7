//! # Program.A Poster Server Library
//!
//! HTTP surface of the poster editors: the gallery storage contract at
//! `/api/posters`, server-side export at `/api/export` and health probes.
//! This library is used by both the binary and integration tests.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{any, get, post};
use axum::{middleware, Router};
use poster_core::PosterStore;
use poster_renderer::PosterExporter;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub mod config;
pub mod error;
pub mod export;
pub mod health;
pub mod metrics;
pub mod routes;
pub mod storage;
pub mod validation;

pub use error::ApiError;
pub use storage::{LocalStorage, PosterStorage, RemoteStorage, StorageError};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Where saved posters live.
    pub storage: Arc<dyn PosterStorage>,
    /// Export renderer.
    pub exporter: PosterExporter,
}

impl AppState {
    /// State over `storage` with the default exporter.
    #[must_use]
    pub fn new(storage: Arc<dyn PosterStorage>) -> Self {
        Self {
            storage,
            exporter: PosterExporter::with_defaults(),
        }
    }

    /// State over a fresh in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(LocalStorage::new(PosterStore::new())))
    }

    /// Replace the exporter.
    #[must_use]
    pub fn with_exporter(mut self, exporter: PosterExporter) -> Self {
        self.exporter = exporter;
        self
    }
}

/// Build the application router with request ids, tracing and metrics.
///
/// CORS and the `/metrics` endpoint are added by the binary.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/posters", any(routes::posters))
        .route("/.netlify/functions/posters", any(routes::posters))
        .route("/api/export", post(export::export_handler))
        .route_layer(middleware::from_fn(metrics::track_http))
        // Health check endpoints (Kubernetes probes)
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/health", get(health::readiness))
        .layer(DefaultBodyLimit::max(validation::MAX_BODY_BYTES))
        // Request ID for distributed tracing correlation
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        // Structured request tracing with timing
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// CORS layer allowing localhost origins.
#[must_use]
pub fn build_cors_layer(port: u16) -> CorsLayer {
    let localhost_origins = [
        format!("http://localhost:{port}"),
        format!("http://127.0.0.1:{port}"),
        // Common dev server ports
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(), // Vite
        "http://localhost:8888".to_string(), // netlify dev
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
        "http://127.0.0.1:8888".to_string(),
    ];

    let origins: Vec<HeaderValue> = localhost_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_DISPOSITION])
}
