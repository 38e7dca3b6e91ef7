//! Health check endpoints for Kubernetes probes.
//!
//! - `/health/live` - Liveness probe (restart if fails)
//! - `/health/ready` - Readiness probe (remove from LB if fails)
//! - `/health` - Same as readiness

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

/// Health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "unhealthy"
    pub status: &'static str,
    /// Server version
    pub version: &'static str,
    /// Individual component checks
    pub checks: HealthChecks,
}

/// Individual health checks.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Poster storage reachable
    pub storage: bool,
    /// Renderer can allocate a surface
    pub renderer: bool,
}

/// Liveness probe - is the server running?
#[tracing::instrument(name = "liveness_probe")]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe - is the server ready to accept traffic?
///
/// Asks the storage backend for a check and allocates a tiny raster
/// surface to make sure rendering works.
#[tracing::instrument(name = "readiness_probe", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let storage_ok = match state.storage.check().await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!("Storage check failed: {}", err);
            false
        }
    };
    let renderer_ok = poster_renderer::PixmapSurface::new(1, 1).is_ok();

    let all_ok = storage_ok && renderer_ok;

    let status = HealthStatus {
        status: if all_ok { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            storage: storage_ok,
            renderer: renderer_ok,
        },
    };

    let code = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        let status = HealthStatus {
            status: "unhealthy",
            version: "0.3.0",
            checks: HealthChecks {
                storage: false,
                renderer: true,
            },
        };

        let json = serde_json::to_value(&status).expect("should serialize");
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["checks"]["storage"], false);
        assert_eq!(json["checks"]["renderer"], true);
    }
}
