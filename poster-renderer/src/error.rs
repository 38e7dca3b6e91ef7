//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering and export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Off-screen surface could not be allocated.
    #[error("Surface error: {0}")]
    Surface(String),

    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Encoding the finished image failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// A multi-frame capture was cancelled before it finished.
    #[error("Recording cancelled after {0} frames")]
    Cancelled(usize),

    /// Parameters do not belong to the requested renderer.
    #[error("Invalid render request: {0}")]
    InvalidRequest(String),
}
