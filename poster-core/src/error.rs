//! Error types for poster model operations.

use thiserror::Error;

/// Result type for poster model operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in poster model operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Editor name not recognized.
    #[error("Unknown editor: {0}")]
    UnknownEditor(String),

    /// Editor has no control with this name.
    #[error("Editor {editor} has no parameter named {name}")]
    UnknownParameter {
        /// Editor the update targeted.
        editor: String,
        /// Offending parameter name.
        name: String,
    },

    /// A parameter value could not be decoded.
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Editor or parameter name.
        name: String,
        /// Decoder message.
        reason: String,
    },

    /// A required field was absent or empty.
    #[error("Missing {0}")]
    MissingField(&'static str),

    /// URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
