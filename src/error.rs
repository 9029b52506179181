//! Error types for the marshalling layer.
//!
//! All failures are local and synchronous; nothing is retried internally.
//! Failures of the external service pass through as [`Error::Remote`],
//! opaque to this layer.

use thiserror::Error;

/// Result type alias using this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the marshalling layer.
#[derive(Error, Debug)]
pub enum Error {
    /// Encoding hit a native value with no wire mapping.
    #[error("unsupported value type: {0}")]
    UnsupportedValueType(String),

    /// List-parameter encoding was given zero elements.
    #[error("list parameter '{0}' must not be empty")]
    EmptyList(String),

    /// A registered converter rejected a raw payload.
    #[error("conversion failed for column '{column}' on value '{value}': {reason}")]
    Conversion {
        column: String,
        /// Offending raw payload, truncated for diagnosis.
        value: String,
        reason: String,
    },

    /// Row length or variant tagging does not align with the result shape.
    #[error("result shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Failure reported by the external data service, passed through unmodified.
    #[error("remote service error: {0}")]
    Remote(String),
}

/// Converter-internal failure, wrapped into [`Error::Conversion`] with column
/// context by the decoder.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ConvertError(pub String);

impl ConvertError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}
