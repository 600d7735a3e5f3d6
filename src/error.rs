//! Crate-level error type.

use thiserror::Error;

/// Errors raised while loading, generating, or validating inputs.
///
/// Failures *inside* an optimization call are not errors: they surface as a
/// [`RouteResult`](crate::optimize::RouteResult) carrying a
/// [`FailureReason`](crate::optimize::FailureReason).
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid topology: {0}")]
    Graph(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
