//! Error types for the pure client core.

use thiserror::Error;

/// A credential failed local checks before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to parse page snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("page snapshot has no url")]
    MissingUrl,
}
