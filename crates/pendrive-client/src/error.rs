//! Error types for the host boundary.

use pendrive_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("host request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("host returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed host response: {0}")]
    Decode(String),

    #[error("invalid host url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("credential host unavailable")]
    Unavailable,

    #[error("save rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Host(HostError),
}

impl From<HostError> for SaveError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Status { message, .. } => Self::Rejected(message),
            other => Self::Host(other),
        }
    }
}
