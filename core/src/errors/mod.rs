//! Domain error types for the gatekeeping layer.

mod types;

pub use types::SessionError;

use thiserror::Error;

/// Errors surfaced at the middleware boundary
#[derive(Error, Debug)]
pub enum DomainError {
    /// Transient; the client should retry later
    #[error("Rate limit exceeded")]
    RateLimited { retry_after_seconds: Option<u64> },

    /// No session credential was presented
    #[error("Authentication required")]
    Unauthenticated,

    /// A credential was presented but did not verify
    #[error("Invalid session")]
    InvalidCredential(#[source] SessionError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<SessionError> for DomainError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::MissingSecret => DomainError::Configuration {
                message: err.to_string(),
            },
            SessionError::Signing => DomainError::Internal {
                message: err.to_string(),
            },
            other => DomainError::InvalidCredential(other),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
