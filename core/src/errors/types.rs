//! Session credential rejection reasons

use thiserror::Error;

/// Why a session credential was refused, or why one could not be produced.
///
/// The first four variants are the rejection reasons of `SessionCodec::verify`.
/// They are distinguished for diagnostics only; clients see one "invalid
/// session" answer for all of them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("malformed session credential")]
    Malformed,

    #[error("session credential signature verification failed")]
    BadSignature,

    #[error("session credential uses unexpected signing algorithm {algorithm}")]
    WrongAlgorithm { algorithm: String },

    #[error("session credential expired")]
    Expired,

    #[error("failed to sign session credential")]
    Signing,

    #[error("session signing secret is not configured")]
    MissingSecret,
}

impl SessionError {
    /// Short label for structured log fields
    pub fn reason(&self) -> &'static str {
        match self {
            SessionError::Malformed => "malformed",
            SessionError::BadSignature => "bad_signature",
            SessionError::WrongAlgorithm { .. } => "wrong_algorithm",
            SessionError::Expired => "expired",
            SessionError::Signing => "signing_failed",
            SessionError::MissingSecret => "missing_secret",
        }
    }
}
