//! Session claim entities carried in the signed credential.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::SessionError;

/// Identifier of an authenticated account
pub type SubjectId = i64;

/// Verified contents of a session credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClaims {
    pub subject_id: SubjectId,
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    pub fn new(subject_id: SubjectId, expires_at: DateTime<Utc>) -> Self {
        Self {
            subject_id,
            expires_at,
        }
    }

    /// A credential is valid strictly before its expiry instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// JWT payload as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (decimal account id)
    pub sub: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration as a NumericDate with millisecond fraction
    pub exp: f64,
}

impl TokenClaims {
    pub fn new(subject_id: SubjectId, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: subject_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp_millis() as f64 / 1000.0,
        }
    }

    /// Convert wire claims into typed claims.
    ///
    /// Only call this on a payload whose signature has already been checked.
    pub fn into_session_claims(self) -> Result<SessionClaims, SessionError> {
        let subject_id = self
            .sub
            .parse::<SubjectId>()
            .map_err(|_| SessionError::Malformed)?;
        if !self.exp.is_finite() {
            return Err(SessionError::Malformed);
        }
        let expires_at = Utc
            .timestamp_millis_opt((self.exp * 1000.0).round() as i64)
            .single()
            .ok_or(SessionError::Malformed)?;
        Ok(SessionClaims::new(subject_id, expires_at))
    }
}
