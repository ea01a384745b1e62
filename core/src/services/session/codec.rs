//! Signing and verification of session credentials

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::Deserialize;

use crate::domain::entities::{SessionClaims, SubjectId, TokenClaims};
use crate::errors::SessionError;

use super::config::SessionCodecConfig;

/// The only algorithm a credential may claim
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;
const SIGNING_ALGORITHM_NAME: &str = "HS256";

/// Issues and verifies HS256-signed session credentials.
///
/// Stateless: a credential is valid if and only if its signature matches
/// the process secret and its expiry lies in the future.
pub struct SessionCodec {
    config: SessionCodecConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionCodec {
    /// Fails with [`SessionError::MissingSecret`] when the secret is empty
    pub fn new(config: SessionCodecConfig) -> Result<Self, SessionError> {
        if config.secret.trim().is_empty() {
            return Err(SessionError::MissingSecret);
        }

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        // Expiry is compared against the caller's clock in `verify_at`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Lifetime for a login, longer when the visitor asked to be remembered
    pub fn ttl_for(&self, remember: bool) -> Duration {
        if remember {
            self.config.remember_ttl
        } else {
            self.config.ttl
        }
    }

    pub fn issue(&self, subject_id: SubjectId, ttl: Duration) -> Result<String, SessionError> {
        self.issue_at(subject_id, ttl, Utc::now())
    }

    /// Sign a credential for `subject_id` that expires at `now + ttl`.
    ///
    /// Issue and expiry instants have millisecond granularity; anything
    /// finer in `now` or `ttl` is truncated.
    pub fn issue_at(
        &self,
        subject_id: SubjectId,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, SessionError> {
        let issued_at = now.trunc_subsecs(3);
        let expires_at = (issued_at + ttl).trunc_subsecs(3);
        let claims = TokenClaims::new(subject_id, issued_at, expires_at);
        encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|_| SessionError::Signing)
    }

    pub fn verify(&self, credential: &str) -> Result<SessionClaims, SessionError> {
        self.verify_at(credential, Utc::now())
    }

    /// Verify a credential as of `now`.
    ///
    /// Checks run in order: structure, algorithm, signature, claims, expiry.
    /// Nothing from the payload is returned unless every check passes.
    pub fn verify_at(
        &self,
        credential: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionClaims, SessionError> {
        let algorithm = peek_algorithm(credential)?;
        if algorithm != SIGNING_ALGORITHM_NAME {
            return Err(SessionError::WrongAlgorithm { algorithm });
        }

        let token_data = decode::<TokenClaims>(credential, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => SessionError::BadSignature,
                ErrorKind::InvalidAlgorithm => SessionError::WrongAlgorithm {
                    algorithm: algorithm.clone(),
                },
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Malformed,
            })?;

        let claims = token_data.claims.into_session_claims()?;
        if claims.is_expired_at(now) {
            return Err(SessionError::Expired);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("algorithm", &SIGNING_ALGORITHM)
            .field("ttl", &self.config.ttl)
            .field("remember_ttl", &self.config.remember_ttl)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct AlgorithmPeek {
    alg: String,
}

/// Read the `alg` header field without trusting anything else in the credential
fn peek_algorithm(credential: &str) -> Result<String, SessionError> {
    let mut segments = credential.split('.');
    let header = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(header), Some(_), Some(_), None) => header,
        _ => return Err(SessionError::Malformed),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| SessionError::Malformed)?;
    let peek: AlgorithmPeek =
        serde_json::from_slice(&bytes).map_err(|_| SessionError::Malformed)?;
    Ok(peek.alg)
}
