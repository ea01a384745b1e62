//! Configuration for the session codec

use chrono::Duration;

use shelf_shared::SessionConfig;

#[derive(Debug, Clone)]
pub struct SessionCodecConfig {
    /// HMAC-SHA256 signing secret
    pub secret: String,
    /// Lifetime of an ordinary session
    pub ttl: Duration,
    /// Lifetime when the visitor asked to be remembered
    pub remember_ttl: Duration,
}

impl SessionCodecConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::hours(24),
            remember_ttl: Duration::days(30),
        }
    }
}

impl From<&SessionConfig> for SessionCodecConfig {
    fn from(config: &SessionConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            ttl: Duration::seconds(config.ttl_seconds),
            remember_ttl: Duration::seconds(config.remember_ttl_seconds),
        }
    }
}
