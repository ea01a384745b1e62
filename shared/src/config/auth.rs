//! Session authentication configuration

use serde::{Deserialize, Serialize};

/// Signing secret used when nothing else is configured.
///
/// Accepted in development only; `AppConfig::validate` refuses it in production.
pub const DEVELOPMENT_SECRET: &str = "development-secret-please-change-in-production";

/// Session cookie and signing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// HMAC secret for signing session credentials
    pub secret: String,

    /// Name of the cookie carrying the credential
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Session lifetime in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: i64,

    /// Session lifetime in seconds when the visitor asked to be remembered
    #[serde(default = "default_remember_ttl")]
    pub remember_ttl_seconds: i64,

    /// Where page routes send visitors without a valid session
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Cookie secure flag (HTTPS only)
    #[serde(default)]
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::from(DEVELOPMENT_SECRET),
            cookie_name: default_cookie_name(),
            ttl_seconds: default_ttl(),
            remember_ttl_seconds: default_remember_ttl(),
            login_path: default_login_path(),
            secure: false,
        }
    }
}

impl SessionConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Set the remembered lifetime in days
    pub fn with_remember_days(mut self, days: i64) -> Self {
        self.remember_ttl_seconds = days * 86400;
        self
    }

    /// Check if using the development secret (must never reach production)
    pub fn is_using_default_secret(&self) -> bool {
        self.secret == DEVELOPMENT_SECRET
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_cookie_name() -> String {
    String::from("auth_token")
}

fn default_ttl() -> i64 {
    86400 // 24 hours
}

fn default_remember_ttl() -> i64 {
    30 * 86400 // 30 days
}

fn default_login_path() -> String {
    String::from("/login")
}
