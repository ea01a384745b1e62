//! Configuration module with business-specific sub-modules
//!
//! - `auth` - session signing and cookie configuration
//! - `environment` - environment detection and logging configuration
//! - `rate_limit` - per-client token bucket limits
//! - `server` - HTTP server bind configuration

pub mod auth;
pub mod environment;
pub mod rate_limit;
pub mod server;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::{AuthConfig, SessionConfig, DEVELOPMENT_SECRET};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;

/// Prefix for environment overrides, e.g. `SHELF__RATE_LIMIT__CAPACITY=20`
pub const ENV_PREFIX: &str = "SHELF";

/// Errors raised while loading or validating configuration.
///
/// All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("session signing secret must not be empty")]
    MissingSecret,

    #[error("the development signing secret cannot be used in production")]
    DevelopmentSecret,

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub environment: Environment,

    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl AppConfig {
    /// Create configuration for development environment
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::development(),
            logging: LoggingConfig::for_environment(Environment::Development),
        }
    }

    /// Create configuration for production environment.
    ///
    /// The secret is left empty so that a missing `JWT_SECRET` fails validation.
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig::new("0.0.0.0", 8000),
            auth: AuthConfig {
                session: SessionConfig {
                    secret: String::new(),
                    secure: true,
                    ..Default::default()
                },
            },
            rate_limit: RateLimitConfig::production(),
            logging: LoggingConfig::for_environment(Environment::Production),
        }
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self::development(),
            Environment::Production => Self::production(),
            Environment::Staging => {
                let mut config = Self::production();
                config.environment = Environment::Staging;
                config.logging = LoggingConfig::for_environment(Environment::Staging);
                config
            }
        }
    }

    /// Load configuration for the current environment.
    ///
    /// Layers, lowest priority first: environment defaults, the optional
    /// `config.<environment>.toml` file, `SHELF__*` variables, and finally
    /// `JWT_SECRET` for the signing secret. The result is validated.
    pub fn load() -> Result<Self, ConfigError> {
        let environment = Environment::from_env();
        let defaults = Self::for_environment(environment);

        let settings = ::config::Config::builder()
            .add_source(::config::Config::try_from(&defaults)?)
            .add_source(::config::File::with_name(environment.config_file()).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("rate_limit.trusted_proxies"),
            )
            .set_override_option("auth.session.secret", std::env::var("JWT_SECRET").ok())?
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the gatekeeping layer cannot run safely with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let session = &self.auth.session;
        if session.secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if self.environment.is_production() && session.is_using_default_secret() {
            return Err(ConfigError::DevelopmentSecret);
        }
        if session.ttl_seconds < 0 || session.remember_ttl_seconds < 0 {
            return Err(ConfigError::Invalid {
                field: "auth.session.ttl_seconds",
                reason: "session lifetimes must not be negative".to_string(),
            });
        }

        let limits = &self.rate_limit;
        if !limits.capacity.is_finite() || limits.capacity < 1.0 {
            return Err(ConfigError::Invalid {
                field: "rate_limit.capacity",
                reason: format!("must be at least 1, got {}", limits.capacity),
            });
        }
        if !limits.refill_rate.is_finite() || limits.refill_rate < 0.0 {
            return Err(ConfigError::Invalid {
                field: "rate_limit.refill_rate",
                reason: format!("must be a non-negative number, got {}", limits.refill_rate),
            });
        }
        if limits.idle_threshold_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "rate_limit.idle_threshold_seconds",
                reason: "must be greater than zero".to_string(),
            });
        }
        if limits.sweep_interval_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "rate_limit.sweep_interval_seconds",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}
