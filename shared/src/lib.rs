//! Shared configuration and response types for the Shelf server
//!
//! - Configuration types and layered loading
//! - The JSON error body every rejection uses

pub mod config;
pub mod errors;

pub use config::{
    AppConfig, AuthConfig, ConfigError, Environment, LogFormat, LoggingConfig, RateLimitConfig,
    ServerConfig, SessionConfig,
};
pub use errors::{error_codes, ErrorResponse};
