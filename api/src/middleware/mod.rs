pub mod auth;
pub mod client_key;
pub mod rate_limit;

pub use auth::{Identity, MaybeIdentity, RejectionStyle, SessionAuth};
pub use client_key::ClientKeyResolver;
pub use rate_limit::RateLimiter;
