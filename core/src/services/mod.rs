//! Gatekeeping services: per-client rate limiting and session credentials.

pub mod rate_limit;
pub mod session;

pub use rate_limit::{Admission, LimiterConfig, SweeperHandle, TokenBucket, VisitorRegistry};
pub use session::{SessionCodec, SessionCodecConfig};
