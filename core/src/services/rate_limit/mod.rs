//! Per-client rate limiting
//!
//! - `bucket` - token bucket with time-proportional refill
//! - `registry` - sharded visitor map with idle eviction
//! - `sweeper` - background task that runs the eviction sweep

mod bucket;
mod config;
mod registry;
mod sweeper;

#[cfg(test)]
mod tests;

pub use bucket::TokenBucket;
pub use config::LimiterConfig;
pub use registry::{Admission, VisitorRegistry};
pub use sweeper::SweeperHandle;
