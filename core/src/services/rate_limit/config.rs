//! Configuration for the visitor registry

use std::time::Duration;

use shelf_shared::RateLimitConfig;

/// Bucket shape and eviction settings applied to every visitor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimiterConfig {
    /// Tokens a fresh bucket holds (burst size)
    pub capacity: f64,
    /// Tokens restored per second
    pub refill_rate: f64,
    /// Entries untouched for longer than this are swept
    pub idle_threshold: Duration,
}

impl LimiterConfig {
    pub fn new(capacity: f64, refill_rate: f64) -> Self {
        Self {
            capacity,
            refill_rate,
            ..Default::default()
        }
    }

    pub fn with_idle_threshold(mut self, idle_threshold: Duration) -> Self {
        self.idle_threshold = idle_threshold;
        self
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            capacity: 5.0,
            refill_rate: 1.0,
            idle_threshold: Duration::from_secs(180),
        }
    }
}

impl From<&RateLimitConfig> for LimiterConfig {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            capacity: config.capacity,
            refill_rate: config.refill_rate,
            idle_threshold: Duration::from_secs(config.idle_threshold_seconds),
        }
    }
}
