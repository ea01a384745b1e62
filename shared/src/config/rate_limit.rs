//! Rate limiting configuration module

use serde::{Deserialize, Serialize};

/// Per-client token bucket settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Burst size: tokens a fresh bucket starts with
    pub capacity: f64,

    /// Sustained rate in requests per second
    pub refill_rate: f64,

    /// Visitors idle longer than this are evicted
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold_seconds: u64,

    /// How often the eviction sweep runs
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,

    /// Peers (IPs or CIDRs) whose forwarded-for headers are trusted.
    /// Empty means the connection address is always used.
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            capacity: 5.0,
            refill_rate: 1.0,
            idle_threshold_seconds: default_idle_threshold(),
            sweep_interval_seconds: default_sweep_interval(),
            trusted_proxies: Vec::new(),
        }
    }
}

impl RateLimitConfig {
    pub fn new(capacity: f64, refill_rate: f64) -> Self {
        Self {
            capacity,
            refill_rate,
            ..Default::default()
        }
    }

    /// More lenient limits for local work
    pub fn development() -> Self {
        Self {
            capacity: 50.0,
            refill_rate: 20.0,
            ..Default::default()
        }
    }

    pub fn production() -> Self {
        Self::default()
    }

    /// Trust forwarded-for headers from the given peer
    pub fn with_trusted_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.trusted_proxies.push(proxy.into());
        self
    }
}

fn default_enabled() -> bool {
    true
}

fn default_idle_threshold() -> u64 {
    180 // 3 minutes
}

fn default_sweep_interval() -> u64 {
    60
}
