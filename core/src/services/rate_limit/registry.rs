//! Concurrency-safe map from client key to token bucket.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use super::bucket::TokenBucket;
use super::config::LimiterConfig;
use crate::domain::entities::ClientKey;

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    /// Request may proceed; `remaining` whole tokens are left
    Admitted { remaining: u64 },
    /// Request is refused; a token frees up after `retry_after`, or never
    Rejected { retry_after: Option<Duration> },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted { .. })
    }
}

/// Rate-limit state of one client
#[derive(Debug)]
struct VisitorEntry {
    bucket: TokenBucket,
    last_seen: Instant,
}

impl VisitorEntry {
    fn new(config: &LimiterConfig, now: Instant) -> Self {
        Self {
            bucket: TokenBucket::new(config.capacity, config.refill_rate, now),
            last_seen: now,
        }
    }

    fn touch(&mut self, now: Instant) {
        if now > self.last_seen {
            self.last_seen = now;
        }
    }

    fn is_idle(&self, now: Instant, idle_threshold: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) > idle_threshold
    }
}

/// Process-wide visitor state, shared across workers behind an `Arc`.
///
/// Buckets never leave the map: every read and write happens while the
/// owning shard is locked, so look-up-or-create for one key is atomic and
/// a sweep only ever holds one shard at a time.
#[derive(Debug)]
pub struct VisitorRegistry {
    config: LimiterConfig,
    visitors: DashMap<ClientKey, VisitorEntry>,
}

impl VisitorRegistry {
    pub fn new(config: LimiterConfig) -> Self {
        Self {
            config,
            visitors: DashMap::new(),
        }
    }

    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    pub fn idle_threshold(&self) -> Duration {
        self.config.idle_threshold
    }

    /// Spend a token for `key`, creating a full bucket on first sight
    pub fn admit(&self, key: ClientKey, now: Instant) -> bool {
        self.check(key, now).is_admitted()
    }

    /// Like [`admit`](Self::admit) but reports remaining tokens or the wait until the next one
    pub fn check(&self, key: ClientKey, now: Instant) -> Admission {
        let mut entry = self
            .visitors
            .entry(key)
            .or_insert_with(|| VisitorEntry::new(&self.config, now));

        entry.touch(now);
        if entry.bucket.try_consume(now) {
            Admission::Admitted {
                remaining: entry.bucket.tokens().floor() as u64,
            }
        } else {
            Admission::Rejected {
                retry_after: entry.bucket.retry_after(),
            }
        }
    }

    /// Drop every visitor idle for longer than `idle_threshold`; returns how many were removed
    pub fn sweep(&self, now: Instant, idle_threshold: Duration) -> usize {
        let mut removed = 0;
        self.visitors.retain(|_, entry| {
            let keep = !entry.is_idle(now, idle_threshold);
            if !keep {
                removed += 1;
            }
            keep
        });

        debug!(removed, remaining = self.visitors.len(), "Visitor sweep finished");
        removed
    }

    pub fn contains(&self, key: &ClientKey) -> bool {
        self.visitors.contains_key(key)
    }

    /// Tokens currently held by `key` as of its last request
    pub fn tokens(&self, key: &ClientKey) -> Option<f64> {
        self.visitors.get(key).map(|entry| entry.bucket.tokens())
    }

    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }
}

impl Default for VisitorRegistry {
    fn default() -> Self {
        Self::new(LimiterConfig::default())
    }
}
