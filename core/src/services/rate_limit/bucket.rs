//! Token bucket with time-proportional refill.

use std::time::{Duration, Instant};

/// Per-visitor token counter.
///
/// Holds `0 <= tokens <= capacity` at all times. An admitted request spends
/// exactly one token; tokens come back only through elapsed time.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// A full bucket
    pub fn new(capacity: f64, refill_rate: f64, now: Instant) -> Self {
        let capacity = capacity.max(0.0);
        Self {
            capacity,
            tokens: capacity,
            refill_rate: refill_rate.max(0.0),
            last_refill: now,
        }
    }

    /// Refill for the time since the last call, then spend one token if a
    /// whole one is available.
    pub fn try_consume(&mut self, now: Instant) -> bool {
        self.refill(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Time until a whole token is available, `None` if the bucket never refills
    pub fn retry_after(&self) -> Option<Duration> {
        let missing = 1.0 - self.tokens;
        if missing <= 0.0 {
            return Some(Duration::ZERO);
        }
        if self.refill_rate <= 0.0 {
            return None;
        }
        Some(Duration::from_secs_f64(missing / self.refill_rate))
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    fn refill(&mut self, now: Instant) {
        // Callers racing on one entry may hand in a slightly older instant.
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        if now > self.last_refill {
            self.last_refill = now;
        }
    }
}
