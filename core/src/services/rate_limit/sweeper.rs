//! Periodic eviction of idle visitors.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::registry::VisitorRegistry;

/// Owns the background sweep task.
///
/// `shutdown` stops the task and waits for it; dropping the handle only
/// signals cancellation.
#[derive(Debug)]
pub struct SweeperHandle {
    token: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Cancel the sweep loop and wait until it has exited
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                debug!(error = %e, "Visitor sweeper task ended abnormally");
            }
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl VisitorRegistry {
    /// Start sweeping this registry every `interval` on the current tokio runtime
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> SweeperHandle {
        let registry = Arc::clone(self);
        let token = CancellationToken::new();
        let shutdown = token.clone();

        let join = tokio::spawn(async move {
            info!(
                interval_seconds = interval.as_secs(),
                idle_threshold_seconds = registry.idle_threshold().as_secs(),
                "Visitor sweeper started"
            );

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let now = tokio::time::Instant::now().into_std();
                        let removed = registry.sweep(now, registry.idle_threshold());
                        if removed > 0 {
                            info!(removed, active = registry.len(), "Evicted idle visitors");
                        }
                    }
                    _ = shutdown.cancelled() => {
                        info!("Visitor sweeper shutting down");
                        break;
                    }
                }
            }
        });

        SweeperHandle {
            token,
            join: Some(join),
        }
    }
}
