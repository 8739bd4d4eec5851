//! Admission and graceful shutdown for in-flight generations.
//!
//! Every generation runs under an [`InflightGuard`] obtained from
//! [`Lifecycle::begin`]. On shutdown the lifecycle stops admitting new work,
//! waits (up to the configured timeout) for in-flight generations to drain,
//! and then cancels whatever is left through the shared
//! [`CancellationToken`], which parents every generation's own token.

use core::time::Duration;
use randgen_core::Error;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct Lifecycle {
    shutdown_token: CancellationToken,
    accepting: AtomicBool,
    inflight: AtomicUsize,
    shutdown_timeout: Duration,
}

impl Lifecycle {
    pub fn new(shutdown_timeout: Duration) -> Self {
        Self {
            shutdown_token: CancellationToken::new(),
            accepting: AtomicBool::new(true),
            inflight: AtomicUsize::new(0),
            shutdown_timeout,
        }
    }

    /// Token cancelled once the drain phase of [`Lifecycle::shutdown`] ends.
    pub fn token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::Acquire)
    }

    pub fn is_shutting_down(&self) -> bool {
        !self.accepting.load(Ordering::Acquire)
    }

    /// Registers a new in-flight generation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceShutdown`] once shutdown has started.
    pub fn begin(self: &Arc<Self>) -> Result<InflightGuard, Error> {
        self.inflight.fetch_add(1, Ordering::AcqRel);
        let guard = InflightGuard {
            lifecycle: Arc::clone(self),
        };
        if self.is_shutting_down() {
            return Err(Error::ServiceShutdown);
        }
        Ok(guard)
    }

    /// Gracefully stops the service.
    ///
    /// - Refuses new generations.
    /// - Waits up to `shutdown_timeout` for in-flight ones to finish.
    /// - Cancels the shared token so the remaining ones stop.
    pub async fn shutdown(&self) {
        // === Phase 0: Stop accepting new requests ===
        tracing::info!("Refusing new requests");
        self.accepting.store(false, Ordering::Release);

        // === Phase 1: Wait for in-flight generations to drain ===
        tracing::info!("Draining in-flight generations ({} active)", self.inflight());
        let drain_result = timeout(self.shutdown_timeout, async {
            while self.inflight() > 0 {
                sleep(Duration::from_millis(100)).await;
            }
        })
        .await;

        match drain_result {
            Ok(()) => tracing::debug!("All in-flight generations drained"),
            Err(_) => tracing::warn!(
                "Graceful drain timed out ({} generations still active)",
                self.inflight()
            ),
        }

        // === Phase 2: Cancel any remaining work ===
        tracing::debug!("Cancelling remaining work via shutdown token");
        self.shutdown_token.cancel();
    }
}

/// Keeps a generation counted as in flight until dropped.
#[derive(Debug)]
pub struct InflightGuard {
    lifecycle: Arc<Lifecycle>,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.lifecycle.inflight.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_track_inflight_work() {
        let lifecycle = Arc::new(Lifecycle::new(Duration::from_millis(10)));
        let a = lifecycle.begin().unwrap();
        let b = lifecycle.begin().unwrap();
        assert_eq!(lifecycle.inflight(), 2);
        drop(a);
        assert_eq!(lifecycle.inflight(), 1);
        drop(b);
        assert_eq!(lifecycle.inflight(), 0);
    }

    #[tokio::test]
    async fn shutdown_refuses_new_work_and_cancels() {
        let lifecycle = Arc::new(Lifecycle::new(Duration::from_millis(10)));
        lifecycle.shutdown().await;

        assert!(lifecycle.token().is_cancelled());
        assert_eq!(lifecycle.begin().unwrap_err(), Error::ServiceShutdown);
        assert_eq!(lifecycle.inflight(), 0);
    }

    #[tokio::test]
    async fn shutdown_waits_for_drain() {
        let lifecycle = Arc::new(Lifecycle::new(Duration::from_secs(5)));
        let guard = lifecycle.begin().unwrap();

        let releaser = tokio::spawn(async move {
            sleep(Duration::from_millis(150)).await;
            drop(guard);
        });

        lifecycle.shutdown().await;
        assert_eq!(lifecycle.inflight(), 0);
        assert!(lifecycle.token().is_cancelled());
        releaser.await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_cancels_after_timeout() {
        let lifecycle = Arc::new(Lifecycle::new(Duration::from_millis(50)));
        let _stuck = lifecycle.begin().unwrap();

        lifecycle.shutdown().await;
        assert_eq!(lifecycle.inflight(), 1);
        assert!(lifecycle.token().is_cancelled());
    }
}
