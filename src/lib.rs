// Core infrastructure modules
pub mod core;

// Keyed request coordination
pub mod coord;

// Re-exports for convenience
pub use crate::coord::{
    ActiveOperation, CompletionRecord, CoordinatorStats, LoggingObserver, RequestCoordinator,
    RequestObserver,
};
pub use crate::core::config::CoordinatorConfig;
pub use crate::core::errors::{CoordinatorError, Result};

// Re-export the token type so callers don't need a direct tokio-util
// dependency to hold one.
pub use tokio_util::sync::CancellationToken;

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingObserver {
        begun: AtomicUsize,
        completed: AtomicUsize,
        cancelled: AtomicUsize,
    }

    #[async_trait]
    impl RequestObserver for CountingObserver {
        async fn on_begin(&self, _key: &str, _query_label: &str) {
            self.begun.fetch_add(1, Ordering::Relaxed);
        }

        async fn on_completed(&self, _key: &str, _duration_ms: u64) {
            self.completed.fetch_add(1, Ordering::Relaxed);
        }

        async fn on_cancelled(&self, _key: &str, _duration_ms: u64) {
            self.cancelled.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[tokio::test]
    async fn search_session_lifecycle() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let observer = Arc::new(CountingObserver::default());
        let coordinator = Arc::new(RequestCoordinator::new().with_observer(observer.clone()));

        // Each keystroke supersedes the previous fetch for the session.
        let stale = coordinator.begin("session-1", "rust").await;
        coordinator.begin("session-1", "rust async").await;
        assert!(stale.is_cancelled());
        assert_eq!(coordinator.active_count(), 1);

        // The user settles on a query and it runs to completion.
        coordinator.cancel("session-1").await;
        let results = coordinator
            .run_with_cancellation("session-1", "rust async cancellation", |_token| async {
                anyhow::Ok(vec!["keyflight"])
            })
            .await
            .unwrap();
        assert_eq!(results, Some(vec!["keyflight"]));

        // Two more sessions are torn down at shutdown.
        coordinator.begin("session-2", "tokio").await;
        coordinator.begin("session-3", "dashmap").await;
        coordinator.cancel_all().await;
        assert_eq!(coordinator.active_count(), 0);

        let stats = coordinator.stats();
        assert_eq!(stats.completed, 5);
        assert_eq!(stats.cancel_rate, 0.8);

        assert_eq!(observer.begun.load(Ordering::Relaxed), 5);
        assert_eq!(observer.completed.load(Ordering::Relaxed), 1);
        assert_eq!(observer.cancelled.load(Ordering::Relaxed), 4);
    }

    #[tokio::test]
    async fn work_observing_its_token_stops_early() {
        let coordinator = Arc::new(RequestCoordinator::new());

        let worker = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .run_with_cancellation("session-1", "slow fetch", |token| async move {
                        // Cooperative work: wait on whichever finishes first.
                        tokio::select! {
                            _ = token.cancelled() => {
                                Err(CoordinatorError::cancelled("session-1").into())
                            }
                            _ = std::future::pending::<()>() => {
                                anyhow::Ok("unreachable")
                            }
                        }
                    })
                    .await
            })
        };

        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        coordinator.cancel("session-1").await;

        assert_eq!(worker.await.unwrap().unwrap(), None);
        assert_eq!(coordinator.active_count(), 0);
    }
}
