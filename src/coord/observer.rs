//! Lifecycle observer hooks
//!
//! Observers receive notifications after the coordinator's own bookkeeping
//! has completed; they never mutate coordinator state.

use async_trait::async_trait;

/// Observer of request lifecycle transitions
///
/// All methods default to no-ops so implementors only override the
/// transitions they care about.
#[async_trait]
pub trait RequestObserver: Send + Sync {
    /// Called after a new operation is installed for a key
    async fn on_begin(&self, _key: &str, _query_label: &str) {}

    /// Called after an operation runs to normal completion
    async fn on_completed(&self, _key: &str, _duration_ms: u64) {}

    /// Called after an operation is cancelled
    async fn on_cancelled(&self, _key: &str, _duration_ms: u64) {}
}

/// Observer that logs every transition
pub struct LoggingObserver;

#[async_trait]
impl RequestObserver for LoggingObserver {
    async fn on_begin(&self, key: &str, query_label: &str) {
        tracing::info!("Request began: {} ({})", key, query_label);
    }

    async fn on_completed(&self, key: &str, duration_ms: u64) {
        tracing::info!("Request completed: {} in {}ms", key, duration_ms);
    }

    async fn on_cancelled(&self, key: &str, duration_ms: u64) {
        tracing::info!("Request cancelled: {} after {}ms", key, duration_ms);
    }
}
