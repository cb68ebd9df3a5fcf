//! RequestCoordinator - keyed request lifecycle and cancellation
//!
//! The coordinator tracks in-flight operations by caller-supplied key,
//! guarantees at most one live operation per key by cancelling any
//! predecessor sharing that key, and records completion statistics.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use dashmap::DashMap;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::coord::observer::RequestObserver;
use crate::coord::types::{ActiveOperation, CompletionRecord, CoordinatorStats};
use crate::core::config::CoordinatorConfig;
use crate::core::errors::{signals_cancellation, CoordinatorError};

/// Most-recent record count kept by the manual [`trim_history`] hook,
/// independent of the automatic insertion-time bound
///
/// [`trim_history`]: RequestCoordinator::trim_history
const MANUAL_TRIM_LIMIT: usize = 50;

/// Keys are truncated to this many characters in log lines
const KEY_LOG_LEN: usize = 12;

/// Coordinator for keyed in-flight requests
///
/// Constructed once by the application's composition root and shared via
/// `Arc`; its public operations are the sole mutation surface over the
/// active table and the completion history.
pub struct RequestCoordinator {
    config: CoordinatorConfig,
    /// Active operations by key; at most one entry per key
    active: DashMap<String, ActiveOperation>,
    /// Bounded FIFO of completion records, oldest first
    history: Mutex<VecDeque<CompletionRecord>>,
    next_op_id: AtomicU64,
    observers: Vec<Arc<dyn RequestObserver>>,
}

impl RequestCoordinator {
    /// Create a coordinator with default configuration
    pub fn new() -> Self {
        Self {
            config: CoordinatorConfig::default(),
            active: DashMap::new(),
            history: Mutex::new(VecDeque::new()),
            next_op_id: AtomicU64::new(1),
            observers: Vec::new(),
        }
    }

    /// Create a coordinator with a validated configuration
    pub fn with_config(config: CoordinatorConfig) -> Result<Self, CoordinatorError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Install a lifecycle observer
    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Start tracking an operation for `key`, cancelling any predecessor
    ///
    /// A superseded predecessor is cancelled and its completion record
    /// written in the same non-suspending mutation that installs the new
    /// entry. Returns the fresh token so the caller's asynchronous work
    /// can observe cancellation.
    pub async fn begin(&self, key: &str, query_label: &str) -> CancellationToken {
        self.install(key, query_label).await.0
    }

    async fn install(&self, key: &str, query_label: &str) -> (CancellationToken, u64) {
        let token = CancellationToken::new();
        let op_id = self.next_op_id.fetch_add(1, Ordering::Relaxed);
        let op = ActiveOperation {
            key: key.to_string(),
            op_id,
            token: token.clone(),
            started_at: Instant::now(),
            query_label: query_label.to_string(),
        };

        // Swap the successor in and retire any predecessor as one table
        // operation. No awaits until both are bookkept, so a concurrent
        // begin for the same key can never strand a live, un-cancelled
        // operation outside the table.
        let superseded = self.active.insert(key.to_string(), op).map(|prev| {
            prev.token.cancel();
            let duration_ms = prev.started_at.elapsed().as_millis() as u64;
            self.push_record(CompletionRecord::new(key, duration_ms, true));
            info!(
                "Cancelled request {} after {}ms ({})",
                short_key(key),
                duration_ms,
                prev.query_label
            );
            duration_ms
        });

        info!("Starting request {} ({})", short_key(key), query_label);

        if let Some(duration_ms) = superseded {
            for observer in &self.observers {
                observer.on_cancelled(key, duration_ms).await;
            }
        }
        for observer in &self.observers {
            observer.on_begin(key, query_label).await;
        }

        (token, op_id)
    }

    /// Cancel the active operation for `key`, if any
    ///
    /// No-op on unknown keys. Triggering an already-triggered token is
    /// safe, so repeated calls for the same key are harmless.
    pub async fn cancel(&self, key: &str) {
        let Some((_, op)) = self.active.remove(key) else {
            debug!("Cancel for {} ignored, no active operation", short_key(key));
            return;
        };

        op.token.cancel();
        let duration_ms = op.started_at.elapsed().as_millis() as u64;
        self.push_record(CompletionRecord::new(key, duration_ms, true));

        info!(
            "Cancelled request {} after {}ms ({})",
            short_key(key),
            duration_ms,
            op.query_label
        );
        for observer in &self.observers {
            observer.on_cancelled(key, duration_ms).await;
        }
    }

    /// Cancel every active operation
    ///
    /// Iterates over a snapshot of the keys so cancellation records landing
    /// in history never race the table walk.
    pub async fn cancel_all(&self) {
        let keys: Vec<String> = self.active.iter().map(|entry| entry.key().clone()).collect();
        if keys.is_empty() {
            return;
        }

        info!("Cancelling all {} active requests", keys.len());
        for key in keys {
            self.cancel(&key).await;
        }
    }

    /// Run caller-supplied work under cancellation and lifecycle bookkeeping
    ///
    /// Returns `Ok(Some(value))` when the work settles normally,
    /// `Ok(None)` when the operation was cancelled (the token fired, or the
    /// work returned [`CoordinatorError::Cancelled`]), and `Err` with the
    /// work's failure unchanged otherwise. Cancellation is a normal
    /// outcome, never an error. Only success and explicit cancellation
    /// produce history records; plain failures do not.
    ///
    /// The token is advisory for the work itself, but a token triggered
    /// while the work is still running also aborts it here by dropping its
    /// future. Work only needs to observe the token when it must release
    /// resources or report cancellation on its own.
    pub async fn run_with_cancellation<T, F, Fut>(
        &self,
        key: &str,
        query_label: &str,
        work: F,
    ) -> Result<Option<T>>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let (token, op_id) = self.install(key, query_label).await;
        let started = Instant::now();

        tokio::select! {
            result = work(token.clone()) => match result {
                Ok(value) => {
                    // The table entry may already belong to a successor
                    // installed by a later begin; retire only our own.
                    self.retire(key, op_id);
                    let duration_ms = started.elapsed().as_millis() as u64;
                    self.push_record(CompletionRecord::new(key, duration_ms, false));

                    debug!("Request {} completed in {}ms", short_key(key), duration_ms);
                    for observer in &self.observers {
                        observer.on_completed(key, duration_ms).await;
                    }
                    Ok(Some(value))
                }
                Err(err) => {
                    self.retire(key, op_id);
                    if signals_cancellation(&err) {
                        debug!("Request {} reported cancellation", short_key(key));
                        Ok(None)
                    } else {
                        Err(err)
                    }
                }
            },
            _ = token.cancelled() => {
                self.retire(key, op_id);
                debug!("Request {} cancelled while in flight", short_key(key));
                Ok(None)
            }
        }
    }

    /// Number of operations currently in flight
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Snapshot of activity and completion statistics
    pub fn stats(&self) -> CoordinatorStats {
        // Release the history lock before touching the active table.
        let (completed, avg_duration_ms, cancel_rate) = {
            let history = self.lock_history();
            let completed = history.len();
            if completed == 0 {
                (0, 0.0, 0.0)
            } else {
                let total_ms: u64 = history.iter().map(|record| record.duration_ms).sum();
                let cancelled = history.iter().filter(|record| record.cancelled).count();
                (
                    completed,
                    total_ms as f64 / completed as f64,
                    cancelled as f64 / completed as f64,
                )
            }
        };

        CoordinatorStats {
            active: self.active.len(),
            completed,
            avg_duration_ms,
            cancel_rate,
        }
    }

    /// Snapshot of the completion history, oldest first
    pub fn history(&self) -> Vec<CompletionRecord> {
        self.lock_history().iter().cloned().collect()
    }

    /// Truncate the history to its most recent 50 records
    ///
    /// A manual compaction hook distinct from the automatic eviction at
    /// insertion time; the two bounds are independent. Returns the number
    /// of records evicted.
    pub fn trim_history(&self) -> usize {
        let mut history = self.lock_history();
        let excess = history.len().saturating_sub(MANUAL_TRIM_LIMIT);
        if excess > 0 {
            history.drain(..excess);
            info!("Trimmed {} completion records", excess);
        }
        excess
    }

    /// Remove the table entry for `key` only if it still belongs to the
    /// operation identified by `op_id`
    fn retire(&self, key: &str, op_id: u64) -> bool {
        self.active
            .remove_if(key, |_, op| op.op_id == op_id)
            .is_some()
    }

    fn push_record(&self, record: CompletionRecord) {
        let mut history = self.lock_history();
        history.push_back(record);
        while history.len() > self.config.max_history {
            history.pop_front();
        }
    }

    // The lock is only ever held for synchronous bookkeeping, never across
    // an await.
    fn lock_history(&self) -> MutexGuard<'_, VecDeque<CompletionRecord>> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RequestCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncate a key for log readability
fn short_key(key: &str) -> &str {
    match key.char_indices().nth(KEY_LOG_LEN) {
        Some((idx, _)) => &key[..idx],
        None => key,
    }
}
