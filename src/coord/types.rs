//! Core types for keyed request coordination

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// A request currently in flight, tracked by key
///
/// At most one of these exists per key; installing a new operation for a
/// key first retires (cancels) the existing one.
#[derive(Debug, Clone)]
pub struct ActiveOperation {
    /// Caller-chosen key identifying the logical request
    pub key: String,
    /// Process-unique id guarding table removal: a finishing operation
    /// only removes the entry it installed, never a successor's
    pub op_id: u64,
    /// Shared cancellation signal observed by the in-flight work
    pub token: CancellationToken,
    /// When the operation was installed
    pub started_at: Instant,
    /// Free-form description for logging, not used for logic
    pub query_label: String,
}

/// Immutable historical entry describing how a past operation ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub key: String,
    /// Wall-clock time from installation to terminal state
    pub duration_ms: u64,
    /// True if the operation ended via cancellation rather than running
    /// to normal completion
    pub cancelled: bool,
    pub recorded_at: DateTime<Utc>,
}

impl CompletionRecord {
    pub fn new(key: impl Into<String>, duration_ms: u64, cancelled: bool) -> Self {
        Self {
            key: key.into(),
            duration_ms,
            cancelled,
            recorded_at: Utc::now(),
        }
    }
}

/// Point-in-time snapshot of coordinator activity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoordinatorStats {
    /// Requests currently in flight
    pub active: usize,
    /// Completion records retained in history
    pub completed: usize,
    /// Mean duration over retained records; 0 when history is empty
    pub avg_duration_ms: f64,
    /// Fraction of retained records that ended via cancellation;
    /// 0 when history is empty
    pub cancel_rate: f64,
}
