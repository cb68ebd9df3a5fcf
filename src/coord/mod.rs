//! Keyed request coordination
//!
//! The coordinator deduplicates in-flight work by key: a later request for
//! a key cancels the earlier one before installing itself, and every
//! terminal transition is recorded in a bounded completion history.

pub mod coordinator;
pub mod observer;
pub mod types;

pub use coordinator::RequestCoordinator;
pub use observer::{LoggingObserver, RequestObserver};
pub use types::{ActiveOperation, CompletionRecord, CoordinatorStats};
