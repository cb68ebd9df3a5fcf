// Core infrastructure modules shared by the coordination layer

pub mod config;
pub mod errors;

// Re-export commonly used types
pub use config::CoordinatorConfig;
pub use errors::{CoordinatorError, Result};
