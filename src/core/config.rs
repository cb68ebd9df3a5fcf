use crate::core::errors::{CoordinatorError, Result};
use serde::{Deserialize, Serialize};

/// Coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Maximum completion records retained; oldest entries are evicted
    /// first when a new record pushes the history past this bound
    pub max_history: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self { max_history: 100 }
    }
}

impl CoordinatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_history == 0 {
            return Err(CoordinatorError::configuration_field(
                "max_history must be greater than 0",
                "max_history",
            ));
        }
        Ok(())
    }

    /// Override the retained-history bound
    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = CoordinatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_history, 100);
    }

    #[test]
    fn test_zero_history_rejected() {
        let config = CoordinatorConfig::default().with_max_history(0);
        let err = config.validate().unwrap_err();
        assert_eq!(err.category(), "configuration");
    }
}
