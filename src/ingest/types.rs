//! Loader types
//!
//! Configuration and statistics for batch loading.

use crate::config::DEFAULT_BATCH_SIZE;
use crate::types::OnBatchError;
use serde::Serialize;

/// Configuration for a load operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadConfig {
    /// Maximum records per insert
    pub batch_size: usize,
    /// What to do when a batch insert fails
    pub on_error: OnBatchError,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            on_error: OnBatchError::Abort,
        }
    }
}

impl LoadConfig {
    /// Create a new load config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set batch size (values below one are raised to one)
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set the batch failure policy
    #[must_use]
    pub fn with_on_error(mut self, policy: OnBatchError) -> Self {
        self.on_error = policy;
        self
    }
}

/// Statistics from loading one entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Target entity
    pub entity: String,
    /// Records handed to the loader
    pub records_seen: usize,
    /// Records written by the store
    pub records_written: usize,
    /// Records skipped because their key already existed
    pub conflicts: usize,
    /// Insert operations issued
    pub batches_issued: usize,
    /// Insert operations that failed and were skipped
    pub batches_failed: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl LoadReport {
    /// Create an empty report for an entity
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Self::default()
        }
    }

    /// Records that were neither written nor conflicts
    pub fn records_lost(&self) -> usize {
        self.records_seen
            .saturating_sub(self.records_written + self.conflicts)
    }

    /// Whether every batch went through
    pub fn is_complete(&self) -> bool {
        self.batches_failed == 0
    }
}
