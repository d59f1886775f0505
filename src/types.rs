//! Common types used throughout the catalog loader
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// A single record flowing through the pipeline.
///
/// Documents and rows share this representation; the entity schema decides
/// how a store interprets it.
pub type Record = JsonObject;

// ============================================================================
// Store Kind
// ============================================================================

/// The family of store a pipeline writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Schema-flexible document store (collections + validators)
    Document,
    /// Normalized relational store (tables + constraints)
    Relational,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKind::Document => write!(f, "document"),
            StoreKind::Relational => write!(f, "relational"),
        }
    }
}

// ============================================================================
// Sort Order
// ============================================================================

/// Direction of an index key or sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl SortOrder {
    /// MongoDB direction value (1 / -1)
    pub fn direction(self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }

    /// SQL keyword
    pub fn sql_keyword(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }

    /// Short suffix used in generated index names
    pub fn suffix(self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

// ============================================================================
// Batch Failure Policy
// ============================================================================

/// What the batch loader does when a single batch insert fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnBatchError {
    /// Propagate the error and stop the load
    Abort,
    /// Log the failure, count it, and continue with the next batch
    Skip,
}

impl std::str::FromStr for OnBatchError {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(OnBatchError::Abort),
            "skip" => Ok(OnBatchError::Skip),
            other => Err(format!("expected 'abort' or 'skip', got '{other}'")),
        }
    }
}
