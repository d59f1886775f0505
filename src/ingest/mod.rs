//! Batch ingestion
//!
//! # Overview
//!
//! - `BatchLoader` - chunked, sequential inserts into any `TargetStore`
//! - `LoadConfig` - batch size and failure policy
//! - `LoadReport` - per-entity counts

mod batch;
mod types;

pub use batch::BatchLoader;
pub use types::{LoadConfig, LoadReport};
