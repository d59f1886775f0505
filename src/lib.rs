// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Catalog Loader
//!
//! Batch loader for a streaming catalog. Movies and series go into MongoDB
//! collections with `$jsonSchema` validators, users and viewing sessions go
//! into PostgreSQL tables, and a set of aggregation queries validates the
//! document load.
//!
//! ## Features
//!
//! - **Provisioning**: collections and tables exist, with their constraints,
//!   before the first insert
//! - **Batched Loads**: bounded chunks, duplicate-safe on re-run
//! - **Indexes**: declared after the load, idempotent
//! - **Aggregations**: declarative pipelines rendered to MongoDB stages or
//!   evaluated in memory
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use catalog_loader::config::LoaderSettings;
//! use catalog_loader::pipeline::{document_plan, run_documents};
//! use catalog_loader::source::load_catalog;
//! use catalog_loader::store::MongoStore;
//!
//! #[tokio::main]
//! async fn main() -> catalog_loader::Result<()> {
//!     let content = load_catalog("content.json")?;
//!     let plan = document_plan(content, Vec::new(), &LoaderSettings::default())?;
//!
//!     let store = MongoStore::connect("mongodb://localhost:27017", "streaming").await?;
//!     let report = run_documents(&store, &plan).await?;
//!     println!("{} records written", report.records_written());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Pipeline                              │
//! │  provision → load (batches) → index → aggregate (documents)     │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │  Source  │  Schema   │    Ingest     │   Index   │  Aggregate  │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ JSON     │ Catalog   │ Chunking      │ Single    │ Group       │
//! │ CSV      │ Validator │ Conflicts     │ Compound  │ Match       │
//! │          │ DDL       │ Error policy  │ Unique    │ Sort/Limit  │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//!                                │
//!            TargetStore: MongoDB │ PostgreSQL │ DuckDB │ Memory
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Environment configuration
pub mod config;

/// JSON and CSV input sources
pub mod source;

/// Entity schemas and provisioning
pub mod schema;

/// Store back-ends
pub mod store;

/// Batched, duplicate-safe loading
pub mod ingest;

/// Secondary indexes
pub mod index;

/// Declarative aggregation pipelines
pub mod aggregate;

/// Pipeline plans and execution
pub mod pipeline;

/// Console reporting
pub mod report;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
