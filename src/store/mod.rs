//! Target stores
//!
//! A single loading pipeline drives every backend through the
//! [`TargetStore`] trait: provisioning, batch inserts, index declaration
//! and teardown. Document stores additionally run aggregation pipelines.
//!
//! # Backends
//!
//! - `MongoStore` - MongoDB collections with `$jsonSchema` validators
//! - `PostgresStore` - PostgreSQL tables with column and key constraints
//! - `DuckDbStore` - embedded DuckDB tables (dry runs and tests)
//! - `MemoryDocumentStore` - in-process document collections (dry runs and tests)

pub mod convert;
mod duckdb;
mod memory;
mod mongo;
mod postgres;
pub mod sql;

pub use self::duckdb::DuckDbStore;
pub use memory::MemoryDocumentStore;
pub use mongo::MongoStore;
pub use postgres::PostgresStore;

use crate::aggregate::Pipeline;
use crate::error::Result;
use crate::index::IndexSpec;
use crate::schema::EntitySchema;
use crate::types::{Record, StoreKind};
use async_trait::async_trait;

/// Result of one batch insert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Records written by this call
    pub inserted: usize,
    /// Records skipped because their primary key was already present
    pub conflicts: usize,
}

/// A store that can receive catalog records
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Store family
    fn kind(&self) -> StoreKind;

    /// Connection summary for logs, without secrets
    fn describe(&self) -> String;

    /// Whether a collection/table exists
    async fn entity_exists(&self, name: &str) -> Result<bool>;

    /// Create a collection/table with its validation constraints.
    ///
    /// Creating an entity that already exists must not fail.
    async fn create_entity(&self, schema: &EntitySchema) -> Result<()>;

    /// Insert one batch.
    ///
    /// Records whose primary key is already stored are skipped and counted
    /// as conflicts; any other rejection fails the whole call.
    async fn insert_batch(&self, schema: &EntitySchema, records: &[Record])
        -> Result<BatchOutcome>;

    /// Declare an index; declaring an existing index is a no-op
    async fn create_index(&self, entity: &str, index: &IndexSpec) -> Result<()>;

    /// Number of records stored in an entity
    async fn count(&self, entity: &str) -> Result<u64>;

    /// Release connections. Called once, on every exit path.
    async fn close(&self) -> Result<()>;
}

/// A schema-flexible store that can run aggregation pipelines
#[async_trait]
pub trait DocumentStore: TargetStore {
    /// Run a read-only pipeline over a collection
    async fn aggregate(&self, collection: &str, pipeline: &Pipeline) -> Result<Vec<Record>>;
}
