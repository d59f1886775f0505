//! Pipeline types

use crate::aggregate::{AggregationQuery, QueryResult};
use crate::index::IndexSpec;
use crate::ingest::{LoadConfig, LoadReport};
use crate::schema::{EntitySchema, ProvisionReport};
use crate::types::{Record, StoreKind};
use serde::Serialize;

/// One entity to provision, load and index
#[derive(Debug, Clone)]
pub struct EntityLoad {
    pub schema: EntitySchema,
    pub records: Vec<Record>,
    pub indexes: Vec<IndexSpec>,
}

impl EntityLoad {
    /// Create an entity load
    pub fn new(schema: EntitySchema, records: Vec<Record>, indexes: Vec<IndexSpec>) -> Self {
        Self {
            schema,
            records,
            indexes,
        }
    }
}

/// Everything a pipeline run needs besides the store
#[derive(Debug, Clone)]
pub struct PipelinePlan {
    /// Store family the plan targets
    pub kind: StoreKind,
    /// Entities in provisioning order (referenced tables first)
    pub entities: Vec<EntityLoad>,
    /// Queries run after loading (document pipeline only)
    pub queries: Vec<AggregationQuery>,
    /// Batch settings
    pub load: LoadConfig,
}

impl PipelinePlan {
    /// Schemas in provisioning order
    pub fn schemas(&self) -> Vec<EntitySchema> {
        self.entities.iter().map(|e| e.schema.clone()).collect()
    }

    /// Total records across every entity
    pub fn record_count(&self) -> usize {
        self.entities.iter().map(|e| e.records.len()).sum()
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Store family
    pub pipeline: StoreKind,
    /// Store description (no secrets)
    pub store: String,
    /// Entities created or found
    pub provision: ProvisionReport,
    /// Per-entity load statistics
    pub loads: Vec<LoadReport>,
    /// Index declarations issued
    pub indexes_declared: usize,
    /// Query results in execution order
    pub queries: Vec<QueryResult>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl PipelineReport {
    /// Records written across every entity
    pub fn records_written(&self) -> usize {
        self.loads.iter().map(|l| l.records_written).sum()
    }

    /// Batches skipped across every entity
    pub fn batches_failed(&self) -> usize {
        self.loads.iter().map(|l| l.batches_failed).sum()
    }
}
