//! Batch loader
//!
//! Splits a record sequence into contiguous chunks and inserts them one at
//! a time, in source order.

use super::types::{LoadConfig, LoadReport};
use crate::error::{Error, Result};
use crate::schema::EntitySchema;
use crate::store::TargetStore;
use crate::types::{OnBatchError, Record};
use std::time::Instant;

/// Inserts records into a store in fixed-size batches
pub struct BatchLoader<'a, S: TargetStore + ?Sized> {
    store: &'a S,
    config: LoadConfig,
}

impl<'a, S: TargetStore + ?Sized> BatchLoader<'a, S> {
    /// Create a loader
    pub fn new(store: &'a S, config: LoadConfig) -> Self {
        Self { store, config }
    }

    /// Current configuration
    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Load every record into the schema's entity.
    ///
    /// An empty record slice issues no store call. A failing batch is
    /// handled per the configured policy, except connectivity errors, which
    /// always stop the load.
    pub async fn load(&self, schema: &EntitySchema, records: &[Record]) -> Result<LoadReport> {
        let start = Instant::now();
        let mut report = LoadReport::new(&schema.name);
        report.records_seen = records.len();

        if records.is_empty() {
            tracing::info!("No records for '{}', nothing to load", schema.name);
            return Ok(report);
        }

        let batch_size = self.config.batch_size.max(1);
        let total_batches = records.len().div_ceil(batch_size);

        for (i, chunk) in records.chunks(batch_size).enumerate() {
            let batch = i + 1;
            report.batches_issued += 1;

            match self.store.insert_batch(schema, chunk).await {
                Ok(outcome) => {
                    tracing::debug!(
                        "Batch {}/{} into '{}': {} written, {} conflicts",
                        batch,
                        total_batches,
                        schema.name,
                        outcome.inserted,
                        outcome.conflicts
                    );
                    report.records_written += outcome.inserted;
                    report.conflicts += outcome.conflicts;
                }
                Err(e) if e.is_connectivity() => return Err(e),
                Err(e) => match self.config.on_error {
                    OnBatchError::Abort => {
                        return Err(Error::batch_write(&schema.name, batch, e.to_string()));
                    }
                    OnBatchError::Skip => {
                        tracing::warn!(
                            "Skipping batch {}/{} into '{}' ({} records): {}",
                            batch,
                            total_batches,
                            schema.name,
                            chunk.len(),
                            e
                        );
                        report.batches_failed += 1;
                    }
                },
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Loaded '{}': {} of {} records written, {} conflicts, {} failed batches",
            schema.name,
            report.records_written,
            report.records_seen,
            report.conflicts,
            report.batches_failed
        );

        Ok(report)
    }
}
