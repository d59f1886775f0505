//! Aggregation runner
//!
//! Executes an ordered list of queries against a document store.

use super::types::AggregationQuery;
use crate::error::{Error, Result};
use crate::store::DocumentStore;
use crate::types::Record;
use serde::Serialize;
use std::time::Instant;

/// Rows produced by one query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Query name
    pub name: String,
    /// Report heading
    pub title: String,
    /// Collection queried
    pub collection: String,
    /// Result rows, in pipeline output order
    pub rows: Vec<Record>,
    /// Execution time in milliseconds
    pub duration_ms: u64,
}

/// Runs read-only queries against a document store
pub struct AggregationRunner<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: DocumentStore + ?Sized> AggregationRunner<'a, S> {
    /// Create a runner
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Run every query in order, stopping at the first failure
    pub async fn run(&self, queries: &[AggregationQuery]) -> Result<Vec<QueryResult>> {
        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            results.push(self.run_one(query).await?);
        }
        Ok(results)
    }

    /// Run a single query.
    ///
    /// A missing collection is an error rather than an empty result.
    pub async fn run_one(&self, query: &AggregationQuery) -> Result<QueryResult> {
        query
            .pipeline
            .validate()
            .map_err(|e| Error::query(&query.name, e.to_string()))?;

        if !self.store.entity_exists(&query.collection).await? {
            return Err(Error::CollectionNotFound {
                collection: query.collection.clone(),
            });
        }

        let start = Instant::now();
        let rows = self
            .store
            .aggregate(&query.collection, &query.pipeline)
            .await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            "Query '{}' on '{}' returned {} rows in {}ms",
            query.name,
            query.collection,
            rows.len(),
            duration_ms
        );

        Ok(QueryResult {
            name: query.name.clone(),
            title: query.heading().to_string(),
            collection: query.collection.clone(),
            rows,
            duration_ms,
        })
    }
}
