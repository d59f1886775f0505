//! Tests for the pipeline module

use super::*;
use crate::aggregate::{AggregationQuery, Pipeline};
use crate::config::LoaderSettings;
use crate::error::{Error, Result};
use crate::index::IndexSpec;
use crate::schema::EntitySchema;
use crate::source::{parse_catalog, ContentCatalog};
use crate::store::{BatchOutcome, DocumentStore, DuckDbStore, MemoryDocumentStore, TargetStore};
use crate::types::{OnBatchError, Record, StoreKind};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};

/// Memory store that remembers whether it was closed
#[derive(Default)]
struct ClosingStore {
    inner: MemoryDocumentStore,
    closed: AtomicBool,
}

#[async_trait]
impl TargetStore for ClosingStore {
    fn kind(&self) -> StoreKind {
        self.inner.kind()
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }

    async fn entity_exists(&self, name: &str) -> Result<bool> {
        self.inner.entity_exists(name).await
    }

    async fn create_entity(&self, schema: &EntitySchema) -> Result<()> {
        self.inner.create_entity(schema).await
    }

    async fn insert_batch(&self, schema: &EntitySchema, records: &[Record]) -> Result<BatchOutcome> {
        self.inner.insert_batch(schema, records).await
    }

    async fn create_index(&self, entity: &str, index: &IndexSpec) -> Result<()> {
        self.inner.create_index(entity, index).await
    }

    async fn count(&self, entity: &str) -> Result<u64> {
        self.inner.count(entity).await
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Err(Error::connection("already gone"))
    }
}

#[async_trait]
impl DocumentStore for ClosingStore {
    async fn aggregate(&self, collection: &str, pipeline: &Pipeline) -> Result<Vec<Record>> {
        self.inner.aggregate(collection, pipeline).await
    }
}

fn content() -> ContentCatalog {
    parse_catalog(
        r#"{
            "movies": [
                {"content_id": "m1", "title": "A", "genre": ["Drama"], "release_year": 2020, "rating": 4, "views_count": 10, "production_budget": 1000},
                {"content_id": "m2", "title": "B", "genre": ["Action"], "release_year": 2020, "rating": 2, "views_count": 20, "production_budget": 3000},
                {"content_id": "m3", "title": "C", "genre": ["Drama", "Comedy"], "release_year": 2021, "rating": 5, "views_count": 5, "production_budget": 500}
            ],
            "series": [
                {"content_id": "s1", "title": "D", "genre": ["Crime"], "seasons": 6, "total_views": 150000, "production_budget": 50000000, "episodes_per_season": [10, 10, 10, 10, 10, 10]}
            ]
        }"#,
        "content.json",
    )
    .unwrap()
}

fn rows(value: serde_json::Value) -> Vec<Record> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_object().unwrap().clone())
        .collect()
}

#[test]
fn test_empty_catalog_is_rejected() {
    let err = document_plan(ContentCatalog::default(), Vec::new(), &LoaderSettings::default())
        .unwrap_err();
    assert!(matches!(err, Error::EmptyInput { .. }));
}

#[test]
fn test_empty_tables_are_rejected() {
    let err = relational_plan(Vec::new(), Vec::new(), &LoaderSettings::default()).unwrap_err();
    assert!(matches!(err, Error::EmptyInput { .. }));
}

#[test]
fn test_default_policies() {
    let settings = LoaderSettings::default();
    let documents = document_plan(content(), Vec::new(), &settings).unwrap();
    let relational = relational_plan(rows(json!([{"user_id": "u1"}])), Vec::new(), &settings).unwrap();

    assert_eq!(documents.load.on_error, OnBatchError::Abort);
    assert_eq!(relational.load.on_error, OnBatchError::Skip);
    assert_eq!(documents.queries.len(), 4);

    let overridden = LoaderSettings {
        batch_size: 50,
        on_batch_error: Some(OnBatchError::Skip),
    };
    let documents = document_plan(content(), Vec::new(), &overridden).unwrap();
    assert_eq!(documents.load.on_error, OnBatchError::Skip);
    assert_eq!(documents.load.batch_size, 50);
}

#[tokio::test]
async fn test_document_pipeline_end_to_end() {
    let store = MemoryDocumentStore::new();
    let plan = document_plan(content(), Vec::new(), &LoaderSettings::default()).unwrap();

    let report = run_documents(&store, &plan).await.unwrap();

    assert_eq!(report.provision.created, vec!["movies", "series"]);
    assert_eq!(report.records_written(), 4);
    assert_eq!(report.indexes_declared, 6);
    assert_eq!(report.queries.len(), 4);
    assert_eq!(
        report.queries[0].rows,
        rows(json!([
            {"_id": 2020, "avg_rating": 3.0, "avg_budget": 2000.0},
            {"_id": 2021, "avg_rating": 5.0, "avg_budget": 500.0}
        ]))
    );
    assert_eq!(report.queries[2].rows.len(), 1);
    assert_eq!(report.queries[3].rows[0]["total_episodes"], json!(60));
}

#[tokio::test]
async fn test_document_pipeline_rerun_is_idempotent() {
    let store = MemoryDocumentStore::new();
    let plan = document_plan(content(), Vec::new(), &LoaderSettings::default()).unwrap();

    run_documents(&store, &plan).await.unwrap();
    let second = run_documents(&store, &plan).await.unwrap();

    assert_eq!(second.provision.existing, vec!["movies", "series"]);
    assert_eq!(second.records_written(), 0);
    assert_eq!(store.count("movies").await.unwrap(), 3);
}

#[tokio::test]
async fn test_store_closed_after_failure() {
    let store = ClosingStore::default();
    let broken = AggregationQuery::new("broken", "", "movies", Pipeline::new());
    let plan = document_plan(content(), vec![broken], &LoaderSettings::default()).unwrap();

    let err = run_documents(&store, &plan).await.unwrap_err();

    assert!(store.closed.load(Ordering::SeqCst));
    // the close error does not replace the query error
    assert!(matches!(err, Error::Query { ref query, .. } if query == "broken"));
}

#[tokio::test]
async fn test_relational_pipeline_with_duckdb() {
    let store = DuckDbStore::open_in_memory().unwrap();
    let users = rows(json!([
        {"user_id": "u1", "age": 30, "registration_date": "2023-01-15"},
        {"user_id": "u2", "age": 41}
    ]));
    let sessions = rows(json!([
        {"session_id": "s1", "user_id": "u1", "content_id": "m1", "watch_duration_minutes": 90},
        {"session_id": "s2", "user_id": "u2", "completion_percentage": 55.5}
    ]));
    let plan = relational_plan(users, sessions, &LoaderSettings::default()).unwrap();

    let report = run_relational(&store, &plan).await.unwrap();

    assert_eq!(report.pipeline, StoreKind::Relational);
    assert_eq!(report.provision.created, vec!["users", "viewing_sessions"]);
    assert_eq!(report.records_written(), 4);
    assert_eq!(report.indexes_declared, 2);
    assert!(report.queries.is_empty());
}
