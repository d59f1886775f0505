//! In-process document store
//!
//! Behaves like a MongoDB database with validated collections. A batch is
//! validated as a whole before anything is written, uniqueness comes from
//! declared unique indexes, and pipelines run through the in-memory
//! evaluator.

use super::{BatchOutcome, DocumentStore, TargetStore};
use crate::aggregate::{evaluate, Pipeline};
use crate::error::{Error, Result};
use crate::index::IndexSpec;
use crate::schema::EntitySchema;
use crate::types::{JsonValue, Record, StoreKind};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
struct Collection {
    schema: EntitySchema,
    documents: Vec<Record>,
    /// Field of the unique index, once one is declared
    key_field: Option<String>,
    keys: HashSet<String>,
    indexes: Vec<String>,
}

impl Collection {
    fn declare_index(&mut self, entity: &str, index: &IndexSpec) -> Result<()> {
        if let ([key], true) = (index.keys.as_slice(), index.unique) {
            if self.key_field.as_deref() != Some(key.field.as_str()) {
                let mut keys = HashSet::new();
                for document in &self.documents {
                    let value = key_of(document, &key.field);
                    if !keys.insert(value.clone()) {
                        return Err(Error::index(
                            entity,
                            format!("duplicate key {value} for unique index on '{}'", key.field),
                        ));
                    }
                }
                self.key_field = Some(key.field.clone());
                self.keys = keys;
            }
        }

        let name = index.name(entity);
        if !self.indexes.contains(&name) {
            self.indexes.push(name);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Inner {
    collections: BTreeMap<String, Collection>,
    next_id: u64,
}

/// Document store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    inner: Mutex<Inner>,
}

impl MemoryDocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| Error::Other("memory store lock poisoned".to_string()))
    }

    /// Names of the indexes declared on a collection
    pub fn index_names(&self, entity: &str) -> Vec<String> {
        self.lock()
            .ok()
            .and_then(|inner| inner.collections.get(entity).map(|c| c.indexes.clone()))
            .unwrap_or_default()
    }

    /// Copy of every document in a collection
    pub fn documents(&self, entity: &str) -> Vec<Record> {
        self.lock()
            .ok()
            .and_then(|inner| inner.collections.get(entity).map(|c| c.documents.clone()))
            .unwrap_or_default()
    }
}

/// Unique key value of a record; a missing field keys as null
fn key_of(record: &Record, field: &str) -> String {
    record.get(field).unwrap_or(&JsonValue::Null).to_string()
}

#[async_trait]
impl TargetStore for MemoryDocumentStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Document
    }

    fn describe(&self) -> String {
        "in-memory document store".to_string()
    }

    async fn entity_exists(&self, name: &str) -> Result<bool> {
        Ok(self.lock()?.collections.contains_key(name))
    }

    async fn create_entity(&self, schema: &EntitySchema) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.collections.contains_key(&schema.name) {
            return Ok(());
        }

        let mut collection = Collection {
            schema: schema.clone(),
            documents: Vec::new(),
            key_field: None,
            keys: HashSet::new(),
            indexes: Vec::new(),
        };
        if let Some(pk) = &schema.primary_key {
            collection.declare_index(&schema.name, &IndexSpec::unique(pk))?;
        }
        inner.collections.insert(schema.name.clone(), collection);
        Ok(())
    }

    async fn insert_batch(
        &self,
        schema: &EntitySchema,
        records: &[Record],
    ) -> Result<BatchOutcome> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;
        let collection = inner
            .collections
            .get_mut(&schema.name)
            .ok_or_else(|| Error::CollectionNotFound {
                collection: schema.name.clone(),
            })?;

        // the stored validator applies, not the caller's schema
        collection
            .schema
            .validate_all(records)
            .map_err(|message| Error::validation(&schema.name, message))?;

        let mut outcome = BatchOutcome::default();
        for record in records {
            if let Some(field) = &collection.key_field {
                if !collection.keys.insert(key_of(record, field)) {
                    outcome.conflicts += 1;
                    continue;
                }
            }

            inner.next_id += 1;
            let mut document = Record::new();
            document.insert(
                "_id".to_string(),
                JsonValue::String(format!("{:024x}", inner.next_id)),
            );
            document.extend(record.iter().map(|(k, v)| (k.clone(), v.clone())));
            collection.documents.push(document);
            outcome.inserted += 1;
        }

        Ok(outcome)
    }

    async fn create_index(&self, entity: &str, index: &IndexSpec) -> Result<()> {
        self.lock()?
            .collections
            .get_mut(entity)
            .ok_or_else(|| Error::CollectionNotFound {
                collection: entity.to_string(),
            })?
            .declare_index(entity, index)
    }

    async fn count(&self, entity: &str) -> Result<u64> {
        Ok(self
            .lock()?
            .collections
            .get(entity)
            .map_or(0, |c| c.documents.len() as u64))
    }

    async fn close(&self) -> Result<()> {
        tracing::debug!("Closing in-memory document store");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn aggregate(&self, collection: &str, pipeline: &Pipeline) -> Result<Vec<Record>> {
        let documents = {
            let inner = self.lock()?;
            inner
                .collections
                .get(collection)
                .map(|c| c.documents.clone())
                .ok_or_else(|| Error::CollectionNotFound {
                    collection: collection.to_string(),
                })?
        };
        Ok(evaluate(pipeline, documents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog;
    use serde_json::json;

    fn movie(id: &str) -> Record {
        json!({"content_id": id, "title": "T", "genre": ["Drama"]})
            .as_object()
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn test_duplicate_keys_are_conflicts() {
        let store = MemoryDocumentStore::new();
        let schema = catalog::movies();
        store.create_entity(&schema).await.unwrap();

        let first = store
            .insert_batch(&schema, &[movie("m1"), movie("m2")])
            .await
            .unwrap();
        let second = store
            .insert_batch(&schema, &[movie("m2"), movie("m3")])
            .await
            .unwrap();

        assert_eq!(first, BatchOutcome { inserted: 2, conflicts: 0 });
        assert_eq!(second, BatchOutcome { inserted: 1, conflicts: 1 });
        assert_eq!(store.count("movies").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_invalid_document_fails_whole_batch() {
        let store = MemoryDocumentStore::new();
        let schema = catalog::movies();
        store.create_entity(&schema).await.unwrap();

        let mut bad = movie("m2");
        bad.remove("title");
        let result = store.insert_batch(&schema, &[movie("m1"), bad]).await;

        assert!(matches!(result, Err(Error::Validation { .. })));
        assert_eq!(store.count("movies").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unique_index_declared_later_dedups() {
        let store = MemoryDocumentStore::new();
        let mut keyless = catalog::movies();
        keyless.primary_key = None;
        store.create_entity(&keyless).await.unwrap();
        store.insert_batch(&keyless, &[movie("m1")]).await.unwrap();

        store
            .create_index("movies", &IndexSpec::unique("content_id"))
            .await
            .unwrap();
        let outcome = store
            .insert_batch(&keyless, &[movie("m1"), movie("m2")])
            .await
            .unwrap();

        assert_eq!(outcome, BatchOutcome { inserted: 1, conflicts: 1 });
        assert_eq!(store.count("movies").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unique_index_over_duplicates_fails() {
        let store = MemoryDocumentStore::new();
        let mut keyless = catalog::movies();
        keyless.primary_key = None;
        store.create_entity(&keyless).await.unwrap();
        store
            .insert_batch(&keyless, &[movie("m1"), movie("m1")])
            .await
            .unwrap();

        let result = store
            .create_index("movies", &IndexSpec::unique("content_id"))
            .await;

        assert!(matches!(result, Err(Error::Index { .. })));
        assert!(store.index_names("movies").is_empty());
    }

    #[tokio::test]
    async fn test_assigns_object_ids() {
        let store = MemoryDocumentStore::new();
        let schema = catalog::movies();
        store.create_entity(&schema).await.unwrap();
        store.insert_batch(&schema, &[movie("m1")]).await.unwrap();

        let docs = store.documents("movies");
        assert_eq!(docs[0]["_id"], json!("000000000000000000000001"));
        assert_eq!(docs[0]["content_id"], json!("m1"));
    }

    #[tokio::test]
    async fn test_insert_into_missing_collection() {
        let store = MemoryDocumentStore::new();
        let result = store.insert_batch(&catalog::series(), &[]).await;
        assert!(matches!(result, Err(Error::CollectionNotFound { .. })));
    }
}
