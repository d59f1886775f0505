//! Embedded DuckDB relational store
//!
//! Same table layout and insert semantics as the PostgreSQL store, without
//! a server. Used in memory for dry runs and the end-to-end tests.

use super::sql::{self, Dialect, SqlValue};
use super::{BatchOutcome, TargetStore};
use crate::error::{Error, Result};
use crate::index::IndexSpec;
use crate::schema::EntitySchema;
use crate::types::{Record, StoreKind};
use async_trait::async_trait;
use duckdb::types::Value;
use duckdb::{params, params_from_iter, Connection};
use std::sync::{Mutex, MutexGuard};

/// In-memory DuckDB database
pub struct DuckDbStore {
    conn: Mutex<Connection>,
    location: String,
}

impl DuckDbStore {
    /// Open a fresh in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::connection(format!("Failed to create DuckDB connection: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
            location: ":memory:".to_string(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Other("DuckDB connection lock poisoned".to_string()))
    }
}

fn to_value(value: SqlValue) -> Value {
    match value {
        SqlValue::Text(Some(s)) => Value::Text(s),
        SqlValue::Int(Some(i)) => Value::BigInt(i),
        SqlValue::Float(Some(f)) => Value::Double(f),
        SqlValue::Date(Some(d)) => Value::Text(d.format("%Y-%m-%d").to_string()),
        SqlValue::Text(None) | SqlValue::Int(None) | SqlValue::Float(None) | SqlValue::Date(None) => {
            Value::Null
        }
    }
}

#[async_trait]
impl TargetStore for DuckDbStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Relational
    }

    fn describe(&self) -> String {
        format!("DuckDB {}", self.location)
    }

    async fn entity_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = self.lock()?.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn create_entity(&self, schema: &EntitySchema) -> Result<()> {
        let ddl = sql::create_table(schema, Dialect::DuckDb)?;
        tracing::debug!("{}", ddl);
        self.lock()?.execute_batch(&ddl)?;
        Ok(())
    }

    async fn insert_batch(
        &self,
        schema: &EntitySchema,
        records: &[Record],
    ) -> Result<BatchOutcome> {
        if records.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let values: Vec<Value> = sql::batch_values(schema, records)?
            .into_iter()
            .map(to_value)
            .collect();
        let statement = sql::insert_rows(schema, records.len(), Dialect::DuckDb);

        let inserted = self
            .lock()?
            .execute(&statement, params_from_iter(values))?;

        Ok(BatchOutcome {
            inserted,
            conflicts: records.len().saturating_sub(inserted),
        })
    }

    async fn create_index(&self, entity: &str, index: &IndexSpec) -> Result<()> {
        self.lock()?
            .execute_batch(&sql::create_index(entity, index))
            .map_err(|e| Error::index(entity, e.to_string()))
    }

    async fn count(&self, entity: &str) -> Result<u64> {
        let count: i64 =
            self.lock()?
                .query_row(&format!("SELECT COUNT(*) FROM {entity}"), [], |row| row.get(0))?;
        Ok(count as u64)
    }

    async fn close(&self) -> Result<()> {
        tracing::debug!("Closing DuckDB {}", self.location);
        Ok(())
    }
}
