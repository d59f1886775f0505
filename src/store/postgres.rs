//! PostgreSQL relational store

use super::sql::{self, Dialect, SqlValue};
use super::{BatchOutcome, TargetStore};
use crate::config::RelationalStoreConfig;
use crate::error::{Error, Result};
use crate::index::IndexSpec;
use crate::schema::{is_valid_identifier, EntitySchema};
use crate::types::{Record, StoreKind};
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};

/// Database that always exists on a PostgreSQL server
const MAINTENANCE_DATABASE: &str = "postgres";

/// Connection to the viewing-data database
pub struct PostgresStore {
    client: Client,
    connection: JoinHandle<()>,
    description: String,
}

async fn open(connection_string: &str, target: &str) -> Result<(Client, JoinHandle<()>)> {
    let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
        .await
        .map_err(|e| Error::connection(format!("Failed to connect to {target}: {e}")))?;

    let handle = tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("PostgreSQL connection error: {}", e);
        }
    });

    Ok((client, handle))
}

impl PostgresStore {
    /// Connect to the configured database
    pub async fn connect(config: &RelationalStoreConfig) -> Result<Self> {
        let (client, connection) = open(&config.connection_string(), &config.masked()).await?;
        tracing::info!("Connected to {}", config.masked());

        Ok(Self {
            client,
            connection,
            description: format!("PostgreSQL {}", config.masked()),
        })
    }

    /// Connect with a `postgresql://` URL or a key/value connection string
    pub async fn connect_url(url: &str) -> Result<Self> {
        let config: tokio_postgres::Config = url
            .parse()
            .map_err(|e| Error::invalid_value("connection string", format!("{e}")))?;
        let description = format!(
            "PostgreSQL {}@{}",
            config.get_user().unwrap_or_default(),
            config.get_dbname().unwrap_or(MAINTENANCE_DATABASE)
        );
        let (client, connection) = open(url, &description).await?;
        tracing::info!("Connected to {}", description);

        Ok(Self {
            client,
            connection,
            description,
        })
    }

    /// Create the configured database when it does not exist yet.
    ///
    /// Returns whether the database was created. Connects through the
    /// maintenance database, which is closed again before returning.
    pub async fn ensure_database(config: &RelationalStoreConfig) -> Result<bool> {
        if !is_valid_identifier(&config.database) {
            return Err(Error::invalid_value(
                "PG_DB",
                format!("'{}' is not a valid database name", config.database),
            ));
        }

        let (client, connection) = open(
            &config.connection_string_for(MAINTENANCE_DATABASE),
            MAINTENANCE_DATABASE,
        )
        .await?;

        let result = create_if_missing(&client, &config.database).await;

        drop(client);
        connection.abort();
        result
    }
}

async fn create_if_missing(client: &Client, database: &str) -> Result<bool> {
    let existing = client
        .query_opt("SELECT 1 FROM pg_database WHERE datname = $1", &[&database])
        .await?;
    if existing.is_some() {
        tracing::info!("Database '{}' already exists", database);
        return Ok(false);
    }

    client
        .batch_execute(&format!("CREATE DATABASE {database}"))
        .await?;
    tracing::info!("Created database '{}'", database);
    Ok(true)
}

fn to_param(value: SqlValue) -> Box<dyn ToSql + Sync + Send> {
    match value {
        SqlValue::Text(v) => Box::new(v),
        SqlValue::Int(v) => Box::new(v),
        SqlValue::Float(v) => Box::new(v),
        SqlValue::Date(v) => Box::new(v),
    }
}

#[async_trait]
impl TargetStore for PostgresStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Relational
    }

    fn describe(&self) -> String {
        self.description.clone()
    }

    async fn entity_exists(&self, name: &str) -> Result<bool> {
        let row = self
            .client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_name = $1)",
                &[&name],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn create_entity(&self, schema: &EntitySchema) -> Result<()> {
        let ddl = sql::create_table(schema, Dialect::Postgres)?;
        tracing::debug!("{}", ddl);
        self.client.batch_execute(&ddl).await?;
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

        let params: Vec<Box<dyn ToSql + Sync + Send>> = sql::batch_values(schema, records)?
            .into_iter()
            .map(to_param)
            .collect();
        let param_refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p.as_ref() as _).collect();

        let statement = sql::insert_rows(schema, records.len(), Dialect::Postgres);
        let inserted = self.client.execute(&statement, &param_refs).await? as usize;

        Ok(BatchOutcome {
            inserted,
            conflicts: records.len().saturating_sub(inserted),
        })
    }

    async fn create_index(&self, entity: &str, index: &IndexSpec) -> Result<()> {
        self.client
            .batch_execute(&sql::create_index(entity, index))
            .await
            .map_err(|e| Error::index(entity, e.to_string()))
    }

    async fn count(&self, entity: &str) -> Result<u64> {
        let row = self
            .client
            .query_one(&format!("SELECT COUNT(*) FROM {entity}"), &[])
            .await?;
        let count: i64 = row.get(0);
        Ok(count as u64)
    }

    async fn close(&self) -> Result<()> {
        self.connection.abort();
        tracing::info!("Closed PostgreSQL connection");
        Ok(())
    }
}
