//! Error types for the catalog loader
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for the catalog loader
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Input Errors
    // ============================================================================
    #[error("Invalid input in {source_name}: {message}")]
    Input {
        source_name: String,
        message: String,
    },

    #[error("No records to load: {message}")]
    EmptyInput { message: String },

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    // ============================================================================
    // Store Errors
    // ============================================================================
    #[error("Store unreachable: {message}")]
    Connection { message: String },

    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("Schema error for '{entity}': {message}")]
    Schema { entity: String, message: String },

    #[error("Document rejected by '{entity}' validator: {message}")]
    Validation { entity: String, message: String },

    #[error("Batch {batch} into '{entity}' failed: {message}")]
    BatchWrite {
        entity: String,
        batch: usize,
        message: String,
    },

    #[error("Index error on '{entity}': {message}")]
    Index { entity: String, message: String },

    // ============================================================================
    // Aggregation Errors
    // ============================================================================
    #[error("Collection '{collection}' does not exist")]
    CollectionNotFound { collection: String },

    #[error("Invalid pipeline: {message}")]
    InvalidPipeline { message: String },

    #[error("Query '{query}' failed: {message}")]
    Query { query: String, message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an input error
    pub fn input(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Input {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create an empty input error
    pub fn empty_input(message: impl Into<String>) -> Self {
        Self::EmptyInput {
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a schema error
    pub fn schema(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Create a batch write error
    pub fn batch_write(entity: impl Into<String>, batch: usize, message: impl Into<String>) -> Self {
        Self::BatchWrite {
            entity: entity.into(),
            batch,
            message: message.into(),
        }
    }

    /// Create an index error
    pub fn index(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Index {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Create an invalid pipeline error
    pub fn invalid_pipeline(message: impl Into<String>) -> Self {
        Self::InvalidPipeline {
            message: message.into(),
        }
    }

    /// Create a query error
    pub fn query(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            query: query.into(),
            message: message.into(),
        }
    }

    /// Check if this error means the store could not be reached.
    ///
    /// Connectivity errors are always fatal, whatever the batch policy.
    pub fn is_connectivity(&self) -> bool {
        match self {
            Error::Connection { .. } => true,
            Error::Mongo(e) => is_mongo_connectivity(e),
            Error::Postgres(e) => e.is_closed(),
            _ => false,
        }
    }
}

fn is_mongo_connectivity(error: &mongodb::error::Error) -> bool {
    use mongodb::error::ErrorKind;

    matches!(
        *error.kind,
        ErrorKind::Io(_) | ErrorKind::ServerSelection { .. } | ErrorKind::ConnectionPoolCleared { .. }
    )
}

/// Result type alias for the catalog loader
pub type Result<T> = std::result::Result<T, Error>;
