//! Runtime configuration
//!
//! Every setting comes from environment variables (optionally pre-loaded
//! from a `.env` file). Parsing goes through a lookup function so the same
//! code serves the process environment and tests.

use crate::error::{Error, Result};
use crate::schema::catalog;
use crate::store::sql::max_batch_rows;
use crate::types::OnBatchError;
use std::path::PathBuf;

/// Default number of records per insert
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Largest batch every relational table can take in one insert statement
pub fn max_batch_size() -> usize {
    [catalog::users(), catalog::viewing_sessions()]
        .iter()
        .map(max_batch_rows)
        .min()
        .unwrap_or(DEFAULT_BATCH_SIZE)
}

/// Default content document path
pub const DEFAULT_CONTENT_JSON: &str = "content.json";

/// Read a variable from the process environment
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).ok_or_else(|| Error::missing_field(name))
}

// ============================================================================
// Store Connections
// ============================================================================

/// MongoDB connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStoreConfig {
    /// `MONGO_URI`
    pub uri: String,
    /// `MONGO_DB`
    pub database: String,
}

impl DocumentStoreConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            uri: required(lookup, "MONGO_URI")?,
            database: required(lookup, "MONGO_DB")?,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&env_lookup)
    }
}

/// PostgreSQL connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalStoreConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl RelationalStoreConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match optional(lookup, "PG_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| Error::invalid_value("PG_PORT", format!("'{raw}': {e}")))?,
            None => 5432,
        };

        Ok(Self {
            host: optional(lookup, "PG_HOST").unwrap_or_else(|| "localhost".to_string()),
            port,
            database: required(lookup, "PG_DB")?,
            user: required(lookup, "PG_USER")?,
            // an empty password is valid for trust authentication
            password: lookup("PG_PASSWORD").unwrap_or_default(),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&env_lookup)
    }

    /// Key/value connection string for the configured database
    pub fn connection_string(&self) -> String {
        self.connection_string_for(&self.database)
    }

    /// Key/value connection string for another database on the same server
    pub fn connection_string_for(&self, database: &str) -> String {
        format!(
            "host={} port={} user={} password={} dbname={}",
            quote(&self.host),
            self.port,
            quote(&self.user),
            quote(&self.password),
            quote(database)
        )
    }

    /// Connection summary safe for logs
    pub fn masked(&self) -> String {
        format!(
            "postgresql://{}:****@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

/// Quote a libpq connection string value
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

// ============================================================================
// Sources
// ============================================================================

/// Inputs of the document pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSources {
    /// `CONTENT_JSON`
    pub content_json: PathBuf,
    /// `QUERIES_FILE`, extra aggregation queries
    pub queries_file: Option<PathBuf>,
}

impl DocumentSources {
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            content_json: optional(lookup, "CONTENT_JSON")
                .unwrap_or_else(|| DEFAULT_CONTENT_JSON.to_string())
                .into(),
            queries_file: optional(lookup, "QUERIES_FILE").map(PathBuf::from),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(&env_lookup)
    }
}

/// Inputs of the relational pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularSources {
    /// `USERS_CSV`
    pub users_csv: PathBuf,
    /// `SESSIONS_CSV`
    pub sessions_csv: PathBuf,
}

impl TabularSources {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            users_csv: required(lookup, "USERS_CSV")?.into(),
            sessions_csv: required(lookup, "SESSIONS_CSV")?.into(),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&env_lookup)
    }
}

// ============================================================================
// Loader Settings
// ============================================================================

/// Settings shared by both pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderSettings {
    /// `BATCH_SIZE`
    pub batch_size: usize,
    /// `ON_BATCH_ERROR`; `None` keeps the pipeline's default
    pub on_batch_error: Option<OnBatchError>,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            on_batch_error: None,
        }
    }
}

impl LoaderSettings {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let batch_size = match optional(lookup, "BATCH_SIZE") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) => {
                    return Err(Error::invalid_value(
                        "BATCH_SIZE",
                        "must be greater than zero",
                    ))
                }
                Ok(n) if n > max_batch_size() => {
                    return Err(Error::invalid_value(
                        "BATCH_SIZE",
                        format!("{n} exceeds the maximum of {}", max_batch_size()),
                    ))
                }
                Ok(n) => n,
                Err(e) => return Err(Error::invalid_value("BATCH_SIZE", format!("'{raw}': {e}"))),
            },
            None => DEFAULT_BATCH_SIZE,
        };

        let on_batch_error = optional(lookup, "ON_BATCH_ERROR")
            .map(|raw| raw.parse::<OnBatchError>())
            .transpose()
            .map_err(|e| Error::invalid_value("ON_BATCH_ERROR", e))?;

        Ok(Self {
            batch_size,
            on_batch_error,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&env_lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_relational_defaults() {
        let lookup = lookup_from(&[("PG_DB", "streaming"), ("PG_USER", "loader")]);
        let config = RelationalStoreConfig::from_lookup(&lookup).unwrap();

        assert_eq!(
            config,
            RelationalStoreConfig {
                host: "localhost".to_string(),
                port: 5432,
                database: "streaming".to_string(),
                user: "loader".to_string(),
                password: String::new(),
            }
        );
    }

    #[test]
    fn test_relational_missing_database() {
        let lookup = lookup_from(&[("PG_USER", "loader")]);
        let err = RelationalStoreConfig::from_lookup(&lookup).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "PG_DB"));
    }

    #[test]
    fn test_relational_invalid_port() {
        let lookup = lookup_from(&[("PG_DB", "d"), ("PG_USER", "u"), ("PG_PORT", "abc")]);
        let err = RelationalStoreConfig::from_lookup(&lookup).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
    }

    #[test]
    fn test_connection_string_and_mask() {
        let config = RelationalStoreConfig {
            host: "db".to_string(),
            port: 5433,
            database: "streaming".to_string(),
            user: "loader".to_string(),
            password: "it's secret".to_string(),
        };

        assert_eq!(
            config.connection_string(),
            r"host='db' port=5433 user='loader' password='it\'s secret' dbname='streaming'"
        );
        assert_eq!(
            config.connection_string_for("postgres"),
            r"host='db' port=5433 user='loader' password='it\'s secret' dbname='postgres'"
        );
        assert_eq!(config.masked(), "postgresql://loader:****@db:5433/streaming");
        assert!(!config.masked().contains("secret"));
    }

    #[test]
    fn test_document_store_requires_uri_and_db() {
        let lookup = lookup_from(&[("MONGO_URI", "mongodb://localhost:27017")]);
        let err = DocumentStoreConfig::from_lookup(&lookup).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "MONGO_DB"));
    }

    #[test]
    fn test_document_sources_default_path() {
        let sources = DocumentSources::from_lookup(&lookup_from(&[]));
        assert_eq!(sources.content_json, PathBuf::from("content.json"));
        assert_eq!(sources.queries_file, None);
    }

    #[test]
    fn test_tabular_sources_required() {
        let lookup = lookup_from(&[("USERS_CSV", "users.csv"), ("SESSIONS_CSV", " ")]);
        let err = TabularSources::from_lookup(&lookup).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "SESSIONS_CSV"));
    }

    #[test]
    fn test_loader_settings() {
        let settings = LoaderSettings::from_lookup(&lookup_from(&[])).unwrap();
        assert_eq!(settings, LoaderSettings::default());

        let lookup = lookup_from(&[("BATCH_SIZE", "100"), ("ON_BATCH_ERROR", "skip")]);
        let settings = LoaderSettings::from_lookup(&lookup).unwrap();
        assert_eq!(settings.batch_size, 100);
        assert_eq!(settings.on_batch_error, Some(OnBatchError::Skip));
    }

    #[test]
    fn test_loader_settings_batch_upper_bound() {
        assert_eq!(max_batch_size(), 8191);

        let settings = LoaderSettings::from_lookup(&lookup_from(&[("BATCH_SIZE", "8191")])).unwrap();
        assert_eq!(settings.batch_size, 8191);

        let err = LoaderSettings::from_lookup(&lookup_from(&[("BATCH_SIZE", "8192")])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
        assert!(err.to_string().contains("exceeds the maximum of 8191"));
    }

    #[test]
    fn test_loader_settings_rejects_zero_batch() {
        let err = LoaderSettings::from_lookup(&lookup_from(&[("BATCH_SIZE", "0")])).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));

        let err =
            LoaderSettings::from_lookup(&lookup_from(&[("ON_BATCH_ERROR", "retry")])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
    }
}
