//! YAML loader for custom query definitions
//!
//! ```yaml
//! queries:
//!   - name: genre_counts
//!     title: Movies per genre
//!     collection: movies
//!     pipeline:
//!       - unwind: { field: genre }
//!       - group:
//!           key: genre
//!           accumulators:
//!             - { output: movies, op: count }
//!       - sort: { keys: [{ field: movies, order: desc }] }
//! ```

use super::types::AggregationQuery;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct QueryFile {
    #[serde(default)]
    queries: Vec<AggregationQuery>,
}

/// Load query definitions from a YAML file
pub fn load_queries(path: impl AsRef<Path>, collections: &[&str]) -> Result<Vec<AggregationQuery>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read query file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_queries_from_str(&content, collections)
}

/// Load query definitions from a YAML string
pub fn load_queries_from_str(yaml: &str, collections: &[&str]) -> Result<Vec<AggregationQuery>> {
    let file: QueryFile = serde_yaml::from_str(yaml)?;

    validate_queries(&file.queries, collections)?;
    Ok(file.queries)
}

/// Validate a set of query definitions
fn validate_queries(queries: &[AggregationQuery], collections: &[&str]) -> Result<()> {
    let mut names = HashSet::new();

    for query in queries {
        if query.name.trim().is_empty() {
            return Err(Error::config("Query name cannot be empty"));
        }
        if !names.insert(query.name.as_str()) {
            return Err(Error::config(format!(
                "Duplicate query name '{}'",
                query.name
            )));
        }
        if !collections.contains(&query.collection.as_str()) {
            return Err(Error::config(format!(
                "Query '{}' targets unknown collection '{}' (expected one of: {})",
                query.name,
                query.collection,
                collections.join(", ")
            )));
        }
        query
            .pipeline
            .validate()
            .map_err(|e| Error::query(&query.name, e.to_string()))?;
    }

    Ok(())
}
