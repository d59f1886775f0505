//! Catalog document reader

use super::types::ContentCatalog;
use crate::error::{Error, Result};
use crate::types::{JsonValue, Record};
use std::fs;
use std::path::Path;

/// Read the content document (`{"movies": [...], "series": [...]}`)
pub fn load_catalog(path: impl AsRef<Path>) -> Result<ContentCatalog> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::input(path.display().to_string(), e.to_string())
        }
    })?;

    let catalog = parse_catalog(&content, &path.display().to_string())?;
    tracing::info!(
        "Read {} movies and {} series from {}",
        catalog.movies.len(),
        catalog.series.len(),
        path.display()
    );
    Ok(catalog)
}

/// Parse a content document. Missing arrays are empty.
pub fn parse_catalog(content: &str, source_name: &str) -> Result<ContentCatalog> {
    let document: JsonValue = serde_json::from_str(content)
        .map_err(|e| Error::input(source_name, format!("invalid JSON: {e}")))?;

    let JsonValue::Object(mut root) = document else {
        return Err(Error::input(source_name, "top level must be an object"));
    };

    Ok(ContentCatalog {
        movies: entries(root.remove("movies"), "movies", source_name)?,
        series: entries(root.remove("series"), "series", source_name)?,
    })
}

fn entries(value: Option<JsonValue>, key: &str, source_name: &str) -> Result<Vec<Record>> {
    match value {
        None | Some(JsonValue::Null) => Ok(Vec::new()),
        Some(JsonValue::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                JsonValue::Object(map) => Ok(map),
                other => Err(Error::input(
                    source_name,
                    format!("{key}[{i}] is not an object: {other}"),
                )),
            })
            .collect(),
        Some(_) => Err(Error::input(source_name, format!("'{key}' must be an array"))),
    }
}
