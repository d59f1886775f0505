//! CSV readers for the viewing data

use super::types::{to_record, SessionRecord, UserRecord};
use crate::error::{Error, Result};
use crate::types::Record;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Read the users file
pub fn read_users(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    read_rows::<UserRecord>(path.as_ref())
}

/// Read the viewing sessions file
pub fn read_sessions(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    read_rows::<SessionRecord>(path.as_ref())
}

fn read_rows<T>(path: &Path) -> Result<Vec<Record>>
where
    T: DeserializeOwned + Serialize,
{
    let source_name = path.display().to_string();
    if !path.exists() {
        return Err(Error::FileNotFound { path: source_name });
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut records = Vec::new();
    for row in reader.deserialize::<T>() {
        let row = row.map_err(|e| {
            let line = e.position().map_or(0, csv::Position::line);
            Error::input(&source_name, format!("line {line}: {e}"))
        })?;
        records.push(to_record(&row)?);
    }

    tracing::info!("Read {} rows from {}", records.len(), source_name);
    Ok(records)
}
