//! Index declaration against a target store

use super::types::IndexSpec;
use crate::error::{Error, Result};
use crate::schema::is_valid_identifier;
use crate::store::TargetStore;

/// Declares secondary indexes after a load
pub struct IndexBuilder<'a, S: TargetStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: TargetStore + ?Sized> IndexBuilder<'a, S> {
    /// Create a builder for a store
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Create every index for an entity.
    ///
    /// Indexes that already exist are left as they are. Returns the number
    /// of index declarations issued.
    pub async fn build(&self, entity: &str, indexes: &[IndexSpec]) -> Result<usize> {
        for index in indexes {
            check_index(entity, index)?;
        }

        for index in indexes {
            tracing::debug!("Declaring index {} on '{}'", index.name(entity), entity);
            self.store.create_index(entity, index).await?;
        }

        if !indexes.is_empty() {
            tracing::info!("Ensured {} indexes on '{}'", indexes.len(), entity);
        }
        Ok(indexes.len())
    }
}

fn check_index(entity: &str, index: &IndexSpec) -> Result<()> {
    if index.keys.is_empty() {
        return Err(Error::index(entity, "index has no keys"));
    }
    if let Some(bad) = index.keys.iter().find(|k| !is_valid_identifier(&k.field)) {
        return Err(Error::index(
            entity,
            format!("invalid index field '{}'", bad.field),
        ));
    }
    Ok(())
}
