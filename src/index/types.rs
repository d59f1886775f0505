//! Index types

use crate::types::SortOrder;
use serde::{Deserialize, Serialize};

/// One key of an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexKey {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

/// A secondary index over one or more fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Keys in index order
    pub keys: Vec<IndexKey>,
    /// Whether the index enforces uniqueness
    #[serde(default)]
    pub unique: bool,
}

impl IndexSpec {
    /// Single-field ascending index
    pub fn single(field: impl Into<String>) -> Self {
        Self::compound([(field.into(), SortOrder::Ascending)])
    }

    /// Unique single-field index
    pub fn unique(field: impl Into<String>) -> Self {
        Self {
            unique: true,
            ..Self::single(field)
        }
    }

    /// Compound index from `(field, order)` pairs
    pub fn compound<I, F>(keys: I) -> Self
    where
        I: IntoIterator<Item = (F, SortOrder)>,
        F: Into<String>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(|(field, order)| IndexKey {
                    field: field.into(),
                    order,
                })
                .collect(),
            unique: false,
        }
    }

    /// Fields covered by the index, in key order
    pub fn fields(&self) -> Vec<&str> {
        self.keys.iter().map(|k| k.field.as_str()).collect()
    }

    /// Deterministic name: `<entity>_<field>_<dir>[_<field>_<dir>...]`
    pub fn name(&self, entity: &str) -> String {
        let mut name = entity.to_string();
        for key in &self.keys {
            name.push('_');
            name.push_str(&key.field);
            name.push('_');
            name.push_str(key.order.suffix());
        }
        if self.unique {
            name.push_str("_key");
        }
        name
    }
}
