//! Schema provisioning
//!
//! Ensures every entity exists in the target store before data arrives.
//! Existing entities are not migrated, but an existing collection still
//! gets a unique index on its primary key so reloads stay duplicate-free.

use super::types::EntitySchema;
use crate::error::Result;
use crate::index::IndexSpec;
use crate::store::TargetStore;
use crate::types::StoreKind;
use serde::Serialize;

/// Outcome of a provisioning pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    /// Entities created during this pass
    pub created: Vec<String>,
    /// Entities that already existed
    pub existing: Vec<String>,
}

impl ProvisionReport {
    /// Total number of entities handled
    pub fn total(&self) -> usize {
        self.created.len() + self.existing.len()
    }
}

/// Creates missing collections/tables with their validation constraints
pub struct SchemaProvisioner<'a, S: TargetStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: TargetStore + ?Sized> SchemaProvisioner<'a, S> {
    /// Create a provisioner for a store
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Ensure every schema exists, in order.
    ///
    /// Order matters for relational stores: referenced tables come first.
    pub async fn ensure(&self, schemas: &[EntitySchema]) -> Result<ProvisionReport> {
        let mut report = ProvisionReport::default();

        for schema in schemas {
            schema.check()?;

            if self.store.entity_exists(&schema.name).await? {
                tracing::info!(
                    "{} '{}' already exists",
                    self.store.kind(),
                    schema.name
                );
                // relational tables carry their key in the DDL
                if let (Some(pk), StoreKind::Document) = (&schema.primary_key, self.store.kind()) {
                    self.store
                        .create_index(&schema.name, &IndexSpec::unique(pk))
                        .await?;
                }
                report.existing.push(schema.name.clone());
                continue;
            }

            self.store.create_entity(schema).await?;
            tracing::info!(
                "Created {} entity '{}' with {} fields ({} required)",
                self.store.kind(),
                schema.name,
                schema.fields.len(),
                schema.required_fields().len()
            );
            report.created.push(schema.name.clone());
        }

        Ok(report)
    }
}
