//! Entity schemas and provisioning
//!
//! # Overview
//!
//! - `EntitySchema` - one declarative description per collection/table,
//!   rendered as a `$jsonSchema` validator or as relational DDL
//! - `SchemaProvisioner` - creates missing entities before any data is written
//! - `catalog` - the four entities of the streaming catalog

pub mod catalog;
mod provisioner;
mod types;

pub use provisioner::{ProvisionReport, SchemaProvisioner};
pub use types::{is_valid_identifier, EntitySchema, FieldDef, FieldType, ForeignKey};
