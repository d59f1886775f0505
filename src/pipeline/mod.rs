//! Catalog pipelines
//!
//! # Overview
//!
//! - `document_plan` / `relational_plan` - read sources into a plan,
//!   rejecting empty input before any store is touched
//! - `run_documents` / `run_relational` - execute a plan against a store
//! - `PipelineReport` - counts and query rows for reporting

mod plan;
mod run;
mod types;

pub use plan::{document_plan, relational_plan};
pub use run::{run_documents, run_relational};
pub use types::{EntityLoad, PipelinePlan, PipelineReport};

#[cfg(test)]
mod tests;
