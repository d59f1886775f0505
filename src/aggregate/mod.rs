//! Aggregation module
//!
//! Read-only analytical queries over the document store.
//!
//! # Overview
//!
//! The aggregate module provides:
//! - `Pipeline` / `Stage` - declarative multi-stage queries (unwind, group,
//!   match, project, sort, limit)
//! - `Pipeline::to_documents` - MongoDB stage rendering
//! - `evaluate` - in-memory evaluation with the same semantics
//! - `AggregationRunner` - executes an ordered list of queries
//! - `queries` - the four canonical validation queries
//! - `load_queries` - custom query definitions from YAML

mod definitions;
mod eval;
pub mod queries;
mod render;
mod runner;
mod types;

pub use definitions::{load_queries, load_queries_from_str};
pub use eval::{compare_values, evaluate, get_path};
pub use queries::canonical_queries;
pub use runner::{AggregationRunner, QueryResult};
pub use types::{
    is_valid_field_path, Accumulator, AccumulatorOp, AggregationQuery, CompareOp, Condition,
    Pipeline, Projection, SortKey, Stage,
};
