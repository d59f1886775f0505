//! CLI module
//!
//! Command-line interface for running the catalog pipelines.
//!
//! # Commands
//!
//! - `documents` - Load the content catalog into MongoDB and run the queries
//! - `relational` - Load users and viewing sessions into PostgreSQL
//! - `all` - Both pipelines, documents first

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
