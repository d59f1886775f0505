//! CLI commands and argument parsing

use crate::report::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Streaming catalog loader
#[derive(Parser, Debug)]
#[command(name = "catalog-loader")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Environment file loaded before reading configuration
    #[arg(short, long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Run against embedded stores instead of MongoDB and PostgreSQL
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Extra aggregation queries (YAML), overrides QUERIES_FILE
    #[arg(short, long, global = true)]
    pub queries: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Load movies and series into the document store and run the queries
    Documents,

    /// Load users and viewing sessions into the relational store
    Relational,

    /// Run the document pipeline, then the relational pipeline
    All,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "catalog-loader",
            "documents",
            "--format",
            "json",
            "--dry-run",
            "--queries",
            "extra.yaml",
        ])
        .unwrap();

        assert_eq!(cli.command, Commands::Documents);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.dry_run);
        assert_eq!(cli.queries, Some(PathBuf::from("extra.yaml")));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["catalog-loader", "all"]).unwrap();
        assert_eq!(cli.command, Commands::All);
        assert_eq!(cli.format, OutputFormat::Pretty);
        assert_eq!(cli.env_file, None);
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["catalog-loader"]).is_err());
        assert!(Cli::try_parse_from(["catalog-loader", "serve"]).is_err());
    }
}
