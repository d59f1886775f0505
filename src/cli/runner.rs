//! CLI runner - executes commands

use crate::aggregate::{load_queries, AggregationQuery};
use crate::cli::commands::{Cli, Commands};
use crate::config::{
    DocumentSources, DocumentStoreConfig, LoaderSettings, RelationalStoreConfig, TabularSources,
};
use crate::error::{Error, Result};
use crate::pipeline::{
    document_plan, relational_plan, run_documents, run_relational, PipelinePlan,
};
use crate::report;
use crate::schema::catalog;
use crate::source::{load_catalog, read_sessions, read_users};
use crate::store::{DuckDbStore, MemoryDocumentStore, MongoStore, PostgresStore};
use std::path::Path;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    ///
    /// Every plan is read and validated before the first store connection,
    /// so bad input never leaves a half-loaded store behind.
    pub async fn run(&self) -> Result<()> {
        self.load_env()?;
        let settings = LoaderSettings::from_env()?;

        match self.cli.command {
            Commands::Documents => {
                let plan = self.plan_documents(&settings)?;
                self.documents(&plan).await
            }
            Commands::Relational => {
                let plan = self.plan_relational(&settings)?;
                self.relational(&plan).await
            }
            Commands::All => {
                let documents = self.plan_documents(&settings)?;
                let relational = self.plan_relational(&settings)?;
                self.documents(&documents).await?;
                self.relational(&relational).await
            }
        }
    }

    /// Pre-populate the environment from `--env-file` or `./.env`
    fn load_env(&self) -> Result<()> {
        match &self.cli.env_file {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::FileNotFound {
                        path: path.display().to_string(),
                    });
                }
                dotenv::from_path(path).map_err(|e| {
                    Error::config(format!("Failed to read {}: {e}", path.display()))
                })?;
                tracing::debug!("Loaded environment from {}", path.display());
            }
            None => {
                if let Ok(path) = dotenv::dotenv() {
                    tracing::debug!("Loaded environment from {}", path.display());
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Plans
    // ========================================================================

    fn plan_documents(&self, settings: &LoaderSettings) -> Result<PipelinePlan> {
        let sources = DocumentSources::from_env();
        let content = load_catalog(&sources.content_json)?;

        let queries_file = self.cli.queries.clone().or(sources.queries_file);
        let extra = match queries_file {
            Some(path) => self.extra_queries(&path)?,
            None => Vec::new(),
        };

        document_plan(content, extra, settings)
    }

    fn extra_queries(&self, path: &Path) -> Result<Vec<AggregationQuery>> {
        let queries = load_queries(path, &[catalog::MOVIES, catalog::SERIES])?;
        tracing::info!("Loaded {} extra queries from {}", queries.len(), path.display());
        Ok(queries)
    }

    fn plan_relational(&self, settings: &LoaderSettings) -> Result<PipelinePlan> {
        let sources = TabularSources::from_env()?;
        let users = read_users(&sources.users_csv)?;
        let sessions = read_sessions(&sources.sessions_csv)?;
        tracing::info!(
            "Read {} users and {} viewing sessions",
            users.len(),
            sessions.len()
        );

        relational_plan(users, sessions, settings)
    }

    // ========================================================================
    // Pipelines
    // ========================================================================

    async fn documents(&self, plan: &PipelinePlan) -> Result<()> {
        let report = if self.cli.dry_run {
            tracing::info!("Dry run: using the in-memory document store");
            run_documents(&MemoryDocumentStore::new(), plan).await?
        } else {
            let config = DocumentStoreConfig::from_env()?;
            let store = MongoStore::connect(&config.uri, &config.database).await?;
            run_documents(&store, plan).await?
        };

        report::print(&report, self.cli.format);
        Ok(())
    }

    async fn relational(&self, plan: &PipelinePlan) -> Result<()> {
        let report = if self.cli.dry_run {
            tracing::info!("Dry run: using an in-memory DuckDB database");
            run_relational(&DuckDbStore::open_in_memory()?, plan).await?
        } else {
            let config = RelationalStoreConfig::from_env()?;
            if let Err(e) = PostgresStore::ensure_database(&config).await {
                tracing::warn!("Could not ensure database '{}': {}", config.database, e);
            }
            let store = PostgresStore::connect(&config).await?;
            run_relational(&store, plan).await?
        };

        report::print(&report, self.cli.format);
        Ok(())
    }
}
