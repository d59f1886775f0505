//! Plans for the two catalog pipelines

use super::types::{EntityLoad, PipelinePlan};
use crate::aggregate::{canonical_queries, AggregationQuery};
use crate::config::LoaderSettings;
use crate::error::{Error, Result};
use crate::index::{movie_indexes, series_indexes, session_indexes};
use crate::ingest::LoadConfig;
use crate::schema::catalog;
use crate::source::ContentCatalog;
use crate::types::{OnBatchError, Record, StoreKind};

fn load_config(settings: &LoaderSettings, default_policy: OnBatchError) -> LoadConfig {
    LoadConfig::new()
        .with_batch_size(settings.batch_size)
        .with_on_error(settings.on_batch_error.unwrap_or(default_policy))
}

/// Movies and series into the document store, then the canonical queries
/// followed by `extra_queries`.
///
/// Fails with `EmptyInput` when the catalog has no entries at all.
pub fn document_plan(
    content: ContentCatalog,
    extra_queries: Vec<AggregationQuery>,
    settings: &LoaderSettings,
) -> Result<PipelinePlan> {
    if content.is_empty() {
        return Err(Error::empty_input(
            "the content document has neither movies nor series",
        ));
    }

    let mut queries = canonical_queries();
    queries.extend(extra_queries);

    Ok(PipelinePlan {
        kind: StoreKind::Document,
        entities: vec![
            EntityLoad::new(catalog::movies(), content.movies, movie_indexes()),
            EntityLoad::new(catalog::series(), content.series, series_indexes()),
        ],
        queries,
        load: load_config(settings, OnBatchError::Abort),
    })
}

/// Users and viewing sessions into the relational store.
///
/// Users come first so session foreign keys resolve. Fails with
/// `EmptyInput` when both files have no rows.
pub fn relational_plan(
    users: Vec<Record>,
    sessions: Vec<Record>,
    settings: &LoaderSettings,
) -> Result<PipelinePlan> {
    if users.is_empty() && sessions.is_empty() {
        return Err(Error::empty_input(
            "the users and sessions files have no rows",
        ));
    }

    Ok(PipelinePlan {
        kind: StoreKind::Relational,
        entities: vec![
            EntityLoad::new(catalog::users(), users, Vec::new()),
            EntityLoad::new(catalog::viewing_sessions(), sessions, session_indexes()),
        ],
        queries: Vec::new(),
        load: load_config(settings, OnBatchError::Skip),
    })
}
