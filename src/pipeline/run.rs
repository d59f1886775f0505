//! Pipeline execution
//!
//! provision -> load -> index -> aggregate, each stage finishing before the
//! next starts. The store is closed after the run whether it succeeded or
//! not; a close failure is logged and never replaces the run's own error.

use super::types::{PipelinePlan, PipelineReport};
use crate::aggregate::AggregationRunner;
use crate::error::Result;
use crate::index::IndexBuilder;
use crate::ingest::BatchLoader;
use crate::schema::SchemaProvisioner;
use crate::store::{DocumentStore, TargetStore};
use std::time::Instant;

/// Run a document plan, including its queries
pub async fn run_documents<S>(store: &S, plan: &PipelinePlan) -> Result<PipelineReport>
where
    S: DocumentStore + ?Sized,
{
    let result = load_and_query(store, plan).await;
    finish(store, result).await
}

/// Run a relational plan
pub async fn run_relational<S>(store: &S, plan: &PipelinePlan) -> Result<PipelineReport>
where
    S: TargetStore + ?Sized,
{
    let result = load(store, plan).await;
    finish(store, result).await
}

async fn load_and_query<S>(store: &S, plan: &PipelinePlan) -> Result<PipelineReport>
where
    S: DocumentStore + ?Sized,
{
    let start = Instant::now();
    let mut report = load(store, plan).await?;

    if !plan.queries.is_empty() {
        tracing::info!("Running {} aggregation queries", plan.queries.len());
        report.queries = AggregationRunner::new(store).run(&plan.queries).await?;
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    Ok(report)
}

async fn load<S>(store: &S, plan: &PipelinePlan) -> Result<PipelineReport>
where
    S: TargetStore + ?Sized,
{
    let start = Instant::now();
    tracing::info!(
        "Starting {} pipeline against {} ({} records)",
        plan.kind,
        store.describe(),
        plan.record_count()
    );

    let provision = SchemaProvisioner::new(store).ensure(&plan.schemas()).await?;

    let loader = BatchLoader::new(store, plan.load);
    let mut loads = Vec::with_capacity(plan.entities.len());
    for entity in &plan.entities {
        loads.push(loader.load(&entity.schema, &entity.records).await?);
    }

    let builder = IndexBuilder::new(store);
    let mut indexes_declared = 0;
    for entity in &plan.entities {
        indexes_declared += builder.build(&entity.schema.name, &entity.indexes).await?;
    }

    Ok(PipelineReport {
        pipeline: plan.kind,
        store: store.describe(),
        provision,
        loads,
        indexes_declared,
        queries: Vec::new(),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

async fn finish<S>(store: &S, result: Result<PipelineReport>) -> Result<PipelineReport>
where
    S: TargetStore + ?Sized,
{
    if let Err(e) = store.close().await {
        tracing::warn!("Failed to close {}: {}", store.describe(), e);
    }
    if let Ok(report) = &result {
        tracing::info!(
            "{} pipeline finished: {} records written in {}ms",
            report.pipeline,
            report.records_written(),
            report.duration_ms
        );
    }
    result
}
