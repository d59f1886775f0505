//! Console reporting for pipeline runs
//!
//! JSON output is one message per line, tagged by `type`; pretty output is
//! plain human-readable lines.

use crate::pipeline::PipelineReport;
use crate::types::JsonValue;
use serde_json::json;

/// Output format of the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// JSON messages, one per line
    Json,
}

/// Messages describing a report, in display order
pub fn messages(report: &PipelineReport) -> Vec<JsonValue> {
    let mut out = Vec::with_capacity(report.loads.len() + report.queries.len() + 2);

    out.push(json!({
        "type": "PROVISION",
        "pipeline": report.pipeline,
        "store": report.store,
        "created": report.provision.created,
        "existing": report.provision.existing,
    }));

    for load in &report.loads {
        let mut message = json!({ "type": "LOAD" });
        if let (Some(map), Ok(JsonValue::Object(fields))) =
            (message.as_object_mut(), serde_json::to_value(load))
        {
            map.extend(fields);
        }
        out.push(message);
    }

    for query in &report.queries {
        out.push(json!({
            "type": "QUERY",
            "name": query.name,
            "title": query.title,
            "collection": query.collection,
            "rows": query.rows,
            "duration_ms": query.duration_ms,
        }));
    }

    out.push(json!({
        "type": "PIPELINE_SUMMARY",
        "pipeline": report.pipeline,
        "records_written": report.records_written(),
        "batches_failed": report.batches_failed(),
        "indexes_declared": report.indexes_declared,
        "queries": report.queries.len(),
        "duration_ms": report.duration_ms,
    }));

    out
}

/// Human-readable lines for a report
pub fn pretty_lines(report: &PipelineReport) -> Vec<String> {
    let mut lines = vec![format!("[{}] {}", report.pipeline, report.store)];

    if !report.provision.created.is_empty() {
        lines.push(format!("  created: {}", report.provision.created.join(", ")));
    }
    if !report.provision.existing.is_empty() {
        lines.push(format!("  existing: {}", report.provision.existing.join(", ")));
    }

    for load in &report.loads {
        let mut line = format!(
            "  {}: {} of {} records written, {} already present, {} batches",
            load.entity, load.records_written, load.records_seen, load.conflicts, load.batches_issued
        );
        if load.batches_failed > 0 {
            line.push_str(&format!(" ({} failed)", load.batches_failed));
        }
        lines.push(line);
    }

    lines.push(format!("  indexes declared: {}", report.indexes_declared));

    for query in &report.queries {
        lines.push(String::new());
        lines.push(format!("{} [{} rows]", query.title, query.rows.len()));
        for row in &query.rows {
            lines.push(format!(
                "  {}",
                serde_json::to_string(row).unwrap_or_default()
            ));
        }
    }

    lines.push(format!(
        "Done: {} records written in {}ms",
        report.records_written(),
        report.duration_ms
    ));
    lines
}

/// Print a report to stdout
pub fn print(report: &PipelineReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for message in messages(report) {
                println!("{}", serde_json::to_string(&message).unwrap_or_default());
            }
        }
        OutputFormat::Pretty => {
            for line in pretty_lines(report) {
                println!("{line}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::QueryResult;
    use crate::ingest::LoadReport;
    use crate::schema::ProvisionReport;
    use crate::types::StoreKind;
    use pretty_assertions::assert_eq;

    fn sample() -> PipelineReport {
        PipelineReport {
            pipeline: StoreKind::Document,
            store: "in-memory document store".to_string(),
            provision: ProvisionReport {
                created: vec!["movies".to_string()],
                existing: vec![],
            },
            loads: vec![LoadReport {
                entity: "movies".to_string(),
                records_seen: 3,
                records_written: 2,
                conflicts: 1,
                batches_issued: 1,
                batches_failed: 0,
                duration_ms: 4,
            }],
            indexes_declared: 3,
            queries: vec![QueryResult {
                name: "top".to_string(),
                title: "Top genres".to_string(),
                collection: "movies".to_string(),
                rows: vec![json!({"_id": "Drama", "total_views": 10})
                    .as_object()
                    .unwrap()
                    .clone()],
                duration_ms: 1,
            }],
            duration_ms: 12,
        }
    }

    #[test]
    fn test_json_messages() {
        let messages = messages(&sample());

        let types: Vec<&str> = messages
            .iter()
            .map(|m| m["type"].as_str().unwrap())
            .collect();
        assert_eq!(types, vec!["PROVISION", "LOAD", "QUERY", "PIPELINE_SUMMARY"]);
        assert_eq!(messages[0]["pipeline"], json!("document"));
        assert_eq!(messages[1]["records_written"], json!(2));
        assert_eq!(messages[2]["rows"][0]["_id"], json!("Drama"));
        assert_eq!(messages[3]["records_written"], json!(2));
    }

    #[test]
    fn test_pretty_lines() {
        let lines = pretty_lines(&sample());

        assert_eq!(lines[0], "[document] in-memory document store");
        assert_eq!(lines[1], "  created: movies");
        assert_eq!(
            lines[2],
            "  movies: 2 of 3 records written, 1 already present, 1 batches"
        );
        assert!(lines.contains(&"Top genres [1 rows]".to_string()));
        assert_eq!(lines.last().unwrap(), "Done: 2 records written in 12ms");
    }
}
