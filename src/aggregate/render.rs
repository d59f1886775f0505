//! Rendering pipelines to MongoDB aggregation stages

use super::types::{AccumulatorOp, Pipeline, Projection, Stage};
use crate::store::convert::json_to_bson;
use mongodb::bson::{doc, Bson, Document};

impl Pipeline {
    /// Render the pipeline as MongoDB aggregation stage documents
    pub fn to_documents(&self) -> Vec<Document> {
        self.stages.iter().map(render_stage).collect()
    }
}

fn field_ref(path: &str) -> String {
    format!("${path}")
}

fn render_stage(stage: &Stage) -> Document {
    match stage {
        Stage::Unwind { field } => doc! { "$unwind": field_ref(field) },
        Stage::Group { key, accumulators } => {
            let mut group = Document::new();
            group.insert(
                "_id",
                key.as_deref().map_or(Bson::Null, |k| Bson::String(field_ref(k))),
            );
            for acc in accumulators {
                let input = match &acc.field {
                    Some(field) if acc.op != AccumulatorOp::Count => {
                        Bson::String(field_ref(field))
                    }
                    _ => Bson::Int32(1),
                };
                group.insert(acc.output.clone(), doc! { acc.op.operator(): input });
            }
            doc! { "$group": group }
        }
        Stage::Match { conditions } => {
            let mut filter = Document::new();
            for condition in conditions {
                if !filter.contains_key(&condition.field) {
                    filter.insert(condition.field.clone(), Document::new());
                }
                if let Some(Bson::Document(ops)) = filter.get_mut(&condition.field) {
                    ops.insert(condition.op.operator(), json_to_bson(&condition.value));
                }
            }
            doc! { "$match": filter }
        }
        Stage::Project { fields } => {
            let mut projection = Document::new();
            for field in fields {
                match field {
                    Projection::Field(name) => {
                        projection.insert(name.clone(), 1);
                    }
                    Projection::Sum { output, field } => {
                        projection.insert(output.clone(), doc! { "$sum": field_ref(field) });
                    }
                }
            }
            doc! { "$project": projection }
        }
        Stage::Sort { keys } => {
            let sort: Document = keys
                .iter()
                .map(|k| (k.field.clone(), Bson::Int32(k.order.direction())))
                .collect();
            doc! { "$sort": sort }
        }
        Stage::Limit { count } => doc! { "$limit": *count as i64 },
    }
}
