//! Declarative aggregation pipeline types
//!
//! A pipeline is an ordered list of stages. The same value is rendered to
//! MongoDB stage documents or evaluated in memory, and can be written in
//! YAML for custom queries.

use crate::error::{Error, Result};
use crate::types::{JsonValue, SortOrder};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Dotted field paths: `title`, `stats.views`
static FIELD_PATH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z0-9_]+)*$").unwrap());

/// Accumulator operator used inside a group stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulatorOp {
    Sum,
    Avg,
    Min,
    Max,
    /// Number of documents in the group (takes no field)
    Count,
}

impl AccumulatorOp {
    /// MongoDB operator name
    pub fn operator(self) -> &'static str {
        match self {
            AccumulatorOp::Sum | AccumulatorOp::Count => "$sum",
            AccumulatorOp::Avg => "$avg",
            AccumulatorOp::Min => "$min",
            AccumulatorOp::Max => "$max",
        }
    }
}

/// One output field of a group stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accumulator {
    /// Output field name
    pub output: String,
    pub op: AccumulatorOp,
    /// Input field path (absent for `count`)
    #[serde(default)]
    pub field: Option<String>,
}

impl Accumulator {
    fn with_field(output: impl Into<String>, op: AccumulatorOp, field: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            op,
            field: Some(field.into()),
        }
    }

    /// Sum of a numeric field
    pub fn sum(output: impl Into<String>, field: impl Into<String>) -> Self {
        Self::with_field(output, AccumulatorOp::Sum, field)
    }

    /// Average of a numeric field
    pub fn avg(output: impl Into<String>, field: impl Into<String>) -> Self {
        Self::with_field(output, AccumulatorOp::Avg, field)
    }

    /// Minimum of a field
    pub fn min(output: impl Into<String>, field: impl Into<String>) -> Self {
        Self::with_field(output, AccumulatorOp::Min, field)
    }

    /// Maximum of a field
    pub fn max(output: impl Into<String>, field: impl Into<String>) -> Self {
        Self::with_field(output, AccumulatorOp::Max, field)
    }

    /// Document count
    pub fn count(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            op: AccumulatorOp::Count,
            field: None,
        }
    }
}

/// Comparison operator used in a match stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// MongoDB operator name
    pub fn operator(self) -> &'static str {
        match self {
            CompareOp::Eq => "$eq",
            CompareOp::Ne => "$ne",
            CompareOp::Gt => "$gt",
            CompareOp::Gte => "$gte",
            CompareOp::Lt => "$lt",
            CompareOp::Lte => "$lte",
        }
    }
}

/// A single predicate of a match stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub op: CompareOp,
    pub value: JsonValue,
}

impl Condition {
    /// Build a condition
    pub fn new(field: impl Into<String>, op: CompareOp, value: impl Into<JsonValue>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// `field >= value`
    pub fn gte(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::new(field, CompareOp::Gte, value)
    }

    /// `field == value`
    pub fn equals(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::new(field, CompareOp::Eq, value)
    }
}

/// One output field of a project stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// Keep an input field as is
    Field(String),
    /// Sum of the numeric elements of an array field
    Sum { output: String, field: String },
}

impl Projection {
    /// Keep a field
    pub fn field(name: impl Into<String>) -> Self {
        Projection::Field(name.into())
    }

    /// Computed sum of an array field
    pub fn sum(output: impl Into<String>, field: impl Into<String>) -> Self {
        Projection::Sum {
            output: output.into(),
            field: field.into(),
        }
    }

    /// Name of the output field
    pub fn output(&self) -> &str {
        match self {
            Projection::Field(name) => name,
            Projection::Sum { output, .. } => output,
        }
    }
}

/// One key of a sort stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

/// A pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// One output document per element of an array field
    Unwind { field: String },
    /// Group by a field (or everything, when `key` is absent)
    Group {
        #[serde(default)]
        key: Option<String>,
        accumulators: Vec<Accumulator>,
    },
    /// Keep documents matching every condition
    Match { conditions: Vec<Condition> },
    /// Reshape documents; `_id` is kept when present
    Project { fields: Vec<Projection> },
    Sort { keys: Vec<SortKey> },
    Limit { count: usize },
}

/// Ordered list of stages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage
    #[must_use]
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append an unwind stage
    #[must_use]
    pub fn unwind(self, field: impl Into<String>) -> Self {
        self.stage(Stage::Unwind {
            field: field.into(),
        })
    }

    /// Append a group stage keyed by a field
    #[must_use]
    pub fn group_by(self, key: impl Into<String>, accumulators: Vec<Accumulator>) -> Self {
        self.stage(Stage::Group {
            key: Some(key.into()),
            accumulators,
        })
    }

    /// Append a match stage
    #[must_use]
    pub fn matching(self, conditions: Vec<Condition>) -> Self {
        self.stage(Stage::Match { conditions })
    }

    /// Append a project stage
    #[must_use]
    pub fn project(self, fields: Vec<Projection>) -> Self {
        self.stage(Stage::Project { fields })
    }

    /// Append a single-key descending sort
    #[must_use]
    pub fn sort_desc(self, field: impl Into<String>) -> Self {
        self.stage(Stage::Sort {
            keys: vec![SortKey {
                field: field.into(),
                order: SortOrder::Descending,
            }],
        })
    }

    /// Append a limit stage
    #[must_use]
    pub fn limit(self, count: usize) -> Self {
        self.stage(Stage::Limit { count })
    }

    /// Reject malformed field references and empty stages
    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(Error::invalid_pipeline("pipeline has no stages"));
        }

        for (i, stage) in self.stages.iter().enumerate() {
            validate_stage(stage).map_err(|message| {
                Error::invalid_pipeline(format!("stage {}: {message}", i + 1))
            })?;
        }
        Ok(())
    }
}

/// Check whether a string is a usable field path
pub fn is_valid_field_path(path: &str) -> bool {
    FIELD_PATH_REGEX.is_match(path)
}

fn check_path(path: &str) -> std::result::Result<(), String> {
    if is_valid_field_path(path) {
        Ok(())
    } else {
        Err(format!("malformed field reference '{path}'"))
    }
}

fn validate_stage(stage: &Stage) -> std::result::Result<(), String> {
    match stage {
        Stage::Unwind { field } => check_path(field),
        Stage::Group { key, accumulators } => {
            if let Some(key) = key {
                check_path(key)?;
            }
            if accumulators.is_empty() {
                return Err("group has no accumulators".to_string());
            }
            let mut outputs = HashSet::new();
            for acc in accumulators {
                check_path(&acc.output)?;
                if acc.output == "_id" || acc.output.contains('.') {
                    return Err(format!("invalid accumulator output '{}'", acc.output));
                }
                if !outputs.insert(acc.output.as_str()) {
                    return Err(format!("duplicate accumulator output '{}'", acc.output));
                }
                match (&acc.op, &acc.field) {
                    (AccumulatorOp::Count, _) => {}
                    (_, Some(field)) => check_path(field)?,
                    (op, None) => {
                        return Err(format!(
                            "accumulator '{}' ({}) needs a field",
                            acc.output,
                            op.operator()
                        ))
                    }
                }
            }
            Ok(())
        }
        Stage::Match { conditions } => {
            if conditions.is_empty() {
                return Err("match has no conditions".to_string());
            }
            conditions.iter().try_for_each(|c| check_path(&c.field))
        }
        Stage::Project { fields } => {
            if fields.is_empty() {
                return Err("project has no fields".to_string());
            }
            for projection in fields {
                match projection {
                    Projection::Field(name) => check_path(name)?,
                    Projection::Sum { output, field } => {
                        check_path(output)?;
                        check_path(field)?;
                    }
                }
            }
            Ok(())
        }
        Stage::Sort { keys } => {
            if keys.is_empty() {
                return Err("sort has no keys".to_string());
            }
            keys.iter().try_for_each(|k| check_path(&k.field))
        }
        Stage::Limit { count } => {
            if *count == 0 {
                Err("limit must be greater than zero".to_string())
            } else {
                Ok(())
            }
        }
    }
}

/// A named, read-only query over one collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationQuery {
    /// Short identifier (`yearly_rating_budget`)
    pub name: String,
    /// Human-readable heading for reports
    #[serde(default)]
    pub title: String,
    /// Collection the pipeline runs against
    pub collection: String,
    pub pipeline: Pipeline,
}

impl AggregationQuery {
    /// Create a query
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        collection: impl Into<String>,
        pipeline: Pipeline,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            collection: collection.into(),
            pipeline,
        }
    }

    /// Heading used in reports (falls back to the name)
    pub fn heading(&self) -> &str {
        if self.title.is_empty() {
            &self.name
        } else {
            &self.title
        }
    }
}
