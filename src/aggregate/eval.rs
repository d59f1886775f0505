//! In-memory pipeline evaluation
//!
//! Follows MongoDB's grouped-aggregation semantics closely enough for the
//! catalog queries:
//! - `$avg` skips missing and non-numeric values, null when nothing is left
//! - `$sum` skips missing and non-numeric values, 0 when nothing is left
//! - range comparisons only hold between numbers or between strings
//! - sorting is stable and orders null < numbers < strings < objects < arrays < booleans

use super::types::{
    Accumulator, AccumulatorOp, CompareOp, Condition, Pipeline, Projection, SortKey, Stage,
};
use crate::types::{JsonObject, JsonValue, Record, SortOrder};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Run a pipeline over a set of documents
pub fn evaluate(pipeline: &Pipeline, documents: Vec<Record>) -> Vec<Record> {
    pipeline
        .stages
        .iter()
        .fold(documents, |docs, stage| apply_stage(stage, docs))
}

fn apply_stage(stage: &Stage, docs: Vec<Record>) -> Vec<Record> {
    match stage {
        Stage::Unwind { field } => unwind(field, docs),
        Stage::Group { key, accumulators } => group(key.as_deref(), accumulators, docs),
        Stage::Match { conditions } => docs
            .into_iter()
            .filter(|doc| conditions.iter().all(|c| matches_condition(doc, c)))
            .collect(),
        Stage::Project { fields } => docs.iter().map(|doc| project(fields, doc)).collect(),
        Stage::Sort { keys } => sort(keys, docs),
        Stage::Limit { count } => docs.into_iter().take(*count).collect(),
    }
}

// ============================================================================
// Field access
// ============================================================================

/// Resolve a dotted path inside a record
pub fn get_path<'a>(record: &'a Record, path: &str) -> Option<&'a JsonValue> {
    let mut parts = path.split('.');
    let mut current = record.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn set_path(record: &mut Record, path: &str, value: JsonValue) {
    match path.split_once('.') {
        None => {
            record.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = record
                .entry(head.to_string())
                .or_insert_with(|| JsonValue::Object(JsonObject::new()));
            if !entry.is_object() {
                *entry = JsonValue::Object(JsonObject::new());
            }
            if let JsonValue::Object(inner) = entry {
                set_path(inner, rest, value);
            }
        }
    }
}

fn float_value(f: f64) -> JsonValue {
    serde_json::Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number)
}

// ============================================================================
// Unwind
// ============================================================================

fn unwind(field: &str, docs: Vec<Record>) -> Vec<Record> {
    let mut out = Vec::with_capacity(docs.len());
    for doc in docs {
        let items = match get_path(&doc, field) {
            None | Some(JsonValue::Null) => continue,
            Some(JsonValue::Array(items)) => Some(items.clone()),
            Some(_) => None,
        };
        match items {
            Some(items) => {
                for item in items {
                    let mut copy = doc.clone();
                    set_path(&mut copy, field, item);
                    out.push(copy);
                }
            }
            None => out.push(doc),
        }
    }
    out
}

// ============================================================================
// Group
// ============================================================================

/// Running sum that stays integral until a float (or overflow) shows up
#[derive(Debug, Clone, Copy)]
enum Sum {
    Int(i64),
    Float(f64),
}

impl Sum {
    fn add(self, value: &JsonValue) -> Self {
        match (self, value.as_i64()) {
            (Sum::Int(acc), Some(i)) => acc
                .checked_add(i)
                .map_or(Sum::Float(acc as f64 + i as f64), Sum::Int),
            (Sum::Int(acc), None) => Sum::Float(acc as f64 + value.as_f64().unwrap_or(0.0)),
            (Sum::Float(acc), _) => Sum::Float(acc + value.as_f64().unwrap_or(0.0)),
        }
    }

    fn into_json(self) -> JsonValue {
        match self {
            Sum::Int(i) => JsonValue::from(i),
            Sum::Float(f) => float_value(f),
        }
    }
}

#[derive(Debug, Clone)]
enum AccState {
    Sum(Sum),
    Avg { total: f64, count: usize },
    Extreme(Option<JsonValue>),
    Count(i64),
}

impl AccState {
    fn new(op: AccumulatorOp) -> Self {
        match op {
            AccumulatorOp::Sum => AccState::Sum(Sum::Int(0)),
            AccumulatorOp::Avg => AccState::Avg {
                total: 0.0,
                count: 0,
            },
            AccumulatorOp::Min | AccumulatorOp::Max => AccState::Extreme(None),
            AccumulatorOp::Count => AccState::Count(0),
        }
    }

    fn update(&mut self, acc: &Accumulator, doc: &Record) {
        let value = acc.field.as_deref().and_then(|f| get_path(doc, f));
        match self {
            AccState::Count(n) => *n += 1,
            AccState::Sum(sum) => {
                if let Some(v) = value.filter(|v| v.is_number()) {
                    *sum = sum.add(v);
                }
            }
            AccState::Avg { total, count } => {
                if let Some(f) = value.and_then(JsonValue::as_f64) {
                    *total += f;
                    *count += 1;
                }
            }
            AccState::Extreme(current) => {
                let Some(v) = value.filter(|v| !v.is_null()) else {
                    return;
                };
                let wanted = if acc.op == AccumulatorOp::Min {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
                let replace = current
                    .as_ref()
                    .map_or(true, |c| compare_values(v, c) == wanted);
                if replace {
                    *current = Some(v.clone());
                }
            }
        }
    }

    fn finish(self) -> JsonValue {
        match self {
            AccState::Sum(sum) => sum.into_json(),
            AccState::Avg { total, count } if count > 0 => float_value(total / count as f64),
            AccState::Avg { .. } => JsonValue::Null,
            AccState::Extreme(value) => value.unwrap_or(JsonValue::Null),
            AccState::Count(n) => JsonValue::from(n),
        }
    }
}

/// Hash key of a group value; numerically equal numbers share a key
fn group_key(value: &JsonValue) -> String {
    match value {
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        (f as i64).to_string()
                    }
                    Some(f) => f.to_string(),
                    None => n.to_string(),
                }
            }
        }
        JsonValue::Array(items) => {
            let parts: Vec<String> = items.iter().map(group_key).collect();
            format!("[{}]", parts.join(","))
        }
        JsonValue::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{k:?}:{}", group_key(v)))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
        other => other.to_string(),
    }
}

fn group(key: Option<&str>, accumulators: &[Accumulator], docs: Vec<Record>) -> Vec<Record> {
    // groups in first-seen order
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(JsonValue, Vec<AccState>)> = Vec::new();

    for doc in &docs {
        let key_value = key
            .and_then(|k| get_path(doc, k))
            .cloned()
            .unwrap_or(JsonValue::Null);
        let slot = *index.entry(group_key(&key_value)).or_insert_with(|| {
            groups.push((
                key_value.clone(),
                accumulators.iter().map(|a| AccState::new(a.op)).collect(),
            ));
            groups.len() - 1
        });

        for (state, acc) in groups[slot].1.iter_mut().zip(accumulators) {
            state.update(acc, doc);
        }
    }

    groups
        .into_iter()
        .map(|(key_value, states)| {
            let mut row = Record::new();
            row.insert("_id".to_string(), key_value);
            for (state, acc) in states.into_iter().zip(accumulators) {
                row.insert(acc.output.clone(), state.finish());
            }
            row
        })
        .collect()
}

// ============================================================================
// Match
// ============================================================================

fn numbers_equal(a: &JsonValue, b: &JsonValue) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}

/// Ordering for range operators; `None` when the types are not comparable
fn range_ordering(actual: &JsonValue, expected: &JsonValue) -> Option<Ordering> {
    match (actual, expected) {
        (JsonValue::Number(_), JsonValue::Number(_))
        | (JsonValue::String(_), JsonValue::String(_)) => Some(compare_values(actual, expected)),
        _ => None,
    }
}

fn matches_condition(doc: &Record, condition: &Condition) -> bool {
    let actual = get_path(doc, &condition.field).unwrap_or(&JsonValue::Null);
    let expected = &condition.value;
    let ordering = || range_ordering(actual, expected);

    match condition.op {
        CompareOp::Eq => numbers_equal(actual, expected),
        CompareOp::Ne => !numbers_equal(actual, expected),
        CompareOp::Gt => ordering().is_some_and(Ordering::is_gt),
        CompareOp::Gte => ordering().is_some_and(Ordering::is_ge),
        CompareOp::Lt => ordering().is_some_and(Ordering::is_lt),
        CompareOp::Lte => ordering().is_some_and(Ordering::is_le),
    }
}

// ============================================================================
// Project
// ============================================================================

fn sum_of(value: Option<&JsonValue>) -> JsonValue {
    match value {
        Some(JsonValue::Array(items)) => items
            .iter()
            .filter(|v| v.is_number())
            .fold(Sum::Int(0), Sum::add)
            .into_json(),
        Some(v) if v.is_number() => v.clone(),
        _ => JsonValue::from(0),
    }
}

fn project(fields: &[Projection], doc: &Record) -> Record {
    let mut out = Record::new();
    if let Some(id) = doc.get("_id") {
        out.insert("_id".to_string(), id.clone());
    }
    for projection in fields {
        match projection {
            Projection::Field(name) => {
                if let Some(value) = get_path(doc, name) {
                    set_path(&mut out, name, value.clone());
                }
            }
            Projection::Sum { output, field } => {
                set_path(&mut out, output, sum_of(get_path(doc, field)));
            }
        }
    }
    out
}

// ============================================================================
// Sort
// ============================================================================

fn type_rank(value: &JsonValue) -> u8 {
    match value {
        JsonValue::Null => 0,
        JsonValue::Number(_) => 1,
        JsonValue::String(_) => 2,
        JsonValue::Object(_) => 3,
        JsonValue::Array(_) => 4,
        JsonValue::Bool(_) => 5,
    }
}

/// Total order over JSON values used for sorting and min/max
pub fn compare_values(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i.cmp(&j),
            _ => x
                .as_f64()
                .unwrap_or(f64::NAN)
                .total_cmp(&y.as_f64().unwrap_or(f64::NAN)),
        },
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        (JsonValue::Array(x), JsonValue::Array(y)) => x
            .iter()
            .zip(y)
            .map(|(l, r)| compare_values(l, r))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (JsonValue::Object(x), JsonValue::Object(y)) => x
            .iter()
            .zip(y)
            .map(|((lk, lv), (rk, rv))| lk.cmp(rk).then_with(|| compare_values(lv, rv)))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn sort(keys: &[SortKey], mut docs: Vec<Record>) -> Vec<Record> {
    docs.sort_by(|a, b| {
        keys.iter()
            .map(|key| {
                let left = get_path(a, &key.field).unwrap_or(&JsonValue::Null);
                let right = get_path(b, &key.field).unwrap_or(&JsonValue::Null);
                let ordering = compare_values(left, right);
                match key.order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            })
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    docs
}
