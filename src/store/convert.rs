//! JSON <-> BSON conversion
//!
//! Integers that fit in 32 bits become BSON `int` so that they satisfy
//! `bsonType: "int"` validators; larger ones become `long`.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue, Record};
use mongodb::bson::{Bson, Document};

/// Convert a JSON value to BSON
pub fn json_to_bson(value: &JsonValue) -> Bson {
    match value {
        JsonValue::Null => Bson::Null,
        JsonValue::Bool(b) => Bson::Boolean(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).map_or(Bson::Int64(i), Bson::Int32)
            } else if let Some(u) = n.as_u64() {
                i64::try_from(u).map_or(Bson::Double(u as f64), Bson::Int64)
            } else {
                Bson::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => Bson::String(s.clone()),
        JsonValue::Array(items) => Bson::Array(items.iter().map(json_to_bson).collect()),
        JsonValue::Object(map) => Bson::Document(object_to_document(map)),
    }
}

/// Convert a JSON object to a BSON document, keeping key order
pub fn object_to_document(map: &JsonObject) -> Document {
    map.iter()
        .map(|(k, v)| (k.clone(), json_to_bson(v)))
        .collect()
}

/// Convert a JSON value that must be an object
pub fn json_to_document(value: &JsonValue) -> Result<Document> {
    match value {
        JsonValue::Object(map) => Ok(object_to_document(map)),
        other => Err(Error::Other(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Convert BSON back to JSON for reporting
pub fn bson_to_json(value: Bson) -> JsonValue {
    match value {
        Bson::Null | Bson::Undefined => JsonValue::Null,
        Bson::Boolean(b) => JsonValue::Bool(b),
        Bson::Int32(i) => JsonValue::from(i),
        Bson::Int64(i) => JsonValue::from(i),
        Bson::Double(f) => serde_json::Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number),
        Bson::String(s) => JsonValue::String(s),
        Bson::Array(items) => JsonValue::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::Document(doc) => JsonValue::Object(document_to_record(doc)),
        Bson::ObjectId(oid) => JsonValue::String(oid.to_hex()),
        Bson::DateTime(dt) => dt
            .try_to_rfc3339_string()
            .map_or_else(|_| JsonValue::from(dt.timestamp_millis()), JsonValue::String),
        other => other.into_relaxed_extjson(),
    }
}

/// Convert a BSON document to a record
pub fn document_to_record(doc: Document) -> Record {
    doc.into_iter().map(|(k, v)| (k, bson_to_json(v))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;
    use serde_json::json;

    #[test]
    fn test_small_integers_become_int32() {
        assert_eq!(json_to_bson(&json!(2020)), Bson::Int32(2020));
        assert_eq!(
            json_to_bson(&json!(5_000_000_000_i64)),
            Bson::Int64(5_000_000_000)
        );
        assert_eq!(json_to_bson(&json!(4.5)), Bson::Double(4.5));
    }

    #[test]
    fn test_object_to_document_keeps_nesting() {
        let value = json!({
            "content_id": "M001",
            "genre": ["Drama", "Comedy"],
            "stats": {"views": 10}
        });

        let doc = json_to_document(&value).unwrap();
        assert_eq!(
            doc,
            doc! {
                "content_id": "M001",
                "genre": ["Drama", "Comedy"],
                "stats": { "views": 10 }
            }
        );
    }

    #[test]
    fn test_json_to_document_rejects_scalars() {
        assert!(json_to_document(&json!("movie")).is_err());
    }

    #[test]
    fn test_bson_to_json() {
        let doc = doc! {
            "_id": 2020,
            "avg_rating": 3.0,
            "total": 5_000_000_000_i64,
            "missing": Bson::Null
        };

        let record = document_to_record(doc);
        assert_eq!(record["_id"], json!(2020));
        assert_eq!(record["avg_rating"], json!(3.0));
        assert_eq!(record["total"], json!(5_000_000_000_i64));
        assert_eq!(record["missing"], JsonValue::Null);
    }
}
