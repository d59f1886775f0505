//! Schema types

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::LazyLock;

/// Identifiers allowed for entity and field names.
///
/// Names are interpolated into DDL, so anything outside this set is refused.
static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").unwrap());

/// Check whether a name is a safe identifier
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_REGEX.is_match(name)
}

/// Declared type of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    /// Integer or floating point
    Number,
    /// Calendar date (`YYYY-MM-DD` in records)
    Date,
    Array(Box<FieldType>),
}

impl FieldType {
    /// Array of the given item type
    pub fn array_of(item: FieldType) -> Self {
        FieldType::Array(Box::new(item))
    }

    /// Check a JSON value against this type. Null never matches.
    pub fn matches(&self, value: &JsonValue) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::Date => value
                .as_str()
                .is_some_and(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()),
            FieldType::Array(item) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|v| item.matches(v))),
        }
    }

    /// `bsonType` rendering for a `$jsonSchema` validator
    fn bson_type(&self) -> JsonValue {
        match self {
            FieldType::String => json!("string"),
            FieldType::Integer => json!(["int", "long"]),
            FieldType::Number => json!(["double", "int", "long", "decimal"]),
            FieldType::Date => json!(["date", "string"]),
            FieldType::Array(_) => json!("array"),
        }
    }

    fn to_json_schema(&self) -> JsonValue {
        let mut property = JsonObject::new();
        property.insert("bsonType".to_string(), self.bson_type());
        if let FieldType::Array(item) = self {
            property.insert("items".to_string(), item.to_json_schema());
        }
        JsonValue::Object(property)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Number => write!(f, "number"),
            FieldType::Date => write!(f, "date"),
            FieldType::Array(item) => write!(f, "array<{item}>"),
        }
    }
}

/// A single field of an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field / column name
    pub name: String,
    /// Declared type
    pub field_type: FieldType,
    /// Whether the field must be present
    #[serde(default)]
    pub required: bool,
    /// Maximum length for strings (relational `VARCHAR(n)`)
    #[serde(default)]
    pub max_length: Option<u32>,
}

impl FieldDef {
    /// Create an optional field
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            max_length: None,
        }
    }

    /// Create a required field
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            required: true,
            ..Self::new(name, field_type)
        }
    }

    /// Set the maximum string length
    #[must_use]
    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

/// Foreign key from a field to another entity's field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub field: String,
    pub references_entity: String,
    pub references_field: String,
}

/// Declarative description of a collection or table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    /// Collection / table name
    pub name: String,
    /// Fields in column order
    pub fields: Vec<FieldDef>,
    /// Unique key used for idempotent inserts
    #[serde(default)]
    pub primary_key: Option<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

impl EntitySchema {
    /// Create an empty schema
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
        }
    }

    /// Add a field
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the primary key
    #[must_use]
    pub fn with_primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = Some(field.into());
        self
    }

    /// Add a foreign key
    #[must_use]
    pub fn with_foreign_key(
        mut self,
        field: impl Into<String>,
        references_entity: impl Into<String>,
        references_field: impl Into<String>,
    ) -> Self {
        self.foreign_keys.push(ForeignKey {
            field: field.into(),
            references_entity: references_entity.into(),
            references_field: references_field.into(),
        });
        self
    }

    /// Look up a field by name
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in column order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Names of required fields (the primary key is always required)
    pub fn required_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.required || self.primary_key.as_deref() == Some(f.name.as_str()))
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Check that the schema itself is well formed
    pub fn check(&self) -> Result<()> {
        if !is_valid_identifier(&self.name) {
            return Err(Error::schema(&self.name, "invalid entity name"));
        }
        if self.fields.is_empty() {
            return Err(Error::schema(&self.name, "entity has no fields"));
        }

        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if !is_valid_identifier(&field.name) {
                return Err(Error::schema(
                    &self.name,
                    format!("invalid field name '{}'", field.name),
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::schema(
                    &self.name,
                    format!("duplicate field '{}'", field.name),
                ));
            }
        }

        if let Some(pk) = &self.primary_key {
            if self.get_field(pk).is_none() {
                return Err(Error::schema(
                    &self.name,
                    format!("primary key '{pk}' is not a field"),
                ));
            }
        }

        for fk in &self.foreign_keys {
            if self.get_field(&fk.field).is_none() {
                return Err(Error::schema(
                    &self.name,
                    format!("foreign key '{}' is not a field", fk.field),
                ));
            }
            if !is_valid_identifier(&fk.references_entity)
                || !is_valid_identifier(&fk.references_field)
            {
                return Err(Error::schema(
                    &self.name,
                    format!("invalid foreign key target for '{}'", fk.field),
                ));
            }
        }

        Ok(())
    }

    /// Render the `$jsonSchema` validator body for a document collection
    pub fn to_json_schema(&self) -> JsonValue {
        let properties: JsonObject = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.field_type.to_json_schema()))
            .collect();

        json!({
            "bsonType": "object",
            "required": self.required_fields(),
            "properties": properties,
        })
    }

    /// Validate a record the way the document store's validator would.
    ///
    /// Required fields must be present; every declared field that is present
    /// must match its type. Undeclared fields are allowed.
    pub fn validate(&self, record: &JsonObject) -> std::result::Result<(), String> {
        for name in self.required_fields() {
            if !record.contains_key(name) {
                return Err(format!("missing required field '{name}'"));
            }
        }

        for field in &self.fields {
            if let Some(value) = record.get(&field.name) {
                if !field.field_type.matches(value) {
                    return Err(format!(
                        "field '{}' expected {}, got {}",
                        field.name,
                        field.field_type,
                        describe(value)
                    ));
                }
            }
        }

        Ok(())
    }

    /// Validate a whole batch, reporting the first rejected record by index
    pub fn validate_all(&self, records: &[JsonObject]) -> std::result::Result<(), String> {
        records
            .iter()
            .enumerate()
            .try_for_each(|(i, record)| {
                self.validate(record)
                    .map_err(|message| format!("document {i}: {message}"))
            })
    }
}

fn describe(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(n) if n.is_f64() => "double",
        JsonValue::Number(_) => "integer",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
