//! SQL rendering shared by the relational stores
//!
//! Identifiers are never quoted: `EntitySchema::check` and the index
//! builder only let plain identifiers through.

use crate::error::{Error, Result};
use crate::index::IndexSpec;
use crate::schema::{EntitySchema, FieldDef, FieldType};
use crate::types::{JsonValue, Record};
use chrono::NaiveDate;

/// Bind parameters PostgreSQL accepts in one statement
pub const MAX_BIND_PARAMETERS: usize = 65_535;

/// Largest batch a single multi-row insert into `schema` can carry
pub fn max_batch_rows(schema: &EntitySchema) -> usize {
    MAX_BIND_PARAMETERS / schema.fields.len().max(1)
}

/// SQL dialect of a relational store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    DuckDb,
}

impl Dialect {
    fn column_type(self, field: &FieldDef) -> Result<String> {
        let sql = match (&field.field_type, field.max_length) {
            (FieldType::String, Some(n)) => format!("VARCHAR({n})"),
            (FieldType::String, None) => "VARCHAR".to_string(),
            (FieldType::Integer, _) => "INT".to_string(),
            (FieldType::Number, _) => match self {
                Dialect::Postgres => "NUMERIC".to_string(),
                Dialect::DuckDb => "DOUBLE".to_string(),
            },
            (FieldType::Date, _) => "DATE".to_string(),
            (FieldType::Array(_), _) => {
                return Err(Error::schema(
                    &field.name,
                    "array fields have no relational column type",
                ))
            }
        };
        Ok(sql)
    }

    /// Placeholder for the `index`-th (1-based) parameter of a statement
    fn placeholder(self, index: usize, field_type: &FieldType) -> String {
        match self {
            Dialect::Postgres => {
                let cast = match field_type {
                    FieldType::Integer => "int8",
                    FieldType::Number => "float8",
                    FieldType::Date => "date",
                    FieldType::String | FieldType::Array(_) => "text",
                };
                format!("${index}::{cast}")
            }
            Dialect::DuckDb => match field_type {
                FieldType::Date => "CAST(? AS DATE)".to_string(),
                _ => "?".to_string(),
            },
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

/// `CREATE TABLE IF NOT EXISTS` with column types, primary and foreign keys
pub fn create_table(schema: &EntitySchema, dialect: Dialect) -> Result<String> {
    let mut columns = Vec::with_capacity(schema.fields.len());

    for field in &schema.fields {
        let mut column = format!("{} {}", field.name, dialect.column_type(field)?);
        if schema.primary_key.as_deref() == Some(field.name.as_str()) {
            column.push_str(" PRIMARY KEY");
        } else if field.required {
            column.push_str(" NOT NULL");
        }
        if let Some(fk) = schema.foreign_keys.iter().find(|fk| fk.field == field.name) {
            column.push_str(&format!(
                " REFERENCES {}({})",
                fk.references_entity, fk.references_field
            ));
        }
        columns.push(column);
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        schema.name,
        columns.join(", ")
    ))
}

/// Multi-row insert for `rows` records that skips primary key conflicts
pub fn insert_rows(schema: &EntitySchema, rows: usize, dialect: Dialect) -> String {
    let width = schema.fields.len();
    let tuples: Vec<String> = (0..rows)
        .map(|row| {
            let placeholders: Vec<String> = schema
                .fields
                .iter()
                .enumerate()
                .map(|(col, field)| dialect.placeholder(row * width + col + 1, &field.field_type))
                .collect();
            format!("({})", placeholders.join(", "))
        })
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES {} ON CONFLICT DO NOTHING",
        schema.name,
        schema.field_names().join(", "),
        tuples.join(", ")
    )
}

/// `CREATE [UNIQUE] INDEX IF NOT EXISTS`
pub fn create_index(entity: &str, index: &IndexSpec) -> String {
    let keys: Vec<String> = index
        .keys
        .iter()
        .map(|k| format!("{} {}", k.field, k.order.sql_keyword()))
        .collect();

    format!(
        "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
        if index.unique { "UNIQUE " } else { "" },
        index.name(entity),
        entity,
        keys.join(", ")
    )
}

// ============================================================================
// Parameters
// ============================================================================

/// A typed, possibly null statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    Int(Option<i64>),
    Float(Option<f64>),
    Date(Option<NaiveDate>),
}

fn sql_value(field: &FieldDef, value: Option<&JsonValue>) -> std::result::Result<SqlValue, String> {
    let value = value.filter(|v| !v.is_null());
    let mismatch = |v: &JsonValue| format!("field '{}' expected {}, got {v}", field.name, field.field_type);

    let converted = match &field.field_type {
        FieldType::String => SqlValue::Text(
            value
                .map(|v| v.as_str().map(str::to_string).ok_or_else(|| mismatch(v)))
                .transpose()?,
        ),
        FieldType::Integer => SqlValue::Int(
            value
                .map(|v| v.as_i64().ok_or_else(|| mismatch(v)))
                .transpose()?,
        ),
        FieldType::Number => SqlValue::Float(
            value
                .map(|v| v.as_f64().ok_or_else(|| mismatch(v)))
                .transpose()?,
        ),
        FieldType::Date => SqlValue::Date(
            value
                .map(|v| {
                    v.as_str()
                        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                        .ok_or_else(|| mismatch(v))
                })
                .transpose()?,
        ),
        FieldType::Array(_) => return Err(format!("field '{}' is an array", field.name)),
    };
    Ok(converted)
}

/// Parameters for a batch, row-major in schema field order
pub fn batch_values(schema: &EntitySchema, records: &[Record]) -> Result<Vec<SqlValue>> {
    let mut values = Vec::with_capacity(records.len() * schema.fields.len());
    for record in records {
        if let Some(missing) = schema
            .required_fields()
            .into_iter()
            .find(|name| record.get(*name).map_or(true, JsonValue::is_null))
        {
            return Err(Error::validation(
                &schema.name,
                format!("missing required field '{missing}'"),
            ));
        }
        for field in &schema.fields {
            values.push(
                sql_value(field, record.get(&field.name))
                    .map_err(|message| Error::validation(&schema.name, message))?,
            );
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::session_indexes;
    use crate::schema::catalog;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_create_users_table() {
        let ddl = create_table(&catalog::users(), Dialect::Postgres).unwrap();
        assert_eq!(
            ddl,
            "CREATE TABLE IF NOT EXISTS users (user_id VARCHAR PRIMARY KEY, age INT, \
             country VARCHAR(50), subscription_type VARCHAR(20), registration_date DATE, \
             total_watch_time_hours NUMERIC)"
        );
    }

    #[test]
    fn test_create_sessions_table_has_foreign_key() {
        let ddl = create_table(&catalog::viewing_sessions(), Dialect::DuckDb).unwrap();
        assert!(ddl.contains("user_id VARCHAR REFERENCES users(user_id)"));
        assert!(ddl.contains("completion_percentage DOUBLE"));
    }

    #[test]
    fn test_array_fields_have_no_column_type() {
        let err = create_table(&catalog::movies(), Dialect::Postgres).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }

    #[test]
    fn test_insert_rows_postgres() {
        let sql = insert_rows(&catalog::users(), 2, Dialect::Postgres);
        assert_eq!(
            sql,
            "INSERT INTO users (user_id, age, country, subscription_type, registration_date, \
             total_watch_time_hours) VALUES \
             ($1::text, $2::int8, $3::text, $4::text, $5::date, $6::float8), \
             ($7::text, $8::int8, $9::text, $10::text, $11::date, $12::float8) \
             ON CONFLICT DO NOTHING"
        );
    }

    #[test]
    fn test_insert_rows_duckdb() {
        let sql = insert_rows(&catalog::users(), 1, Dialect::DuckDb);
        assert!(sql.ends_with("VALUES (?, ?, ?, ?, CAST(? AS DATE), ?) ON CONFLICT DO NOTHING"));
    }

    #[test]
    fn test_create_index_statement() {
        let indexes = session_indexes();
        assert_eq!(
            create_index("viewing_sessions", &indexes[0]),
            "CREATE INDEX IF NOT EXISTS viewing_sessions_user_id_asc ON viewing_sessions (user_id ASC)"
        );
    }

    #[test]
    fn test_max_batch_rows() {
        assert_eq!(max_batch_rows(&catalog::viewing_sessions()), 8191);
        assert_eq!(max_batch_rows(&catalog::users()), 10922);
    }

    #[test]
    fn test_batch_values_types_and_nulls() {
        let record = json!({
            "user_id": "u1",
            "age": 30,
            "registration_date": "2023-01-15",
            "total_watch_time_hours": 12.5
        });
        let values = batch_values(&catalog::users(), &[record.as_object().unwrap().clone()]).unwrap();

        assert_eq!(
            values,
            vec![
                SqlValue::Text(Some("u1".to_string())),
                SqlValue::Int(Some(30)),
                SqlValue::Text(None),
                SqlValue::Text(None),
                SqlValue::Date(NaiveDate::from_ymd_opt(2023, 1, 15)),
                SqlValue::Float(Some(12.5)),
            ]
        );
    }

    #[test]
    fn test_batch_values_rejects_bad_type() {
        let record = json!({"user_id": "u1", "age": "thirty"});
        let err = batch_values(&catalog::users(), &[record.as_object().unwrap().clone()]).unwrap_err();
        assert!(err.to_string().contains("field 'age' expected integer"));
    }

    #[test]
    fn test_batch_values_requires_primary_key() {
        let record = json!({"age": 30});
        let err = batch_values(&catalog::users(), &[record.as_object().unwrap().clone()]).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
