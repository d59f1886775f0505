//! Entity schemas for the streaming catalog
//!
//! Two document collections (`movies`, `series`) and two relational tables
//! (`users`, `viewing_sessions`).

use super::types::{EntitySchema, FieldDef, FieldType};

/// Movies collection name
pub const MOVIES: &str = "movies";
/// Series collection name
pub const SERIES: &str = "series";
/// Users table name
pub const USERS: &str = "users";
/// Viewing sessions table name
pub const VIEWING_SESSIONS: &str = "viewing_sessions";

/// Fields shared by every content document
fn content_base(name: &str) -> EntitySchema {
    EntitySchema::new(name)
        .field(FieldDef::required("content_id", FieldType::String))
        .field(FieldDef::required("title", FieldType::String))
        .field(FieldDef::required(
            "genre",
            FieldType::array_of(FieldType::String),
        ))
        .with_primary_key("content_id")
}

/// `movies` collection
pub fn movies() -> EntitySchema {
    content_base(MOVIES)
        .field(FieldDef::new("release_year", FieldType::Integer))
        .field(FieldDef::new("rating", FieldType::Number))
        .field(FieldDef::new("views_count", FieldType::Integer))
        .field(FieldDef::new("production_budget", FieldType::Number))
}

/// `series` collection
pub fn series() -> EntitySchema {
    content_base(SERIES)
        .field(FieldDef::new("seasons", FieldType::Integer))
        .field(FieldDef::new("rating", FieldType::Number))
        .field(FieldDef::new("total_views", FieldType::Integer))
        .field(FieldDef::new(
            "episodes_per_season",
            FieldType::array_of(FieldType::Integer),
        ))
        .field(FieldDef::new("production_budget", FieldType::Number))
}

/// `users` table
pub fn users() -> EntitySchema {
    EntitySchema::new(USERS)
        .field(FieldDef::required("user_id", FieldType::String))
        .field(FieldDef::new("age", FieldType::Integer))
        .field(FieldDef::new("country", FieldType::String).with_max_length(50))
        .field(FieldDef::new("subscription_type", FieldType::String).with_max_length(20))
        .field(FieldDef::new("registration_date", FieldType::Date))
        .field(FieldDef::new("total_watch_time_hours", FieldType::Number))
        .with_primary_key("user_id")
}

/// `viewing_sessions` table
pub fn viewing_sessions() -> EntitySchema {
    EntitySchema::new(VIEWING_SESSIONS)
        .field(FieldDef::required("session_id", FieldType::String))
        .field(FieldDef::new("user_id", FieldType::String))
        .field(FieldDef::new("content_id", FieldType::String))
        .field(FieldDef::new("watch_date", FieldType::Date))
        .field(FieldDef::new("watch_duration_minutes", FieldType::Integer))
        .field(FieldDef::new("completion_percentage", FieldType::Number))
        .field(FieldDef::new("device_type", FieldType::String).with_max_length(50))
        .field(FieldDef::new("quality_level", FieldType::String).with_max_length(20))
        .with_primary_key("session_id")
        .with_foreign_key("user_id", USERS, "user_id")
}
