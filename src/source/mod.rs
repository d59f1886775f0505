//! Input sources
//!
//! - `load_catalog` - the JSON content document (movies and series)
//! - `read_users` / `read_sessions` - CSV exports of the viewing data

mod content;
mod tabular;
mod types;

pub use content::{load_catalog, parse_catalog};
pub use tabular::{read_sessions, read_users};
pub use types::{ContentCatalog, SessionRecord, UserRecord};
