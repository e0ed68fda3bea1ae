//! Repository layer for the entry store.
//!
//! All database access uses Diesel ORM over SQLite. Every call acquires its
//! own connection and releases it when the call returns.

pub mod context;
pub mod entry;
pub mod leaf_node;
pub mod models;
pub mod pool;
pub mod util;

pub use context::DbContext;
pub use entry::{EntryPage, EntryRepository, MatchMode};
pub use leaf_node::LeafNodeRepository;
pub use pool::{SqliteConn, SqlitePool};

use chrono::{DateTime, Utc};

/// Errors surfaced by the entry store gateway.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The request is missing or has an invalid parameter.
    #[error("{0}")]
    BadRequest(String),
    /// The store could not be reached or the query failed.
    #[error("entry store unavailable: {0}")]
    Unavailable(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(e: diesel::result::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<diesel::ConnectionError> for StoreError {
    fn from(e: diesel::ConnectionError) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Parse an optional datetime string from the database.
pub fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}
