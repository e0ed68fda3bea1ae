//! Diesel ORM models for database tables.

use diesel::prelude::*;

use super::parse_datetime_opt;
use crate::models::{AiResult, Entry, LeafNode, Provider};
use crate::schema;

/// Leaf node record from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::leaf_nodes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LeafNodeRecord {
    pub name: String,
    pub depth: i32,
    pub percentage: f64,
}

/// New leaf node for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::leaf_nodes)]
pub struct NewLeafNode<'a> {
    pub name: &'a str,
    pub depth: i32,
    pub percentage: f64,
}

/// Entry record from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EntryRecord {
    pub id: i32,
    pub labels: String,
    pub summary: String,
    pub body: String,
    pub annotation_provider: Option<String>,
    pub annotation_text: Option<String>,
    pub annotated_at: Option<String>,
    /// Lowercased `labels`, used for case-insensitive matching.
    pub labels_folded: String,
}

/// New entry for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::entries)]
pub struct NewEntry<'a> {
    pub labels: &'a str,
    pub summary: &'a str,
    pub body: &'a str,
    pub labels_folded: &'a str,
}

impl From<LeafNodeRecord> for LeafNode {
    fn from(record: LeafNodeRecord) -> Self {
        LeafNode {
            name: record.name,
            depth: record.depth,
            percentage: record.percentage,
        }
    }
}

impl From<EntryRecord> for Entry {
    fn from(record: EntryRecord) -> Self {
        let annotation = match (record.annotation_provider, record.annotation_text) {
            (Some(provider), Some(raw_text)) => {
                Provider::from_code(&provider).map(|provider| AiResult {
                    provider,
                    raw_text,
                    annotated_at: parse_datetime_opt(record.annotated_at),
                })
            }
            _ => None,
        };

        Entry {
            id: record.id,
            leaf_nodes: Entry::split_labels(&record.labels),
            summary: record.summary,
            body: record.body,
            annotation,
        }
    }
}
