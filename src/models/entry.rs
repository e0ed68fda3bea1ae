//! Entry model: a text record labeled with one or more leaf nodes.

use serde::{Deserialize, Serialize};

use super::AiResult;

/// Separator used when leaf node labels are joined into one field.
pub const LABEL_SEPARATOR: &str = ", ";

/// A stored text record.
///
/// Entries carry no identity beyond their position in a query result; `id`
/// is the storage row key and is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(skip)]
    pub id: i32,
    pub leaf_nodes: Vec<String>,
    pub summary: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<AiResult>,
}

impl Entry {
    /// Create an unsaved entry. Labels are trimmed and deduplicated, keeping first occurrence.
    pub fn new<I, S>(leaf_nodes: I, summary: impl Into<String>, body: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            id: 0,
            leaf_nodes: dedup_labels(leaf_nodes),
            summary: summary.into(),
            body: body.into(),
            annotation: None,
        }
    }

    /// Split a joined label field back into labels.
    pub fn split_labels(joined: &str) -> Vec<String> {
        dedup_labels(joined.split(','))
    }

    /// The joined leaf node field as stored and matched against.
    pub fn joined_leaf_nodes(&self) -> String {
        self.leaf_nodes.join(LABEL_SEPARATOR)
    }
}

fn dedup_labels<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for label in labels {
        let label = label.as_ref().trim();
        if label.is_empty() || out.iter().any(|l| l == label) {
            continue;
        }
        out.push(label.to_string());
    }
    out
}
