//! Offline ingestion of entry records and the taxonomy catalog.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::models::{Entry, LeafNode, QueryField};
use crate::repository::{DbContext, StoreError};

/// One record of an entries file.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRecord {
    #[serde(rename = "Leaf_Nodes", default)]
    pub leaf_nodes: String,
    #[serde(rename = "OpenAI_Summary", default)]
    pub summary: String,
    #[serde(rename = "ArticleBody", default)]
    pub body: String,
}

impl From<ImportRecord> for Entry {
    fn from(record: ImportRecord) -> Self {
        Entry::new(
            Entry::split_labels(&record.leaf_nodes),
            record.summary,
            record.body,
        )
    }
}

/// Read a JSON array of entry records.
pub fn read_entries(path: &Path) -> anyhow::Result<Vec<Entry>> {
    let contents = std::fs::read_to_string(path)?;
    let records: Vec<ImportRecord> = serde_json::from_str(&contents)?;
    Ok(records.into_iter().map(Entry::from).collect())
}

/// Read a JSON array of `{name, depth, percentage}` objects.
pub fn read_leaf_nodes(path: &Path) -> anyhow::Result<Vec<LeafNode>> {
    let contents = std::fs::read_to_string(path)?;
    let nodes: Vec<LeafNode> = serde_json::from_str(&contents)?;
    Ok(nodes
        .into_iter()
        .map(|n| LeafNode::new(n.name, n.depth, n.percentage))
        .collect())
}

#[derive(Debug, Deserialize)]
struct FieldsFile {
    #[serde(default)]
    fields: Vec<QueryField>,
}

/// Read query fields from a TOML file (`[[fields]]` tables) or a JSON file
/// (an array, or an object with a `fields` array).
pub fn read_fields(path: &Path) -> anyhow::Result<Vec<QueryField>> {
    let contents = std::fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    let fields = match ext {
        "toml" => toml::from_str::<FieldsFile>(&contents)?.fields,
        _ => match serde_json::from_str::<Vec<QueryField>>(&contents) {
            Ok(fields) => fields,
            Err(_) => serde_json::from_str::<FieldsFile>(&contents)?.fields,
        },
    };
    Ok(fields)
}

/// Derive the catalog from the entries themselves.
///
/// Depth comes from the `/`-separated name; percentage is the share of
/// entries carrying the label, rounded to two decimals.
pub fn derive_catalog(entries: &[Entry]) -> Vec<LeafNode> {
    if entries.is_empty() {
        return Vec::new();
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        for label in &entry.leaf_nodes {
            *counts.entry(label.as_str()).or_default() += 1;
        }
    }

    let total = entries.len() as f64;
    let mut nodes: Vec<LeafNode> = counts
        .into_iter()
        .map(|(name, count)| {
            let percentage = (count as f64 * 100.0 / total * 100.0).round() / 100.0;
            LeafNode::new(name, LeafNode::depth_of(name), percentage)
        })
        .collect();

    nodes.sort_by(|a, b| {
        b.percentage
            .total_cmp(&a.percentage)
            .then_with(|| a.name.cmp(&b.name))
    });
    nodes
}

/// Counts written by [`store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub removed: usize,
    pub entries: usize,
    pub leaf_nodes: usize,
}

/// Write entries and a catalog to the store.
///
/// With no `catalog`, weights are recomputed over every stored entry after
/// the insert, and the catalog is rewritten from scratch.
pub async fn store(
    ctx: &DbContext,
    entries: &[Entry],
    catalog: Option<&[LeafNode]>,
    replace: bool,
) -> Result<ImportSummary, StoreError> {
    let entry_repo = ctx.entries();
    let node_repo = ctx.leaf_nodes();

    let mut removed = 0;
    if replace {
        removed = entry_repo.clear().await?;
        node_repo.clear().await?;
    }

    let saved = entry_repo.insert_all(entries).await?;

    let leaf_nodes = match catalog {
        Some(nodes) => node_repo.save_all(nodes).await?,
        None => {
            let corpus = entry_repo.list_all().await?;
            let derived = derive_catalog(&corpus);
            node_repo.clear().await?;
            info!(
                "Derived {} leaf nodes from {} stored entries",
                derived.len(),
                corpus.len()
            );
            node_repo.save_all(&derived).await?
        }
    };

    Ok(ImportSummary {
        removed,
        entries: saved.len(),
        leaf_nodes,
    })
}
