//! Export document for a finished annotation round.
//!
//! The transform is pure: the same schema and annotations always produce
//! the same bytes. Model output that does not decode is exported as its
//! raw text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::annotate::is_item_error;
use super::query_schema::QuerySchema;
use crate::llm::is_malformed_placeholder;
use crate::models::{AiResult, Entry, Provider, LABEL_SEPARATOR};

/// Key under `Queries` that holds the per-entry values.
pub const EXAMPLES_KEY: &str = "Examples";

/// Default label written to `Information.Database Name`.
pub const DEFAULT_DATABASE_NAME: &str = "Bayesian";

/// One exported entry: its labels and its annotation, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEntry {
    #[serde(default)]
    pub leaf_nodes: Vec<String>,
    #[serde(default)]
    pub annotation: Option<AiResult>,
}

impl From<&Entry> for ExportEntry {
    fn from(entry: &Entry) -> Self {
        Self {
            leaf_nodes: entry.leaf_nodes.clone(),
            annotation: entry.annotation.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportInformation {
    #[serde(rename = "Database Name")]
    pub database_name: String,
    #[serde(rename = "Selected Note")]
    pub selected_note: String,
    #[serde(rename = "Provider", skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportExample {
    #[serde(rename = "Leaf_Nodes")]
    pub leaf_nodes: String,
    #[serde(rename = "Extracted_Values")]
    pub extracted_values: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportQueries {
    #[serde(flatten)]
    pub fields: QuerySchema,
    #[serde(rename = "Examples")]
    pub examples: Vec<ExportExample>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDocument {
    #[serde(rename = "Information")]
    pub information: ExportInformation,
    #[serde(rename = "Queries")]
    pub queries: ExportQueries,
}

impl ExportDocument {
    /// Render with two-space indentation.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Build the export document.
pub fn export(
    database_name: &str,
    leaf_node: &str,
    provider: Option<Provider>,
    schema: &QuerySchema,
    entries: &[ExportEntry],
) -> ExportDocument {
    let mut fields = schema.clone();
    if fields.remove(EXAMPLES_KEY).is_some() {
        warn!("Query field named '{}' is reserved and was left out", EXAMPLES_KEY);
    }

    let examples = entries
        .iter()
        .map(|entry| ExportExample {
            leaf_nodes: entry.leaf_nodes.join(LABEL_SEPARATOR),
            extracted_values: extracted_values(entry.annotation.as_ref(), schema),
        })
        .collect();

    ExportDocument {
        information: ExportInformation {
            database_name: database_name.to_string(),
            selected_note: leaf_node.to_string(),
            provider: provider.map(|p| p.code().to_string()),
        },
        queries: ExportQueries { fields, examples },
    }
}

/// Decode one annotation against the schema.
///
/// Object members named in the schema are coerced to their declared type.
/// A bare value is coerced when the schema has exactly one field. Output
/// that does not decode is kept as raw text; no annotation exports `null`.
/// Per-article errors and malformed-response placeholders are exported
/// verbatim, even when they quote a JSON body.
pub fn extracted_values(annotation: Option<&AiResult>, schema: &QuerySchema) -> Value {
    let Some(annotation) = annotation else {
        return Value::Null;
    };
    let raw = annotation.raw_text.as_str();
    if is_item_error(raw) || is_malformed_placeholder(raw) {
        return Value::String(raw.to_string());
    }

    match annotation.parsed_value() {
        Some(Value::Object(members)) => {
            let coerced: Map<String, Value> = members
                .into_iter()
                .map(|(key, value)| {
                    let value = match schema.get(&key) {
                        Some(field) => field.data_type.coerce(&value),
                        None => value,
                    };
                    (key, value)
                })
                .collect();
            Value::Object(coerced)
        }
        Some(value) if schema.len() == 1 => schema
            .values()
            .next()
            .map(|field| field.data_type.coerce(&value))
            .unwrap_or(value),
        Some(value) => value,
        None => Value::String(annotation.raw_text.clone()),
    }
}
