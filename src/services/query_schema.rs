//! Combines operator-declared query fields into one instruction and an export schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{DataType, QueryField};

/// Export-side description of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "Question")]
    pub question: String,
    #[serde(rename = "Data Type")]
    pub data_type: DataType,
}

/// Field name to question and type. Keys sort lexically so exports are stable.
pub type QuerySchema = BTreeMap<String, FieldSpec>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQuery {
    /// Instruction sent with every article in a round.
    pub instruction: String,
    pub schema: QuerySchema,
}

/// Build the combined instruction and the export schema.
///
/// Names are trimmed. Rows with a blank name or question are left out of
/// the instruction but still land in the schema. A later row replaces an
/// earlier one with the same name.
pub fn build(fields: &[QueryField]) -> BuiltQuery {
    let mut schema = QuerySchema::new();
    for field in fields {
        schema.insert(
            field.item_name.trim().to_string(),
            FieldSpec {
                question: field.question.clone(),
                data_type: field.data_type,
            },
        );
    }

    let mut questions = Map::new();
    let mut types = Vec::new();
    for field in fields.iter().filter(|f| f.is_complete()) {
        let name = field.item_name.trim();
        questions.insert(name.to_string(), Value::String(field.question.trim().to_string()));
        types.retain(|(n, _): &(String, DataType)| n != name);
        types.push((name.to_string(), field.data_type));
    }

    BuiltQuery {
        instruction: instruction_for(&questions, &types),
        schema,
    }
}

fn instruction_for(questions: &Map<String, Value>, types: &[(String, DataType)]) -> String {
    if questions.is_empty() {
        return String::new();
    }

    let hints = types
        .iter()
        .map(|(name, data_type)| format!("{}: {}", name, data_type.as_str()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Answer each question and reply with one JSON object using these keys: {}. Value types: {}",
        Value::Object(questions.clone()),
        hints
    )
}
