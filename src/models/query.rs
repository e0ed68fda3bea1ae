//! Operator-declared query fields and their data types.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Declared type of an extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    String,
    Int,
    Float,
    Bool,
    Date,
    Datetime,
    List,
    Dict,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::List => "list",
            Self::Dict => "dict",
        }
    }

    /// Coerce a decoded value to this type.
    ///
    /// Values that cannot be coerced come back as their raw text.
    pub fn coerce(&self, value: &Value) -> Value {
        let coerced = match self {
            Self::String => Some(Value::String(raw_text(value))),
            Self::Int => coerce_int(value),
            Self::Float => coerce_float(value),
            Self::Bool => coerce_bool(value),
            Self::Date => value
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
            Self::Datetime => value.as_str().and_then(parse_datetime).map(Value::String),
            Self::List => match value {
                Value::Array(_) => Some(value.clone()),
                Value::String(s) => serde_json::from_str::<Value>(s).ok().filter(Value::is_array),
                _ => None,
            },
            Self::Dict => match value {
                Value::Object(_) => Some(value.clone()),
                Value::String(s) => serde_json::from_str::<Value>(s).ok().filter(Value::is_object),
                _ => None,
            },
        };
        coerced.unwrap_or_else(|| Value::String(raw_text(value)))
    }
}

/// One row of the operator's query form.
///
/// A blank `item_name` or `question` keeps the row out of the instruction
/// but not out of the export schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryField {
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub data_type: DataType,
}

impl QueryField {
    pub fn new(item_name: impl Into<String>, question: impl Into<String>, data_type: DataType) -> Self {
        Self {
            item_name: item_name.into(),
            question: question.into(),
            data_type,
        }
    }

    /// Whether this row contributes to the combined instruction.
    pub fn is_complete(&self) -> bool {
        !self.item_name.trim().is_empty() && !self.question.trim().is_empty()
    }
}

fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn numeric_text(s: &str) -> String {
    s.trim().chars().filter(|c| *c != ',' && *c != '_').collect()
}

fn coerce_int(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| Value::from(f as i64)),
        Value::String(s) => numeric_text(s).parse::<i64>().ok().map(Value::from),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<Value> {
    let f = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => numeric_text(s).parse::<f64>().ok(),
        _ => None,
    }?;
    Number::from_f64(f).map(Value::Number)
}

fn coerce_bool(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(_) => Some(value.clone()),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => Some(Value::Bool(true)),
            "false" | "no" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn parse_datetime(s: &str) -> Option<String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.to_rfc3339());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.and_utc().to_rfc3339())
}
