//! Domain models for the taxonomy catalog and annotation rounds.

mod annotation;
mod entry;
mod leaf_node;
mod query;

pub use annotation::{extract_structured, AiResult, Provider};
pub use entry::{Entry, LABEL_SEPARATOR};
pub use leaf_node::LeafNode;
pub use query::{DataType, QueryField};
