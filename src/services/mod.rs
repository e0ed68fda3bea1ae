//! Service layer: query building, annotation rounds and export.
//!
//! Services hold no UI concerns and are shared by the CLI and the web server.

pub mod annotate;
pub mod export;
pub mod ingest;
pub mod query_schema;

pub use annotate::{item_error, is_item_error, AnnotationDispatcher, DispatchEvent};
pub use export::{export, ExportDocument, ExportEntry, DEFAULT_DATABASE_NAME};
pub use query_schema::{build as build_query, BuiltQuery, FieldSpec, QuerySchema};
