//! HTTP request handlers for the web server.

mod annotate;
mod catalog;
mod entries;
mod export;
mod helpers;

pub use annotate::annotate_articles;
pub use catalog::{list_leaf_nodes, max_depth, refresh_catalog};
pub use entries::list_entries;
pub use export::export_document;
