//! leafmark - taxonomy-driven entry retrieval and batch LLM annotation.
//!
//! Entries are text records labeled with leaf nodes from a hierarchical
//! catalog. An operator selects entries by leaf node, declares the fields
//! to extract, runs an annotation round against a completion provider, and
//! exports the merged results.

pub mod cli;
pub mod config;
pub mod llm;
pub mod models;
pub mod repository;
pub mod schema;
pub mod server;
pub mod services;
