//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod annotate;
mod catalog;
mod import;
mod init;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};
use crate::models::Provider;

#[derive(Parser)]
#[command(name = "leafmark")]
#[command(about = "Taxonomy-driven entry retrieval and batch LLM annotation")]
#[command(version)]
pub struct Cli {
    /// Data directory or database file (overrides config file)
    #[arg(long, short = 'd', global = true)]
    data: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Import entries (and optionally the leaf node catalog) from JSON files
    Import {
        /// JSON array of {Leaf_Nodes, OpenAI_Summary, ArticleBody} records
        entries: PathBuf,
        /// JSON array of {name, depth, percentage}; derived from entries if omitted
        #[arg(long)]
        leaf_nodes: Option<PathBuf>,
        /// Remove existing entries and leaf nodes first
        #[arg(long)]
        replace: bool,
    },

    /// List leaf nodes, highest percentage first
    LeafNodes {
        /// Only show this depth
        #[arg(long)]
        depth: Option<i32>,
    },

    /// List entries labeled with a leaf node
    Entries {
        /// Leaf node name
        leaf_node: String,
        /// Match the whole label field instead of a substring
        #[arg(long)]
        exact: bool,
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "10")]
        page_size: u32,
    },

    /// Run an annotation round over entries and write the export document
    Annotate {
        /// Leaf node name
        leaf_node: String,
        /// Query fields file (TOML or JSON)
        #[arg(short, long)]
        fields: PathBuf,
        /// Provider: A (Anthropic) or B (OpenAI)
        #[arg(short, long, default_value = "A")]
        provider: Provider,
        /// Match the whole label field instead of a substring
        #[arg(long)]
        exact: bool,
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "10")]
        page_size: u32,
        /// Annotate every matching entry instead of one page
        #[arg(long, conflicts_with_all = ["page", "page_size"])]
        all: bool,
        /// Export file
        #[arg(short, long, default_value = "result.json")]
        output: PathBuf,
    },

    /// Start the web server
    Serve {
        /// Bind address: port, host, or host:port
        #[arg(default_value = "127.0.0.1:3030")]
        bind: String,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data: cli.data,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Import {
            entries,
            leaf_nodes,
            replace,
        } => import::cmd_import(&settings, &entries, leaf_nodes.as_deref(), replace).await,
        Commands::LeafNodes { depth } => catalog::cmd_leaf_nodes(&settings, depth).await,
        Commands::Entries {
            leaf_node,
            exact,
            page,
            page_size,
        } => catalog::cmd_entries(&settings, &leaf_node, exact, page, page_size).await,
        Commands::Annotate {
            leaf_node,
            fields,
            provider,
            exact,
            page,
            page_size,
            all,
            output,
        } => {
            let selection = if all {
                annotate::Selection::All
            } else {
                annotate::Selection::Page { page, page_size }
            };
            annotate::cmd_annotate(
                &settings, &leaf_node, &fields, provider, exact, selection, &output,
            )
            .await
        }
        Commands::Serve { bind } => serve::cmd_serve(&settings, &bind).await,
    }
}
