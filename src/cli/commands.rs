//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fetch HubSpot CRM collections as JSON lines
#[derive(Parser, Debug)]
#[command(name = "hubspot-plug")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the available collections
    List,

    /// Show the parameters a collection accepts
    Describe {
        /// Collection name
        collection: String,
    },

    /// Fetch a collection and print its entries
    Read {
        /// Collection name
        collection: String,

        /// Parameter file (JSON or YAML)
        #[arg(short = 'C', long)]
        config: Option<PathBuf>,

        /// Parameter as key=value, overriding the file (repeatable)
        #[arg(short, long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Stop after this many entries
        #[arg(long)]
        max_entries: Option<usize>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one entry per line)
    Json,
    /// Human-readable output
    Pretty,
}
