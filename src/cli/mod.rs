//! CLI module
//!
//! Thin runner over the collections.
//!
//! # Commands
//!
//! - `list` - Collection names and descriptions
//! - `describe` - Parameters of one collection
//! - `read` - Fetch a collection, one entry per line

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{collect_params, Runner};
