//! # hubspot-plug
//!
//! Paginated HubSpot CRM collections as pull-based entry streams.
//!
//! Each collection (companies, contacts, deals, owners) maps its parameters
//! onto a list request, walks the pages with a response-driven paginator,
//! selects entries from each page, and optionally replaces every entry with
//! the result of a per-entry detail request.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hubspot_plug::{collections, http::HttpClientConfig, Result};
//! use serde_json::json;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let params = json!({ "apikey": "demo", "recently": "created" });
//!     let deals = collections::find("deals")?;
//!     let mut pipeline = collections::open(
//!         deals,
//!         params.as_object().unwrap(),
//!         HttpClientConfig::default(),
//!         CancellationToken::new(),
//!     )
//!     .await?;
//!
//!     while let Some(deal) = pipeline.next_entry().await? {
//!         println!("{deal}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │        Collections: companies · contacts · deals · owners     │
//! │     declaration → validate → resolve → ResourceSpec            │
//! └──────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬─────────────┬─────┴───────┬────────────┬──────────┐
//! │ Mapping  │    HTTP     │  Paginate   │  Extract   │  Engine  │
//! ├──────────┼─────────────┼─────────────┼────────────┼──────────┤
//! │ asIs     │ 429 policy  │ has-more    │ selectors  │ fetcher  │
//! │ rename   │ retry cap   │ cursors     │ JSONPath   │ enricher │
//! │ remap    │ rate limit  │ since stop  │ entries    │ stream   │
//! └──────────┴─────────────┴─────────────┴────────────┴──────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Parameter to query/header mapping
pub mod mapping;

/// HTTP client with throttling policy and rate limiting
pub mod http;

/// Entry selection from response documents
pub mod extract;

/// Pagination strategies
pub mod pagination;

/// Path templates for detail requests
pub mod template;

/// Paged fetcher, detail enricher and pipeline
pub mod engine;

/// Parameter declarations and parameter input
pub mod config;

/// The HubSpot collections
pub mod collections;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
