//! Engine types
//!
//! Resource descriptions, statistics, and the pull contract shared by the
//! fetcher and the enricher.

use crate::error::Result;
use crate::extract::Selector;
use crate::mapping::RequestParts;
use crate::pagination::Paginator;
use crate::template::PathTemplate;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Everything one pipeline needs to fetch a resource
///
/// Produced by a collection from validated parameters; request parts are
/// already mapped.
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    /// Collection name, for logging
    pub name: String,
    /// List path, resolved against the client's endpoint
    pub list_path: String,
    /// Entry selector applied to each page
    pub selector: Selector,
    /// Paging strategy
    pub paginator: Arc<dyn Paginator>,
    /// Query and headers of the first page request
    pub parts: RequestParts,
    /// Per-entry detail request, if the resource is enriched
    pub detail: Option<DetailSpec>,
}

/// Per-entry detail request
#[derive(Debug, Clone)]
pub struct DetailSpec {
    /// Path rendered from each entry
    pub template: PathTemplate,
    /// Query and headers of every detail request
    pub parts: RequestParts,
}

impl DetailSpec {
    /// Create a detail spec
    pub fn new(template: impl Into<String>, parts: RequestParts) -> Self {
        Self {
            template: PathTemplate::new(template),
            parts,
        }
    }
}

/// Statistics from one pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// List pages fetched
    pub pages_fetched: u64,
    /// Entries handed downstream
    pub entries_emitted: u64,
    /// Detail requests issued
    pub detail_requests: u64,
    /// Entries skipped before enrichment
    pub entries_skipped: u64,
    /// Throttled responses that were retried
    pub throttled_retries: u64,
    /// Paging stopped because the time cursor passed the since boundary
    pub stopped_at_boundary: bool,
}

impl FetchStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page
    pub fn add_page(&mut self, throttled_retries: u32) {
        self.pages_fetched += 1;
        self.throttled_retries += u64::from(throttled_retries);
    }

    /// Add an emitted entry
    pub fn add_entry(&mut self) {
        self.entries_emitted += 1;
    }
}

/// Pull-based source of entries
///
/// `Ok(None)` means end of stream. After an error has been returned the
/// source is finished and keeps returning `Ok(None)`.
#[async_trait]
pub trait EntrySource: Send {
    /// Produce the next entry
    async fn next_entry(&mut self) -> Result<Option<Value>>;

    /// Statistics so far
    fn stats(&self) -> FetchStats;
}
