//! Execution engine module
//!
//! Paged fetch, detail enrichment, and the pipeline that chains them.
//!
//! # Overview
//!
//! The engine module provides:
//! - `PagedFetcher` - Walks a paginated list and yields its entries
//! - `DetailEnricher` - Replaces each entry with its detail document
//! - `Pipeline` - Built from a `ResourceSpec`, pulls entries or streams them

mod enricher;
mod fetcher;
mod types;

pub use enricher::DetailEnricher;
pub use fetcher::PagedFetcher;
pub use types::{DetailSpec, EntrySource, FetchStats, ResourceSpec};

use crate::error::{Error, Result};
use crate::extract::Extractor;
use crate::http::HttpClient;
use futures::Stream;
use serde_json::Value;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// One resource read from start to end
pub struct Pipeline {
    name: String,
    source: Box<dyn EntrySource>,
    started: Option<Instant>,
    finished: bool,
    failed: bool,
}

impl Pipeline {
    /// Build the pipeline for `spec`
    ///
    /// Nothing is requested until the first entry is pulled.
    pub fn open(client: HttpClient, spec: ResourceSpec, cancel: CancellationToken) -> Self {
        let fetcher = PagedFetcher::new(
            client.clone(),
            spec.list_path,
            spec.parts,
            Extractor::new(spec.selector),
            spec.paginator,
            cancel.clone(),
        );

        let source: Box<dyn EntrySource> = match spec.detail {
            Some(detail) => Box::new(DetailEnricher::new(fetcher, client, detail, cancel)),
            None => Box::new(fetcher),
        };

        Self {
            name: spec.name,
            source,
            started: None,
            finished: false,
            failed: false,
        }
    }

    /// Resource name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Statistics so far
    pub fn stats(&self) -> FetchStats {
        self.source.stats()
    }

    /// Pull the next entry; `Ok(None)` at end of stream
    pub async fn next_entry(&mut self) -> Result<Option<Value>> {
        if self.started.is_none() {
            info!(collection = %self.name, "Starting read");
            self.started = Some(Instant::now());
        }

        let next = self.source.next_entry().await;
        match &next {
            Ok(Some(_)) => {}
            Ok(None) => self.log_completion(),
            Err(e) => self.log_failure(e),
        }
        next
    }

    /// Whether the read ended on an error or a cancellation
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Pull every remaining entry into memory
    pub async fn collect(mut self) -> Result<Vec<Value>> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next_entry().await? {
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Turn the pipeline into a stream of entries
    pub fn into_stream(self) -> impl Stream<Item = Result<Value>> + Send {
        futures::stream::try_unfold(self, |mut pipeline| async move {
            Ok(pipeline.next_entry().await?.map(|entry| (entry, pipeline)))
        })
    }

    fn log_failure(&mut self, error: &Error) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.failed = true;
        let stats = self.stats();
        warn!(
            collection = %self.name,
            pages = stats.pages_fetched,
            entries = stats.entries_emitted,
            error = %error,
            "Read stopped early"
        );
    }

    fn log_completion(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Some(started) = self.started {
            let stats = self.stats();
            info!(
                collection = %self.name,
                pages = stats.pages_fetched,
                entries = stats.entries_emitted,
                details = stats.detail_requests,
                throttled = stats.throttled_retries,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Completed read"
            );
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
