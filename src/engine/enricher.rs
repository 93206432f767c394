//! Per-entry detail enrichment

use super::types::{DetailSpec, EntrySource, FetchStats};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Replaces each upstream entry with its detail document
///
/// Strictly sequential: the next upstream entry is pulled only after the
/// current detail request completed. Null and empty-object entries are
/// dropped without a request.
#[derive(Debug)]
pub struct DetailEnricher<S> {
    upstream: S,
    client: HttpClient,
    detail: DetailSpec,
    cancel: CancellationToken,
    done: bool,
    detail_requests: u64,
    skipped: u64,
    throttled_retries: u64,
}

impl<S: EntrySource> DetailEnricher<S> {
    /// Wrap an upstream source
    pub fn new(upstream: S, client: HttpClient, detail: DetailSpec, cancel: CancellationToken) -> Self {
        Self {
            upstream,
            client,
            detail,
            cancel,
            done: false,
            detail_requests: 0,
            skipped: 0,
            throttled_retries: 0,
        }
    }

    async fn enrich(&mut self, entry: &Value) -> Result<Value> {
        let path = self.detail.template.render(entry)?;
        self.detail_requests += 1;
        debug!(path = %path, "Fetching detail");

        let fetched = self.client.get(&path, &self.detail.parts, &self.cancel).await?;
        self.throttled_retries += u64::from(fetched.throttled_retries);
        Ok(serde_json::from_slice(&fetched.body)?)
    }
}

/// Entries with nothing to look up
pub(crate) fn is_blank(entry: &Value) -> bool {
    match entry {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[async_trait]
impl<S: EntrySource> EntrySource for DetailEnricher<S> {
    async fn next_entry(&mut self) -> Result<Option<Value>> {
        if self.done {
            return Ok(None);
        }
        if self.cancel.is_cancelled() {
            self.done = true;
            return Err(Error::Cancelled);
        }

        loop {
            let entry = match self.upstream.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => {
                    self.done = true;
                    return Ok(None);
                }
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            };

            if is_blank(&entry) {
                self.skipped += 1;
                debug!("Skipping blank entry");
                continue;
            }

            return match self.enrich(&entry).await {
                Ok(detail) => Ok(Some(detail)),
                Err(e) => {
                    self.done = true;
                    Err(e)
                }
            };
        }
    }

    fn stats(&self) -> FetchStats {
        let mut stats = self.upstream.stats();
        stats.entries_emitted = stats.entries_emitted.saturating_sub(self.skipped);
        stats.detail_requests = self.detail_requests;
        stats.entries_skipped = self.skipped;
        stats.throttled_retries += self.throttled_retries;
        stats
    }
}
