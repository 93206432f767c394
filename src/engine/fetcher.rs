//! Paged list fetcher

use super::types::{EntrySource, FetchStats};
use crate::error::{Error, Result};
use crate::extract::{Entries, Extractor};
use crate::http::HttpClient;
use crate::mapping::RequestParts;
use crate::pagination::{NextPage, PageCursor, Paginator};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug)]
enum FetchState {
    Start,
    FetchingPage,
    HasPage(Entries),
    Done,
}

/// Walks a paginated list, one page request at a time
///
/// Each page is parsed once. The paginator reads it first to compute the
/// next cursor, then the document is moved into the extractor and its
/// entries are handed out one by one. The next page is requested only once
/// the current one is drained.
#[derive(Debug)]
pub struct PagedFetcher {
    client: HttpClient,
    path: String,
    parts: RequestParts,
    extractor: Extractor,
    paginator: Arc<dyn Paginator>,
    cancel: CancellationToken,
    cursor: PageCursor,
    state: FetchState,
    more: bool,
    stats: FetchStats,
}

impl PagedFetcher {
    /// Create a fetcher positioned before the first page
    pub fn new(
        client: HttpClient,
        path: impl Into<String>,
        parts: RequestParts,
        extractor: Extractor,
        paginator: Arc<dyn Paginator>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            path: path.into(),
            parts,
            extractor,
            paginator,
            cancel,
            cursor: PageCursor::new(),
            state: FetchState::Start,
            more: false,
            stats: FetchStats::new(),
        }
    }

    /// Current paging position
    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    /// Check if the fetcher has finished
    pub fn is_done(&self) -> bool {
        matches!(self.state, FetchState::Done)
    }

    async fn fetch_page(&mut self) -> Result<Entries> {
        let parts = self.parts.overlaid(&self.cursor.overlay);
        let fetched = self.client.get(&self.path, &parts, &self.cancel).await?;
        self.stats.add_page(fetched.throttled_retries);

        let body: Value = serde_json::from_slice(&fetched.body)?;

        match self.paginator.next_page(&body, &mut self.cursor) {
            NextPage::Continue { query_params } => {
                self.cursor.advance(query_params);
                self.more = true;
            }
            NextPage::Boundary => {
                self.stats.stopped_at_boundary = true;
                self.more = false;
            }
            NextPage::Done => self.more = false,
        }

        let entries = self.extractor.entries(body)?;
        debug!(
            path = %self.path,
            page = self.cursor.pages,
            entries = entries.size_hint().0,
            more = self.more,
            "Fetched page"
        );
        Ok(entries)
    }

    fn finish(&mut self) {
        self.state = FetchState::Done;
        info!(
            path = %self.path,
            pages = self.stats.pages_fetched,
            entries = self.stats.entries_emitted,
            boundary = self.stats.stopped_at_boundary,
            "Completed list"
        );
    }
}

#[async_trait]
impl EntrySource for PagedFetcher {
    async fn next_entry(&mut self) -> Result<Option<Value>> {
        loop {
            if self.cancel.is_cancelled() && !self.is_done() {
                self.state = FetchState::Done;
                return Err(Error::Cancelled);
            }

            match self.state {
                FetchState::Done => return Ok(None),
                FetchState::HasPage(ref mut entries) => {
                    if let Some(entry) = entries.next() {
                        self.stats.add_entry();
                        return Ok(Some(entry));
                    }
                    if self.more {
                        self.state = FetchState::FetchingPage;
                    } else {
                        self.finish();
                    }
                }
                FetchState::Start | FetchState::FetchingPage => {
                    if matches!(self.state, FetchState::Start) {
                        debug!(path = %self.path, selector = %self.extractor.selector(), "Starting list");
                    }
                    match self.fetch_page().await {
                        Ok(entries) => self.state = FetchState::HasPage(entries),
                        Err(e) => {
                            self.state = FetchState::Done;
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    fn stats(&self) -> FetchStats {
        self.stats
    }
}
