//! Pagination strategy implementations
//!
//! Each strategy handles a specific pagination pattern.

use super::types::{is_truthy, NextPage, PageCursor, Paginator};
use crate::types::JsonObject;
use serde_json::Value;
use tracing::{info, warn};

// ============================================================================
// Has-More Pagination
// ============================================================================

/// Response field copied into the next request's query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorField {
    /// Field name in the page document
    pub response_field: String,
    /// Query parameter it is written to
    pub query_param: String,
}

impl CursorField {
    /// Create a cursor field mapping
    pub fn new(response_field: impl Into<String>, query_param: impl Into<String>) -> Self {
        Self {
            response_field: response_field.into(),
            query_param: query_param.into(),
        }
    }
}

/// Time cursor checked against a lower bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeCursor {
    /// The cursor mapping
    pub field: CursorField,
    /// Oldest time to page back to, in epoch milliseconds
    pub since_ms: i64,
}

/// HubSpot v1/v2 list pagination
///
/// Pages while the document reports more data (`hasMore` or `has-more`)
/// and carries the offset fields into the next request:
/// - `?offset=<offset>` for companies and deals
/// - `?vidOffset=<vid-offset>` for contacts
/// - `?timeOffset=<time-offset>` for the recent contact feeds
#[derive(Debug, Clone)]
pub struct HasMorePaginator {
    /// Fields that signal more data; any truthy one is enough
    pub has_more_fields: Vec<String>,
    /// Cursor fields copied when present
    pub cursor_fields: Vec<CursorField>,
    /// Optional time cursor with its boundary
    pub time_cursor: Option<TimeCursor>,
}

impl Default for HasMorePaginator {
    fn default() -> Self {
        Self {
            has_more_fields: vec!["has-more".to_string(), "hasMore".to_string()],
            cursor_fields: vec![
                CursorField::new("vid-offset", "vidOffset"),
                CursorField::new("offset", "offset"),
            ],
            time_cursor: None,
        }
    }
}

impl HasMorePaginator {
    /// Paginator reading both flag spellings and both offset fields
    pub fn new() -> Self {
        Self::default()
    }

    /// Paginator with only the given cursor fields
    pub fn with_cursors(cursor_fields: Vec<CursorField>) -> Self {
        Self {
            cursor_fields,
            ..Self::default()
        }
    }

    /// Stop paging once the time cursor is older than `since_ms`
    #[must_use]
    pub fn with_time_cursor(
        mut self,
        response_field: impl Into<String>,
        query_param: impl Into<String>,
        since_ms: i64,
    ) -> Self {
        self.time_cursor = Some(TimeCursor {
            field: CursorField::new(response_field, query_param),
            since_ms,
        });
        self
    }

    fn has_more(&self, body: &Value) -> bool {
        self.has_more_fields
            .iter()
            .any(|field| body.get(field).is_some_and(is_truthy))
    }
}

impl Paginator for HasMorePaginator {
    fn next_page(&self, body: &Value, cursor: &mut PageCursor) -> NextPage {
        cursor.record_page();

        if !self.has_more(body) {
            cursor.mark_done();
            return NextPage::Done;
        }

        let mut params = JsonObject::new();
        for field in &self.cursor_fields {
            if let Some(value) = body.get(&field.response_field).filter(|v| is_truthy(v)) {
                params.insert(field.query_param.clone(), value.clone());
            }
        }

        if let Some(time) = &self.time_cursor {
            if let Some(value) = body.get(&time.field.response_field).filter(|v| is_truthy(v)) {
                if let Some(ms) = value.as_i64() {
                    cursor.time_offset = Some(ms);
                    if ms < time.since_ms {
                        info!(
                            time_offset = ms,
                            since = time.since_ms,
                            "Time cursor passed the since boundary, stopping"
                        );
                        cursor.mark_done();
                        return NextPage::Boundary;
                    }
                }
                params.insert(time.field.query_param.clone(), value.clone());
            }
        }

        if params.is_empty() {
            warn!(
                page = cursor.pages,
                "Response reports more data but carries no cursor, stopping"
            );
            cursor.mark_done();
            return NextPage::Done;
        }

        NextPage::with_params(params)
    }
}

// ============================================================================
// No Pagination
// ============================================================================

/// No pagination - single request only
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPaginator;

impl Paginator for NoPaginator {
    fn next_page(&self, _body: &Value, cursor: &mut PageCursor) -> NextPage {
        cursor.record_page();
        cursor.mark_done();
        NextPage::Done
    }
}
