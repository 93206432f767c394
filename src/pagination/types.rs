//! Pagination types and traits
//!
//! Defines the page cursor and the trait every paging strategy implements.

use crate::types::{JsonObject, JsonValue};
use serde_json::Value;

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq)]
pub enum NextPage {
    /// More pages available; overlay these query parameters on the next request
    Continue {
        /// Query parameters to add/replace
        query_params: JsonObject,
    },
    /// The time cursor moved past the caller's boundary
    Boundary,
    /// No more pages
    Done,
}

impl NextPage {
    /// Create a continuation with query parameters
    pub fn with_params(query_params: JsonObject) -> Self {
        Self::Continue { query_params }
    }

    /// Create a continuation with a single parameter
    pub fn with_param(key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        let mut query_params = JsonObject::new();
        query_params.insert(key.into(), value.into());
        Self::Continue { query_params }
    }

    /// Check if paging is over, for whatever reason
    pub fn is_done(&self) -> bool {
        !self.is_continue()
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }

    /// Check if paging stopped at the time boundary
    pub fn is_boundary(&self) -> bool {
        matches!(self, Self::Boundary)
    }
}

/// Position of one paging session
///
/// Owned by a single fetcher; the overlay is merged over the base query of
/// every page request after the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageCursor {
    /// Query parameters carried from the previous page
    pub overlay: JsonObject,
    /// Last time cursor seen, in epoch milliseconds
    pub time_offset: Option<i64>,
    /// Pages processed so far
    pub pages: u32,
    /// Is pagination complete?
    pub done: bool,
}

impl PageCursor {
    /// Create a cursor positioned before the first page
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge continuation parameters into the overlay
    pub fn advance(&mut self, query_params: JsonObject) {
        self.overlay.extend(query_params);
    }

    /// Count a processed page
    pub fn record_page(&mut self) {
        self.pages += 1;
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync + std::fmt::Debug {
    /// Inspect a parsed page and decide what comes next
    ///
    /// Called before the page's entries are extracted, so `body` is the
    /// whole document.
    fn next_page(&self, body: &Value, cursor: &mut PageCursor) -> NextPage;
}

/// JavaScript-style truthiness of a response field
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
