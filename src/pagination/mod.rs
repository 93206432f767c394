//! Pagination module
//!
//! Supports: has-more flags with offset/vid-offset/time-offset cursors, single page
//!
//! # Overview
//!
//! A paginator looks at each parsed page before its entries are consumed,
//! updates the session's [`PageCursor`], and returns the query overlay for the
//! next request (or why paging stopped).

mod strategies;
mod types;

pub use strategies::{CursorField, HasMorePaginator, NoPaginator, TimeCursor};
pub use types::{NextPage, PageCursor, Paginator};

#[cfg(test)]
mod tests;
