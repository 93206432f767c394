//! JSON selector extraction module
//!
//! Pulls entries out of a page document with a root-relative selector.
//!
//! # Selector syntax
//!
//! - `!` - the whole document is one entry
//! - `!.companies` - the value under `companies` is one entry
//! - `!.companies.*` - each element of the `companies` array
//! - `!.*` - each element of a top-level array
//!
//! A wildcard applied to an object yields its values. Paths that do not
//! resolve yield nothing.

mod entries;
mod selector;

pub use entries::{Entries, Extractor};
pub use selector::{Segment, Selector};
