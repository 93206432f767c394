//! Query/header mapping module
//!
//! Turns a flat parameter set into the query string and headers of a request
//! through an ordered list of declarative rules.
//!
//! # Overview
//!
//! - [`Mapping`] - ordered rule list (`as_is`, `rename`, `default`, `remap`)
//! - [`RequestMapping`] - a query mapping plus a header mapping
//! - [`RequestParts`] - the mapped query/header objects ready for the client
//!
//! Parameters without a rule are dropped. A derived mapping is the base rule
//! list plus appended rules (see [`Mapping::extended`]).

mod rules;

pub use rules::{DefaultFn, Mapping, RemapFn, RequestMapping, RequestParts, Rule};
