//! Entry extraction
//!
//! Direct selectors move matched values out of the parsed page, so a page is
//! never cloned on the hot path. Selectors with an inner wildcard go through
//! JSONPath.

use super::selector::{Segment, Selector};
use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Extracts entries from page documents with a fixed selector
#[derive(Debug, Clone)]
pub struct Extractor {
    selector: Selector,
}

impl Extractor {
    /// Create an extractor for `selector`
    pub fn new(selector: Selector) -> Self {
        Self { selector }
    }

    /// Parse `selector` and create an extractor for it
    pub fn parse(selector: &str) -> Result<Self> {
        Selector::parse(selector).map(Self::new)
    }

    /// The selector in use
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Parse a raw body and return its entries
    pub fn entries_from_slice(&self, body: &[u8]) -> Result<Entries> {
        let document: Value = serde_json::from_slice(body)?;
        self.entries(document)
    }

    /// Return the entries of an already parsed document, consuming it
    pub fn entries(&self, document: Value) -> Result<Entries> {
        if self.selector.is_direct() {
            Ok(extract_direct(document, self.selector.segments()))
        } else {
            extract_with_jsonpath(&document, &self.selector.to_json_path())
        }
    }
}

fn extract_direct(document: Value, segments: &[Segment]) -> Entries {
    let mut current = document;

    for segment in segments {
        match segment {
            Segment::Field(name) => {
                current = match current {
                    Value::Object(mut map) => match map.remove(name) {
                        Some(value) => value,
                        None => return Entries::empty(),
                    },
                    _ => return Entries::empty(),
                };
            }
            Segment::Wildcard => {
                // is_direct() guarantees the wildcard is the final segment
                return match current {
                    Value::Array(items) => Entries::elements(items),
                    Value::Object(map) => Entries::values(map),
                    _ => Entries::empty(),
                };
            }
        }
    }

    Entries::single(current)
}

fn extract_with_jsonpath(document: &Value, path: &str) -> Result<Entries> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path).map_err(|e| Error::JsonPath {
        message: format!("Invalid JSONPath '{path}': {e}"),
    })?;

    match jp.find(document) {
        Value::Array(items) => Ok(Entries::elements(items)),
        Value::Null => Ok(Entries::empty()),
        other => Ok(Entries::single(other)),
    }
}

/// Lazy, single-pass sequence of extracted entries
pub struct Entries {
    inner: Inner,
}

enum Inner {
    Elements(std::vec::IntoIter<Value>),
    Values(serde_json::map::IntoIter),
    Single(Option<Value>),
}

impl Entries {
    /// A sequence with no entries
    pub fn empty() -> Self {
        Self {
            inner: Inner::Single(None),
        }
    }

    fn elements(items: Vec<Value>) -> Self {
        Self {
            inner: Inner::Elements(items.into_iter()),
        }
    }

    fn values(map: Map<String, Value>) -> Self {
        Self {
            inner: Inner::Values(map.into_iter()),
        }
    }

    fn single(value: Value) -> Self {
        Self {
            inner: Inner::Single(Some(value)),
        }
    }
}

impl std::fmt::Debug for Entries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entries")
            .field("remaining", &self.size_hint().0)
            .finish()
    }
}

impl Iterator for Entries {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match &mut self.inner {
            Inner::Elements(iter) => iter.next(),
            Inner::Values(iter) => iter.next().map(|(_, v)| v),
            Inner::Single(slot) => slot.take(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            Inner::Elements(iter) => iter.size_hint(),
            Inner::Values(iter) => iter.size_hint(),
            Inner::Single(slot) => {
                let n = usize::from(slot.is_some());
                (n, Some(n))
            }
        }
    }
}
