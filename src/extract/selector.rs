//! Selector parsing

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// One step of a selector path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Descend into an object field
    Field(String),
    /// Fan out over array elements or object values
    Wildcard,
}

/// Parsed entry selector such as `!.companies.*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    raw: String,
    segments: Vec<Segment>,
}

impl Selector {
    /// Parse a selector string
    pub fn parse(selector: &str) -> Result<Self> {
        let rest = selector
            .strip_prefix('!')
            .ok_or_else(|| Error::selector(selector, "must start with '!'"))?;

        let mut segments = Vec::new();
        if !rest.is_empty() {
            let path = rest
                .strip_prefix('.')
                .ok_or_else(|| Error::selector(selector, "expected '.' after '!'"))?;

            for part in path.split('.') {
                match part {
                    "" => return Err(Error::selector(selector, "empty path segment")),
                    "*" => segments.push(Segment::Wildcard),
                    name => segments.push(Segment::Field(name.to_string())),
                }
            }
        }

        Ok(Self {
            raw: selector.to_string(),
            segments,
        })
    }

    /// Selector for the whole document (`!`)
    pub fn root() -> Self {
        Self {
            raw: "!".to_string(),
            segments: Vec::new(),
        }
    }

    /// Selector for each element of a top-level array (`!.*`)
    pub fn each() -> Self {
        Self {
            raw: "!.*".to_string(),
            segments: vec![Segment::Wildcard],
        }
    }

    /// Selector for each element of the array under `field` (`!.field.*`)
    pub fn each_in(field: &str) -> Self {
        Self {
            raw: format!("!.{field}.*"),
            segments: vec![Segment::Field(field.to_string()), Segment::Wildcard],
        }
    }

    /// Selector text as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed path segments
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether this selector yields several entries
    pub fn is_fan_out(&self) -> bool {
        self.segments.contains(&Segment::Wildcard)
    }

    /// True when every segment is a field, except possibly a final wildcard
    ///
    /// Such selectors can be resolved by moving values out of the document.
    pub(crate) fn is_direct(&self) -> bool {
        match self.segments.split_last() {
            None => true,
            Some((_, init)) => init.iter().all(|s| matches!(s, Segment::Field(_))),
        }
    }

    /// Equivalent JSONPath expression
    pub fn to_json_path(&self) -> String {
        let mut path = String::from("$");
        for segment in &self.segments {
            match segment {
                Segment::Wildcard => path.push_str("[*]"),
                Segment::Field(name) if is_plain_identifier(name) => {
                    path.push('.');
                    path.push_str(name);
                }
                Segment::Field(name) => {
                    path.push_str("['");
                    path.push_str(&name.replace('\'', "\\'"));
                    path.push_str("']");
                }
            }
        }
        path
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
