//! Path template interpolation
//!
//! Handles `{field}` placeholders in detail paths such as
//! `/deals/v1/deal/{dealId}`. Placeholders are filled from the fields of the
//! entry being enriched; dotted names (`{owner.id}`) descend into objects.

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Regex for matching placeholders: {field} or {field.path}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\s*([a-zA-Z_][a-zA-Z0-9_-]*(?:\.[a-zA-Z_][a-zA-Z0-9_-]*)*)\s*\}").unwrap()
});

/// A parsed path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
}

impl PathTemplate {
    /// Wrap a template string
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The template as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Names of the fields this template reads
    pub fn variables(&self) -> Vec<String> {
        extract_variables(&self.raw)
    }

    /// Render against an entry
    pub fn render(&self, entry: &Value) -> Result<String> {
        render(&self.raw, entry)
    }
}

impl std::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Get a nested value from a JSON value by dotted path
fn get_nested_value<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for part in path.split('.') {
        match current {
            Value::Object(map) => {
                current = map.get(part)?;
            }
            _ => return None,
        }
    }
    match current {
        Value::Null => None,
        other => Some(other),
    }
}

/// Render a template string from the fields of `entry`
///
/// Every placeholder must resolve to a non-null value; the error lists all
/// that did not.
pub fn render(template: &str, entry: &Value) -> Result<String> {
    let mut missing = Vec::new();

    let rendered = TEMPLATE_REGEX.replace_all(template, |cap: &regex::Captures<'_>| {
        let var_path = &cap[1];
        if let Some(value) = get_nested_value(entry, var_path) {
            value_to_string(value)
        } else {
            missing.push(var_path.to_string());
            String::new()
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(missing.join(", ")))
    }
}

/// Check if a string contains placeholders
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Extract all variable names from a template
pub fn extract_variables(template: &str) -> Vec<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Convert a JSON value to a string for substitution
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}
