//! Common types used throughout hubspot-plug
//!
//! Shared type aliases and small value helpers used across modules.

use std::collections::BTreeMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Caller-supplied parameter set (endpoint, credentials, filters)
pub type Params = JsonObject;

/// Ordered string map, used for rendered headers
pub type StringMap = BTreeMap<String, String>;

// ============================================================================
// Value Helpers
// ============================================================================

/// Render a scalar JSON value the way it appears in a query string
///
/// Strings are taken verbatim; numbers and booleans use their JSON text.
/// Arrays, objects and null have no scalar form.
pub fn scalar_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Look up a parameter, treating `null` as absent
pub fn param<'a>(params: &'a Params, name: &str) -> Option<&'a JsonValue> {
    params.get(name).filter(|v| !v.is_null())
}

/// Check whether a flag-style parameter is switched on
///
/// Flags come from the CLI as strings and from files as booleans. Anything
/// that is not `false`, `"false"`, `0` or null counts as set.
pub fn is_flag_set(params: &Params, name: &str) -> bool {
    match param(params, name) {
        None => false,
        Some(JsonValue::Bool(b)) => *b,
        Some(JsonValue::String(s)) => !s.eq_ignore_ascii_case("false"),
        Some(JsonValue::Number(n)) => n.as_f64() != Some(0.0),
        Some(_) => true,
    }
}
