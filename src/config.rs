//! Parameter declarations
//!
//! A [`Declaration`] lists the parameters a collection accepts, their types
//! and defaults, and the constraints between them. Validation coerces
//! string input (from the command line) to the declared type and fills in
//! defaults, producing the parameter set the mappings read from.

use crate::error::{Error, Result};
use crate::http::DEFAULT_ENDPOINT;
use crate::mapping::DefaultFn;
use crate::types::{JsonObject, JsonValue, Params};
use chrono::DateTime;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// Parameter Definitions
// ============================================================================

/// Parameter type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "enum", rename_all = "kebab-case")]
pub enum ParamKind {
    /// Free-form string
    String,
    /// Whole number
    Integer,
    /// `true`/`false`
    Boolean,
    /// RFC 3339 date-time string
    DateTime,
    /// One of a fixed set of strings
    Enum(Vec<String>),
}

impl ParamKind {
    /// Coerce `value` to this kind
    pub fn coerce(&self, name: &str, value: JsonValue) -> Result<JsonValue> {
        match (self, value) {
            (ParamKind::String, JsonValue::String(s)) => Ok(JsonValue::String(s)),
            (ParamKind::String, v @ (JsonValue::Number(_) | JsonValue::Bool(_))) => {
                Ok(JsonValue::String(v.to_string()))
            }
            (ParamKind::Integer, JsonValue::Number(n)) if n.is_i64() || n.is_u64() => {
                Ok(JsonValue::Number(n))
            }
            (ParamKind::Integer, JsonValue::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(JsonValue::from)
                .map_err(|_| Error::invalid_value(name, format!("expected an integer, got '{s}'"))),
            (ParamKind::Boolean, JsonValue::Bool(b)) => Ok(JsonValue::Bool(b)),
            (ParamKind::Boolean, JsonValue::String(s)) => match s.trim() {
                "true" => Ok(JsonValue::Bool(true)),
                "false" => Ok(JsonValue::Bool(false)),
                other => Err(Error::invalid_value(
                    name,
                    format!("expected true or false, got '{other}'"),
                )),
            },
            (ParamKind::DateTime, JsonValue::String(s)) => {
                let s = s.trim();
                DateTime::parse_from_rfc3339(s).map_err(|e| {
                    Error::invalid_value(name, format!("expected an RFC 3339 date-time: {e}"))
                })?;
                Ok(JsonValue::String(s.to_string()))
            }
            (ParamKind::Enum(allowed), JsonValue::String(s)) => {
                if allowed.iter().any(|a| a == &s) {
                    Ok(JsonValue::String(s))
                } else {
                    Err(Error::invalid_value(
                        name,
                        format!("'{s}' is not one of {}", allowed.join(", ")),
                    ))
                }
            }
            (kind, other) => Err(Error::invalid_value(
                name,
                format!("{other} is not a valid {kind}"),
            )),
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::String => f.write_str("string"),
            ParamKind::Integer => f.write_str("integer"),
            ParamKind::Boolean => f.write_str("boolean"),
            ParamKind::DateTime => f.write_str("date-time"),
            ParamKind::Enum(values) => write!(f, "enum [{}]", values.join(", ")),
        }
    }
}

/// Default of a declared parameter
#[derive(Clone)]
pub enum ParamDefault {
    /// Fixed value
    Value(JsonValue),
    /// Evaluated at validation time
    Computed(DefaultFn),
}

impl ParamDefault {
    /// Produce the default value
    pub fn value(&self) -> JsonValue {
        match self {
            ParamDefault::Value(v) => v.clone(),
            ParamDefault::Computed(f) => f(),
        }
    }
}

impl fmt::Debug for ParamDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamDefault::Value(v) => f.debug_tuple("Value").field(v).finish(),
            ParamDefault::Computed(_) => f.write_str("Computed"),
        }
    }
}

/// A declared parameter
#[derive(Debug, Clone)]
pub struct ParameterDef {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub kind: ParamKind,
    /// Human-readable description
    pub description: Option<String>,
    /// Default when absent
    pub default: Option<ParamDefault>,
}

impl ParameterDef {
    /// Declare a parameter of `kind`
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            default: None,
        }
    }

    /// Declare a string parameter
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::String)
    }

    /// Declare an integer parameter
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Integer)
    }

    /// Declare a boolean parameter
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Boolean)
    }

    /// Declare a date-time parameter
    pub fn date_time(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::DateTime)
    }

    /// Declare an enum parameter
    pub fn one_of<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, ParamKind::Enum(values.into_iter().map(Into::into).collect()))
    }

    /// Set the description
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set a fixed default
    #[must_use]
    pub fn with_default(mut self, value: impl Into<JsonValue>) -> Self {
        self.default = Some(ParamDefault::Value(value.into()));
        self
    }

    /// Set a default computed at validation time
    #[must_use]
    pub fn with_default_fn<F>(mut self, thunk: F) -> Self
    where
        F: Fn() -> JsonValue + Send + Sync + 'static,
    {
        self.default = Some(ParamDefault::Computed(Arc::new(thunk)));
        self
    }
}

/// Serializable view of a parameter, for `describe`
#[derive(Debug, Clone, Serialize)]
pub struct ParameterInfo {
    /// Parameter name
    pub name: String,
    /// Parameter type
    #[serde(flatten)]
    pub kind: ParamKind,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Default as it would be applied now
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
}

// ============================================================================
// Declaration
// ============================================================================

/// Parameters of a collection and the constraints between them
#[derive(Debug, Clone, Default)]
pub struct Declaration {
    parameters: Vec<ParameterDef>,
    conflicts: Vec<(String, String)>,
    one_of: Vec<Vec<String>>,
}

impl Declaration {
    /// Create an empty declaration
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a parameter
    #[must_use]
    pub fn parameter(mut self, def: ParameterDef) -> Self {
        self.parameters.retain(|p| p.name != def.name);
        self.parameters.push(def);
        self
    }

    /// Forbid setting both parameters
    #[must_use]
    pub fn conflicts(mut self, first: impl Into<String>, second: impl Into<String>) -> Self {
        self.conflicts.push((first.into(), second.into()));
        self
    }

    /// Require at least one of the parameters
    #[must_use]
    pub fn requires_one_of<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.one_of.push(names.into_iter().map(Into::into).collect());
        self
    }

    /// Copy of this declaration with more parameters or constraints
    pub fn extended(&self, extend: impl FnOnce(Declaration) -> Declaration) -> Declaration {
        extend(self.clone())
    }

    /// Declared parameters, in declaration order
    pub fn parameters(&self) -> &[ParameterDef] {
        &self.parameters
    }

    /// Look up a parameter by name
    pub fn get(&self, name: &str) -> Option<&ParameterDef> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Describe the declared parameters with their current defaults
    pub fn describe(&self) -> Vec<ParameterInfo> {
        self.parameters
            .iter()
            .map(|p| ParameterInfo {
                name: p.name.clone(),
                kind: p.kind.clone(),
                description: p.description.clone(),
                default: p.default.as_ref().map(ParamDefault::value),
            })
            .collect()
    }

    /// Coerce declared parameters, check constraints, and apply defaults
    ///
    /// Undeclared parameters are passed through untouched. Null values
    /// count as absent, and so does `false` when checking conflicts.
    pub fn validate(&self, params: &Params) -> Result<Params> {
        let mut validated = JsonObject::new();
        for (key, value) in params {
            if value.is_null() {
                continue;
            }
            let value = match self.get(key) {
                Some(def) => def.kind.coerce(key, value.clone())?,
                None => value.clone(),
            };
            validated.insert(key.clone(), value);
        }

        let is_set = |name: &str| {
            validated
                .get(name)
                .is_some_and(|v| *v != JsonValue::Bool(false))
        };

        for (first, second) in &self.conflicts {
            if is_set(first) && is_set(second) {
                return Err(Error::conflicting(first, second));
            }
        }

        for group in &self.one_of {
            if !group.iter().any(|name| is_set(name)) {
                return Err(Error::missing_field(group.join(" or ")));
            }
        }

        for def in &self.parameters {
            if validated.contains_key(&def.name) {
                continue;
            }
            if let Some(default) = &def.default {
                validated.insert(def.name.clone(), default.value());
            }
        }

        Ok(validated)
    }
}

/// Parameters every collection accepts
pub fn base_declaration() -> Declaration {
    Declaration::new()
        .parameter(
            ParameterDef::string("endpoint")
                .describe("HubSpot API endpoint")
                .with_default(DEFAULT_ENDPOINT),
        )
        .parameter(ParameterDef::string("apikey").describe("API key"))
        .parameter(ParameterDef::string("token").describe("OAuth 2.0 access token"))
        .conflicts("apikey", "token")
        .requires_one_of(["apikey", "token"])
}

// ============================================================================
// Parameter Input
// ============================================================================

/// Load parameters from a JSON or YAML file
pub fn load_params_file(path: impl AsRef<Path>) -> Result<Params> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    load_params_str(&content)
        .map_err(|e| Error::config(format!("Invalid parameter file {}: {e}", path.display())))
}

/// Parse parameters from a JSON or YAML document
pub fn load_params_str(content: &str) -> Result<Params> {
    if content.trim().is_empty() {
        return Ok(Params::new());
    }
    // YAML is a superset of JSON
    let value: JsonValue = serde_yaml::from_str(content)?;
    match value {
        JsonValue::Object(map) => Ok(map),
        JsonValue::Null => Ok(Params::new()),
        _ => Err(Error::config("Parameter file must contain a mapping")),
    }
}

/// Parse a `key=value` argument
pub fn parse_param_arg(arg: &str) -> Result<(String, JsonValue)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((
            key.trim().to_string(),
            JsonValue::String(value.to_string()),
        )),
        _ => Err(Error::config(format!(
            "Invalid parameter '{arg}', expected key=value"
        ))),
    }
}
