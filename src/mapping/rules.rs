//! Mapping rules and their evaluation

use crate::error::Result;
use crate::types::{param, scalar_to_string, JsonObject, JsonValue, Params, StringMap};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Produces a fallback value for [`Rule::Default`]
pub type DefaultFn = Arc<dyn Fn() -> JsonValue + Send + Sync>;

/// Replaces one parameter with zero or more output keys
///
/// Asynchronous so a remap can resolve its value through a side request.
pub type RemapFn = Arc<dyn Fn(JsonValue) -> BoxFuture<'static, Result<JsonObject>> + Send + Sync>;

/// A single mapping rule
#[derive(Clone)]
pub enum Rule {
    /// Copy the parameter unchanged when present
    AsIs {
        /// Parameter (and output) name
        name: String,
    },
    /// Copy the parameter under a different output key
    Rename {
        /// Parameter name
        from: String,
        /// Output key
        to: String,
    },
    /// Copy the parameter, falling back to a computed value when absent
    Default {
        /// Parameter (and output) name
        name: String,
        /// Fallback thunk
        value: DefaultFn,
    },
    /// Replace the parameter with whatever the function returns
    Remap {
        /// Parameter name
        name: String,
        /// Remapping function; its result is merged into the output
        map: RemapFn,
    },
}

impl Rule {
    /// Name of the parameter this rule reads
    pub fn source(&self) -> &str {
        match self {
            Rule::AsIs { name } | Rule::Default { name, .. } | Rule::Remap { name, .. } => name,
            Rule::Rename { from, .. } => from,
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::AsIs { name } => f.debug_tuple("AsIs").field(name).finish(),
            Rule::Rename { from, to } => f.debug_tuple("Rename").field(from).field(to).finish(),
            Rule::Default { name, .. } => f.debug_tuple("Default").field(name).finish(),
            Rule::Remap { name, .. } => f.debug_tuple("Remap").field(name).finish(),
        }
    }
}

/// Ordered list of mapping rules
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    rules: Vec<Rule>,
}

impl Mapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `name` unchanged
    #[must_use]
    pub fn as_is(mut self, name: impl Into<String>) -> Self {
        self.rules.push(Rule::AsIs { name: name.into() });
        self
    }

    /// Copy `from` under the key `to`
    #[must_use]
    pub fn rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.rules.push(Rule::Rename {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Copy `name`, or `value` when the parameter is absent
    #[must_use]
    pub fn default_value(self, name: impl Into<String>, value: JsonValue) -> Self {
        self.default_with(name, move || value.clone())
    }

    /// Copy `name`, or the result of `thunk` when the parameter is absent
    #[must_use]
    pub fn default_with<F>(mut self, name: impl Into<String>, thunk: F) -> Self
    where
        F: Fn() -> JsonValue + Send + Sync + 'static,
    {
        self.rules.push(Rule::Default {
            name: name.into(),
            value: Arc::new(thunk),
        });
        self
    }

    /// Replace `name` with the object returned by `f`; `None` adds nothing
    #[must_use]
    pub fn remap<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&JsonValue) -> Option<JsonObject> + Send + Sync + 'static,
    {
        let map: RemapFn = Arc::new(move |value| {
            let produced = f(&value).unwrap_or_default();
            futures::future::ready(Ok(produced)).boxed()
        });
        self.rules.push(Rule::Remap {
            name: name.into(),
            map,
        });
        self
    }

    /// Replace `name` with the object resolved by the future `f` returns
    #[must_use]
    pub fn remap_async<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(JsonValue) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<JsonObject>> + Send + 'static,
    {
        let map: RemapFn = Arc::new(move |value| f(value).boxed());
        self.rules.push(Rule::Remap {
            name: name.into(),
            map,
        });
        self
    }

    /// Derive a mapping: this rule list followed by the rules `extend` appends
    #[must_use]
    pub fn extended(&self, extend: impl FnOnce(Mapping) -> Mapping) -> Mapping {
        extend(self.clone())
    }

    /// The rules in evaluation order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the mapping has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate the rules against `params`
    ///
    /// Each rule reads from the parameter set, never from earlier output, so
    /// rules that write distinct keys can be reordered freely.
    pub async fn apply(&self, params: &Params) -> Result<JsonObject> {
        let mut out = JsonObject::new();

        for rule in &self.rules {
            match rule {
                Rule::AsIs { name } => {
                    if let Some(value) = param(params, name) {
                        out.insert(name.clone(), value.clone());
                    }
                }
                Rule::Rename { from, to } => {
                    if let Some(value) = param(params, from) {
                        out.insert(to.clone(), value.clone());
                    }
                }
                Rule::Default { name, value } => {
                    let resolved = param(params, name).cloned().unwrap_or_else(|| value());
                    out.insert(name.clone(), resolved);
                }
                Rule::Remap { name, map } => {
                    if let Some(value) = param(params, name) {
                        let produced = map(value.clone()).await?;
                        out.extend(produced);
                    }
                }
            }
        }

        Ok(out)
    }
}

/// Query and header mappings for one kind of request
#[derive(Debug, Clone, Default)]
pub struct RequestMapping {
    /// Mapping producing query parameters
    pub query: Mapping,
    /// Mapping producing headers
    pub headers: Mapping,
}

impl RequestMapping {
    /// Create a request mapping
    pub fn new(query: Mapping, headers: Mapping) -> Self {
        Self { query, headers }
    }

    /// Derive a mapping with extra query rules
    #[must_use]
    pub fn extend_query(&self, extend: impl FnOnce(Mapping) -> Mapping) -> Self {
        Self {
            query: self.query.extended(extend),
            headers: self.headers.clone(),
        }
    }

    /// Apply both mappings
    pub async fn apply(&self, params: &Params) -> Result<RequestParts> {
        let query = self.query.apply(params).await?;
        let headers = self.headers.apply(params).await?;
        Ok(RequestParts { query, headers })
    }
}

/// Mapped query and headers for a request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParts {
    /// Query parameters; array values repeat the key
    pub query: JsonObject,
    /// Header values
    pub headers: JsonObject,
}

impl RequestParts {
    /// Create empty request parts
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (replace) a query parameter
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Set (replace) a header
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Copy with `overlay` written over the query
    pub fn overlaid(&self, overlay: &JsonObject) -> Self {
        let mut parts = self.clone();
        for (key, value) in overlay {
            parts.query.insert(key.clone(), value.clone());
        }
        parts
    }

    /// Query as `(key, value)` pairs, expanding arrays into repeated keys
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.query.len());
        for (key, value) in &self.query {
            match value {
                JsonValue::Array(items) => {
                    pairs.extend(
                        items
                            .iter()
                            .filter_map(scalar_to_string)
                            .map(|v| (key.clone(), v)),
                    );
                }
                other => {
                    if let Some(v) = scalar_to_string(other) {
                        pairs.push((key.clone(), v));
                    }
                }
            }
        }
        pairs
    }

    /// Headers rendered as strings; non-scalar values are skipped
    pub fn header_map(&self) -> StringMap {
        self.headers
            .iter()
            .filter_map(|(k, v)| scalar_to_string(v).map(|v| (k.clone(), v)))
            .collect()
    }
}
