//! Companies collection

use super::{auth_mapping, Collection, ResolveContext};
use crate::config::{base_declaration, Declaration, ParameterDef};
use crate::engine::{DetailSpec, ResourceSpec};
use crate::error::{Error, Result};
use crate::extract::Selector;
use crate::http::HttpClient;
use crate::mapping::{Mapping, RequestMapping, RequestParts};
use crate::pagination::HasMorePaginator;
use crate::types::{is_flag_set, JsonObject, JsonValue, Params};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Company property definitions
pub const PROPERTIES_PATH: &str = "/properties/v1/companies/properties";

const PAGED_PATH: &str = "/companies/v2/companies/paged";
const RECENT_CREATED_PATH: &str = "/companies/v2/companies/recent/created";
const RECENT_MODIFIED_PATH: &str = "/companies/v2/companies/recent/modified";
const DETAIL_PATH: &str = "/companies/v2/companies/{companyId}";

/// All companies, or the recently created/modified feeds
#[derive(Debug, Clone, Copy, Default)]
pub struct Companies;

fn is_recent(params: &Params) -> bool {
    is_flag_set(params, "recentlyCreated") || is_flag_set(params, "recentlyUpdated")
}

fn list_path(params: &Params) -> &'static str {
    if is_flag_set(params, "recentlyCreated") {
        RECENT_CREATED_PATH
    } else if is_flag_set(params, "recentlyUpdated") {
        RECENT_MODIFIED_PATH
    } else {
        PAGED_PATH
    }
}

fn selector(params: &Params) -> Selector {
    if is_recent(params) {
        Selector::each_in("results")
    } else {
        Selector::each_in("companies")
    }
}

/// Names of every company property, fetched at most once
#[derive(Debug)]
struct PropertyNames {
    client: HttpClient,
    parts: RequestParts,
    cancel: CancellationToken,
    names: OnceCell<Vec<String>>,
}

impl PropertyNames {
    async fn get(&self) -> Result<Vec<String>> {
        self.names
            .get_or_try_init(|| fetch_property_names(&self.client, &self.parts, &self.cancel))
            .await
            .cloned()
    }
}

async fn fetch_property_names(
    client: &HttpClient,
    parts: &RequestParts,
    cancel: &CancellationToken,
) -> Result<Vec<String>> {
    let body = client.get_json(PROPERTIES_PATH, parts, cancel).await?;
    let JsonValue::Array(properties) = body else {
        return Err(Error::Other(format!(
            "Expected an array from {PROPERTIES_PATH}"
        )));
    };

    let names: Vec<String> = properties
        .iter()
        .filter_map(|p| p.get("name").and_then(JsonValue::as_str))
        .map(str::to_string)
        .collect();
    debug!(count = names.len(), "Fetched company property names");
    Ok(names)
}

fn names_as(key: &'static str, names: Vec<String>) -> JsonObject {
    let mut out = JsonObject::new();
    out.insert(key.to_string(), names.into());
    out
}

/// Query mapping for the list request
///
/// The include-all flags are swapped for the full property list, except on
/// the recent feeds which do not accept property filters of that size.
async fn list_mapping(params: &Params, ctx: &ResolveContext) -> Result<RequestMapping> {
    let auth = auth_mapping();
    let mut query = auth.query.extended(|m| {
        m.as_is("limit")
            .as_is("count")
            .as_is("offset")
            .as_is("properties")
            .as_is("propertiesWithHistory")
    });

    let wants_all = is_flag_set(params, "includeAllProperties")
        || is_flag_set(params, "includeAllPropertiesWithHistory");
    if wants_all && !is_recent(params) {
        let names = Arc::new(PropertyNames {
            client: ctx.client.clone(),
            parts: auth.apply(params).await?,
            cancel: ctx.cancel.clone(),
            names: OnceCell::new(),
        });
        query = add_property_remaps(query, params, &names);
    }

    Ok(RequestMapping::new(query, auth.headers))
}

fn add_property_remaps(query: Mapping, params: &Params, names: &Arc<PropertyNames>) -> Mapping {
    let mut query = query;
    if is_flag_set(params, "includeAllProperties") {
        let names = Arc::clone(names);
        query = query.remap_async("includeAllProperties", move |_| {
            let names = Arc::clone(&names);
            async move { Ok(names_as("properties", names.get().await?)) }
        });
    }
    if is_flag_set(params, "includeAllPropertiesWithHistory") {
        let names = Arc::clone(names);
        query = query.remap_async("includeAllPropertiesWithHistory", move |_| {
            let names = Arc::clone(&names);
            async move { Ok(names_as("propertiesWithHistory", names.get().await?)) }
        });
    }
    query
}

#[async_trait]
impl Collection for Companies {
    fn name(&self) -> &'static str {
        "companies"
    }

    fn description(&self) -> &'static str {
        "Companies, optionally only the recently created or modified ones"
    }

    fn declaration(&self) -> Declaration {
        base_declaration().extended(|d| {
            d.parameter(ParameterDef::boolean("recentlyCreated").describe(
                "Fetch companies created in the last 30 days (at most 10k, newest first)",
            ))
            .parameter(ParameterDef::boolean("recentlyUpdated").describe(
                "Fetch companies modified in the last 30 days (at most 10k, newest first)",
            ))
            .conflicts("recentlyCreated", "recentlyUpdated")
            .parameter(
                ParameterDef::string("properties").describe("Fetch companies with specific properties"),
            )
            .parameter(
                ParameterDef::boolean("includeAllProperties")
                    .describe("Fetch companies with all properties"),
            )
            .parameter(
                ParameterDef::string("propertiesWithHistory")
                    .describe("Fetch companies with specific properties including their history"),
            )
            .parameter(
                ParameterDef::boolean("includeAllPropertiesWithHistory")
                    .describe("Fetch companies with all properties including their history"),
            )
            .parameter(
                ParameterDef::integer("limit")
                    .describe("Page size when fetching all companies")
                    .with_default(100),
            )
            .parameter(
                ParameterDef::integer("count")
                    .describe("Page size for the recently created and modified feeds")
                    .with_default(100),
            )
            .parameter(
                ParameterDef::integer("offset")
                    .describe("Offset of the first page")
                    .with_default(0),
            )
            .parameter(
                ParameterDef::boolean("details")
                    .describe("Replace each company with its full record")
                    .with_default(false),
            )
        })
    }

    async fn resolve(&self, params: &Params, ctx: &ResolveContext) -> Result<ResourceSpec> {
        let parts = list_mapping(params, ctx).await?.apply(params).await?;

        let detail = if is_flag_set(params, "details") {
            Some(DetailSpec::new(DETAIL_PATH, auth_mapping().apply(params).await?))
        } else {
            None
        };

        Ok(ResourceSpec {
            name: self.name().to_string(),
            list_path: list_path(params).to_string(),
            selector: selector(params),
            paginator: Arc::new(HasMorePaginator::new()),
            parts,
            detail,
        })
    }
}
