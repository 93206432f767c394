//! HubSpot collections
//!
//! Each collection declares its parameters and turns a validated parameter
//! set into a [`ResourceSpec`]: list path, selector, paging, mapped request
//! parts, and the optional detail request.
//!
//! | Collection | List | Detail |
//! |---|---|---|
//! | companies | `/companies/v2/companies/paged` | `/companies/v2/companies/{companyId}` |
//! | contacts | `/contacts/v1/lists/all/contacts/all` | `/contacts/v1/contact/vid/{vid}/profile` |
//! | deals | `/deals/v1/deal/paged` | `/deals/v1/deal/{dealId}` |
//! | owners | `/owners/v2/owners/` | none |

mod companies;
mod contacts;
mod deals;
mod owners;

pub use companies::{Companies, PROPERTIES_PATH};
pub use contacts::Contacts;
pub use deals::{default_since, earliest_since, Deals};
pub use owners::Owners;

use crate::config::Declaration;
use crate::engine::{Pipeline, ResourceSpec};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig};
use crate::mapping::{Mapping, RequestMapping};
use crate::types::{param, scalar_to_string, JsonObject, Params};
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// What a collection may use while resolving
///
/// Side requests (such as the company property list) go through the same
/// client and honour the same cancellation as the pipeline.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// Client bound to the requested endpoint
    pub client: HttpClient,
    /// Pipeline cancellation
    pub cancel: CancellationToken,
}

/// A fetchable HubSpot resource
#[async_trait]
pub trait Collection: Send + Sync + std::fmt::Debug {
    /// Collection name, as used on the command line
    fn name(&self) -> &'static str;

    /// One-line description
    fn description(&self) -> &'static str;

    /// Accepted parameters
    fn declaration(&self) -> Declaration;

    /// Build the resource spec from validated parameters
    async fn resolve(&self, params: &Params, ctx: &ResolveContext) -> Result<ResourceSpec>;
}

static COLLECTIONS: [&dyn Collection; 4] = [&Companies, &Contacts, &Deals, &Owners];

/// Every known collection
pub fn all() -> &'static [&'static dyn Collection] {
    &COLLECTIONS
}

/// Look up a collection by name
pub fn find(name: &str) -> Result<&'static dyn Collection> {
    COLLECTIONS
        .iter()
        .copied()
        .find(|c| c.name() == name)
        .ok_or_else(|| Error::UnknownCollection {
            name: name.to_string(),
        })
}

/// Authentication shared by every request
///
/// `apikey` becomes the `hapikey` query parameter; `token` becomes a bearer
/// `Authorization` header.
pub fn auth_mapping() -> RequestMapping {
    RequestMapping::new(
        Mapping::new().rename("apikey", "hapikey"),
        Mapping::new().remap("token", |token| {
            scalar_to_string(token).map(|token| {
                let mut headers = JsonObject::new();
                headers.insert("Authorization".to_string(), format!("Bearer {token}").into());
                headers
            })
        }),
    )
}

/// Validate `params`, resolve the collection, and open its pipeline
///
/// The `endpoint` parameter overrides the base URL of `config`. Validation
/// and resolution errors surface here, before any list request is made.
pub async fn open(
    collection: &dyn Collection,
    params: &Params,
    config: HttpClientConfig,
    cancel: CancellationToken,
) -> Result<Pipeline> {
    let validated = collection.declaration().validate(params)?;

    let mut config = config;
    if let Some(endpoint) = param(&validated, "endpoint").and_then(Value::as_str) {
        config.base_url = endpoint.to_string();
    }
    let client = HttpClient::with_config(config)?;

    let ctx = ResolveContext {
        client: client.clone(),
        cancel: cancel.clone(),
    };
    let spec = collection.resolve(&validated, &ctx).await?;

    info!(
        collection = collection.name(),
        path = %spec.list_path,
        selector = %spec.selector,
        details = spec.detail.is_some(),
        "Resolved collection"
    );
    Ok(Pipeline::open(client, spec, cancel))
}
