//! Owners collection

use super::{auth_mapping, Collection, ResolveContext};
use crate::config::{base_declaration, Declaration, ParameterDef};
use crate::engine::ResourceSpec;
use crate::error::Result;
use crate::extract::Selector;
use crate::pagination::NoPaginator;
use crate::types::Params;
use async_trait::async_trait;
use std::sync::Arc;

const LIST_PATH: &str = "/owners/v2/owners/";

/// Portal owners; a single unpaged request
#[derive(Debug, Clone, Copy, Default)]
pub struct Owners;

#[async_trait]
impl Collection for Owners {
    fn name(&self) -> &'static str {
        "owners"
    }

    fn description(&self) -> &'static str {
        "Owners of the portal"
    }

    fn declaration(&self) -> Declaration {
        base_declaration().extended(|d| {
            d.parameter(
                ParameterDef::boolean("includeInactive")
                    .describe("Include owners without any active remotes")
                    .with_default(true),
            )
            .parameter(
                ParameterDef::string("email")
                    .describe("Only owners matching this email address"),
            )
        })
    }

    async fn resolve(&self, params: &Params, _ctx: &ResolveContext) -> Result<ResourceSpec> {
        let parts = auth_mapping()
            .extend_query(|m| m.as_is("includeInactive").as_is("email"))
            .apply(params)
            .await?;

        Ok(ResourceSpec {
            name: self.name().to_string(),
            list_path: LIST_PATH.to_string(),
            selector: Selector::each(),
            paginator: Arc::new(NoPaginator),
            parts,
            detail: None,
        })
    }
}
