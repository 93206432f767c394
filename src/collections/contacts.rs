//! Contacts collection

use super::{auth_mapping, Collection, ResolveContext};
use crate::config::{base_declaration, Declaration, ParameterDef};
use crate::engine::{DetailSpec, ResourceSpec};
use crate::error::Result;
use crate::extract::Selector;
use crate::mapping::Mapping;
use crate::pagination::{CursorField, HasMorePaginator};
use crate::types::{is_flag_set, param, Params};
use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;
use std::sync::Arc;

const ALL_PATH: &str = "/contacts/v1/lists/all/contacts/all";
const RECENT_CREATED_PATH: &str = "/contacts/v1/lists/all/contacts/recent";
const RECENT_UPDATED_PATH: &str = "/contacts/v1/lists/recently_updated/contacts/recent";
const DETAIL_PATH: &str = "/contacts/v1/contact/vid/{vid}/profile";

/// All contacts, or the recently created/updated feeds
#[derive(Debug, Clone, Copy, Default)]
pub struct Contacts;

fn is_recent(params: &Params) -> bool {
    is_flag_set(params, "recentlyCreated") || is_flag_set(params, "recentlyUpdated")
}

fn list_path(params: &Params) -> &'static str {
    if is_flag_set(params, "recentlyCreated") {
        RECENT_CREATED_PATH
    } else if is_flag_set(params, "recentlyUpdated") {
        RECENT_UPDATED_PATH
    } else {
        ALL_PATH
    }
}

/// `since` in epoch milliseconds, when given
fn since_ms(params: &Params) -> Option<i64> {
    param(params, "since")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.timestamp_millis())
}

/// Profile options shared by the list and the detail request
fn profile_options(mapping: Mapping) -> Mapping {
    mapping
        .as_is("propertyMode")
        .as_is("formSubmissionMode")
        .as_is("showListMemberships")
}

fn paginator(params: &Params) -> HasMorePaginator {
    if !is_recent(params) {
        return HasMorePaginator::new();
    }

    // The recent feeds page backwards in time
    let paginator = HasMorePaginator::with_cursors(vec![
        CursorField::new("vid-offset", "vidOffset"),
        CursorField::new("time-offset", "timeOffset"),
    ]);
    match since_ms(params) {
        Some(since) => paginator.with_time_cursor("time-offset", "timeOffset", since),
        None => paginator,
    }
}

#[async_trait]
impl Collection for Contacts {
    fn name(&self) -> &'static str {
        "contacts"
    }

    fn description(&self) -> &'static str {
        "Contacts, optionally only the recently created or updated ones"
    }

    fn declaration(&self) -> Declaration {
        base_declaration().extended(|d| {
            d.parameter(
                ParameterDef::boolean("recentlyCreated")
                    .describe("Fetch recently created contacts in descending order by create date"),
            )
            .parameter(
                ParameterDef::boolean("recentlyUpdated")
                    .describe("Fetch recently updated contacts in descending order by update date"),
            )
            .conflicts("recentlyCreated", "recentlyUpdated")
            .parameter(
                ParameterDef::one_of("propertyMode", ["value_only", "value_and_history"])
                    .describe("Fetch only current property values or their history as well")
                    .with_default("value_and_history"),
            )
            .parameter(
                ParameterDef::one_of("formSubmissionMode", ["all", "none", "newest", "oldest"])
                    .describe("Which form submissions to fetch")
                    .with_default("all"),
            )
            .parameter(
                ParameterDef::boolean("showListMemberships")
                    .describe("Include current list memberships")
                    .with_default(true),
            )
            .parameter(
                ParameterDef::integer("chunkSize")
                    .describe("Page size")
                    .with_default(100),
            )
            .parameter(
                ParameterDef::date_time("since")
                    .describe("Stop the recent feeds at contacts older than this"),
            )
            .parameter(
                ParameterDef::boolean("details")
                    .describe("Replace each contact with its full profile")
                    .with_default(false),
            )
        })
    }

    async fn resolve(&self, params: &Params, _ctx: &ResolveContext) -> Result<ResourceSpec> {
        let auth = auth_mapping();
        let list = auth.extend_query(|m| profile_options(m).rename("chunkSize", "count"));
        let parts = list.apply(params).await?;

        let detail = if is_flag_set(params, "details") {
            let detail_mapping = auth.extend_query(profile_options);
            Some(DetailSpec::new(DETAIL_PATH, detail_mapping.apply(params).await?))
        } else {
            None
        };

        Ok(ResourceSpec {
            name: self.name().to_string(),
            list_path: list_path(params).to_string(),
            selector: Selector::each_in("contacts"),
            paginator: Arc::new(paginator(params)),
            parts,
            detail,
        })
    }
}
