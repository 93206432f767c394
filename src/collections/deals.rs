//! Deals collection
//!
//! Deals are always enriched: the list endpoints return stubs, the detail
//! endpoint returns the full deal with property versions.

use super::{auth_mapping, Collection, ResolveContext};
use crate::config::{base_declaration, Declaration, ParameterDef};
use crate::engine::{DetailSpec, ResourceSpec};
use crate::error::{Error, Result};
use crate::extract::Selector;
use crate::pagination::{CursorField, HasMorePaginator};
use crate::types::{param, JsonObject, Params};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Timelike, Utc};
use serde_json::Value;
use std::sync::Arc;

const PAGED_PATH: &str = "/deals/v1/deal/paged";
const RECENT_CREATED_PATH: &str = "/deals/v1/deal/recent/created";
const RECENT_MODIFIED_PATH: &str = "/deals/v1/deal/recent/modified";
const DETAIL_PATH: &str = "/deals/v1/deal/{dealId}";

/// How far back the recent deal feeds reach
const RECENT_WINDOW_DAYS: i64 = 30;

/// All deals, or the recently created/updated feeds
#[derive(Debug, Clone, Copy, Default)]
pub struct Deals;

/// Oldest `since` the recent feeds accept, relative to `now`
pub fn earliest_since(now: DateTime<Utc>) -> DateTime<Utc> {
    let earliest = now - Duration::days(RECENT_WINDOW_DAYS);
    earliest.with_nanosecond(0).unwrap_or(earliest)
}

/// Default `since`: one second inside the recent window
pub fn default_since(now: DateTime<Utc>) -> DateTime<Utc> {
    earliest_since(now) + Duration::seconds(1)
}

fn parse_since(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::invalid_value("since", e.to_string()))
}

fn feed(params: &Params) -> Option<&str> {
    param(params, "recently").and_then(Value::as_str)
}

fn list_target(recently: Option<&str>) -> (&'static str, Selector) {
    match recently {
        Some("created") => (RECENT_CREATED_PATH, Selector::each_in("results")),
        Some("updated") => (RECENT_MODIFIED_PATH, Selector::each_in("results")),
        _ => (PAGED_PATH, Selector::each_in("deals")),
    }
}

/// Check the `since` window and drop `since` when no feed is requested
fn effective_params(params: &Params, now: DateTime<Utc>) -> Result<Params> {
    let mut params = params.clone();

    if feed(&params).is_some() {
        if let Some(since) = param(&params, "since").and_then(Value::as_str) {
            let since = parse_since(since)?;
            let earliest = earliest_since(now);
            if since < earliest {
                return Err(Error::InvalidRange {
                    since: since.to_rfc3339_opts(SecondsFormat::Secs, true),
                    earliest: earliest.to_rfc3339_opts(SecondsFormat::Secs, true),
                });
            }
        }
    } else {
        params.remove("since");
    }

    Ok(params)
}

fn since_as_millis(value: &Value) -> Option<JsonObject> {
    let since = value.as_str().and_then(|s| parse_since(s).ok())?;
    let mut out = JsonObject::new();
    out.insert("since".to_string(), since.timestamp_millis().into());
    Some(out)
}

#[async_trait]
impl Collection for Deals {
    fn name(&self) -> &'static str {
        "deals"
    }

    fn description(&self) -> &'static str {
        "Deals with property history, optionally only the recently created or updated ones"
    }

    fn declaration(&self) -> Declaration {
        base_declaration().extended(|d| {
            d.parameter(
                ParameterDef::one_of("recently", ["created", "updated"])
                    .describe("Fetch only recent deals in descending order by date"),
            )
            .parameter(
                ParameterDef::date_time("since")
                    .describe("Date and time to query recent deals since")
                    .with_default_fn(|| {
                        default_since(Utc::now())
                            .to_rfc3339_opts(SecondsFormat::Secs, true)
                            .into()
                    }),
            )
            .parameter(
                ParameterDef::boolean("includePropertyVersions")
                    .describe("Include previous versions of property values")
                    .with_default(true),
            )
        })
    }

    async fn resolve(&self, params: &Params, _ctx: &ResolveContext) -> Result<ResourceSpec> {
        let params = effective_params(params, Utc::now())?;
        let (list_path, selector) = list_target(feed(&params));

        let auth = auth_mapping();
        let parts = auth
            .extend_query(|m| m.remap("since", since_as_millis))
            .apply(&params)
            .await?;
        let detail_parts = auth
            .extend_query(|m| m.as_is("includePropertyVersions"))
            .apply(&params)
            .await?;

        Ok(ResourceSpec {
            name: self.name().to_string(),
            list_path: list_path.to_string(),
            selector,
            paginator: Arc::new(HasMorePaginator::with_cursors(vec![CursorField::new(
                "offset", "offset",
            )])),
            parts,
            detail: Some(DetailSpec::new(DETAIL_PATH, detail_parts)),
        })
    }
}
