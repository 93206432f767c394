//! Response policies
//!
//! A policy looks at each response and either passes the drained body through
//! or asks the client to retry the same request after a delay.

use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

/// `policyName` HubSpot reports for the per-second limit
pub const SECONDLY_POLICY: &str = "SECONDLY";

/// Whether and when to repeat a throttled request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    /// Repeat the request
    pub retry: bool,
    /// How long to wait first
    pub delay: Duration,
}

impl RetryDecision {
    /// Retry after `delay`
    pub fn after(delay: Duration) -> Self {
        Self { retry: true, delay }
    }
}

/// Result of running a response through a policy
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyOutcome {
    /// Successful response with its fully read body
    Pass(Bytes),
    /// Throttled; repeat the request as decided
    Retry(RetryDecision),
}

impl PolicyOutcome {
    /// Check if this outcome asks for a retry
    pub fn is_retry(&self) -> bool {
        matches!(self, Self::Retry(_))
    }
}

/// Decides what to do with a response
#[async_trait]
pub trait ResponsePolicy: Send + Sync + std::fmt::Debug {
    /// Consume `response`, draining its body, and classify it
    async fn handle(&self, response: Response) -> Result<PolicyOutcome>;
}

/// 2xx passes, anything else is a hard failure
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl DefaultPolicy {
    /// Classify a status and an already drained body
    pub fn classify(status: StatusCode, body: Bytes) -> Result<PolicyOutcome> {
        if status.is_success() {
            Ok(PolicyOutcome::Pass(body))
        } else {
            Err(Error::http_status(
                status.as_u16(),
                String::from_utf8_lossy(&body).into_owned(),
            ))
        }
    }
}

#[async_trait]
impl ResponsePolicy for DefaultPolicy {
    async fn handle(&self, response: Response) -> Result<PolicyOutcome> {
        let status = response.status();
        let body = response.bytes().await?;
        Self::classify(status, body)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThrottleBody {
    #[serde(default)]
    policy_name: Option<String>,
}

/// HubSpot 429 handling: short wait for the secondly limit, long wait otherwise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlePolicy {
    /// Delay when the per-second limit was hit
    pub secondly_delay: Duration,
    /// Delay for the daily (or any other) limit
    pub window_delay: Duration,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            secondly_delay: Duration::from_secs(1),
            window_delay: Duration::from_secs(60 * 60),
        }
    }
}

impl ThrottlePolicy {
    /// Create a policy with custom delays
    pub fn new(secondly_delay: Duration, window_delay: Duration) -> Self {
        Self {
            secondly_delay,
            window_delay,
        }
    }

    /// Decide the retry for a drained 429 body
    pub fn decide(&self, body: &[u8]) -> Result<RetryDecision> {
        let parsed: ThrottleBody = serde_json::from_slice(body)?;

        if parsed.policy_name.as_deref() == Some(SECONDLY_POLICY) {
            info!("Secondly limit hit, retrying in {:?}", self.secondly_delay);
            Ok(RetryDecision::after(self.secondly_delay))
        } else {
            info!(
                policy = parsed.policy_name.as_deref().unwrap_or("unknown"),
                "Rate limit window exhausted, retrying in {:?}", self.window_delay
            );
            Ok(RetryDecision::after(self.window_delay))
        }
    }

    /// Classify a status and an already drained body
    pub fn classify(&self, status: StatusCode, body: Bytes) -> Result<PolicyOutcome> {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return self.decide(&body).map(PolicyOutcome::Retry);
        }
        DefaultPolicy::classify(status, body)
    }
}

#[async_trait]
impl ResponsePolicy for ThrottlePolicy {
    async fn handle(&self, response: Response) -> Result<PolicyOutcome> {
        let status = response.status();
        // Always drain so the connection can go back to the pool
        let body = response.bytes().await?;
        self.classify(status, body)
    }
}
