//! HTTP client with throttling policy and pacing
//!
//! Provides the GET client every pipeline request goes through:
//! - One request in flight per call, raced against a cancellation token
//! - Response classification through a [`ResponsePolicy`]
//! - Bounded retries of throttled requests
//! - Optional client-side pacing

use super::policy::{PolicyOutcome, ResponsePolicy, ThrottlePolicy};
use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::error::{Error, Result};
use crate::mapping::RequestParts;
use crate::types::StringMap;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Default HubSpot API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.hubapi.com";

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL that request paths are resolved against
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of throttled retries for one request
    pub max_throttle_retries: u32,
    /// 429 handling
    pub throttle: ThrottlePolicy,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: StringMap,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
            max_throttle_retries: 12,
            throttle: ThrottlePolicy::default(),
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers: StringMap::new(),
            user_agent: format!("hubspot-plug/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the throttled retry budget
    pub fn max_throttle_retries(mut self, retries: u32) -> Self {
        self.config.max_throttle_retries = retries;
        self
    }

    /// Set the 429 delays
    pub fn throttle(mut self, policy: ThrottlePolicy) -> Self {
        self.config.throttle = policy;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// A successfully fetched body
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Fully drained response body
    pub body: Bytes,
    /// Throttled attempts before the request went through
    pub throttled_retries: u32,
}

/// GET client shared by the pages and details of a pipeline
///
/// Cloning is cheap; clones share the connection pool and rate limiter.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: Arc<HttpClientConfig>,
    base_url: Url,
    policy: Arc<dyn ResponsePolicy>,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a client for the default endpoint
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let base_url = Url::parse(&config.base_url)?;
        let rate_limiter = config.rate_limit.map(RateLimiter::new);
        let policy: Arc<dyn ResponsePolicy> = Arc::new(config.throttle);

        Ok(Self {
            client,
            config: Arc::new(config),
            base_url,
            policy,
            rate_limiter,
        })
    }

    /// Replace the response policy
    #[must_use]
    pub fn with_policy(mut self, policy: impl ResponsePolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Resolve a path (or absolute URL) against the base URL
    pub fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// GET `path` and return the drained body
    ///
    /// Throttled responses are retried as the policy decides, up to
    /// `max_throttle_retries`. Every wait is abandoned when `cancel` fires.
    pub async fn get(
        &self,
        path: &str,
        parts: &RequestParts,
        cancel: &CancellationToken,
    ) -> Result<Fetched> {
        let url = self.url(path)?;
        let query = parts.query_pairs();
        let headers = parts.header_map();
        let mut throttled = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            if let Some(limiter) = &self.rate_limiter {
                tokio::select! {
                    () = cancel.cancelled() => return Err(Error::Cancelled),
                    () = limiter.until_ready() => {}
                }
            }

            let req = self.build_request(&url, &query, &headers);
            debug!(url = %url, attempt = throttled + 1, "GET");

            let outcome = tokio::select! {
                () = cancel.cancelled() => return Err(Error::Cancelled),
                outcome = self.send_once(req) => outcome?,
            };

            match outcome {
                PolicyOutcome::Pass(body) => {
                    return Ok(Fetched {
                        body,
                        throttled_retries: throttled,
                    });
                }
                PolicyOutcome::Retry(decision) => {
                    throttled += 1;
                    if !decision.retry || throttled > self.config.max_throttle_retries {
                        return Err(Error::RateLimited {
                            attempts: throttled,
                        });
                    }

                    warn!(
                        "Throttled on {}, attempt {}/{}, waiting {:?}",
                        url.path(),
                        throttled,
                        self.config.max_throttle_retries,
                        decision.delay
                    );
                    tokio::select! {
                        () = cancel.cancelled() => return Err(Error::Cancelled),
                        () = tokio::time::sleep(decision.delay) => {}
                    }
                }
            }
        }
    }

    /// GET `path` and parse the body as JSON
    pub async fn get_json(
        &self,
        path: &str,
        parts: &RequestParts,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let fetched = self.get(path, parts, cancel).await?;
        Ok(serde_json::from_slice(&fetched.body)?)
    }

    fn build_request(&self, url: &Url, query: &[(String, String)], headers: &StringMap) -> RequestBuilder {
        let mut req = self.client.get(url.clone());

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        for (key, value) in headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if !query.is_empty() {
            req = req.query(query);
        }

        req
    }

    async fn send_once(&self, req: RequestBuilder) -> Result<PolicyOutcome> {
        let response = req.send().await?;
        self.policy.handle(response).await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .field("policy", &self.policy)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}
