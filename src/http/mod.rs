//! HTTP client module
//!
//! Provides the GET client, the 429 response policy, and request pacing.
//!
//! # Features
//!
//! - **Response policies**: pass 2xx bodies, retry 429s, fail everything else
//! - **HubSpot throttling**: short wait for `SECONDLY`, long wait otherwise
//! - **Retry budget**: throttled retries are capped per request
//! - **Pacing**: token bucket rate limiter using governor
//! - **Cancellation**: every suspension point honours a cancellation token

mod client;
mod policy;
mod rate_limit;

pub use client::{Fetched, HttpClient, HttpClientConfig, HttpClientConfigBuilder, DEFAULT_ENDPOINT};
pub use policy::{
    DefaultPolicy, PolicyOutcome, ResponsePolicy, RetryDecision, ThrottlePolicy, SECONDLY_POLICY,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig, HUBSPOT_REQUESTS_PER_SECOND};
