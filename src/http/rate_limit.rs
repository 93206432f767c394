//! Client-side request pacing
//!
//! Token bucket built on governor. Keeps a pipeline under HubSpot's
//! per-second allowance so the secondly 429 path stays the exception.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;

/// HubSpot's per-second request allowance for private apps
pub const HUBSPOT_REQUESTS_PER_SECOND: u32 = 10;

/// Configuration for request pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Requests allowed back to back before pacing kicks in
    pub burst_size: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::per_second(HUBSPOT_REQUESTS_PER_SECOND)
    }
}

impl RateLimiterConfig {
    /// Pace at `n` requests per second with a burst of `n`
    pub fn per_second(n: u32) -> Self {
        Self {
            requests_per_second: n,
            burst_size: n,
        }
    }

    /// Override the burst size
    #[must_use]
    pub fn with_burst(mut self, burst_size: u32) -> Self {
        self.burst_size = burst_size;
        self
    }
}

/// Token bucket shared by clones of one client
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
    config: RateLimiterConfig,
}

impl RateLimiter {
    /// Create a limiter; zero values are treated as one
    pub fn new(config: RateLimiterConfig) -> Self {
        let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN);

        Self {
            limiter: Arc::new(Governor::direct(Quota::per_second(rate).allow_burst(burst))),
            config,
        }
    }

    /// The configuration this limiter was built from
    pub fn config(&self) -> RateLimiterConfig {
        self.config
    }

    /// Wait until a request may be sent
    pub async fn until_ready(&self) {
        self.limiter.until_ready().await;
    }

    /// Take a permit if one is available right now
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
