//! Admission control for model calls.
//!
//! Wraps a governor token bucket refilled once per inter-batch delay with a
//! burst of one, so calls are spaced at least `delay` apart no matter how
//! many batch tasks are waiting on the same throttle.

use std::sync::Arc;
use std::time::Duration;

use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Cheap to clone; clones share one bucket.
#[derive(Clone, Default)]
pub struct Throttle {
    limiter: Option<Arc<DirectRateLimiter>>,
}

impl Throttle {
    /// One permit per `delay`. A zero delay disables throttling.
    pub fn new(delay: Duration) -> Self {
        Self {
            limiter: Quota::with_period(delay).map(|q| Arc::new(RateLimiter::direct(q))),
        }
    }

    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Wait until the next call may proceed.
    pub async fn until_ready(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    pub fn is_limited(&self) -> bool {
        self.limiter.is_some()
    }
}
