//! Per-client request spacing.
//!
//! A turn makes one call to each upstream, but chat turns run concurrently, so a burst of
//! submissions can still exceed the published per-client rates. Each source client owns a
//! [`Throttle`] and talks to exactly one base URL, so no URL matching is needed.

use std::sync::Arc;
use std::time::Duration;

use http::Extensions;
use reqwest_middleware::{Middleware, Next};
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

/// RxNav allows 20 requests per second per client.
pub(crate) const RXNORM_MIN_INTERVAL: Duration = Duration::from_millis(50);
/// openFDA allows 240 requests per minute; an API key only raises the daily cap.
pub(crate) const OPENFDA_MIN_INTERVAL: Duration = Duration::from_millis(250);

/// Hands out send slots at least `min_interval` apart, in arrival order.
#[derive(Debug)]
pub(crate) struct Throttle {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub(crate) fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Reserves the next free slot and sleeps until it arrives.
    ///
    /// The reservation is made under the lock, so concurrent callers never share a slot.
    pub(crate) async fn acquire(&self) -> Duration {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next = Some(slot + self.min_interval);
            slot
        };
        let waited = slot.saturating_duration_since(Instant::now());
        if !waited.is_zero() {
            sleep_until(slot).await;
        }
        waited
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ThrottleMiddleware {
    api: &'static str,
    throttle: Arc<Throttle>,
}

impl ThrottleMiddleware {
    pub(crate) fn new(api: &'static str, min_interval: Duration) -> Self {
        Self {
            api,
            throttle: Arc::new(Throttle::new(min_interval)),
        }
    }
}

#[async_trait::async_trait]
impl Middleware for ThrottleMiddleware {
    async fn handle(
        &self,
        req: reqwest::Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<reqwest::Response> {
        let waited = self.throttle.acquire().await;
        if !waited.is_zero() {
            debug!(api = self.api, waited_ms = waited.as_millis() as u64, "throttled request");
        }
        next.run(req, extensions).await
    }
}
