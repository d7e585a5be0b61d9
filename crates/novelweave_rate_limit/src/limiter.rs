//! Rate limiter built on governor and a Tokio semaphore.
//!
//! Requests per minute are enforced with governor's GCRA limiter. The
//! concurrency cap is a semaphore whose permit lives in the returned guard.

use crate::Tier;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Limiter enforcing a tier's RPM quota and concurrency cap.
///
/// # Example
///
/// ```
/// use novelweave_rate_limit::{RateLimiter, TierConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let limiter = RateLimiter::new(TierConfig::new("Free", Some(30), Some(1)));
/// let guard = limiter.acquire().await;
/// assert!(limiter.try_acquire().is_none());
/// drop(guard);
/// assert!(limiter.try_acquire().is_some());
/// # }
/// ```
#[derive(Clone)]
pub struct RateLimiter<T: Tier> {
    inner: T,
    rpm_limiter: Option<Arc<DirectRateLimiter>>,
    concurrent_semaphore: Arc<Semaphore>,
}

impl<T: Tier> RateLimiter<T> {
    /// Create a limiter from a tier.
    ///
    /// A tier without `max_concurrent` still runs requests one at a time.
    pub fn new(tier: T) -> Self {
        let rpm_limiter = tier.rpm().and_then(NonZeroU32::new).map(|n| {
            let quota = Quota::per_minute(n);
            Arc::new(GovernorRateLimiter::direct(quota))
        });

        let max_concurrent = tier.max_concurrent().unwrap_or(1).max(1);
        let concurrent_semaphore = Arc::new(Semaphore::new(max_concurrent as usize));

        Self {
            inner: tier,
            rpm_limiter,
            concurrent_semaphore,
        }
    }

    /// The tier this limiter was built from.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Wait until the quota allows one more request.
    ///
    /// The concurrency slot is taken last so a request waiting on the RPM
    /// quota does not hold it.
    pub async fn acquire(&self) -> RateLimiterGuard {
        if let Some(limiter) = &self.rpm_limiter {
            limiter.until_ready().await;
        }

        let permit = self.concurrent_semaphore.clone().acquire_owned().await.ok();
        trace!(
            tier = self.inner.name(),
            available = self.concurrent_semaphore.available_permits(),
            "Rate limit slot acquired"
        );
        RateLimiterGuard { _permit: permit }
    }

    /// Take a slot only if no limit would block.
    pub fn try_acquire(&self) -> Option<RateLimiterGuard> {
        let permit = self.concurrent_semaphore.clone().try_acquire_owned().ok()?;
        if let Some(limiter) = &self.rpm_limiter {
            limiter.check().ok()?;
        }
        Some(RateLimiterGuard {
            _permit: Some(permit),
        })
    }
}

/// Holds a concurrency slot until dropped.
pub struct RateLimiterGuard {
    _permit: Option<OwnedSemaphorePermit>,
}
