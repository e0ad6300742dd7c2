use chrono::{DateTime, Duration, Utc};

use crate::core::error::{SwipeError, SwipeResult};
use crate::core::store::{StoreError, SwipeStore};
use crate::models::{NewSwipe, Swipe};

/// Maximum swipes one user may issue inside a window
pub const MAX_SWIPES_PER_WINDOW: u64 = 10;

/// Length of the trailing rate window in hours
pub const SWIPE_WINDOW_HOURS: i64 = 24;

/// Rolling-window swipe limit, recomputed from the swipe log on every check
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    max_swipes: u64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_swipes: u64, window: Duration) -> Self {
        Self { max_swipes, window }
    }

    pub fn max_swipes(&self) -> u64 {
        self.max_swipes
    }

    /// Start of the window ending at `now`; swipes strictly after it count
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }

    pub async fn count_recent_swipes(
        &self,
        store: &dyn SwipeStore,
        swiper: u64,
        now: DateTime<Utc>,
    ) -> SwipeResult<u64> {
        let since = self.window_start(now);
        let count = store.count_swipes_since(swiper, since).await?;
        tracing::debug!("User {} has {} swipes since {}", swiper, count, since);
        Ok(count)
    }

    /// Read-only check; the authoritative one is `record_within_window`
    pub async fn check(&self, store: &dyn SwipeStore, swiper: u64, now: DateTime<Utc>) -> SwipeResult<()> {
        let count = self.count_recent_swipes(store, swiper, now).await?;
        if count >= self.max_swipes {
            tracing::info!("User {} hit swipe limit ({} in window)", swiper, count);
            return Err(SwipeError::ResourceExhausted);
        }
        Ok(())
    }

    /// Persist `swipe` if the window ending at its timestamp still has room.
    ///
    /// The count and the insert are a single store operation, so concurrent
    /// swipes from one user cannot all slip under the limit.
    pub async fn record_within_window(&self, store: &dyn SwipeStore, swipe: NewSwipe) -> SwipeResult<Swipe> {
        let swiper = swipe.swiper_user_id;
        let since = self.window_start(swipe.created_at);

        store
            .insert_swipe_within_limit(swipe, since, self.max_swipes)
            .await
            .map_err(|e| {
                if let StoreError::LimitExceeded(detail) = &e {
                    tracing::info!("User {} hit swipe limit on insert: {}", swiper, detail);
                }
                SwipeError::from(e)
            })
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(MAX_SWIPES_PER_WINDOW, Duration::hours(SWIPE_WINDOW_HOURS))
    }
}
