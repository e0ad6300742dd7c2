use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

use crate::core::error::SwipeError;
use crate::models::{Match, MatchInsert, NewSwipe, Swipe, SwipeAction, UserPair};

/// Errors raised by a swipe store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    /// A uniqueness constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The swiper's rate window is already full
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for SwipeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => SwipeError::AlreadyExists,
            StoreError::LimitExceeded(_) => SwipeError::ResourceExhausted,
            other => SwipeError::Internal(other.to_string()),
        }
    }
}

/// Persistence for swipes and matches.
///
/// Implementations must enforce uniqueness of (swiper, swiped) for swipes and
/// of the canonical pair for matches themselves; callers treat their own
/// lookups only as a fast path.
#[async_trait]
pub trait SwipeStore: Send + Sync {
    /// Swipe authored by `swiper` on `swiped`, if any
    async fn find_swipe(&self, swiper: u64, swiped: u64) -> Result<Option<Swipe>, StoreError>;

    /// Number of swipes by `swiper` created strictly after `since`
    async fn count_swipes_since(&self, swiper: u64, since: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Insert a swipe. Fails with `StoreError::Conflict` if the pair already exists.
    async fn insert_swipe(&self, swipe: NewSwipe) -> Result<Swipe, StoreError>;

    /// Insert a swipe unless `swiper` already has `max_swipes` swipes created
    /// strictly after `since`.
    ///
    /// Counting and inserting happen as one step per swiper, so concurrent
    /// callers cannot overshoot the window. Fails with `StoreError::Conflict`
    /// for an existing pair and `StoreError::LimitExceeded` when the window is full.
    async fn insert_swipe_within_limit(
        &self,
        swipe: NewSwipe,
        since: DateTime<Utc>,
        max_swipes: u64,
    ) -> Result<Swipe, StoreError>;

    /// Ids of every user `swiper` has swiped, any action
    async fn swiped_user_ids(&self, swiper: u64) -> Result<HashSet<u64>, StoreError>;

    /// Swipes authored by `swiper` in creation order
    async fn list_swipes(
        &self,
        swiper: u64,
        action: Option<SwipeAction>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Swipe>, StoreError>;

    /// Insert the match for `pair`, or return the one already stored
    async fn insert_match(&self, pair: UserPair, created_at: DateTime<Utc>) -> Result<MatchInsert, StoreError>;

    async fn find_match(&self, pair: UserPair) -> Result<Option<Match>, StoreError>;

    /// Matches involving `user_id`, in creation order
    async fn list_matches(&self, user_id: u64) -> Result<Vec<Match>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}
