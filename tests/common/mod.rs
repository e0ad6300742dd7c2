// Shared fixtures for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use date_service::core::{
    ActivityEntry, ActivityError, ActivitySink, ManualClock, ProfileProvider, ProviderError, StoreError,
    SwipeEngine, SwipeStore,
};
use date_service::models::{Match, MatchInsert, NewSwipe, ProfileSummary, Swipe, SwipeAction, UserPair};
use date_service::services::{InMemorySwipeStore, TracingActivityLog};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn profile(user_id: u64) -> ProfileSummary {
    ProfileSummary {
        id: user_id + 500,
        user_id,
        age: 20 + (user_id % 15) as i32,
        bio: format!("User {}", user_id),
        photos: vec![format!("{}.jpg", user_id)],
    }
}

/// Returns a fixed candidate list, honoring the requested limit like a real provider
pub struct StaticProfileProvider {
    profiles: Vec<ProfileSummary>,
    pub requested: Mutex<Vec<usize>>,
}

impl StaticProfileProvider {
    pub fn new(user_ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            profiles: user_ids.into_iter().map(profile).collect(),
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ProfileProvider for StaticProfileProvider {
    async fn candidate_profiles(&self, _user_id: u64, limit: usize) -> Result<Vec<ProfileSummary>, ProviderError> {
        self.requested.lock().unwrap().push(limit);
        Ok(self.profiles.iter().take(limit).cloned().collect())
    }
}

pub struct MissingProfileProvider;

#[async_trait]
impl ProfileProvider for MissingProfileProvider {
    async fn candidate_profiles(&self, user_id: u64, _limit: usize) -> Result<Vec<ProfileSummary>, ProviderError> {
        Err(ProviderError::NotFound(format!("profile for user {}", user_id)))
    }
}

pub struct SlowProfileProvider(pub Duration);

#[async_trait]
impl ProfileProvider for SlowProfileProvider {
    async fn candidate_profiles(&self, _user_id: u64, _limit: usize) -> Result<Vec<ProfileSummary>, ProviderError> {
        tokio::time::sleep(self.0).await;
        Ok(vec![])
    }
}

/// Forwards every entry to a channel
pub struct RecordingActivitySink(pub mpsc::UnboundedSender<ActivityEntry>);

#[async_trait]
impl ActivitySink for RecordingActivitySink {
    async fn record_activity(&self, entry: ActivityEntry) -> Result<(), ActivityError> {
        let _ = self.0.send(entry);
        Ok(())
    }
}

pub struct FailingActivitySink;

#[async_trait]
impl ActivitySink for FailingActivitySink {
    async fn record_activity(&self, entry: ActivityEntry) -> Result<(), ActivityError> {
        Err(ActivityError::Rejected(format!("logs service down for '{}'", entry.action_type)))
    }
}

/// In-memory store with switchable faults and database-like read latency
pub struct FaultyStore {
    pub inner: InMemorySwipeStore,
    /// Pretend no swipe exists on lookup, forcing the insert to hit the unique index
    pub blind_lookups: AtomicBool,
    pub fail_match_writes: AtomicBool,
    /// Sleep a few milliseconds on every read, like a network round-trip
    pub slow_reads: AtomicBool,
    pub fail_health: AtomicBool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self {
            inner: InMemorySwipeStore::new(),
            blind_lookups: AtomicBool::new(false),
            fail_match_writes: AtomicBool::new(false),
            slow_reads: AtomicBool::new(false),
            fail_health: AtomicBool::new(false),
        }
    }

    async fn read_latency(&self) {
        if self.slow_reads.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl SwipeStore for FaultyStore {
    async fn find_swipe(&self, swiper: u64, swiped: u64) -> Result<Option<Swipe>, StoreError> {
        self.read_latency().await;
        if self.blind_lookups.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_swipe(swiper, swiped).await
    }

    async fn count_swipes_since(&self, swiper: u64, since: DateTime<Utc>) -> Result<u64, StoreError> {
        let count = self.inner.count_swipes_since(swiper, since).await;
        self.read_latency().await;
        count
    }

    async fn insert_swipe(&self, swipe: NewSwipe) -> Result<Swipe, StoreError> {
        self.inner.insert_swipe(swipe).await
    }

    async fn insert_swipe_within_limit(
        &self,
        swipe: NewSwipe,
        since: DateTime<Utc>,
        max_swipes: u64,
    ) -> Result<Swipe, StoreError> {
        self.inner.insert_swipe_within_limit(swipe, since, max_swipes).await
    }

    async fn swiped_user_ids(&self, swiper: u64) -> Result<HashSet<u64>, StoreError> {
        self.inner.swiped_user_ids(swiper).await
    }

    async fn list_swipes(
        &self,
        swiper: u64,
        action: Option<SwipeAction>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Swipe>, StoreError> {
        self.inner.list_swipes(swiper, action, limit, offset).await
    }

    async fn insert_match(&self, pair: UserPair, created_at: DateTime<Utc>) -> Result<MatchInsert, StoreError> {
        if self.fail_match_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("matches table locked".to_string()));
        }
        self.inner.insert_match(pair, created_at).await
    }

    async fn find_match(&self, pair: UserPair) -> Result<Option<Match>, StoreError> {
        self.inner.find_match(pair).await
    }

    async fn list_matches(&self, user_id: u64) -> Result<Vec<Match>, StoreError> {
        self.inner.list_matches(user_id).await
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        if self.fail_health.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(true)
    }
}

/// Engine over `store` with a manual clock and a tracing-only activity sink
pub fn engine(store: Arc<dyn SwipeStore>, profiles: Arc<dyn ProfileProvider>) -> (SwipeEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start_time()));
    let engine = SwipeEngine::new(store, profiles, Arc::new(TracingActivityLog)).with_clock(clock.clone());
    (engine, clock)
}

pub fn memory_engine() -> (SwipeEngine, Arc<InMemorySwipeStore>, Arc<ManualClock>) {
    let store = Arc::new(InMemorySwipeStore::new());
    let (engine, clock) = engine(store.clone(), Arc::new(StaticProfileProvider::new(Vec::new())));
    (engine, store, clock)
}
