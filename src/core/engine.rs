use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::core::detector::MatchDetector;
use crate::core::error::{SwipeError, SwipeResult};
use crate::core::filters::filter_suggestions;
use crate::core::ports::{ActivityEntry, ActivitySink, Clock, ProfileProvider, SystemClock};
use crate::core::rate_limit::RateLimiter;
use crate::core::store::SwipeStore;
use crate::models::{Match, MatchInsert, NewSwipe, ProfileSummary, Swipe, SwipeAction, SwipeOutcome};

/// Largest user id accepted; ids are stored as signed 64-bit integers
pub const MAX_USER_ID: u64 = i64::MAX as u64;

/// Paging and fetch limits applied by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Suggestions returned when the caller passes limit 0
    pub suggestion_default_limit: usize,
    pub suggestion_max_limit: usize,
    /// Upper bound on how many candidates are requested from the provider
    pub candidate_fetch_ceiling: usize,
    /// History page size when the caller passes limit 0
    pub history_default_limit: usize,
    pub history_max_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            suggestion_default_limit: 20,
            suggestion_max_limit: 100,
            candidate_fetch_ceiling: 500,
            history_default_limit: 50,
            history_max_limit: 100,
        }
    }
}

/// Entry point for recording swipes and reading suggestions, history and matches.
///
/// # RecordSwipe pipeline
/// 1. Argument validation (no I/O)
/// 2. Duplicate check against the store
/// 3. Rolling-window rate check, repeated atomically with the insert
/// 4. Persist; a store conflict still reports `AlreadyExists`
/// 5. Match detection for likes; failure here downgrades to a warning
/// 6. Activity notifications, dispatched after the write and never awaited
///
/// The engine holds no mutable state of its own and is cheap to clone.
#[derive(Clone)]
pub struct SwipeEngine {
    store: Arc<dyn SwipeStore>,
    profiles: Arc<dyn ProfileProvider>,
    activity: Arc<dyn ActivitySink>,
    clock: Arc<dyn Clock>,
    rate_limiter: RateLimiter,
    detector: MatchDetector,
    config: EngineConfig,
}

impl SwipeEngine {
    pub fn new(
        store: Arc<dyn SwipeStore>,
        profiles: Arc<dyn ProfileProvider>,
        activity: Arc<dyn ActivitySink>,
    ) -> Self {
        Self {
            store,
            profiles,
            activity,
            clock: Arc::new(SystemClock),
            rate_limiter: RateLimiter::default(),
            detector: MatchDetector::new(),
            config: EngineConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SwipeStore> {
        &self.store
    }

    pub async fn record_swipe(&self, swiper: u64, swiped: u64, action: &str) -> SwipeResult<SwipeOutcome> {
        let action = validate_swipe(swiper, swiped, action)?;
        let store = self.store.as_ref();

        if store.find_swipe(swiper, swiped).await?.is_some() {
            tracing::debug!("User {} already swiped user {}", swiper, swiped);
            return Err(SwipeError::AlreadyExists);
        }

        let now = self.clock.now();
        self.rate_limiter.check(store, swiper, now).await?;

        let new_swipe = NewSwipe {
            swiper_user_id: swiper,
            swiped_profile_user_id: swiped,
            action,
            created_at: now,
        };
        let swipe = self
            .rate_limiter
            .record_within_window(store, new_swipe)
            .await
            .map_err(|err| {
                if let SwipeError::Internal(msg) = &err {
                    tracing::error!("Failed to persist swipe {} -> {}: {}", swiper, swiped, msg);
                }
                err
            })?;

        tracing::info!("Recorded swipe {}: {} -> {} ({})", swipe.id, swiper, swiped, action);
        self.notify(ActivityEntry::new(
            swiper,
            "Swipe",
            format!("User {} swipe user {} with action {}", swiper, swiped, action),
        ));

        let mut matched = None;
        let mut warning = None;
        if action == SwipeAction::Like {
            match self.detector.detect_and_create_match(store, swiper, swiped, now).await {
                Ok(Some(inserted)) => matched = Some(self.announce_match(inserted, swiper, swiped)),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Swipe {} committed but match detection failed: {}", swipe.id, e);
                    warning = Some(format!("swipe recorded but match detection failed: {}", e));
                }
            }
        }

        Ok(SwipeOutcome {
            status: format!("Successfully {} profile with user id {}", action, swiped),
            swipe,
            matched,
            warning,
        })
    }

    pub async fn get_suggestions(&self, user_id: u64, limit: u32) -> SwipeResult<Vec<ProfileSummary>> {
        require_user(user_id)?;
        let limit = clamp_limit(limit, self.config.suggestion_default_limit, self.config.suggestion_max_limit);

        let mut excluded = self.store.swiped_user_ids(user_id).await?;
        excluded.insert(user_id);

        let fetch = limit
            .saturating_add(excluded.len())
            .min(self.config.candidate_fetch_ceiling)
            .max(limit);

        let candidates = self.profiles.candidate_profiles(user_id, fetch).await.map_err(|e| {
            tracing::error!("Failed to fetch candidates for {}: {}", user_id, e);
            SwipeError::from(e)
        })?;
        let total = candidates.len();

        let profiles = filter_suggestions(candidates, &excluded, limit);
        tracing::info!(
            "Returning {} suggestions for user {} (from {} candidates, {} excluded)",
            profiles.len(),
            user_id,
            total,
            excluded.len()
        );

        Ok(profiles)
    }

    /// Swipes authored by `user_id`, oldest first. Limit 0 means the default page size.
    pub async fn get_swipe_history(&self, user_id: u64, limit: u32, offset: u32) -> SwipeResult<Vec<Swipe>> {
        require_user(user_id)?;
        let limit = clamp_limit(limit, self.config.history_default_limit, self.config.history_max_limit);
        let swipes = self.store.list_swipes(user_id, None, limit, offset as usize).await?;
        Ok(swipes)
    }

    pub async fn get_matches(&self, user_id: u64) -> SwipeResult<Vec<Match>> {
        require_user(user_id)?;
        Ok(self.store.list_matches(user_id).await?)
    }

    /// Re-run match detection for every like `user_id` has authored and
    /// return the matches that were missing.
    pub async fn reconcile_matches(&self, user_id: u64) -> SwipeResult<Vec<Match>> {
        require_user(user_id)?;
        let store = self.store.as_ref();
        let likes = store.list_swipes(user_id, Some(SwipeAction::Like), usize::MAX, 0).await?;
        let now = self.clock.now();

        let mut created = Vec::new();
        for like in likes {
            let target = like.swiped_profile_user_id;
            if let Some(inserted @ MatchInsert::Created(_)) =
                self.detector.detect_and_create_match(store, user_id, target, now).await?
            {
                created.push(self.announce_match(inserted, user_id, target));
            }
        }

        if !created.is_empty() {
            tracing::info!("Reconciled {} missing matches for user {}", created.len(), user_id);
        }
        Ok(created)
    }

    fn announce_match(&self, inserted: MatchInsert, swiper: u64, swiped: u64) -> Match {
        if inserted.is_created() {
            self.notify(ActivityEntry::new(
                swiper,
                "Found Match",
                format!("Found Match between user {} and user {}", swiper, swiped),
            ));
        }
        inserted.into_match()
    }

    /// Fire-and-observe: failures are logged, never returned
    fn notify(&self, entry: ActivityEntry) {
        let sink = Arc::clone(&self.activity);
        tokio::spawn(async move {
            let user_id = entry.user_id;
            let action_type = entry.action_type.clone();
            if let Err(e) = sink.record_activity(entry).await {
                tracing::warn!("Failed to record '{}' activity for user {}: {}", action_type, user_id, e);
            }
        });
    }
}

/// Run `fut`, abandoning it with `DeadlineExceeded` once `deadline` elapses
pub async fn with_deadline<T, F>(deadline: Option<Duration>, fut: F) -> SwipeResult<T>
where
    F: Future<Output = SwipeResult<T>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .unwrap_or(Err(SwipeError::DeadlineExceeded)),
        None => fut.await,
    }
}

fn validate_swipe(swiper: u64, swiped: u64, action: &str) -> SwipeResult<SwipeAction> {
    check_user_id("swiper_user_id", swiper)?;
    check_user_id("swiped_profile_user_id", swiped)?;
    if action.trim().is_empty() {
        return Err(SwipeError::invalid("action", "is required"));
    }
    let action = action
        .parse::<SwipeAction>()
        .map_err(|e| SwipeError::invalid("action", e.to_string()))?;
    if swiper == swiped {
        return Err(SwipeError::invalid("swiped_profile_user_id", "you cannot swipe yourself"));
    }
    Ok(action)
}

fn require_user(user_id: u64) -> SwipeResult<()> {
    check_user_id("user_id", user_id)
}

fn check_user_id(field: &'static str, id: u64) -> SwipeResult<()> {
    match id {
        0 => Err(SwipeError::invalid(field, "is required")),
        id if id > MAX_USER_ID => Err(SwipeError::invalid(field, format!("must be at most {}", MAX_USER_ID))),
        _ => Ok(()),
    }
}

fn clamp_limit(requested: u32, default: usize, max: usize) -> usize {
    match requested as usize {
        0 => default.min(max),
        n => n.min(max),
    }
}
