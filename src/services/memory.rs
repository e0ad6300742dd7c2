use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;

use crate::core::store::{StoreError, SwipeStore};
use crate::models::{Match, MatchInsert, NewSwipe, Swipe, SwipeAction, UserPair};

#[derive(Default)]
struct Tables {
    next_swipe_id: u64,
    next_match_id: u64,
    /// Keyed by id, so iteration is creation order
    swipes: BTreeMap<u64, Swipe>,
    /// Unique (swiper, swiped) index
    swipe_pairs: HashMap<(u64, u64), u64>,
    matches: BTreeMap<u64, Match>,
    /// Unique canonical pair index
    match_pairs: HashMap<UserPair, u64>,
}

impl Tables {
    fn count_since(&self, swiper: u64, since: DateTime<Utc>) -> u64 {
        self.swipes
            .values()
            .filter(|s| s.swiper_user_id == swiper && s.created_at > since)
            .count() as u64
    }

    fn ensure_new_pair(&self, swipe: &NewSwipe) -> Result<(), StoreError> {
        let key = (swipe.swiper_user_id, swipe.swiped_profile_user_id);
        if self.swipe_pairs.contains_key(&key) {
            return Err(StoreError::Conflict(format!("swipe {} -> {} already exists", key.0, key.1)));
        }
        Ok(())
    }

    fn insert_swipe(&mut self, swipe: NewSwipe) -> Result<Swipe, StoreError> {
        self.ensure_new_pair(&swipe)?;

        self.next_swipe_id += 1;
        let stored = Swipe {
            id: self.next_swipe_id,
            swiper_user_id: swipe.swiper_user_id,
            swiped_profile_user_id: swipe.swiped_profile_user_id,
            action: swipe.action,
            created_at: swipe.created_at,
        };
        self.swipe_pairs
            .insert((stored.swiper_user_id, stored.swiped_profile_user_id), stored.id);
        self.swipes.insert(stored.id, stored.clone());

        Ok(stored)
    }
}

fn check_distinct(swipe: &NewSwipe) -> Result<(), StoreError> {
    if swipe.swiper_user_id == swipe.swiped_profile_user_id {
        return Err(StoreError::InvalidInput("swiper and swiped user must differ".to_string()));
    }
    Ok(())
}

/// Process-local swipe store.
///
/// Every write takes the table lock for the whole check-and-insert, so the
/// unique indexes hold under concurrent use the same way database constraints
/// do. Used by tests, benches and the `memory` storage backend.
#[derive(Default)]
pub struct InMemorySwipeStore {
    tables: RwLock<Tables>,
}

impl InMemorySwipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn swipe_count(&self) -> usize {
        self.tables.read().await.swipes.len()
    }

    pub async fn match_count(&self) -> usize {
        self.tables.read().await.matches.len()
    }
}

#[async_trait]
impl SwipeStore for InMemorySwipeStore {
    async fn find_swipe(&self, swiper: u64, swiped: u64) -> Result<Option<Swipe>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .swipe_pairs
            .get(&(swiper, swiped))
            .and_then(|id| tables.swipes.get(id))
            .cloned())
    }

    async fn count_swipes_since(&self, swiper: u64, since: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(self.tables.read().await.count_since(swiper, since))
    }

    async fn insert_swipe(&self, swipe: NewSwipe) -> Result<Swipe, StoreError> {
        check_distinct(&swipe)?;
        self.tables.write().await.insert_swipe(swipe)
    }

    async fn insert_swipe_within_limit(
        &self,
        swipe: NewSwipe,
        since: DateTime<Utc>,
        max_swipes: u64,
    ) -> Result<Swipe, StoreError> {
        check_distinct(&swipe)?;

        let mut tables = self.tables.write().await;
        tables.ensure_new_pair(&swipe)?;
        let recent = tables.count_since(swipe.swiper_user_id, since);
        if recent >= max_swipes {
            return Err(StoreError::LimitExceeded(format!(
                "user {} has {} swipes since {}",
                swipe.swiper_user_id, recent, since
            )));
        }
        tables.insert_swipe(swipe)
    }

    async fn swiped_user_ids(&self, swiper: u64) -> Result<HashSet<u64>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .swipe_pairs
            .keys()
            .filter(|(from, _)| *from == swiper)
            .map(|(_, to)| *to)
            .collect())
    }

    async fn list_swipes(
        &self,
        swiper: u64,
        action: Option<SwipeAction>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Swipe>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .swipes
            .values()
            .filter(|s| s.swiper_user_id == swiper)
            .filter(|s| action.map_or(true, |a| s.action == a))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert_match(&self, pair: UserPair, created_at: DateTime<Utc>) -> Result<MatchInsert, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.match_pairs.get(&pair).and_then(|id| tables.matches.get(id)) {
            return Ok(MatchInsert::Existing(existing.clone()));
        }

        tables.next_match_id += 1;
        let stored = Match {
            id: tables.next_match_id,
            user_one_id: pair.user_one(),
            user_two_id: pair.user_two(),
            created_at,
        };
        tables.match_pairs.insert(pair, stored.id);
        tables.matches.insert(stored.id, stored.clone());

        Ok(MatchInsert::Created(stored))
    }

    async fn find_match(&self, pair: UserPair) -> Result<Option<Match>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .match_pairs
            .get(&pair)
            .and_then(|id| tables.matches.get(id))
            .cloned())
    }

    async fn list_matches(&self, user_id: u64) -> Result<Vec<Match>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .matches
            .values()
            .filter(|m| m.pair().contains(user_id))
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}
