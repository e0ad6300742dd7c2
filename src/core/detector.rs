use chrono::{DateTime, Utc};

use crate::core::error::SwipeResult;
use crate::core::store::SwipeStore;
use crate::models::{MatchInsert, SwipeAction, UserPair};

/// Turns a mutual like into a match record
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchDetector;

impl MatchDetector {
    pub fn new() -> Self {
        Self
    }

    /// Check whether `user_b` already likes `user_a` and, if so, make sure the
    /// match for the pair exists.
    ///
    /// Returns `None` when there is no reverse like yet. Running this twice
    /// for the same pair, even concurrently, leaves exactly one match row:
    /// the store's pair constraint decides the winner and the loser gets the
    /// existing row back.
    pub async fn detect_and_create_match(
        &self,
        store: &dyn SwipeStore,
        user_a: u64,
        user_b: u64,
        now: DateTime<Utc>,
    ) -> SwipeResult<Option<MatchInsert>> {
        let reverse = store.find_swipe(user_b, user_a).await?;
        match reverse {
            Some(swipe) if swipe.action == SwipeAction::Like => {
                let pair = UserPair::new(user_a, user_b);
                let inserted = store.insert_match(pair, now).await?;
                if inserted.is_created() {
                    tracing::info!("Match found between user {} and user {}", user_a, user_b);
                } else {
                    tracing::debug!("Match between user {} and user {} already recorded", user_a, user_b);
                }
                Ok(Some(inserted))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewSwipe;
    use crate::services::InMemorySwipeStore;
    use std::sync::Arc;

    async fn swipe(store: &InMemorySwipeStore, from: u64, to: u64, action: SwipeAction) {
        store
            .insert_swipe(NewSwipe {
                swiper_user_id: from,
                swiped_profile_user_id: to,
                action,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_no_reverse_swipe_is_no_match() {
        let store = InMemorySwipeStore::new();
        swipe(&store, 1, 2, SwipeAction::Like).await;

        let result = MatchDetector::new()
            .detect_and_create_match(&store, 1, 2, Utc::now())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_reverse_pass_is_no_match() {
        let store = InMemorySwipeStore::new();
        swipe(&store, 2, 1, SwipeAction::Pass).await;
        swipe(&store, 1, 2, SwipeAction::Like).await;

        let result = MatchDetector::new()
            .detect_and_create_match(&store, 1, 2, Utc::now())
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(store.find_match(UserPair::new(1, 2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mutual_like_creates_canonical_match_once() {
        let store = InMemorySwipeStore::new();
        swipe(&store, 9, 4, SwipeAction::Like).await;
        swipe(&store, 4, 9, SwipeAction::Like).await;

        let detector = MatchDetector::new();
        let first = detector.detect_and_create_match(&store, 4, 9, Utc::now()).await.unwrap().unwrap();
        assert!(first.is_created());

        let second = detector.detect_and_create_match(&store, 4, 9, Utc::now()).await.unwrap().unwrap();
        assert!(!second.is_created());

        let stored = second.into_match();
        assert_eq!(stored.user_one_id, 4);
        assert_eq!(stored.user_two_id, 9);
        assert_eq!(store.list_matches(4).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_detection_yields_one_match() {
        let store = Arc::new(InMemorySwipeStore::new());
        swipe(&store, 1, 2, SwipeAction::Like).await;
        swipe(&store, 2, 1, SwipeAction::Like).await;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let (a, b) = if i % 2 == 0 { (1, 2) } else { (2, 1) };
                    MatchDetector::new()
                        .detect_and_create_match(store.as_ref(), a, b, Utc::now())
                        .await
                        .unwrap()
                        .unwrap()
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_created() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.list_matches(1).await.unwrap().len(), 1);
    }
}
