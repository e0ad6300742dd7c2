use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::core::ports::{ProfileProvider, ProviderError};
use crate::models::ProfileSummary;
use crate::services::cache::{CacheKey, CacheManager};

#[derive(Debug, Deserialize)]
struct SuggestionsBody {
    #[serde(default)]
    profiles: Vec<ProfileSummary>,
}

/// HTTP client for the profile service's suggestion endpoint
pub struct HttpProfileProvider {
    base_url: String,
    client: Client,
}

impl HttpProfileProvider {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }
}

#[async_trait]
impl ProfileProvider for HttpProfileProvider {
    async fn candidate_profiles(&self, user_id: u64, limit: usize) -> Result<Vec<ProfileSummary>, ProviderError> {
        let url = format!("{}/profiles/suggestions", self.base_url.trim_end_matches('/'));

        tracing::debug!("Fetching up to {} candidates for user {} from {}", limit, user_id, url);

        let response = self
            .client
            .get(&url)
            .query(&[("userId", user_id.to_string()), ("limit", limit.to_string())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(format!("profile for user {}", user_id)));
        }
        if !status.is_success() {
            return Err(ProviderError::ApiError(format!("Failed to fetch suggestions: {}", status)));
        }

        let body: SuggestionsBody = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        tracing::debug!("Profile service returned {} candidates for {}", body.profiles.len(), user_id);
        Ok(body.profiles)
    }
}

/// Candidate fetches through the cache are rounded up to a multiple of this
pub const CANDIDATE_FETCH_STEP: usize = 50;

#[derive(Debug, Serialize, Deserialize)]
struct CachedCandidates {
    /// Fetch size the provider was asked for
    requested: usize,
    profiles: Vec<ProfileSummary>,
}

/// Profile provider that remembers candidate lists for the cache TTL.
///
/// Entries are keyed by user only and fetched in steps of
/// `CANDIDATE_FETCH_STEP`, so the slowly growing fetch size that follows each
/// swipe is still served from the same entry. Only the provider's answer is
/// cached; the caller filters out swiped profiles against fresh store data.
pub struct CachedProfileProvider {
    inner: Arc<dyn ProfileProvider>,
    cache: Arc<CacheManager>,
}

impl CachedProfileProvider {
    pub fn new(inner: Arc<dyn ProfileProvider>, cache: Arc<CacheManager>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl ProfileProvider for CachedProfileProvider {
    async fn candidate_profiles(&self, user_id: u64, limit: usize) -> Result<Vec<ProfileSummary>, ProviderError> {
        let key = CacheKey::candidates(user_id);

        match self.cache.get::<CachedCandidates>(&key).await {
            Ok(Some(entry)) if entry.requested >= limit => {
                return Ok(entry.profiles.into_iter().take(limit).collect());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Candidate cache read failed for {}: {}", key, e),
        }

        let requested = limit.div_ceil(CANDIDATE_FETCH_STEP).max(1) * CANDIDATE_FETCH_STEP;
        let profiles = self.inner.candidate_profiles(user_id, requested).await?;

        let entry = CachedCandidates { requested, profiles };
        if let Err(e) = self.cache.set(&key, &entry).await {
            tracing::warn!("Candidate cache write failed for {}: {}", key, e);
        }

        Ok(entry.profiles.into_iter().take(limit).collect())
    }
}
