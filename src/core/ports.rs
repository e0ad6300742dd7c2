//! Collaborators the engine and HTTP layer consume but do not own.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;
use thiserror::Error;

use crate::core::error::SwipeError;
use crate::models::{ProfileSummary, UserIdentity};

/// Errors returned by a profile provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl From<ProviderError> for SwipeError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(what) => SwipeError::NotFound(what),
            other => SwipeError::Internal(other.to_string()),
        }
    }
}

/// Source of candidate profiles for suggestions
#[async_trait]
pub trait ProfileProvider: Send + Sync {
    /// Candidate profiles for `user_id`, in the provider's preferred order
    async fn candidate_profiles(&self, user_id: u64, limit: usize) -> Result<Vec<ProfileSummary>, ProviderError>;
}

/// Errors raised while resolving a caller identity
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("invalid subject: {0}")]
    InvalidSubject(String),
}

impl From<AuthError> for SwipeError {
    fn from(err: AuthError) -> Self {
        SwipeError::Unauthenticated(err.to_string())
    }
}

/// Resolves bearer tokens to user identities
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn validate_token(&self, token: &str) -> Result<UserIdentity, AuthError>;
}

/// Errors raised by an activity sink
#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Logs service rejected entry: {0}")]
    Rejected(String),
}

/// Activity log entry emitted after a state change
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ActivityEntry {
    #[serde(rename = "userId")]
    pub user_id: u64,
    #[serde(rename = "actionType")]
    pub action_type: String,
    pub details: String,
}

impl ActivityEntry {
    pub fn new(user_id: u64, action_type: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            user_id,
            action_type: action_type.into(),
            details: details.into(),
        }
    }
}

/// Best-effort sink for activity entries
#[async_trait]
pub trait ActivitySink: Send + Sync {
    async fn record_activity(&self, entry: ActivityEntry) -> Result<(), ActivityError>;
}

/// Time source for swipe timestamps and the rate window
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
