use serde::{Deserialize, Serialize};
use crate::models::domain::{Match, ProfileSummary, Swipe, SwipeOutcome};

/// Response for the record swipe endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSwipeResponse {
    pub status: String,
    pub swipe: Swipe,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none", default)]
    pub matched: Option<Match>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub warning: Option<String>,
}

impl From<SwipeOutcome> for RecordSwipeResponse {
    fn from(outcome: SwipeOutcome) -> Self {
        Self {
            status: outcome.status,
            swipe: outcome.swipe,
            matched: outcome.matched,
            warning: outcome.warning,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub profiles: Vec<ProfileSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeHistoryResponse {
    pub swipes: Vec<Swipe>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesResponse {
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileResponse {
    pub created: Vec<Match>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
