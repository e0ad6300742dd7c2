use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to record a swipe
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordSwipeRequest {
    #[validate(range(min = 1, max = 9223372036854775807u64))]
    #[serde(alias = "swiper_user_id", rename = "swiperUserId", default)]
    pub swiper_user_id: u64,
    #[validate(range(min = 1, max = 9223372036854775807u64))]
    #[serde(alias = "swiped_profile_user_id", rename = "swipedProfileUserId", default)]
    pub swiped_profile_user_id: u64,
    #[validate(length(min = 1))]
    #[serde(default)]
    pub action: String,
}

/// Query for suggested profiles
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SuggestionsQuery {
    #[validate(range(min = 1, max = 9223372036854775807u64))]
    #[serde(alias = "user_id", rename = "userId", default)]
    pub user_id: u64,
    #[serde(default)]
    pub limit: u32,
}

/// Query for a user's swipe history
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SwipeHistoryQuery {
    #[validate(range(min = 1, max = 9223372036854775807u64))]
    #[serde(alias = "user_id", rename = "userId", default)]
    pub user_id: u64,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

/// Query naming a single user (matches listing, reconciliation)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserQuery {
    #[validate(range(min = 1, max = 9223372036854775807u64))]
    #[serde(alias = "user_id", rename = "userId", default)]
    pub user_id: u64,
}
