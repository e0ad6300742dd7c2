use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Verdict a user gives another user's profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeAction {
    Like,
    Pass,
}

impl SwipeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeAction::Like => "like",
            SwipeAction::Pass => "pass",
        }
    }
}

impl fmt::Display for SwipeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an action string is neither `like` nor `pass`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown swipe action '{}', expected 'like' or 'pass'", self.0)
    }
}

impl std::error::Error for UnknownAction {}

impl FromStr for SwipeAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "like" => Ok(SwipeAction::Like),
            "pass" => Ok(SwipeAction::Pass),
            _ => Err(UnknownAction(s.to_string())),
        }
    }
}

/// One directed swipe, as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swipe {
    pub id: u64,
    #[serde(rename = "swiperUserId")]
    pub swiper_user_id: u64,
    #[serde(rename = "swipedProfileUserId")]
    pub swiped_profile_user_id: u64,
    pub action: SwipeAction,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// A swipe that has passed validation and is about to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSwipe {
    pub swiper_user_id: u64,
    pub swiped_profile_user_id: u64,
    pub action: SwipeAction,
    pub created_at: DateTime<Utc>,
}

/// Unordered pair of users, always held with the smaller id first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserPair {
    low: u64,
    high: u64,
}

impl UserPair {
    pub fn new(a: u64, b: u64) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn user_one(&self) -> u64 {
        self.low
    }

    pub fn user_two(&self) -> u64 {
        self.high
    }

    pub fn contains(&self, user_id: u64) -> bool {
        self.low == user_id || self.high == user_id
    }
}

/// Mutual like between two users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: u64,
    #[serde(rename = "userOneId")]
    pub user_one_id: u64,
    #[serde(rename = "userTwoId")]
    pub user_two_id: u64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn pair(&self) -> UserPair {
        UserPair::new(self.user_one_id, self.user_two_id)
    }
}

/// Outcome of a match insert: either this call created the row or it was
/// already there (possibly created by a concurrent request)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchInsert {
    Created(Match),
    Existing(Match),
}

impl MatchInsert {
    pub fn into_match(self) -> Match {
        match self {
            MatchInsert::Created(m) | MatchInsert::Existing(m) => m,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, MatchInsert::Created(_))
    }
}

/// Candidate profile as served by the profile provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: u64,
    #[serde(rename = "userId", alias = "user_id")]
    pub user_id: u64,
    #[serde(default)]
    pub age: i32,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Caller identity resolved from a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: u64,
    pub username: Option<String>,
    pub is_premium: bool,
}

/// Result of a successful RecordSwipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwipeOutcome {
    pub status: String,
    pub swipe: Swipe,
    /// Present when this swipe completed a mutual like
    pub matched: Option<Match>,
    /// Set when the swipe committed but match detection failed
    pub warning: Option<String>,
}
