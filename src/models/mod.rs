// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Match, MatchInsert, NewSwipe, ProfileSummary, Swipe, SwipeAction, SwipeOutcome, UnknownAction, UserIdentity, UserPair};
pub use requests::{RecordSwipeRequest, SuggestionsQuery, SwipeHistoryQuery, UserQuery};
pub use responses::{ErrorResponse, HealthResponse, MatchesResponse, ReconcileResponse, RecordSwipeResponse, SuggestionsResponse, SwipeHistoryResponse};
