// Core swipe-and-match exports
pub mod detector;
pub mod engine;
pub mod error;
pub mod filters;
pub mod ports;
pub mod rate_limit;
pub mod store;

pub use detector::MatchDetector;
pub use engine::{with_deadline, EngineConfig, SwipeEngine, MAX_USER_ID};
pub use error::{SwipeError, SwipeResult};
pub use filters::filter_suggestions;
pub use ports::{ActivityEntry, ActivityError, ActivitySink, AuthError, Clock, IdentityProvider, ManualClock, ProfileProvider, ProviderError, SystemClock};
pub use rate_limit::{RateLimiter, MAX_SWIPES_PER_WINDOW, SWIPE_WINDOW_HOURS};
pub use store::{StoreError, SwipeStore};
