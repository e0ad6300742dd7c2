//! Date Service - swipe and match engine for the dating platform
//!
//! Records swipes under a rolling per-user rate limit, rejects duplicate
//! swipes, turns mutual likes into matches, and serves suggestion filtering
//! and swipe history over HTTP.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{MatchDetector, RateLimiter, SwipeEngine, SwipeError, SwipeStore, filter_suggestions};
pub use models::{Match, ProfileSummary, Swipe, SwipeAction, SwipeOutcome};
