// Service exports
pub mod activity;
pub mod cache;
pub mod identity;
pub mod memory;
pub mod postgres;
pub mod profiles;

pub use activity::{HttpActivityLog, TracingActivityLog};
pub use cache::{CacheError, CacheKey, CacheManager};
pub use identity::{JwtIdentityProvider, TokenClaims};
pub use memory::InMemorySwipeStore;
pub use postgres::PostgresSwipeStore;
pub use profiles::{CachedProfileProvider, HttpProfileProvider};
