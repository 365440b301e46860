//! Credential gateway infrastructure: validation modes, cache, rate
//! limiting and usage accounting

pub mod cache;
pub mod in_memory;
pub mod postgres;
pub mod rate_limiter;
pub mod recorder;
pub mod service;
pub mod static_auth;
pub mod token;

pub use cache::CredentialCache;
pub use in_memory::InMemoryCredentialStore;
pub use postgres::PostgresCredentialStore;
pub use rate_limiter::{RateLimitDecision, RateLimiter};
pub use recorder::UsageRecorder;
pub use service::{AuthMode, DatabaseAuthConfig, DatabaseAuthenticator};
pub use static_auth::StaticAuthenticator;
