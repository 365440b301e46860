//! Domain layer: entities, store traits and errors

pub mod credential;
pub mod error;
pub mod search;
pub mod usage;

pub use credential::{
    ClientIdentity, CredentialId, CredentialRecord, CredentialStore, RateCeilings,
    RateLimitDefaults, RateWindow,
};
pub use error::DomainError;
pub use search::{SearchBackend, SearchHit, SearchRequest, SearchResponse};
pub use usage::{UsageLogEntry, UNKNOWN_CREDENTIAL};
