//! Credential domain model

pub mod entity;
pub mod repository;

pub use entity::{
    ClientIdentity, CredentialId, CredentialRecord, RateCeilings, RateLimitDefaults, RateWindow,
};
pub use repository::CredentialStore;
