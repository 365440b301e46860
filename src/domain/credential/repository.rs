//! Credential store trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

use super::entity::{CredentialId, CredentialRecord, RateWindow};
use crate::domain::usage::UsageLogEntry;
use crate::domain::DomainError;

/// The persistent credential store.
///
/// The gateway reaches persistence only through these operations; record
/// creation, revocation and retention sweeps belong to the external
/// issuance tooling.
#[async_trait]
pub trait CredentialStore: Send + Sync + Debug {
    /// Look up an active credential by its key hash. Inactive records are
    /// filtered out at the store, not by the caller.
    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<CredentialRecord>, DomainError>;

    /// Atomically count this request against the window and report whether
    /// the ceiling still holds. Must be linearizable per credential: with
    /// one unit of quota left, two concurrent calls may not both return
    /// `true`.
    async fn check_and_increment(
        &self,
        id: &CredentialId,
        window: RateWindow,
        ceiling: u32,
    ) -> Result<bool, DomainError>;

    /// Append one usage log row
    async fn insert_usage_log(&self, entry: UsageLogEntry) -> Result<(), DomainError>;

    /// Read the persisted cumulative request counter
    async fn fetch_total_requests(&self, id: &CredentialId) -> Result<u64, DomainError>;

    /// Write back the batched last-used/total-requests update
    async fn update_record(
        &self,
        id: &CredentialId,
        last_used_at: DateTime<Utc>,
        total_requests: u64,
    ) -> Result<(), DomainError>;
}
