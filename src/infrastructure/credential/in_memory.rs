//! In-memory credential store
//!
//! Backs tests and single-process deployments that want database-mode
//! semantics without a database. Window counters use tumbling buckets keyed
//! by (credential, window, bucket) and are updated under one mutex, which
//! makes the increment-and-compare linearizable per credential.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::domain::{
    CredentialId, CredentialRecord, CredentialStore, DomainError, RateWindow, UsageLogEntry,
};

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    /// Records keyed by key hash
    records: RwLock<HashMap<String, CredentialRecord>>,
    /// (credential id, window, bucket) -> count
    counters: Mutex<HashMap<(String, RateWindow, u64), u32>>,
    usage_log: RwLock<Vec<UsageLogEntry>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a credential, as the external issuance tooling would
    pub async fn insert_credential(&self, record: CredentialRecord) {
        let mut records = self.records.write().await;
        records.insert(record.key_hash().to_string(), record);
    }

    pub async fn usage_entries(&self) -> Vec<UsageLogEntry> {
        self.usage_log.read().await.clone()
    }

    fn bucket(window: RateWindow, now_unix: u64) -> u64 {
        now_unix / window.duration_secs()
    }

    fn unix_now() -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<CredentialRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records.get(key_hash).filter(|r| r.is_active()).cloned())
    }

    async fn check_and_increment(
        &self,
        id: &CredentialId,
        window: RateWindow,
        ceiling: u32,
    ) -> Result<bool, DomainError> {
        let now = Self::unix_now();
        let bucket = Self::bucket(window, now);

        let mut counters = self.counters.lock().await;

        // stale buckets are dropped opportunistically
        counters.retain(|(_, w, b), _| *b == Self::bucket(*w, now));

        let count = counters
            .entry((id.as_str().to_string(), window, bucket))
            .or_insert(0);
        *count += 1;

        Ok(*count <= ceiling)
    }

    async fn insert_usage_log(&self, entry: UsageLogEntry) -> Result<(), DomainError> {
        self.usage_log.write().await.push(entry);
        Ok(())
    }

    async fn fetch_total_requests(&self, id: &CredentialId) -> Result<u64, DomainError> {
        let records = self.records.read().await;
        records
            .values()
            .find(|r| r.id() == id)
            .map(|r| r.total_requests())
            .ok_or_else(|| DomainError::not_found(format!("Credential '{}' not found", id)))
    }

    async fn update_record(
        &self,
        id: &CredentialId,
        last_used_at: DateTime<Utc>,
        total_requests: u64,
    ) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        let record = records
            .values_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| DomainError::not_found(format!("Credential '{}' not found", id)))?;

        record.apply_usage_update(last_used_at, total_requests);
        Ok(())
    }
}
