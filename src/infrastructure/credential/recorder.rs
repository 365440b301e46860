//! Asynchronous usage accounting
//!
//! Usage log rows are written fire-and-forget; last-used/total-requests
//! updates are batched per credential to bound write amplification. Neither
//! path ever surfaces a failure to the request being served.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::domain::{CredentialId, CredentialStore, UsageLogEntry};

/// Best-effort usage writer shared across all concurrent requests
#[derive(Debug)]
pub struct UsageRecorder {
    store: Arc<dyn CredentialStore>,
    batch_threshold: u32,
    /// Pending per-credential increments, not persisted. A restart loses at
    /// most threshold-1 increments per credential; the counters are advisory
    /// telemetry, not billing-authoritative.
    pending: Mutex<HashMap<String, u32>>,
}

impl UsageRecorder {
    pub fn new(store: Arc<dyn CredentialStore>, batch_threshold: u32) -> Self {
        Self {
            store,
            batch_threshold: batch_threshold.max(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Append one usage log row without blocking the caller. Failures are
    /// logged locally and never propagated.
    pub fn record(&self, entry: UsageLogEntry) {
        let store = self.store.clone();

        tokio::spawn(async move {
            if let Err(e) = store.insert_usage_log(entry).await {
                error!("Failed to write usage log entry: {}", e);
            }
        });
    }

    /// Count one accepted request toward the credential's batched
    /// last-used/total-requests update. Flushes once the pending counter
    /// reaches the batch threshold, then resets it.
    pub async fn touch(&self, id: &CredentialId) {
        let flush_count = {
            let mut pending = self.pending.lock().await;
            let count = pending.entry(id.as_str().to_string()).or_insert(0);
            *count += 1;

            if *count >= self.batch_threshold {
                let accumulated = *count;
                *count = 0;
                Some(accumulated)
            } else {
                None
            }
        };

        if let Some(accumulated) = flush_count {
            self.flush(id, accumulated).await;
        }
    }

    /// Pending increments for a credential (not yet flushed)
    pub async fn pending_count(&self, id: &CredentialId) -> u32 {
        let pending = self.pending.lock().await;
        pending.get(id.as_str()).copied().unwrap_or(0)
    }

    async fn flush(&self, id: &CredentialId, accumulated: u32) {
        let total = match self.store.fetch_total_requests(id).await {
            Ok(total) => total,
            Err(e) => {
                warn!(credential_id = %id, "Skipping usage flush, total fetch failed: {}", e);
                return;
            }
        };

        let new_total = total + u64::from(accumulated);

        match self.store.update_record(id, Utc::now(), new_total).await {
            Ok(()) => debug!(credential_id = %id, total_requests = new_total, "Flushed usage update"),
            Err(e) => warn!(credential_id = %id, "Failed to flush usage update: {}", e),
        }
    }
}
