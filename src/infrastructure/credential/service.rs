//! Database-backed credential validation
//!
//! Bundles the cache, rate limiter and usage recorder behind one validation
//! service, plus the startup-selected authentication mode the gateway
//! dispatches on.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::domain::{CredentialRecord, CredentialStore, RateLimitDefaults};

use super::cache::CredentialCache;
use super::rate_limiter::{RateLimitDecision, RateLimiter};
use super::recorder::UsageRecorder;
use super::static_auth::StaticAuthenticator;
use super::token;

/// Tunables for the database validation mode
#[derive(Debug, Clone)]
pub struct DatabaseAuthConfig {
    pub cache_validity_secs: u64,
    pub cache_capacity: usize,
    pub batch_update_threshold: u32,
    pub default_rate_limits: RateLimitDefaults,
}

impl Default for DatabaseAuthConfig {
    fn default() -> Self {
        Self {
            cache_validity_secs: 300,
            cache_capacity: 100,
            batch_update_threshold: 10,
            default_rate_limits: RateLimitDefaults::default(),
        }
    }
}

/// Credential validation with bounded-staleness caching, store-backed rate
/// limiting and batched usage accounting
#[derive(Debug)]
pub struct DatabaseAuthenticator {
    store: Arc<dyn CredentialStore>,
    cache: CredentialCache,
    rate_limiter: RateLimiter,
    recorder: UsageRecorder,
}

impl DatabaseAuthenticator {
    pub fn new(store: Arc<dyn CredentialStore>, config: DatabaseAuthConfig) -> Self {
        let cache = CredentialCache::new(config.cache_validity_secs, config.cache_capacity);
        let rate_limiter = RateLimiter::new(store.clone(), config.default_rate_limits);
        let recorder = UsageRecorder::new(store.clone(), config.batch_update_threshold);

        Self {
            store,
            cache,
            rate_limiter,
            recorder,
        }
    }

    /// Validate a plaintext token. Returns the resolved record when the
    /// credential exists, is active and has not expired.
    ///
    /// Lookups go through the epoch-bucketed cache; a store error during the
    /// fill denies the request (ambiguous authorization state) and is not
    /// cached, so the next request retries the store.
    pub async fn validate(&self, token: &str) -> Option<CredentialRecord> {
        let key_hash = token::hash_token(token);

        let lookup = match self.cache.get(&key_hash).await {
            Some(cached) => cached,
            None => match self.store.find_by_hash(&key_hash).await {
                Ok(found) => {
                    self.cache.insert(&key_hash, found.clone()).await;
                    found
                }
                Err(e) => {
                    error!("Credential lookup failed, denying request: {}", e);
                    return None;
                }
            },
        };

        let record = match lookup {
            Some(record) => record,
            None => {
                debug!("API key not found or inactive");
                return None;
            }
        };

        // Expiry is re-checked on every read: an expired record stays cached
        // until its bucket rolls over but must never validate again.
        if record.is_expired() {
            warn!(client = %record.client_name(), "API key expired");
            return None;
        }

        if !record.is_active() {
            return None;
        }

        debug!(client = %record.client_name(), "API key validated");
        Some(record)
    }

    /// Check the three rate windows for an already-resolved credential
    pub async fn check_rate_limit(&self, record: &CredentialRecord) -> RateLimitDecision {
        self.rate_limiter.check(record).await
    }

    pub fn recorder(&self) -> &UsageRecorder {
        &self.recorder
    }

    /// Drop the whole credential cache. Called after any external credential
    /// mutation so a stale accept decision cannot outlive the mutation.
    pub async fn invalidate_cache(&self) {
        self.cache.invalidate_all().await;
        tracing::info!("Credential cache cleared");
    }
}

/// Authentication mode, selected once at startup
#[derive(Debug)]
pub enum AuthMode {
    /// No authentication; every request passes with an anonymous identity
    Disabled,
    /// Fixed in-memory credential list, no quotas, no persistence
    Static(StaticAuthenticator),
    /// Credential store with caching, quotas and usage accounting
    Database(Arc<DatabaseAuthenticator>),
}

impl AuthMode {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Static(_) => "static",
            Self::Database(_) => "database",
        }
    }
}
