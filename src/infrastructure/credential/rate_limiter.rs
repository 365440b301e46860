//! Tiered rate limiting against the credential store's atomic counters

use std::sync::Arc;

use tracing::warn;

use crate::domain::{CredentialRecord, CredentialStore, RateLimitDefaults, RateWindow};

/// Outcome of a rate limit check. Computed fresh per request; never cached.
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Which window was exceeded (if any)
    pub exceeded_window: Option<RateWindow>,
    /// Fixed retry hint in seconds
    pub retry_after_secs: Option<u64>,
}

impl RateLimitDecision {
    fn allowed() -> Self {
        Self {
            allowed: true,
            exceeded_window: None,
            retry_after_secs: None,
        }
    }

    fn exceeded(window: RateWindow) -> Self {
        Self {
            allowed: false,
            exceeded_window: Some(window),
            retry_after_secs: Some(window.retry_after_secs()),
        }
    }
}

/// Rate limiter evaluating a resolved credential against its three ceilings.
///
/// Windows are checked tightest first (minute, hour, day) and the first
/// violation short-circuits, so clients are always told the most actionable
/// window. Each evaluated window is one atomic increment-and-compare in the
/// store; there is no read-then-write race between concurrent requests.
///
/// On a store error the limiter fails open and lets the request through:
/// availability of the search service is prioritized over strict quota
/// enforcement during a store outage.
#[derive(Debug)]
pub struct RateLimiter {
    store: Arc<dyn CredentialStore>,
    defaults: RateLimitDefaults,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CredentialStore>, defaults: RateLimitDefaults) -> Self {
        Self { store, defaults }
    }

    /// Check all windows for one request. A resolved ceiling of zero means
    /// unbounded and skips that window entirely.
    pub async fn check(&self, record: &CredentialRecord) -> RateLimitDecision {
        for window in RateWindow::ALL {
            let ceiling = record.rate_ceilings().limit_for(window, &self.defaults);

            if ceiling == 0 {
                continue;
            }

            match self
                .store
                .check_and_increment(record.id(), window, ceiling)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    warn!(
                        credential_id = %record.id(),
                        client = %record.client_name(),
                        window = %window,
                        "Rate limit exceeded"
                    );
                    return RateLimitDecision::exceeded(window);
                }
                Err(e) => {
                    warn!(
                        credential_id = %record.id(),
                        window = %window,
                        "Rate limit check failed, failing open: {}",
                        e
                    );
                    return RateLimitDecision::allowed();
                }
            }
        }

        RateLimitDecision::allowed()
    }
}
