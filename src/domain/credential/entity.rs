//! Credential record and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credential identifier - an opaque, stable handle minted by the issuance tooling
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialId(String);

impl CredentialId {
    /// Create an ID from an existing handle
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new unique ID
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CredentialId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CredentialId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Time window a rate ceiling applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateWindow {
    Minute,
    Hour,
    Day,
}

impl RateWindow {
    /// All windows in checking order (tightest first)
    pub const ALL: [RateWindow; 3] = [Self::Minute, Self::Hour, Self::Day];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }

    /// Window length in seconds
    pub fn duration_secs(&self) -> u64 {
        match self {
            Self::Minute => 60,
            Self::Hour => 3600,
            Self::Day => 86400,
        }
    }

    /// Fixed retry hint returned to clients; full window length rather than
    /// the actual remaining time
    pub fn retry_after_secs(&self) -> u64 {
        self.duration_secs()
    }
}

impl std::fmt::Display for RateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tier-default ceilings, applied when a record does not carry its own
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitDefaults {
    pub per_minute: u32,
    pub per_hour: u32,
    pub per_day: u32,
}

impl Default for RateLimitDefaults {
    fn default() -> Self {
        Self {
            per_minute: 60,
            per_hour: 1000,
            per_day: 10000,
        }
    }
}

impl RateLimitDefaults {
    pub fn limit_for(&self, window: RateWindow) -> u32 {
        match window {
            RateWindow::Minute => self.per_minute,
            RateWindow::Hour => self.per_hour,
            RateWindow::Day => self.per_day,
        }
    }
}

/// Per-credential ceilings. `None` means "use the tier default"; a resolved
/// value of zero means unbounded (the window check is skipped).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RateCeilings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_minute: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_hour: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_day: Option<u32>,
}

impl RateCeilings {
    pub fn new(per_minute: u32, per_hour: u32, per_day: u32) -> Self {
        Self {
            per_minute: Some(per_minute),
            per_hour: Some(per_hour),
            per_day: Some(per_day),
        }
    }

    /// Ceilings that disable every window check
    pub fn unbounded() -> Self {
        Self::new(0, 0, 0)
    }

    /// Resolve the effective ceiling for a window
    pub fn limit_for(&self, window: RateWindow, defaults: &RateLimitDefaults) -> u32 {
        let own = match window {
            RateWindow::Minute => self.per_minute,
            RateWindow::Hour => self.per_hour,
            RateWindow::Day => self.per_day,
        };
        own.unwrap_or_else(|| defaults.limit_for(window))
    }
}

/// One issued credential, as persisted in the credential store.
///
/// Created and revoked by the external issuance tooling; the gateway only
/// reads records and pushes back batched `last_used_at`/`total_requests`
/// updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Stable identifier
    id: CredentialId,
    /// Owner label shown in listings and logs
    client_name: String,
    /// Hex SHA-256 digest of the plaintext token. The plaintext is never
    /// persisted or logged.
    key_hash: String,
    /// Short non-secret fragment for human listings
    key_prefix: String,
    /// Revoked credentials have this cleared and never validate again
    is_active: bool,
    /// Expiration timestamp (None = never expires)
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    /// Per-window ceilings
    #[serde(default)]
    rate_ceilings: RateCeilings,
    /// Cumulative request counter (batched updates, advisory)
    total_requests: u64,
    /// Last time the credential was used (batched updates, advisory)
    #[serde(skip_serializing_if = "Option::is_none")]
    last_used_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    created_at: DateTime<Utc>,
}

impl CredentialRecord {
    pub fn new(
        id: CredentialId,
        client_name: impl Into<String>,
        key_hash: impl Into<String>,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            id,
            client_name: client_name.into(),
            key_hash: key_hash.into(),
            key_prefix: key_prefix.into(),
            is_active: true,
            expires_at: None,
            rate_ceilings: RateCeilings::default(),
            total_requests: 0,
            last_used_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_expiration(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_rate_ceilings(mut self, ceilings: RateCeilings) -> Self {
        self.rate_ceilings = ceilings;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    pub fn with_total_requests(mut self, total_requests: u64) -> Self {
        self.total_requests = total_requests;
        self
    }

    pub fn with_last_used_at(mut self, last_used_at: Option<DateTime<Utc>>) -> Self {
        self.last_used_at = last_used_at;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    // Getters

    pub fn id(&self) -> &CredentialId {
        &self.id
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn key_hash(&self) -> &str {
        &self.key_hash
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn rate_ceilings(&self) -> &RateCeilings {
        &self.rate_ceilings
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Check if the credential has expired. Expiry is terminal: once in the
    /// past, there is no un-expiry.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false,
        }
    }

    /// Check if the credential is currently usable
    pub fn is_valid(&self) -> bool {
        self.is_active && !self.is_expired()
    }

    /// Apply a batched usage update (what `update_record` writes back)
    pub fn apply_usage_update(&mut self, last_used_at: DateTime<Utc>, total_requests: u64) {
        self.last_used_at = Some(last_used_at);
        self.total_requests = total_requests;
    }
}

/// Resolved owner identity attached to accepted requests for attribution
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub credential_id: Option<CredentialId>,
    pub client_name: String,
}

impl ClientIdentity {
    pub fn new(credential_id: CredentialId, client_name: impl Into<String>) -> Self {
        Self {
            credential_id: Some(credential_id),
            client_name: client_name.into(),
        }
    }

    /// Identity without a backing store record (static mode)
    pub fn named(client_name: impl Into<String>) -> Self {
        Self {
            credential_id: None,
            client_name: client_name.into(),
        }
    }

    /// Identity used when authentication is disabled
    pub fn anonymous() -> Self {
        Self {
            credential_id: None,
            client_name: "Unknown".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_record(id: &str, name: &str) -> CredentialRecord {
        CredentialRecord::new(CredentialId::new(id), name, "hash", "dsg_test")
    }

    #[test]
    fn test_credential_record_creation() {
        let record = create_test_record("cred-1", "Client A");

        assert_eq!(record.id().as_str(), "cred-1");
        assert_eq!(record.client_name(), "Client A");
        assert!(record.is_active());
        assert!(record.is_valid());
        assert!(!record.is_expired());
        assert_eq!(record.total_requests(), 0);
        assert!(record.last_used_at().is_none());
    }

    #[test]
    fn test_inactive_record_never_valid() {
        let record = create_test_record("cred-1", "Client A").with_active(false);
        assert!(!record.is_valid());
        assert!(!record.is_expired());
    }

    #[test]
    fn test_expired_record_not_valid() {
        let past = Utc::now() - chrono::Duration::hours(1);
        let record = create_test_record("cred-1", "Client A").with_expiration(past);

        assert!(record.is_expired());
        assert!(!record.is_valid());
    }

    #[test]
    fn test_future_expiration_still_valid() {
        let future = Utc::now() + chrono::Duration::hours(1);
        let record = create_test_record("cred-1", "Client A").with_expiration(future);

        assert!(!record.is_expired());
        assert!(record.is_valid());
    }

    #[test]
    fn test_rate_ceilings_resolution() {
        let defaults = RateLimitDefaults::default();

        let own = RateCeilings::new(5, 50, 500);
        assert_eq!(own.limit_for(RateWindow::Minute, &defaults), 5);
        assert_eq!(own.limit_for(RateWindow::Hour, &defaults), 50);
        assert_eq!(own.limit_for(RateWindow::Day, &defaults), 500);

        let inherited = RateCeilings::default();
        assert_eq!(inherited.limit_for(RateWindow::Minute, &defaults), 60);
        assert_eq!(inherited.limit_for(RateWindow::Hour, &defaults), 1000);
        assert_eq!(inherited.limit_for(RateWindow::Day, &defaults), 10000);

        let unbounded = RateCeilings::unbounded();
        assert_eq!(unbounded.limit_for(RateWindow::Minute, &defaults), 0);
    }

    #[test]
    fn test_rate_window_ordering_and_durations() {
        assert_eq!(RateWindow::ALL[0], RateWindow::Minute);
        assert_eq!(RateWindow::ALL[1], RateWindow::Hour);
        assert_eq!(RateWindow::ALL[2], RateWindow::Day);

        assert_eq!(RateWindow::Minute.retry_after_secs(), 60);
        assert_eq!(RateWindow::Hour.retry_after_secs(), 3600);
        assert_eq!(RateWindow::Day.retry_after_secs(), 86400);
    }

    #[test]
    fn test_apply_usage_update() {
        let mut record = create_test_record("cred-1", "Client A");
        let now = Utc::now();

        record.apply_usage_update(now, 10);

        assert_eq!(record.total_requests(), 10);
        assert_eq!(record.last_used_at(), Some(now));
    }

    #[test]
    fn test_client_identity() {
        let identity = ClientIdentity::new(CredentialId::new("cred-1"), "Client A");
        assert_eq!(identity.client_name, "Client A");
        assert!(identity.credential_id.is_some());

        let anon = ClientIdentity::anonymous();
        assert_eq!(anon.client_name, "Unknown");
        assert!(anon.credential_id.is_none());
    }
}
