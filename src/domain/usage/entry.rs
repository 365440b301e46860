//! Usage log entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credential ID recorded when authentication itself failed
pub const UNKNOWN_CREDENTIAL: &str = "unknown";

/// One completed or rejected request, as appended to the usage log.
///
/// Append-only; once durably written the store owns it and the gateway keeps
/// no reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLogEntry {
    /// Credential the request was attributed to, or [`UNKNOWN_CREDENTIAL`]
    pub credential_id: String,
    pub endpoint: String,
    pub method: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl UsageLogEntry {
    pub fn new(
        credential_id: impl Into<String>,
        endpoint: impl Into<String>,
        method: impl Into<String>,
        status_code: u16,
    ) -> Self {
        Self {
            credential_id: credential_id.into(),
            endpoint: endpoint.into(),
            method: method.into(),
            status_code,
            client_addr: None,
            user_agent: None,
            latency_ms: None,
            error_message: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_client_addr(mut self, addr: Option<String>) -> Self {
        self.client_addr = addr;
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_builder() {
        let entry = UsageLogEntry::new("cred-1", "/v1/search", "POST", 200)
            .with_client_addr(Some("10.0.0.1".to_string()))
            .with_user_agent(Some("curl/8.0".to_string()))
            .with_latency_ms(42);

        assert_eq!(entry.credential_id, "cred-1");
        assert_eq!(entry.endpoint, "/v1/search");
        assert_eq!(entry.status_code, 200);
        assert_eq!(entry.latency_ms, Some(42));
        assert!(entry.error_message.is_none());
    }

    #[test]
    fn test_unknown_sentinel_for_failed_auth() {
        let entry = UsageLogEntry::new(UNKNOWN_CREDENTIAL, "/v1/search", "POST", 401)
            .with_error("Invalid or expired API key");

        assert_eq!(entry.credential_id, "unknown");
        assert_eq!(entry.error_message.as_deref(), Some("Invalid or expired API key"));
    }
}
