//! Static credential list validation
//!
//! A cache-free validation mode for small deployments (a handful of clients)
//! where the credential set is loaded once from configuration. No rate
//! limiting and no persistence; the only state is the immutable list itself.

use std::collections::HashMap;

use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use tracing::warn;

/// Label returned for configured credentials without a name
const UNNAMED_CLIENT: &str = "Unknown";

/// Validator over a fixed, in-memory credential list
#[derive(Debug, Clone)]
pub struct StaticAuthenticator {
    api_keys: Vec<String>,
    key_names: HashMap<String, String>,
}

impl StaticAuthenticator {
    /// Build from configuration. Returns `None` (mode downgrades to
    /// disabled) when the list is empty, so a misconfigured deployment stays
    /// visible instead of rejecting all traffic.
    pub fn from_config(
        api_keys: Vec<String>,
        key_names: HashMap<String, String>,
    ) -> Option<Self> {
        let api_keys: Vec<String> = api_keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if api_keys.is_empty() {
            warn!(
                "Authentication is enabled but no API keys are configured. \
                 Authentication will be DISABLED."
            );
            return None;
        }

        Some(Self { api_keys, key_names })
    }

    /// Validate a token against every configured credential.
    ///
    /// The comparison visits all candidates and accumulates the result with
    /// constant-time equality; there is no early exit on match, so timing
    /// reveals only the final boolean, not which candidate (or how much of
    /// it) matched.
    pub fn validate(&self, token: &str) -> Option<&str> {
        let token_bytes = token.as_bytes();
        let mut any_match = Choice::from(0u8);
        let mut matched_index = 0u32;

        for (index, key) in self.api_keys.iter().enumerate() {
            let hit = token_bytes.ct_eq(key.as_bytes());
            matched_index = u32::conditional_select(&matched_index, &(index as u32), hit);
            any_match |= hit;
        }

        if bool::from(any_match) {
            let key = &self.api_keys[matched_index as usize];
            Some(
                self.key_names
                    .get(key)
                    .map(String::as_str)
                    .unwrap_or(UNNAMED_CLIENT),
            )
        } else {
            None
        }
    }

    pub fn key_count(&self) -> usize {
        self.api_keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> StaticAuthenticator {
        let keys = vec!["key-alpha".to_string(), "key-beta".to_string()];
        let mut names = HashMap::new();
        names.insert("key-alpha".to_string(), "Client A".to_string());

        StaticAuthenticator::from_config(keys, names).unwrap()
    }

    #[test]
    fn test_valid_key_returns_label() {
        let auth = authenticator();
        assert_eq!(auth.validate("key-alpha"), Some("Client A"));
    }

    #[test]
    fn test_unnamed_key_returns_unknown() {
        let auth = authenticator();
        assert_eq!(auth.validate("key-beta"), Some("Unknown"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let auth = authenticator();
        assert_eq!(auth.validate("key-gamma"), None);
        assert_eq!(auth.validate(""), None);
        // prefix of a valid key must not match
        assert_eq!(auth.validate("key-alph"), None);
    }

    #[test]
    fn test_empty_list_downgrades_to_disabled() {
        let result = StaticAuthenticator::from_config(Vec::new(), HashMap::new());
        assert!(result.is_none());
    }

    #[test]
    fn test_whitespace_only_keys_are_dropped() {
        let result =
            StaticAuthenticator::from_config(vec!["  ".to_string(), String::new()], HashMap::new());
        assert!(result.is_none());
    }

    #[test]
    fn test_keys_are_trimmed() {
        let auth =
            StaticAuthenticator::from_config(vec!["  key-alpha  ".to_string()], HashMap::new())
                .unwrap();
        assert!(auth.validate("key-alpha").is_some());
        assert_eq!(auth.key_count(), 1);
    }

    #[test]
    fn test_last_candidate_still_matches() {
        let keys: Vec<String> = (0..10).map(|i| format!("key-{}", i)).collect();
        let auth = StaticAuthenticator::from_config(keys, HashMap::new()).unwrap();

        assert!(auth.validate("key-9").is_some());
        assert!(auth.validate("key-0").is_some());
        assert!(auth.validate("key-10").is_none());
    }
}
