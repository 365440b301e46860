//! Credential token helpers
//!
//! Tokens are minted by the external issuance tooling; the gateway only ever
//! sees the plaintext transiently and works with its digest.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in a generated token (256 bits of entropy)
const TOKEN_BYTES: usize = 32;

/// Length of the non-secret display prefix
const PREFIX_CHARS: usize = 8;

/// Generate a cryptographically secure random token
pub fn generate_token() -> String {
    let mut random_bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut random_bytes);
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Hex SHA-256 digest of a plaintext token, as stored in `key_hash`
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Short non-secret fragment of a token for human listings
pub fn token_prefix(token: &str) -> &str {
    &token[..PREFIX_CHARS.min(token.len())]
}
