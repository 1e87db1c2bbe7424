//! Account bearer tokens.
//!
//! Tokens are 32 random bytes, hex-encoded with a `prly_` prefix. Only the
//! lowercase hex SHA-256 of a token is ever stored.

use aes_gcm::aead::{OsRng, rand_core::RngCore};
use sha2::{Digest, Sha256};

const TOKEN_PREFIX: &str = "prly_";

/// Generate a new plaintext bearer token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("{TOKEN_PREFIX}{hex}")
}

/// Compute the SHA-256 hash of a token (lowercase hex).
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}
