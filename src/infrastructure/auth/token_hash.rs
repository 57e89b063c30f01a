//! Hashing of refresh tokens for storage

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};

const HASH_PREFIX: &str = "sha256$";

/// Hash a token as `sha256$<base64url digest>`
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{}{}", HASH_PREFIX, URL_SAFE_NO_PAD.encode(digest))
}

/// Check a presented token against a stored hash in constant time
pub fn verify_token_hash(token: &str, stored_hash: &str) -> bool {
    constant_time_eq(hash_token(token).as_bytes(), stored_hash.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
