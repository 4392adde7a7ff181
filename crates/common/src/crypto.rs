//! Random token generation and comparison shared across CodeJam crates
//!
//! Session identifiers and OAuth `state` values both come from here.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::error::{Error, Result};

/// Generate `len` random bytes from the OS and encode them as URL-safe
/// base64 without padding.
pub fn generate_token(len: usize) -> Result<String> {
    let mut bytes = vec![0u8; len];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| Error::Internal(format!("Failed to generate random bytes: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Compare two tokens over their full length in constant time.
///
/// A prefix of the expected token never matches.
pub fn tokens_match(expected: &str, candidate: &str) -> bool {
    let expected = expected.as_bytes();
    let candidate = candidate.as_bytes();

    if expected.len() != candidate.len() {
        return false;
    }

    let mut result = 0u8;
    for (a, b) in expected.iter().zip(candidate.iter()) {
        result |= a ^ b;
    }
    result == 0
}
