//! Opaque refresh token generation and fingerprinting.
//!
//! The raw token is only ever handed to the client; the store and cache see
//! nothing but its fingerprint.

use anyhow::{Context, Result};
use base64::Engine;
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

/// Generate a new opaque refresh token: 32 bytes of OS randomness, encoded
/// as unpadded URL-safe base64 (43 characters, 256 bits of entropy).
///
/// # Errors
/// Returns an error if the OS random source fails.
pub fn generate() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate refresh token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Fingerprint an opaque token for storage and lookup: hex-encoded SHA-256,
/// deterministic for the same input.
#[must_use]
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    #[test]
    fn generated_token_decodes_to_32_bytes() {
        let decoded_len = generate()
            .ok()
            .and_then(|token| URL_SAFE_NO_PAD.decode(token.as_bytes()).ok())
            .map(|bytes| bytes.len());
        assert_eq!(decoded_len, Some(32));
    }

    #[test]
    fn generated_tokens_are_url_safe() {
        let token = generate().expect("token");
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn generated_tokens_do_not_repeat() {
        let mut tokens: Vec<String> = (0..100).map(|_| generate().expect("token")).collect();
        let total = tokens.len();
        tokens.sort();
        tokens.dedup();
        assert_eq!(tokens.len(), total);
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let first = fingerprint("token");
        let second = fingerprint("token");
        let other = fingerprint("other");
        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
