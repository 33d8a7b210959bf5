//! PKCE, state, and nonce generation for the OAuth authorization code flow
//!
//! Implements the S256 code challenge method of RFC 7636. All values are
//! drawn from the operating system CSPRNG and are never reused across flows.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Encodes bytes as URL-safe Base64 without padding.
fn b64url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

fn random_urlsafe(byte_len: usize) -> String {
    let mut bytes = vec![0u8; byte_len];
    OsRng.fill_bytes(&mut bytes);
    b64url_encode(&bytes)
}

/// Generates a PKCE code verifier (RFC 7636).
///
/// 64 random bytes encode to 86 characters, inside the required 43-128 range.
pub fn generate_code_verifier() -> String {
    random_urlsafe(64)
}

/// Derives the S256 code challenge from a verifier:
/// base64url(sha256(verifier)) without padding.
pub fn derive_code_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    b64url_encode(&digest)
}

/// Generates a random state value for CSRF protection on the redirect.
pub fn generate_state() -> String {
    random_urlsafe(24)
}

/// Generates a random nonce for OpenID Connect replay protection.
pub fn generate_nonce() -> String {
    random_urlsafe(24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_verifier_length_and_alphabet() {
        let verifier = generate_code_verifier();
        // 64 bytes -> 86 base64url chars, within the RFC 7636 43-128 window
        assert_eq!(verifier.len(), 86);
        assert!(verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_challenge_is_deterministic() {
        let verifier = generate_code_verifier();
        assert_eq!(derive_code_challenge(&verifier), derive_code_challenge(&verifier));
    }

    #[test]
    fn test_challenge_matches_rfc7636_vector() {
        // Appendix B of RFC 7636
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(
            derive_code_challenge(verifier),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_state_and_nonce_are_independent() {
        let state = generate_state();
        let nonce = generate_nonce();
        assert_ne!(state, nonce);
        // 24 bytes -> 32 base64url chars
        assert_eq!(state.len(), 32);
        assert_eq!(nonce.len(), 32);
    }

    #[test]
    fn test_values_are_not_reused() {
        let values: HashSet<String> = (0..1000).map(|_| generate_state()).collect();
        assert_eq!(values.len(), 1000);
    }
}
