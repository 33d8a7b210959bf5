//! Password hashing, verification, and strength policy
//!
//! Passwords are hashed with Argon2id over the plaintext concatenated with a
//! process-wide secret pepper. The per-password salt comes from the hash
//! scheme itself (a fresh random salt on every call), so the same input never
//! produces the same encoded output twice.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    HashFailed(String),
}

// OWASP recommended settings for Argon2id
const MEMORY_COST_KIB: u32 = 19 * 1024;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;
const HASH_LENGTH: usize = 32;

fn argon2_instance() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, Some(HASH_LENGTH))
        .map_err(|e| PasswordError::HashFailed(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password mixed with the application pepper.
///
/// Returns the PHC-formatted hash string.
pub fn hash_password(password: &str, pepper: &str) -> Result<String, PasswordError> {
    let peppered = format!("{}{}", password, pepper);
    let salt = SaltString::generate(&mut OsRng);

    let hash = argon2_instance()?
        .hash_password(peppered.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashFailed(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies a candidate password against a stored PHC hash.
///
/// Returns false on mismatch and on malformed stored hashes; a wrong password
/// is never an error condition. Comparison is constant-time inside the argon2
/// crate.
pub fn verify_password(password: &str, pepper: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    let peppered = format!("{}{}", password, pepper);

    // Argon2::default() can verify hashes produced with tuned params, since
    // the params are carried in the PHC string.
    Argon2::default()
        .verify_password(peppered.as_bytes(), &parsed)
        .is_ok()
}

/// Password strength policy: at least one uppercase letter, one lowercase
/// letter, one digit, one special character, and 8-100 characters total.
///
/// Pure predicate, no side effects.
pub fn check_strength(password: &str) -> bool {
    let length = password.chars().count();
    if !(8..=100).contains(&length) {
        return false;
    }

    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_special = false;

    for c in password.chars() {
        if c.is_ascii_uppercase() {
            has_upper = true;
        } else if c.is_ascii_lowercase() {
            has_lower = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else {
            has_special = true;
        }
    }

    has_upper && has_lower && has_digit && has_special
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEPPER: &str = "test-pepper";

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("Abcdef1!", PEPPER).unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Abcdef1!", PEPPER, &hash));
        assert!(!verify_password("Abcdef1?", PEPPER, &hash));
    }

    #[test]
    fn test_verify_rejects_wrong_pepper() {
        let hash = hash_password("Abcdef1!", PEPPER).unwrap();
        assert!(!verify_password("Abcdef1!", "other-pepper", &hash));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("Abcdef1!", PEPPER, "not-a-phc-string"));
        assert!(!verify_password("Abcdef1!", PEPPER, ""));
    }

    #[test]
    fn test_same_password_produces_different_hashes() {
        let hash1 = hash_password("Abcdef1!", PEPPER).unwrap();
        let hash2 = hash_password("Abcdef1!", PEPPER).unwrap();
        assert_ne!(hash1, hash2);

        assert!(verify_password("Abcdef1!", PEPPER, &hash1));
        assert!(verify_password("Abcdef1!", PEPPER, &hash2));
    }

    #[test]
    fn test_strength_accepts_valid_passwords() {
        assert!(check_strength("Abcdef1!"));
        assert!(check_strength("A1!aaaaa")); // exactly 8 chars
        assert!(check_strength("Str0ng&Password"));
    }

    #[test]
    fn test_strength_rejects_missing_character_classes() {
        assert!(!check_strength("abcdefgh")); // lowercase only
        assert!(!check_strength("ABCDEFG1!")); // no lowercase
        assert!(!check_strength("Abcdefgh!")); // no digit
        assert!(!check_strength("Abcdefg1")); // no special
    }

    #[test]
    fn test_strength_rejects_bad_lengths() {
        assert!(!check_strength("A1!a")); // 4 chars
        assert!(!check_strength(""));

        let long = format!("Aa1!{}", "a".repeat(97)); // 101 chars
        assert!(!check_strength(&long));

        let max = format!("Aa1!{}", "a".repeat(96)); // exactly 100 chars
        assert!(check_strength(&max));
    }
}
