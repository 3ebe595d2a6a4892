//! Password hashing and policy validation.
//!
//! Hashing uses Argon2id (hybrid mode) at the library's default parameters,
//! with salts from `OsRng`, producing PHC-format strings for storage.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::config::PasswordPolicy;
use crate::types::PasswordValidation;

/// Hash a password for storage.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails (rare).
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, and `Err` only when
/// the stored hash cannot be parsed. The [`SecurityGuard`](crate::SecurityGuard)
/// wrapper collapses that error into "no match".
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}

/// Validate a password against the composition policy.
///
/// Collects every violated rule so callers can render the full checklist.
pub fn validate_password(policy: &PasswordPolicy, password: &str) -> PasswordValidation {
    let mut errors = Vec::new();

    if password.chars().count() < policy.min_length {
        errors.push(format!(
            "Password must be at least {} characters long",
            policy.min_length
        ));
    }
    if policy.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
        errors.push("Password must contain an uppercase letter".to_string());
    }
    if policy.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
        errors.push("Password must contain a lowercase letter".to_string());
    }
    if policy.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain a digit".to_string());
    }
    if policy.require_special
        && !password
            .chars()
            .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
    {
        errors.push("Password must contain a special character".to_string());
    }

    PasswordValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PasswordPolicy {
        PasswordPolicy::default()
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let first = hash_password("correct horse battery staple").unwrap();
        let second = hash_password("correct horse battery staple").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-hash").is_err());
    }

    #[test]
    fn test_short_password_always_reports_length() {
        let result = validate_password(&policy(), "Ab1!");
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("at least 12")));
    }

    #[test]
    fn test_strong_password_is_valid() {
        let result = validate_password(&policy(), "Gizi-Plate#2026");
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_all_violations_are_reported() {
        // Long enough, but lowercase-only: three class violations at once.
        let result = validate_password(&policy(), "alllowercaseonly");
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 3);
    }

    #[test]
    fn test_each_character_class_is_checked() {
        let cases = [
            ("nouppercase1!aaaa", "uppercase"),
            ("NOLOWERCASE1!AAAA", "lowercase"),
            ("NoDigitsHere!!aaa", "digit"),
            ("NoSpecials123aaaa", "special"),
        ];
        for (password, expected) in cases {
            let result = validate_password(&policy(), password);
            assert_eq!(result.errors.len(), 1, "password {password:?}");
            assert!(result.errors[0].contains(expected), "password {password:?}");
        }
    }
}
