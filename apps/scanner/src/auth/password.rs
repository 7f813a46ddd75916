//! Password storage for the credential store.
//!
//! Records keep a PHC string (`$argon2id$v=19$...`) carrying its own salt and
//! parameters, so hashes stay verifiable if the defaults change later.

use anyhow::{anyhow, Result};
use argon2::password_hash::{
    self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| anyhow!("argon2 hashing failed: {e}"))
}

/// `Ok(false)` for a wrong password. A stored value that is not a PHC string,
/// or any other verifier failure, is an error rather than a silent mismatch.
pub fn verify_password(password: &str, stored: &str) -> Result<bool> {
    let phc = PasswordHash::new(stored).map_err(|e| anyhow!("stored hash is not a PHC string: {e}"))?;

    match Argon2::default().verify_password(password.as_bytes(), &phc) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow!("argon2 verification failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_mismatch() {
        let stored = hash_password("abcdef").unwrap();
        assert!(verify_password("abcdef", &stored).unwrap());
        assert!(!verify_password("abcdeg", &stored).unwrap());
        assert!(!verify_password("", &stored).unwrap());
    }

    #[test]
    fn test_each_hash_gets_its_own_salt() {
        let first = hash_password("123456").unwrap();
        let second = hash_password("123456").unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(verify_password("123456", &second).unwrap());
    }

    #[test]
    fn test_plaintext_in_store_is_an_error() {
        assert!(verify_password("123456", "123456").is_err());
    }
}
