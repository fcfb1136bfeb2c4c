//! Argon2 implementation of `PasswordHasher`. Hashes are PHC strings, so the
//! parameters travel with each stored value.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use domains::{DomainError, PasswordHasher, Result};

#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(DomainError::internal)?
            .to_string())
    }

    /// Unparseable hashes never verify.
    fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hasher = Argon2Hasher::new();
        let hash = hasher.hash("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(hasher.verify("correct horse", &hash));
        assert!(!hasher.verify("battery staple", &hash));
    }

    #[test]
    fn salts_differ() {
        let hasher = Argon2Hasher::new();
        assert_ne!(hasher.hash("pw").unwrap(), hasher.hash("pw").unwrap());
    }

    #[test]
    fn garbage_hash_is_rejected() {
        assert!(!Argon2Hasher::new().verify("pw", "not-a-phc-string"));
    }
}
