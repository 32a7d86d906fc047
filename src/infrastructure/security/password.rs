use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Salted SHA-256 digest for the local account store.
///
/// Keeps demo passwords out of `users.json` in plain text. Not a password
/// hardening scheme.
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new_salt() -> String {
        Uuid::new_v4().simple().to_string()
    }

    pub fn hash(password: &str, salt: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(b":");
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn verify(password: &str, salt: &str, expected_hash: &str) -> bool {
        Self::hash(password, salt) == expected_hash
    }
}
