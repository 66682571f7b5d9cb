//! One-way password digests.
//!
//! Passwords are stored as argon2id PHC strings with a random salt. The
//! parameters travel inside the PHC string, so hashes made with different
//! settings keep verifying.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use tracing::warn;

use crate::error::AuthError;

#[derive(Clone)]
pub struct PasswordDigest {
    argon: Argon2<'static>,
}

impl Default for PasswordDigest {
    fn default() -> Self {
        Self {
            argon: Argon2::default(),
        }
    }
}

impl PasswordDigest {
    /// Custom cost parameters (memory in KiB, iterations, lanes).
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, AuthError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(Self {
            argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// False for a wrong password and for an unreadable stored hash.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Stored password hash is not a valid PHC string");
                return false;
            }
        };
        self.argon
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest() -> PasswordDigest {
        PasswordDigest::with_params(1024, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_verifies_only_original() {
        let d = digest();
        let hash = d.hash("Secret123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(d.verify("Secret123", &hash));
        assert!(!d.verify("secret123", &hash));
        assert!(!d.verify("", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let d = digest();
        let a = d.hash("Secret123").unwrap();
        let b = d.hash("Secret123").unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("Secret123"));
    }

    #[test]
    fn test_verify_across_parameter_sets() {
        let hash = digest().hash("Secret123").unwrap();
        assert!(PasswordDigest::default().verify("Secret123", &hash));
    }

    #[test]
    fn test_verify_rejects_legacy_encoding() {
        // base64("Secret123"), the shape of hashes from older installs
        assert!(!digest().verify("Secret123", "U2VjcmV0MTIz"));
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(matches!(
            PasswordDigest::with_params(1024, 0, 1),
            Err(AuthError::Hashing(_))
        ));
    }
}
