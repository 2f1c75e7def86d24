//! Password hashing with Argon2id.
//!
//! Hashes are stored as PHC strings, so verification reads the parameters
//! from the hash itself and keeps working after the cost is changed.

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Check the password policy.
///
/// # Errors
///
/// Returns [`AuthError::WeakPassword`] for passwords shorter than
/// [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Argon2id hasher configured from [`AuthConfig`].
#[derive(Clone)]
pub struct Passwords {
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for Passwords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Passwords").finish_non_exhaustive()
    }
}

impl Passwords {
    /// Build a hasher with the configured cost.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::PasswordHash`] if the cost parameters are out of
    /// range for Argon2.
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::PasswordHash`] if hashing fails.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::PasswordHash(e.to_string()))
    }

    /// Check a password against a stored PHC hash.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::PasswordHash`] if the stored hash is not a valid
    /// PHC string. A wrong password is `Ok(false)`.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
