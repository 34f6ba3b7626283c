//! Password Hashing Service
//!
//! Secure password hashing using Argon2id. Hashes are stored in PHC string
//! format so the parameters travel with each hash.

use argon2::{
    password_hash::{
        rand_core::OsRng,
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2, Algorithm, Params, Version,
};
use tracing::debug;

use crate::shared::error::{PlatformError, Result};

/// Argon2id cost parameters. Defaults: 64 MiB, 3 passes, 4 lanes, 32-byte output.
#[derive(Debug, Clone)]
pub struct Argon2Config {
    /// KiB
    pub memory_cost: u32,
    pub time_cost: u32,
    pub parallelism: u32,
    pub output_len: usize,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_cost: 65536,
            time_cost: 3,
            parallelism: 4,
            output_len: 32,
        }
    }
}

impl Argon2Config {
    /// Cheap parameters for test suites
    pub fn testing() -> Self {
        Self {
            memory_cost: 4096,
            time_cost: 1,
            parallelism: 1,
            output_len: 32,
        }
    }

    fn to_params(&self) -> Result<Params> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.output_len),
        )
        .map_err(|e| PlatformError::internal(format!("Invalid Argon2 params: {}", e)))
    }
}

pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new(config: Argon2Config) -> Result<Self> {
        let params = config.to_params()?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        Ok(Self { argon2 })
    }

    /// Hash a password using Argon2id
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PlatformError::internal(format!("Failed to hash password: {}", e)))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            PlatformError::internal(format!("Invalid password hash format: {}", e))
        })?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                debug!("Password verification failed: incorrect password");
                Ok(false)
            }
            Err(e) => Err(PlatformError::internal(format!("Password verification error: {}", e))),
        }
    }
}
