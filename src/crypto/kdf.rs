//! Password-based key derivation using Argon2id.
//!
//! Argon2id is a memory-hard KDF that protects against brute-force and
//! GPU-based attacks.  Parameters are configurable via `KdfParams`
//! (loaded from `passvault.toml` or sensible defaults) and are persisted
//! in every vault header so the file stays self-describing.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::errors::{PassVaultError, Result};

use super::keys::{MasterKey, KEY_LEN};

/// Length of the salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Identifier written into the vault header for the KDF in use.
pub const KDF_ALGORITHM: &str = "argon2id";

/// Memory cost bounds in KiB (8 MB .. 4 GB).
const MIN_MEMORY_KIB: u32 = 8_192;
const MAX_MEMORY_KIB: u32 = 4_194_304;

/// Iteration bounds.
const MIN_ITERATIONS: u32 = 1;
const MAX_ITERATIONS: u32 = 16;

/// Parallelism bounds.
const MIN_PARALLELISM: u32 = 1;
const MAX_PARALLELISM: u32 = 16;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// The cheapest parameters the KDF accepts. Only meant for tests.
    pub fn minimum() -> Self {
        Self {
            memory_kib: MIN_MEMORY_KIB,
            iterations: MIN_ITERATIONS,
            parallelism: MIN_PARALLELISM,
        }
    }

    /// Check the parameters against the supported bounds.
    pub fn validate(&self) -> Result<()> {
        check_range("memory_kib", self.memory_kib, MIN_MEMORY_KIB, MAX_MEMORY_KIB)?;
        check_range("iterations", self.iterations, MIN_ITERATIONS, MAX_ITERATIONS)?;
        check_range(
            "parallelism",
            self.parallelism,
            MIN_PARALLELISM,
            MAX_PARALLELISM,
        )?;
        Ok(())
    }
}

fn check_range(name: &str, value: u32, min: u32, max: u32) -> Result<()> {
    if value < min || value > max {
        return Err(PassVaultError::InvalidParameters(format!(
            "Argon2 {name} must be between {min} and {max} (got {value})"
        )));
    }
    Ok(())
}

/// Derive the vault's master key from a password and salt.
///
/// The same password + salt + params always produce the same key.
/// This is CPU- and memory-bound; callers on a latency-sensitive
/// path must not hold any shared lock while it runs.
pub fn derive(password: &[u8], salt: &[u8], kdf_params: &KdfParams) -> Result<MasterKey> {
    kdf_params.validate()?;

    if salt.len() != SALT_LEN {
        return Err(PassVaultError::InvalidParameters(format!(
            "salt must be {SALT_LEN} bytes (got {})",
            salt.len()
        )));
    }

    let params = Params::new(
        kdf_params.memory_kib,
        kdf_params.iterations,
        kdf_params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| PassVaultError::InvalidParameters(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = MasterKey::zeroed();
    argon2
        .hash_password_into(password, salt, key.as_mut_bytes())
        .map_err(|e| PassVaultError::InvalidParameters(format!("Argon2id hashing failed: {e}")))?;

    Ok(key)
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
