//! Passphrase-based key derivation.
//!
//! A passphrase and a random salt are run through Argon2id, and the 64-byte
//! hash is folded down to a 32-byte symmetric key with SHA-256.

use crate::error::{KeysError, Result};
use argon2::{Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// The length of the salt used for key derivation.
pub const SALT_LENGTH: usize = 16;

/// The length of the raw Argon2 output before folding.
pub const HASH_LENGTH: usize = 64;

/// The length of the derived symmetric key.
pub const KEY_LENGTH: usize = 32;

/// Default Argon2id memory cost in KiB (64 MiB).
pub const DEFAULT_MEMORY_KIB: u32 = 65536;

/// Default Argon2id pass count.
pub const DEFAULT_ITERATIONS: u32 = 3;

/// Default Argon2id lane count.
pub const DEFAULT_PARALLELISM: u32 = 4;

/// Upper bounds on accepted costs. Parameters are read back from stored
/// ciphertexts and imported armor, so these cap what a crafted file can demand.
pub const MAX_MEMORY_KIB: u32 = 1 << 20;

pub const MAX_ITERATIONS: u32 = 64;

pub const MAX_PARALLELISM: u32 = 64;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
}

impl KdfParams {
    /// Validate and build a parameter set.
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        if memory_kib > MAX_MEMORY_KIB {
            return Err(KeysError::KeyDerivationError(format!(
                "Memory cost {} KiB exceeds the {} KiB limit",
                memory_kib, MAX_MEMORY_KIB
            )));
        }
        if iterations > MAX_ITERATIONS {
            return Err(KeysError::KeyDerivationError(format!(
                "Iteration count {} exceeds the limit of {}",
                iterations, MAX_ITERATIONS
            )));
        }
        if parallelism > MAX_PARALLELISM {
            return Err(KeysError::KeyDerivationError(format!(
                "Parallelism {} exceeds the limit of {}",
                parallelism, MAX_PARALLELISM
            )));
        }
        let params = Self {
            memory_kib,
            iterations,
            parallelism,
        };
        params.argon2_params()?;
        Ok(params)
    }

    /// Cheap parameters for tests. Never use these for keys that matter.
    pub fn low_cost() -> Self {
        Self {
            memory_kib: 256,
            iterations: 1,
            parallelism: 1,
        }
    }

    pub fn memory_kib(&self) -> u32 {
        self.memory_kib
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    fn argon2_params(&self) -> Result<Params> {
        Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(HASH_LENGTH),
        )
        .map_err(|e| KeysError::KeyDerivationError(format!("Invalid Argon2 params: {}", e)))
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_MEMORY_KIB,
            iterations: DEFAULT_ITERATIONS,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

/// Generate a random salt for key derivation.
///
/// # Example
///
/// ```
/// use tmkeys::crypto::password::{generate_salt, SALT_LENGTH};
///
/// let salt = generate_salt();
/// assert_eq!(salt.len(), SALT_LENGTH);
/// ```
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Derive a symmetric key from a passphrase and salt.
///
/// This is intentionally slow: with the default parameters a single call
/// costs 64 MiB of memory and a noticeable amount of CPU time.
///
/// # Arguments
///
/// * `passphrase` - The passphrase to derive from
/// * `salt` - A random salt of `SALT_LENGTH` bytes
/// * `params` - Argon2id cost parameters
pub fn derive_key(
    passphrase: &str,
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LENGTH]>> {
    if salt.len() != SALT_LENGTH {
        return Err(KeysError::KeyDerivationError(format!(
            "Salt must be {} bytes, got {}",
            SALT_LENGTH,
            salt.len()
        )));
    }

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        Version::V0x13,
        params.argon2_params()?,
    );

    let mut hash = Zeroizing::new([0u8; HASH_LENGTH]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut hash[..])
        .map_err(|e| KeysError::KeyDerivationError(format!("Argon2 error: {}", e)))?;

    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
    key.copy_from_slice(&Sha256::digest(&hash[..]));
    Ok(key)
}
