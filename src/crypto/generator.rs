//! Deterministic key generation.
//!
//! A generator turns a seed into a private key of one algorithm. The seed is
//! hashed with SHA-256 and the digest becomes the Ed25519 seed or the
//! secp256k1 scalar, so the same seed always yields the same key.

use crate::crypto::keys::{Algorithm, PrivateKey};
use crate::error::{KeysError, Result};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, Zeroizing};

/// The length of seeds produced by [`generate_seed`].
pub const SEED_LENGTH: usize = 32;

/// Produces private keys of a single algorithm from seed bytes.
pub trait Generator: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    /// Derive a private key from `seed`. Pure: equal seeds give equal keys.
    fn generate(&self, seed: &[u8]) -> Result<PrivateKey>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Generator;

impl Generator for Ed25519Generator {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Ed25519
    }

    fn generate(&self, seed: &[u8]) -> Result<PrivateKey> {
        let mut secret: [u8; 32] = Sha256::digest(seed).into();
        let key = ed25519_dalek::SigningKey::from_bytes(&secret);
        secret.zeroize();
        Ok(PrivateKey::Ed25519(key))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Generator;

impl Generator for Secp256k1Generator {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Secp256k1
    }

    /// Fails with a crypto error when the digest is zero or not below the
    /// curve order.
    fn generate(&self, seed: &[u8]) -> Result<PrivateKey> {
        let mut secret: [u8; 32] = Sha256::digest(seed).into();
        let key = k256::ecdsa::SigningKey::from_slice(&secret);
        secret.zeroize();
        key.map(PrivateKey::Secp256k1).map_err(|e| {
            KeysError::CryptoError(format!("Seed does not map to a secp256k1 scalar: {}", e))
        })
    }
}

/// Look up the generator for an algorithm.
pub fn generator_for(algorithm: Algorithm) -> Box<dyn Generator> {
    match algorithm {
        Algorithm::Ed25519 => Box::new(Ed25519Generator),
        Algorithm::Secp256k1 => Box::new(Secp256k1Generator),
    }
}

/// Look up a generator by canonical name (`ed25519`, `secp256k1`).
pub fn generator_by_name(name: &str) -> Result<Box<dyn Generator>> {
    Ok(generator_for(name.parse()?))
}

/// Look up a generator by its one-byte type tag.
pub fn generator_by_type(tag: u8) -> Result<Box<dyn Generator>> {
    Ok(generator_for(Algorithm::from_type_byte(tag)?))
}

/// Fresh random seed from the thread-local CSPRNG.
pub fn generate_seed() -> Zeroizing<[u8; SEED_LENGTH]> {
    let mut seed = Zeroizing::new([0u8; SEED_LENGTH]);
    rand::thread_rng().fill_bytes(&mut seed[..]);
    seed
}
