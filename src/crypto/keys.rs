//! Asymmetric key types.
//!
//! Keys are tagged with their [`Algorithm`]. The binary form of both private
//! and public keys is `[type byte][raw key bytes]`, which is what gets
//! encrypted and persisted by the storage backends.

use crate::error::{KeysError, Result};
use ed25519_dalek::{Signer as _, Verifier as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, Zeroizing};

/// Length of an Ed25519 secret seed.
pub const ED25519_SECRET_LENGTH: usize = 32;

/// Length of a secp256k1 secret scalar.
pub const SECP256K1_SECRET_LENGTH: usize = 32;

/// Length of a key address.
pub const ADDRESS_LENGTH: usize = 20;

/// Supported signature algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Ed25519,
    Secp256k1,
}

impl Algorithm {
    /// Every algorithm the keyring can generate and sign with.
    pub const ALL: [Algorithm; 2] = [Algorithm::Ed25519, Algorithm::Secp256k1];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Ed25519 => "ed25519",
            Algorithm::Secp256k1 => "secp256k1",
        }
    }

    /// One-byte type tag used in binary key encodings.
    pub fn type_byte(self) -> u8 {
        match self {
            Algorithm::Ed25519 => 0x01,
            Algorithm::Secp256k1 => 0x02,
        }
    }

    /// Resolve an algorithm from its type tag.
    pub fn from_type_byte(tag: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|algo| algo.type_byte() == tag)
            .ok_or_else(|| KeysError::UnsupportedAlgorithmError(format!("type byte 0x{:02x}", tag)))
    }
}

impl FromStr for Algorithm {
    type Err = KeysError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|algo| algo.name() == s)
            .ok_or_else(|| KeysError::UnsupportedAlgorithmError(s.to_string()))
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A private signing key.
///
/// Secret material is wiped when the key is dropped; [`PrivateKey::to_bytes`]
/// hands out a buffer that is wiped as well.
#[derive(Clone)]
pub enum PrivateKey {
    Ed25519(ed25519_dalek::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
}

impl PrivateKey {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            PrivateKey::Ed25519(_) => Algorithm::Ed25519,
            PrivateKey::Secp256k1(_) => Algorithm::Secp256k1,
        }
    }

    /// Derive the public half.
    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Ed25519(key) => PublicKey::Ed25519(key.verifying_key()),
            PrivateKey::Secp256k1(key) => PublicKey::Secp256k1(key.verifying_key().clone()),
        }
    }

    /// Sign a message, returning the raw signature bytes.
    ///
    /// Ed25519 signatures are 64 bytes. Secp256k1 signatures are 64-byte
    /// `r || s` ECDSA signatures over the SHA-256 digest of the message.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            PrivateKey::Ed25519(key) => key.sign(message).to_bytes().to_vec(),
            PrivateKey::Secp256k1(key) => {
                let signature: k256::ecdsa::Signature = key.sign(message);
                signature.to_bytes().to_vec()
            }
        }
    }

    /// Tagged binary form: `[type byte][32-byte secret]`.
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        let mut out = Zeroizing::new(Vec::with_capacity(1 + ED25519_SECRET_LENGTH));
        out.push(self.algorithm().type_byte());
        match self {
            PrivateKey::Ed25519(key) => {
                let mut secret = key.to_bytes();
                out.extend_from_slice(&secret);
                secret.zeroize();
            }
            PrivateKey::Secp256k1(key) => {
                let mut secret = key.to_bytes();
                out.extend_from_slice(&secret);
                secret.as_mut_slice().zeroize();
            }
        }
        out
    }

    /// Parse the tagged binary form produced by [`PrivateKey::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (tag, raw) = bytes
            .split_first()
            .ok_or_else(|| KeysError::InvalidKeyError("empty private key".to_string()))?;

        match Algorithm::from_type_byte(*tag)? {
            Algorithm::Ed25519 => {
                if raw.len() != ED25519_SECRET_LENGTH {
                    return Err(KeysError::InvalidKeyError(format!(
                        "Expected {} bytes for Ed25519 secret key, got {}",
                        ED25519_SECRET_LENGTH,
                        raw.len()
                    )));
                }
                let mut secret = [0u8; ED25519_SECRET_LENGTH];
                secret.copy_from_slice(raw);
                let key = ed25519_dalek::SigningKey::from_bytes(&secret);
                secret.zeroize();
                Ok(PrivateKey::Ed25519(key))
            }
            Algorithm::Secp256k1 => {
                if raw.len() != SECP256K1_SECRET_LENGTH {
                    return Err(KeysError::InvalidKeyError(format!(
                        "Expected {} bytes for secp256k1 secret key, got {}",
                        SECP256K1_SECRET_LENGTH,
                        raw.len()
                    )));
                }
                let key = k256::ecdsa::SigningKey::from_slice(raw).map_err(|e| {
                    KeysError::InvalidKeyError(format!("Invalid secp256k1 secret key: {}", e))
                })?;
                Ok(PrivateKey::Secp256k1(key))
            }
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", &self.algorithm())
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// A public verification key.
#[derive(Clone, PartialEq, Eq)]
pub enum PublicKey {
    Ed25519(ed25519_dalek::VerifyingKey),
    Secp256k1(k256::ecdsa::VerifyingKey),
}

impl PublicKey {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            PublicKey::Ed25519(_) => Algorithm::Ed25519,
            PublicKey::Secp256k1(_) => Algorithm::Secp256k1,
        }
    }

    /// Untagged key bytes: 32 bytes for Ed25519, 33-byte compressed SEC1
    /// point for secp256k1.
    pub fn raw_bytes(&self) -> Vec<u8> {
        match self {
            PublicKey::Ed25519(key) => key.to_bytes().to_vec(),
            PublicKey::Secp256k1(key) => key.to_encoded_point(true).as_bytes().to_vec(),
        }
    }

    /// Tagged binary form: `[type byte][raw key bytes]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let raw = self.raw_bytes();
        let mut out = Vec::with_capacity(1 + raw.len());
        out.push(self.algorithm().type_byte());
        out.extend_from_slice(&raw);
        out
    }

    /// Parse the tagged binary form produced by [`PublicKey::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (tag, raw) = bytes
            .split_first()
            .ok_or_else(|| KeysError::InvalidKeyError("empty public key".to_string()))?;
        Self::from_raw(Algorithm::from_type_byte(*tag)?, raw)
    }

    /// Build a public key from untagged bytes of a known algorithm.
    pub fn from_raw(algorithm: Algorithm, raw: &[u8]) -> Result<Self> {
        match algorithm {
            Algorithm::Ed25519 => {
                let bytes: [u8; 32] = raw.try_into().map_err(|_| {
                    KeysError::InvalidKeyError(format!(
                        "Expected 32 bytes for Ed25519 public key, got {}",
                        raw.len()
                    ))
                })?;
                ed25519_dalek::VerifyingKey::from_bytes(&bytes)
                    .map(PublicKey::Ed25519)
                    .map_err(|e| KeysError::InvalidKeyError(format!("Invalid Ed25519 public key: {}", e)))
            }
            Algorithm::Secp256k1 => k256::ecdsa::VerifyingKey::from_sec1_bytes(raw)
                .map(PublicKey::Secp256k1)
                .map_err(|e| KeysError::InvalidKeyError(format!("Invalid secp256k1 public key: {}", e))),
        }
    }

    /// Address derived from this key.
    pub fn address(&self) -> Address {
        Address::from_public_key(self)
    }

    /// Verify a raw signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        match self {
            PublicKey::Ed25519(key) => {
                let signature = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|e| KeysError::InvalidSignatureError(e.to_string()))?;
                key.verify(message, &signature)
                    .map_err(|e| KeysError::InvalidSignatureError(format!("Signature verification failed: {}", e)))
            }
            PublicKey::Secp256k1(key) => {
                let signature = k256::ecdsa::Signature::from_slice(signature)
                    .map_err(|e| KeysError::InvalidSignatureError(e.to_string()))?;
                key.verify(message, &signature)
                    .map_err(|e| KeysError::InvalidSignatureError(format!("Signature verification failed: {}", e)))
            }
        }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}:{})", self.algorithm(), hex::encode_upper(self.raw_bytes()))
    }
}

#[derive(Serialize, Deserialize)]
struct PublicKeyJson {
    #[serde(rename = "type")]
    algorithm: Algorithm,
    data: String,
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        PublicKeyJson {
            algorithm: self.algorithm(),
            data: hex::encode_upper(self.raw_bytes()),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = PublicKeyJson::deserialize(deserializer)?;
        let raw = hex::decode(&json.data).map_err(serde::de::Error::custom)?;
        PublicKey::from_raw(json.algorithm, &raw).map_err(serde::de::Error::custom)
    }
}

/// A 20-byte key address: the leading bytes of SHA-256 over the raw
/// public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let digest = Sha256::digest(public_key.raw_bytes());
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&digest[..ADDRESS_LENGTH]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = KeysError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| KeysError::DecodeError(format!("Invalid hex address: {}", e)))?;
        let bytes: [u8; ADDRESS_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
            KeysError::DecodeError(format!(
                "Expected {} address bytes, got {}",
                ADDRESS_LENGTH,
                b.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
