//! Passphrase encryption of private keys.
//!
//! [`SecretBox`] derives a key with Argon2id (see [`crate::crypto::password`])
//! and seals the tagged private key bytes with AES-256-GCM. The sealed form is:
//!
//! `[m_cost u32 BE][t_cost u32 BE][p_cost u32 BE][nonce (12 bytes)][ciphertext + tag]`
//!
//! The salt travels next to the ciphertext in [`EncryptedSecret`] rather than
//! inside it, because the file backend stores it as an armor header.

use crate::crypto::keys::PrivateKey;
use crate::crypto::password::{derive_key, generate_salt, KdfParams};
use crate::error::{KeysError, Result};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm,
};
use std::fmt;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// The length of the nonce used for AES-GCM encryption.
pub const NONCE_LENGTH: usize = 12;

/// Length of the KDF parameter header in front of the nonce.
const PARAMS_LENGTH: usize = 12;

/// AES-GCM authentication tag length.
const TAG_LENGTH: usize = 16;

/// An encrypted private key and the salt it was encrypted under.
///
/// An empty salt marks an unencrypted secret (empty passphrase).
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct EncryptedSecret {
    salt: Vec<u8>,
    ciphertext: Vec<u8>,
}

impl EncryptedSecret {
    pub fn new(salt: Vec<u8>, ciphertext: Vec<u8>) -> Self {
        Self { salt, ciphertext }
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn is_encrypted(&self) -> bool {
        !self.salt.is_empty()
    }
}

impl fmt::Debug for EncryptedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedSecret")
            .field("salt", &hex::encode_upper(&self.salt))
            .field("ciphertext_len", &self.ciphertext.len())
            .finish()
    }
}

/// Turns private keys into storable secrets and back.
pub trait Encoder: Send + Sync {
    fn encrypt(&self, key: &PrivateKey, passphrase: &str) -> Result<EncryptedSecret>;

    /// Fails with [`KeysError::InvalidPassphraseError`] when the passphrase
    /// is wrong or the ciphertext was tampered with.
    fn decrypt(&self, secret: &EncryptedSecret, passphrase: &str) -> Result<PrivateKey>;
}

/// Argon2id + AES-256-GCM encoder.
///
/// An empty passphrase stores the raw key bytes with an empty salt. This is
/// deliberate and kept only for compatibility with unprotected keyrings.
#[derive(Debug, Clone, Default)]
pub struct SecretBox {
    params: KdfParams,
}

impl SecretBox {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }
}

impl Encoder for SecretBox {
    fn encrypt(&self, key: &PrivateKey, passphrase: &str) -> Result<EncryptedSecret> {
        let plaintext = key.to_bytes();
        if passphrase.is_empty() {
            return Ok(EncryptedSecret::new(Vec::new(), plaintext.to_vec()));
        }

        let salt = generate_salt();
        debug!(
            memory_kib = self.params.memory_kib(),
            iterations = self.params.iterations(),
            "Deriving encryption key"
        );
        let derived_key = derive_key(passphrase, &salt, &self.params)?;

        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut nonce_bytes);

        let cipher = Aes256Gcm::new_from_slice(&derived_key[..])
            .map_err(|e| KeysError::EncryptionError(format!("Invalid key length: {}", e)))?;
        let sealed = cipher
            .encrypt(&nonce_bytes.into(), plaintext.as_slice())
            .map_err(|e| KeysError::EncryptionError(format!("Encryption failed: {}", e)))?;

        let mut output = Vec::with_capacity(PARAMS_LENGTH + NONCE_LENGTH + sealed.len());
        output.extend_from_slice(&self.params.memory_kib().to_be_bytes());
        output.extend_from_slice(&self.params.iterations().to_be_bytes());
        output.extend_from_slice(&self.params.parallelism().to_be_bytes());
        output.extend_from_slice(&nonce_bytes);
        output.extend_from_slice(&sealed);

        Ok(EncryptedSecret::new(salt.to_vec(), output))
    }

    fn decrypt(&self, secret: &EncryptedSecret, passphrase: &str) -> Result<PrivateKey> {
        match (secret.is_encrypted(), passphrase.is_empty()) {
            (false, true) => return PrivateKey::from_bytes(secret.ciphertext()),
            (false, false) | (true, true) => return Err(KeysError::InvalidPassphraseError),
            (true, false) => {}
        }

        let encrypted = secret.ciphertext();
        let min_length = PARAMS_LENGTH + NONCE_LENGTH + TAG_LENGTH;
        if encrypted.len() < min_length {
            return Err(KeysError::EncryptionError(format!(
                "Encrypted data too short: expected at least {} bytes, got {}",
                min_length,
                encrypted.len()
            )));
        }

        let (header, rest) = encrypted.split_at(PARAMS_LENGTH);
        let (nonce_bytes, sealed) = rest.split_at(NONCE_LENGTH);
        let params = KdfParams::new(
            read_u32(&header[0..4]),
            read_u32(&header[4..8]),
            read_u32(&header[8..12]),
        )?;

        let derived_key = derive_key(passphrase, secret.salt(), &params)?;
        let cipher = Aes256Gcm::new_from_slice(&derived_key[..])
            .map_err(|e| KeysError::EncryptionError(format!("Invalid key length: {}", e)))?;

        let plaintext = Zeroizing::new(
            cipher
                .decrypt(nonce_bytes.into(), sealed)
                .map_err(|_| KeysError::InvalidPassphraseError)?,
        );

        PrivateKey::from_bytes(&plaintext)
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_be_bytes(buf)
}

/// Stores raw key bytes and ignores the passphrase. Tests only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Noop;

impl Encoder for Noop {
    fn encrypt(&self, key: &PrivateKey, _passphrase: &str) -> Result<EncryptedSecret> {
        Ok(EncryptedSecret::new(Vec::new(), key.to_bytes().to_vec()))
    }

    fn decrypt(&self, secret: &EncryptedSecret, _passphrase: &str) -> Result<PrivateKey> {
        PrivateKey::from_bytes(secret.ciphertext())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::generator::{Ed25519Generator, Generator, Secp256k1Generator};
    use crate::crypto::password::SALT_LENGTH;

    fn test_box() -> SecretBox {
        SecretBox::new(KdfParams::low_cost())
    }

    fn test_key() -> PrivateKey {
        Ed25519Generator.generate(b"encryption test").unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let encoder = test_box();
        for key in [test_key(), Secp256k1Generator.generate(b"k1").unwrap()] {
            let secret = encoder.encrypt(&key, "secure-passphrase").unwrap();
            let decrypted = encoder.decrypt(&secret, "secure-passphrase").unwrap();

            assert_eq!(*key.to_bytes(), *decrypted.to_bytes());
        }
    }

    #[test]
    fn test_encrypt_produces_different_output() {
        let encoder = test_box();
        let key = test_key();

        let secret1 = encoder.encrypt(&key, "passphrase").unwrap();
        let secret2 = encoder.encrypt(&key, "passphrase").unwrap();

        assert_ne!(secret1, secret2);
    }

    #[test]
    fn test_encrypt_output_format() {
        let encoder = test_box();
        let key = test_key();
        let secret = encoder.encrypt(&key, "passphrase").unwrap();

        assert_eq!(secret.salt().len(), SALT_LENGTH);
        assert_eq!(
            secret.ciphertext().len(),
            PARAMS_LENGTH + NONCE_LENGTH + key.to_bytes().len() + TAG_LENGTH
        );
        assert_eq!(read_u32(&secret.ciphertext()[0..4]), KdfParams::low_cost().memory_kib());
    }

    #[test]
    fn test_decrypt_wrong_passphrase() {
        let encoder = test_box();
        let secret = encoder.encrypt(&test_key(), "correct-passphrase").unwrap();

        match encoder.decrypt(&secret, "wrong-passphrase") {
            Err(KeysError::InvalidPassphraseError) => {}
            _ => panic!("Expected InvalidPassphraseError"),
        }
    }

    #[test]
    fn test_decrypt_corrupted_data() {
        let encoder = test_box();
        let secret = encoder.encrypt(&test_key(), "passphrase").unwrap();

        let mut ciphertext = secret.ciphertext().to_vec();
        let len = ciphertext.len();
        ciphertext[len - 1] ^= 0xFF;
        let tampered = EncryptedSecret::new(secret.salt().to_vec(), ciphertext);

        match encoder.decrypt(&tampered, "passphrase") {
            Err(KeysError::InvalidPassphraseError) => {}
            _ => panic!("Expected InvalidPassphraseError"),
        }
    }

    #[test]
    fn test_decrypt_too_short() {
        let secret = EncryptedSecret::new(vec![0u8; SALT_LENGTH], vec![0u8; 20]);

        match test_box().decrypt(&secret, "passphrase") {
            Err(KeysError::EncryptionError(msg)) => assert!(msg.contains("too short")),
            _ => panic!("Expected EncryptionError"),
        }
    }

    #[test]
    fn test_decrypt_uses_stored_params() {
        let key = test_key();
        let writer = SecretBox::new(KdfParams::new(512, 2, 1).unwrap());
        let secret = writer.encrypt(&key, "passphrase").unwrap();

        let reader = test_box();
        let decrypted = reader.decrypt(&secret, "passphrase").unwrap();

        assert_eq!(*key.to_bytes(), *decrypted.to_bytes());
    }

    #[test]
    fn test_decrypt_rejects_excessive_stored_params() {
        let secret = test_box().encrypt(&test_key(), "passphrase").unwrap();

        let mut ciphertext = secret.ciphertext().to_vec();
        ciphertext[4..8].copy_from_slice(&u32::MAX.to_be_bytes());
        let crafted = EncryptedSecret::new(secret.salt().to_vec(), ciphertext);

        match test_box().decrypt(&crafted, "passphrase") {
            Err(KeysError::KeyDerivationError(msg)) => assert!(msg.contains("Iteration count")),
            _ => panic!("Expected KeyDerivationError"),
        }
    }

    #[test]
    fn test_empty_passphrase_stores_raw_bytes() {
        let encoder = test_box();
        let key = test_key();

        let secret = encoder.encrypt(&key, "").unwrap();
        assert!(secret.salt().is_empty());
        assert!(!secret.is_encrypted());
        assert_eq!(secret.ciphertext(), key.to_bytes().as_slice());

        let decrypted = encoder.decrypt(&secret, "").unwrap();
        assert_eq!(*key.to_bytes(), *decrypted.to_bytes());
    }

    #[test]
    fn test_empty_passphrase_mismatch() {
        let encoder = test_box();
        let key = test_key();

        let salted = encoder.encrypt(&key, "passphrase").unwrap();
        assert!(matches!(
            encoder.decrypt(&salted, ""),
            Err(KeysError::InvalidPassphraseError)
        ));

        let raw = encoder.encrypt(&key, "").unwrap();
        assert!(matches!(
            encoder.decrypt(&raw, "passphrase"),
            Err(KeysError::InvalidPassphraseError)
        ));
    }

    #[test]
    fn test_noop_ignores_passphrase() {
        let key = test_key();
        let secret = Noop.encrypt(&key, "anything").unwrap();
        let decrypted = Noop.decrypt(&secret, "something else").unwrap();

        assert_eq!(*key.to_bytes(), *decrypted.to_bytes());
    }

    #[test]
    fn test_debug_hides_ciphertext() {
        let secret = Noop.encrypt(&test_key(), "").unwrap();
        let rendered = format!("{:?}", secret);

        assert!(rendered.contains("ciphertext_len"));
        assert!(!rendered.contains(&hex::encode_upper(secret.ciphertext())));
    }
}
