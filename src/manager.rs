//! The keyring manager.
//!
//! [`Manager`] combines an [`Encoder`], a [`Storage`] and a [`Codec`] and
//! exposes the key lifecycle: create, look up, list, delete, sign, change
//! passphrase, and move keys in and out as phrases or armored text.
//!
//! Decrypted keys live only for the duration of a call and are wiped when
//! dropped.

use crate::codec::Codec;
use crate::crypto::encryption::{EncryptedSecret, Encoder, SecretBox};
use crate::crypto::generator::{generate_seed, generator_by_name};
use crate::crypto::keys::{Address, Algorithm, PrivateKey, PublicKey};
use crate::crypto::password::KdfParams;
use crate::error::{KeysError, Result};
use crate::storage::armor::{encode_armor, unarmor, Headers};
use crate::storage::{validate_name, Info, Infos, Storage};
use crate::tx::Signable;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Armor label for exported public keys.
pub const PUBLIC_KEY_BLOCK_TYPE: &str = "TENDERMINT PUBLIC KEY";

/// Armor label for exported private keys.
pub const PRIVATE_KEY_BLOCK_TYPE: &str = "TENDERMINT PRIVATE KEY";

/// Value of the `kdf` header on exported private keys.
pub const EXPORT_KDF: &str = "argon2id";

/// Key lifecycle operations over pluggable encoder, storage and codec.
pub struct Manager {
    encoder: Box<dyn Encoder>,
    storage: Box<dyn Storage>,
    codec: Box<dyn Codec>,
    export_params: KdfParams,
}

impl Manager {
    pub fn new(
        encoder: Box<dyn Encoder>,
        storage: Box<dyn Storage>,
        codec: Box<dyn Codec>,
    ) -> Self {
        Self {
            encoder,
            storage,
            codec,
            export_params: KdfParams::default(),
        }
    }

    /// Argon2id costs used when exporting armored private keys.
    pub fn with_export_params(mut self, params: KdfParams) -> Self {
        self.export_params = params;
        self
    }

    /// Generate a new key from a fresh random seed and store it under `name`.
    ///
    /// # Arguments
    ///
    /// * `name` - Name to store the key under; must not be taken
    /// * `passphrase` - Passphrase to encrypt the key with
    /// * `algorithm` - Canonical algorithm name, `ed25519` or `secp256k1`
    pub fn create(&self, name: &str, passphrase: &str, algorithm: &str) -> Result<Info> {
        let generator = generator_by_name(algorithm)?;
        self.ensure_free(name)?;

        let key = generator.generate(&generate_seed()[..])?;
        let info = self.persist(name, passphrase, &key)?;

        info!(name = %name, algorithm = %info.algorithm(), address = %info.address, "Created key");
        Ok(info)
    }

    pub fn get(&self, name: &str) -> Result<Info> {
        Ok(self.storage.get(name)?.info)
    }

    pub fn get_by_address(&self, address: &Address) -> Result<Info> {
        self.storage
            .list()?
            .into_iter()
            .find(|info| &info.address == address)
            .ok_or_else(|| KeysError::NotFoundError(format!("No key with address {}", address)))
    }

    pub fn has_key(&self, name: &str) -> Result<bool> {
        match self.storage.get(name) {
            Ok(_) => Ok(true),
            Err(KeysError::NotFoundError(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// All keys, sorted by name.
    pub fn list(&self) -> Result<Infos> {
        self.storage.list()
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        self.storage.delete(name)?;
        info!(name = %name, "Deleted key");
        Ok(())
    }

    /// Sign `envelope` with the key stored under `name`.
    ///
    /// The signature covers `envelope.sign_bytes()` and is handed to
    /// `envelope.sign`, whose errors (such as `AlreadySignedError`) are
    /// returned unchanged.
    pub fn sign<T: Signable + ?Sized>(
        &self,
        name: &str,
        passphrase: &str,
        envelope: &mut T,
    ) -> Result<()> {
        let (signature, public_key) = self.sign_bytes(name, passphrase, &envelope.sign_bytes())?;
        envelope.sign(public_key, signature)
    }

    /// Sign raw bytes, returning the signature and the signer's public key.
    pub fn sign_bytes(
        &self,
        name: &str,
        passphrase: &str,
        message: &[u8],
    ) -> Result<(Vec<u8>, PublicKey)> {
        let key = self.decrypt(name, passphrase)?;
        debug!(name = %name, len = message.len(), "Signing");
        Ok((key.sign(message), key.public_key()))
    }

    /// Re-encrypt the key under `name` with a new passphrase.
    ///
    /// The record is replaced by delete then put. If the put fails the old
    /// record is written back.
    pub fn update(&self, name: &str, old_passphrase: &str, new_passphrase: &str) -> Result<()> {
        let record = self.storage.get(name)?;
        let key = self.encoder.decrypt(&record.secret, old_passphrase)?;
        let secret = self.encoder.encrypt(&key, new_passphrase)?;

        self.storage.delete(name)?;
        if let Err(e) = self.storage.put(name, &secret, &record.info) {
            warn!(name = %name, error = %e, "Update failed, restoring previous record");
            if let Err(restore) = self.storage.put(name, &record.secret, &record.info) {
                warn!(name = %name, error = %restore, "Could not restore previous record");
            }
            return Err(e);
        }

        info!(name = %name, "Updated key passphrase");
        Ok(())
    }

    /// Export the private key under `name` as a codec phrase.
    pub fn export_phrase(&self, name: &str, passphrase: &str) -> Result<Zeroizing<String>> {
        let key = self.decrypt(name, passphrase)?;
        let phrase = self.codec.encode(&key.to_bytes())?;
        info!(name = %name, "Exported key phrase");
        Ok(phrase)
    }

    /// Store the key encoded in `phrase` under `name`.
    pub fn recover(&self, name: &str, passphrase: &str, phrase: &str) -> Result<Info> {
        self.ensure_free(name)?;

        let bytes = self.codec.decode(phrase)?;
        let key = PrivateKey::from_bytes(&bytes)?;
        let info = self.persist(name, passphrase, &key)?;

        info!(name = %name, address = %info.address, "Recovered key");
        Ok(info)
    }

    /// Armored public key with a `type` header naming the algorithm.
    pub fn export_pub_key_armor(&self, name: &str) -> Result<String> {
        let info = self.get(name)?;
        let mut headers = Headers::new();
        headers.insert("type".to_string(), info.algorithm().name().to_string());
        encode_armor(PUBLIC_KEY_BLOCK_TYPE, &headers, &info.public_key.raw_bytes())
    }

    /// Armored private key, re-encrypted under `encrypt_passphrase`.
    pub fn export_priv_key_armor(
        &self,
        name: &str,
        decrypt_passphrase: &str,
        encrypt_passphrase: &str,
    ) -> Result<String> {
        if encrypt_passphrase.is_empty() {
            return Err(KeysError::InvalidPassphraseError);
        }
        let key = self.decrypt(name, decrypt_passphrase)?;
        let secret = SecretBox::new(self.export_params).encrypt(&key, encrypt_passphrase)?;

        let mut headers = Headers::new();
        headers.insert("kdf".to_string(), EXPORT_KDF.to_string());
        headers.insert("salt".to_string(), hex::encode_upper(secret.salt()));
        headers.insert("type".to_string(), key.algorithm().name().to_string());

        let armor = encode_armor(PRIVATE_KEY_BLOCK_TYPE, &headers, secret.ciphertext())?;
        info!(name = %name, "Exported armored private key");
        Ok(armor)
    }

    /// Decrypt an armored private key with `passphrase` and store it under
    /// `name`, encrypted with the same passphrase.
    pub fn import_priv_key_armor(&self, name: &str, armor: &str, passphrase: &str) -> Result<Info> {
        self.ensure_free(name)?;

        let armor = unarmor(armor, PRIVATE_KEY_BLOCK_TYPE)?;
        let header = |key: &str| {
            armor
                .headers
                .get(key)
                .ok_or_else(|| KeysError::MalformedArmorError(format!("missing '{}' header", key)))
        };

        let kdf = header("kdf")?;
        if kdf != EXPORT_KDF {
            return Err(KeysError::KeyDerivationError(format!("Unrecognized KDF type: {}", kdf)));
        }
        let algorithm: Algorithm = header("type")?.parse()?;
        let salt = hex::decode(header("salt")?)
            .map_err(|e| KeysError::MalformedArmorError(format!("invalid salt header: {}", e)))?;

        let secret = EncryptedSecret::new(salt, armor.body.clone());
        let key = SecretBox::new(self.export_params).decrypt(&secret, passphrase)?;
        if key.algorithm() != algorithm {
            return Err(KeysError::InvalidKeyError(format!(
                "Armor declares {} but holds a {} key",
                algorithm,
                key.algorithm()
            )));
        }

        let info = self.persist(name, passphrase, &key)?;
        info!(name = %name, address = %info.address, "Imported armored private key");
        Ok(info)
    }

    pub fn supported_algorithms(&self) -> Vec<Algorithm> {
        Algorithm::ALL.to_vec()
    }

    fn ensure_free(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        if self.has_key(name)? {
            return Err(KeysError::AlreadyExistsError(format!(
                "Key '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    fn persist(&self, name: &str, passphrase: &str, key: &PrivateKey) -> Result<Info> {
        let info = Info::new(name, key.public_key());
        let secret = self.encoder.encrypt(key, passphrase)?;
        self.storage.put(name, &secret, &info)?;
        Ok(info)
    }

    fn decrypt(&self, name: &str, passphrase: &str) -> Result<PrivateKey> {
        let record = self.storage.get(name)?;
        self.encoder.decrypt(&record.secret, passphrase)
    }
}
