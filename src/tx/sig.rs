//! Single-signature envelopes.

use crate::crypto::keys::PublicKey;
use crate::error::{KeysError, Result};
use crate::tx::wire::{put_bytes, Reader};
use crate::tx::{hex_bytes, EnvelopeKind, Signable};
use serde::{Deserialize, Serialize};

/// A signature together with the key that claims to have made it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signed {
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
    pub public_key: Option<PublicKey>,
}

impl Signed {
    pub fn new(public_key: PublicKey, signature: Vec<u8>) -> Self {
        Self {
            signature,
            public_key: Some(public_key),
        }
    }

    /// True when either the signature or the key is missing.
    pub fn is_empty(&self) -> bool {
        self.signature.is_empty() || self.public_key.is_none()
    }

    /// Check the signature over `message` and return the signer.
    pub fn verify(&self, message: &[u8]) -> Result<PublicKey> {
        let public_key = match (&self.public_key, self.signature.is_empty()) {
            (Some(public_key), false) => public_key,
            _ => {
                return Err(KeysError::MissingSignatureError(
                    "signature or public key is unset".to_string(),
                ))
            }
        };
        public_key.verify(message, &self.signature)?;
        Ok(public_key.clone())
    }

    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        put_bytes(buf, &self.signature);
        match &self.public_key {
            Some(public_key) => put_bytes(buf, &public_key.to_bytes()),
            None => put_bytes(buf, &[]),
        }
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let signature = reader.read_bytes()?.to_vec();
        let key_bytes = reader.read_bytes()?;
        let public_key = if key_bytes.is_empty() {
            None
        } else {
            Some(
                PublicKey::from_bytes(key_bytes)
                    .map_err(|e| KeysError::DecodeError(format!("public key: {}", e)))?,
            )
        };
        Ok(Self {
            signature,
            public_key,
        })
    }
}

/// A payload that takes exactly one signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sig {
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
    pub signed: Signed,
}

impl Sig {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            signed: Signed::default(),
        }
    }

    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        put_bytes(buf, &self.payload);
        self.signed.encode(buf);
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let payload = reader.read_bytes()?.to_vec();
        let signed = Signed::decode(reader)?;
        Ok(Self { payload, signed })
    }
}

impl Signable for Sig {
    fn sign_bytes(&self) -> Vec<u8> {
        self.payload.clone()
    }

    fn sign(&mut self, public_key: PublicKey, signature: Vec<u8>) -> Result<()> {
        if !self.signed.is_empty() {
            return Err(KeysError::AlreadySignedError);
        }
        if signature.is_empty() {
            return Err(KeysError::MissingSignatureError("empty signature".to_string()));
        }
        self.signed = Signed::new(public_key, signature);
        Ok(())
    }

    fn signers(&self) -> Result<Vec<PublicKey>> {
        Ok(vec![self.signed.verify(&self.sign_bytes())?])
    }

    fn tx_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = vec![EnvelopeKind::Sig.type_byte()];
        self.encode(&mut buf);
        Ok(buf)
    }
}
