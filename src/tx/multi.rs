//! Multi-signature envelopes.

use crate::crypto::keys::PublicKey;
use crate::error::{KeysError, Result};
use crate::tx::sig::Signed;
use crate::tx::wire::{put_bytes, put_uvarint, Reader};
use crate::tx::{hex_bytes, EnvelopeKind, Signable};
use serde::{Deserialize, Serialize};

/// A payload that collects any number of signatures in signing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSig {
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
    pub signatures: Vec<Signed>,
}

impl MultiSig {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            signatures: Vec::new(),
        }
    }

    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        put_bytes(buf, &self.payload);
        put_uvarint(buf, self.signatures.len() as u64);
        for signed in &self.signatures {
            signed.encode(buf);
        }
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let payload = reader.read_bytes()?.to_vec();
        let count = reader.read_uvarint()?;
        let mut signatures = Vec::new();
        for _ in 0..count {
            signatures.push(Signed::decode(reader)?);
        }
        Ok(Self {
            payload,
            signatures,
        })
    }
}

impl Signable for MultiSig {
    fn sign_bytes(&self) -> Vec<u8> {
        self.payload.clone()
    }

    fn sign(&mut self, public_key: PublicKey, signature: Vec<u8>) -> Result<()> {
        if signature.is_empty() {
            return Err(KeysError::MissingSignatureError("empty signature".to_string()));
        }
        self.signatures.push(Signed::new(public_key, signature));
        Ok(())
    }

    fn signers(&self) -> Result<Vec<PublicKey>> {
        if self.signatures.is_empty() {
            return Err(KeysError::MissingSignatureError("no signatures".to_string()));
        }
        let message = self.sign_bytes();
        self.signatures
            .iter()
            .map(|signed| signed.verify(&message))
            .collect()
    }

    fn tx_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = vec![EnvelopeKind::MultiSig.type_byte()];
        self.encode(&mut buf);
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::generator::{Ed25519Generator, Generator, Secp256k1Generator};

    #[test]
    fn test_signers_in_signing_order() {
        let a = Ed25519Generator.generate(b"a").unwrap();
        let b = Secp256k1Generator.generate(b"b").unwrap();
        let mut tx = MultiSig::new(b"multi payload".to_vec());

        assert!(matches!(tx.signers(), Err(KeysError::MissingSignatureError(_))));

        let message = tx.sign_bytes();
        tx.sign(a.public_key(), a.sign(&message)).unwrap();
        tx.sign(b.public_key(), b.sign(&message)).unwrap();

        assert_eq!(tx.sign_bytes(), message);
        assert_eq!(tx.signers().unwrap(), vec![a.public_key(), b.public_key()]);
    }

    #[test]
    fn test_one_bad_signature_fails() {
        let a = Ed25519Generator.generate(b"a").unwrap();
        let b = Ed25519Generator.generate(b"b").unwrap();
        let mut tx = MultiSig::new(b"multi payload".to_vec());

        let message = tx.sign_bytes();
        tx.sign(a.public_key(), a.sign(&message)).unwrap();
        tx.sign(b.public_key(), a.sign(&message)).unwrap();

        assert!(matches!(tx.signers(), Err(KeysError::InvalidSignatureError(_))));
    }

    #[test]
    fn test_tx_bytes_grow_with_signatures() {
        let a = Ed25519Generator.generate(b"a").unwrap();
        let mut tx = MultiSig::new(b"payload".to_vec());
        let unsigned = tx.tx_bytes().unwrap();

        tx.sign(a.public_key(), a.sign(&tx.sign_bytes())).unwrap();

        let signed = tx.tx_bytes().unwrap();
        assert_eq!(signed[0], EnvelopeKind::MultiSig.type_byte());
        assert!(signed.len() > unsigned.len());
    }
}
