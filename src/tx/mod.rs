//! Signable transaction envelopes.
//!
//! An envelope wraps an opaque payload and records the signatures made over
//! it. Two kinds exist, [`Sig`] and [`MultiSig`]. [`Envelope`] is the closed
//! set of kinds, and it serializes with a type tag so that a value of
//! either kind can be decoded without knowing the kind up front:
//!
//! | kind       | JSON `"type"` | binary tag |
//! |------------|---------------|------------|
//! | `Sig`      | `sig`         | `0x01`     |
//! | `MultiSig` | `multisig`    | `0x02`     |

pub mod multi;
pub mod sig;
pub mod wire;

pub use multi::MultiSig;
pub use sig::{Sig, Signed};

use crate::crypto::keys::PublicKey;
use crate::error::{KeysError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use wire::Reader;

/// Something that can be signed by a key in the keyring.
pub trait Signable {
    /// Canonical bytes to sign. Unchanged by signing.
    fn sign_bytes(&self) -> Vec<u8>;

    /// Record a signature made by `public_key` over [`Signable::sign_bytes`].
    fn sign(&mut self, public_key: PublicKey, signature: Vec<u8>) -> Result<()>;

    /// Verified signers in signing order.
    ///
    /// Fails with `MissingSignatureError` when nothing has been signed and
    /// with `InvalidSignatureError` if any signature does not verify.
    fn signers(&self) -> Result<Vec<PublicKey>>;

    /// Binary wire form, signatures included.
    fn tx_bytes(&self) -> Result<Vec<u8>>;
}

/// Registry of envelope kinds and their stable tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    Sig,
    MultiSig,
}

impl EnvelopeKind {
    pub const ALL: [EnvelopeKind; 2] = [EnvelopeKind::Sig, EnvelopeKind::MultiSig];

    pub fn name(self) -> &'static str {
        match self {
            EnvelopeKind::Sig => "sig",
            EnvelopeKind::MultiSig => "multisig",
        }
    }

    pub fn type_byte(self) -> u8 {
        match self {
            EnvelopeKind::Sig => 0x01,
            EnvelopeKind::MultiSig => 0x02,
        }
    }

    pub fn from_type_byte(tag: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_byte() == tag)
            .ok_or_else(|| KeysError::DecodeError(format!("unknown envelope type 0x{:02x}", tag)))
    }
}

impl FromStr for EnvelopeKind {
    type Err = KeysError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| KeysError::DecodeError(format!("unknown envelope type '{}'", s)))
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Any envelope kind, tagged for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Envelope {
    #[serde(rename = "sig")]
    Sig(Sig),
    #[serde(rename = "multisig")]
    MultiSig(MultiSig),
}

impl Envelope {
    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Envelope::Sig(_) => EnvelopeKind::Sig,
            Envelope::MultiSig(_) => EnvelopeKind::MultiSig,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![self.kind().type_byte()];
        match self {
            Envelope::Sig(tx) => tx.encode(&mut buf),
            Envelope::MultiSig(tx) => tx.encode(&mut buf),
        }
        buf
    }

    /// Decode the binary form. The whole buffer must be consumed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let envelope = match EnvelopeKind::from_type_byte(reader.read_u8()?)? {
            EnvelopeKind::Sig => Envelope::Sig(Sig::decode(&mut reader)?),
            EnvelopeKind::MultiSig => Envelope::MultiSig(MultiSig::decode(&mut reader)?),
        };
        reader.finish()?;
        Ok(envelope)
    }

    fn inner(&self) -> &dyn Signable {
        match self {
            Envelope::Sig(tx) => tx,
            Envelope::MultiSig(tx) => tx,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Signable {
        match self {
            Envelope::Sig(tx) => tx,
            Envelope::MultiSig(tx) => tx,
        }
    }
}

impl From<Sig> for Envelope {
    fn from(tx: Sig) -> Self {
        Envelope::Sig(tx)
    }
}

impl From<MultiSig> for Envelope {
    fn from(tx: MultiSig) -> Self {
        Envelope::MultiSig(tx)
    }
}

impl Signable for Envelope {
    fn sign_bytes(&self) -> Vec<u8> {
        self.inner().sign_bytes()
    }

    fn sign(&mut self, public_key: PublicKey, signature: Vec<u8>) -> Result<()> {
        self.inner_mut().sign(public_key, signature)
    }

    fn signers(&self) -> Result<Vec<PublicKey>> {
        self.inner().signers()
    }

    fn tx_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.to_bytes())
    }
}

/// Serde adapter for byte strings as uppercase hex.
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode_upper(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::generator::{Ed25519Generator, Generator, Secp256k1Generator};
    use crate::crypto::keys::PrivateKey;

    fn key(seed: &[u8]) -> PrivateKey {
        Ed25519Generator.generate(seed).unwrap()
    }

    fn signed_sig() -> Sig {
        let signer = key(b"alice");
        let mut tx = Sig::new(b"hello".to_vec());
        let signature = signer.sign(&tx.sign_bytes());
        tx.sign(signer.public_key(), signature).unwrap();
        tx
    }

    fn signed_multisig() -> MultiSig {
        let a = key(b"a");
        let b = Secp256k1Generator.generate(b"b").unwrap();
        let mut tx = MultiSig::new(vec![0u8, 1, 2, 3]);
        let message = tx.sign_bytes();
        tx.sign(a.public_key(), a.sign(&message)).unwrap();
        tx.sign(b.public_key(), b.sign(&message)).unwrap();
        tx
    }

    #[test]
    fn test_registry_tags() {
        assert_eq!(EnvelopeKind::Sig.name(), "sig");
        assert_eq!(EnvelopeKind::MultiSig.type_byte(), 0x02);
        assert_eq!("multisig".parse::<EnvelopeKind>().unwrap(), EnvelopeKind::MultiSig);
        assert_eq!(EnvelopeKind::from_type_byte(0x01).unwrap(), EnvelopeKind::Sig);
        assert!("unknown".parse::<EnvelopeKind>().is_err());
        assert!(EnvelopeKind::from_type_byte(0x09).is_err());
    }

    #[test]
    fn test_json_roundtrip_restores_variant() {
        for envelope in [Envelope::from(signed_sig()), Envelope::from(signed_multisig())] {
            let json = envelope.to_json().unwrap();
            let decoded = Envelope::from_json(&json).unwrap();

            assert_eq!(decoded, envelope);
            assert_eq!(decoded.kind(), envelope.kind());
            assert_eq!(decoded.signers().unwrap(), envelope.signers().unwrap());
        }

        for envelope in [
            Envelope::from(Sig::new(b"unsigned".to_vec())),
            Envelope::from(MultiSig::new(b"unsigned".to_vec())),
        ] {
            let decoded = Envelope::from_json(&envelope.to_json().unwrap()).unwrap();

            assert_eq!(decoded, envelope);
            assert_eq!(decoded.kind(), envelope.kind());
            assert_eq!(decoded.sign_bytes(), b"unsigned".to_vec());
            assert!(matches!(decoded.signers(), Err(KeysError::MissingSignatureError(_))));
        }
    }

    #[test]
    fn test_json_shape() {
        let value = serde_json::to_value(Envelope::from(Sig::new(b"hi".to_vec()))).unwrap();

        assert_eq!(value["type"], "sig");
        assert_eq!(value["payload"], "6869");
        assert_eq!(value["signed"]["signature"], "");
        assert!(value["signed"]["public_key"].is_null());

        let value = serde_json::to_value(Envelope::from(MultiSig::new(b"hi".to_vec()))).unwrap();
        assert_eq!(value["type"], "multisig");
        assert_eq!(value["signatures"], serde_json::json!([]));
    }

    #[test]
    fn test_json_rejects_unknown_type() {
        let result = Envelope::from_json(r#"{"type":"triplesig","payload":""}"#);
        assert!(matches!(result, Err(KeysError::JsonError(_))));
    }

    #[test]
    fn test_binary_roundtrip_restores_variant() {
        for envelope in [
            Envelope::from(signed_sig()),
            Envelope::from(signed_multisig()),
            Envelope::from(Sig::new(Vec::new())),
        ] {
            let bytes = envelope.to_bytes();
            assert_eq!(bytes[0], envelope.kind().type_byte());
            assert_eq!(Envelope::from_bytes(&bytes).unwrap(), envelope);
        }
    }

    #[test]
    fn test_tx_bytes_match_envelope_bytes() {
        let tx = signed_sig();
        assert_eq!(tx.tx_bytes().unwrap(), Envelope::from(tx.clone()).to_bytes());

        let tx = signed_multisig();
        assert_eq!(tx.tx_bytes().unwrap(), Envelope::from(tx).tx_bytes().unwrap());
    }

    #[test]
    fn test_binary_rejects_bad_input() {
        let bytes = Envelope::from(signed_multisig()).to_bytes();

        let mut unknown = bytes.clone();
        unknown[0] = 0x7f;
        let mut trailing = bytes.clone();
        trailing.push(0);

        for bad in [&[][..], &unknown[..], &bytes[..bytes.len() - 1], &trailing[..]] {
            match Envelope::from_bytes(bad) {
                Err(KeysError::DecodeError(_)) => {}
                other => panic!("Expected DecodeError, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_envelope_delegates_signing() {
        let signer = key(b"delegate");
        let mut envelope = Envelope::from(Sig::new(b"payload".to_vec()));

        let signature = signer.sign(&envelope.sign_bytes());
        envelope.sign(signer.public_key(), signature.clone()).unwrap();

        assert_eq!(envelope.signers().unwrap(), vec![signer.public_key()]);
        assert!(matches!(
            envelope.sign(signer.public_key(), signature),
            Err(KeysError::AlreadySignedError)
        ));
    }
}
