//! Human-transcribable phrases for secret key material.

use crate::error::{KeysError, Result};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Converts secret bytes to a phrase and back.
pub trait Codec: Send + Sync {
    fn encode(&self, secret: &[u8]) -> Result<Zeroizing<String>>;

    fn decode(&self, phrase: &str) -> Result<Zeroizing<Vec<u8>>>;
}

/// Length of the checksum appended before encoding.
pub const CHECKSUM_LENGTH: usize = 4;

/// Characters per word in a [`HexCodec`] phrase.
pub const WORD_LENGTH: usize = 8;

/// Uppercase hex with a 4-byte SHA-256 checksum, split into 8-character
/// words.
///
/// ```
/// use tmkeys::codec::{Codec, HexCodec};
///
/// let phrase = HexCodec.encode(b"\x01\x02\x03").unwrap();
/// assert_eq!(phrase.as_str(), "01020303 9058C6");
/// assert_eq!(HexCodec.decode(&phrase).unwrap().as_slice(), b"\x01\x02\x03");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HexCodec;

fn checksum(data: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    let digest = Sha256::digest(data);
    let mut out = [0u8; CHECKSUM_LENGTH];
    out.copy_from_slice(&digest[..CHECKSUM_LENGTH]);
    out
}

impl Codec for HexCodec {
    fn encode(&self, secret: &[u8]) -> Result<Zeroizing<String>> {
        if secret.is_empty() {
            return Err(KeysError::CodecError("nothing to encode".to_string()));
        }

        let mut data = Zeroizing::new(secret.to_vec());
        data.extend_from_slice(&checksum(secret));
        let encoded = Zeroizing::new(hex::encode_upper(&data[..]));

        let mut phrase = Zeroizing::new(String::with_capacity(encoded.len() + encoded.len() / WORD_LENGTH));
        for (i, word) in encoded.as_bytes().chunks(WORD_LENGTH).enumerate() {
            if i > 0 {
                phrase.push(' ');
            }
            // hex output is ASCII
            phrase.push_str(&String::from_utf8_lossy(word));
        }
        Ok(phrase)
    }

    fn decode(&self, phrase: &str) -> Result<Zeroizing<Vec<u8>>> {
        let joined: Zeroizing<String> = Zeroizing::new(phrase.split_whitespace().collect());
        let mut data = Zeroizing::new(
            hex::decode(joined.as_str())
                .map_err(|e| KeysError::CodecError(format!("Invalid phrase: {}", e)))?,
        );

        if data.len() <= CHECKSUM_LENGTH {
            return Err(KeysError::CodecError("Phrase is too short".to_string()));
        }

        let split = data.len() - CHECKSUM_LENGTH;
        let expected = checksum(&data[..split]);
        if data[split..] != expected {
            return Err(KeysError::CodecError("Phrase checksum mismatch".to_string()));
        }

        data.truncate(split);
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_roundtrip() {
        let secret: Vec<u8> = (1..=33).collect();
        let phrase = HexCodec.encode(&secret).unwrap();

        assert!(phrase.split(' ').all(|word| word.len() <= WORD_LENGTH));
        assert_eq!(HexCodec.decode(&phrase).unwrap().as_slice(), secret.as_slice());
    }

    #[test]
    fn test_decode_is_lenient_on_whitespace_and_case() {
        let phrase = HexCodec.encode(b"secret").unwrap();
        let messy = format!("  {}\n", phrase.to_lowercase().replace(' ', "\t "));

        assert_eq!(HexCodec.decode(&messy).unwrap().as_slice(), b"secret");
    }

    #[test]
    fn test_decode_rejects_bad_checksum() {
        let mut phrase = HexCodec.encode(b"secret").unwrap().as_str().to_owned();
        let flipped = if phrase.starts_with('7') { "8" } else { "7" };
        phrase.replace_range(0..1, flipped);

        match HexCodec.decode(&phrase) {
            Err(KeysError::CodecError(msg)) => assert!(msg.contains("checksum")),
            _ => panic!("Expected CodecError"),
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        for phrase in ["", "zzzz", "0102", "ABC"] {
            assert!(matches!(HexCodec.decode(phrase), Err(KeysError::CodecError(_))));
        }
    }

    #[test]
    fn test_encode_rejects_empty() {
        assert!(matches!(HexCodec.encode(b""), Err(KeysError::CodecError(_))));
    }
}
