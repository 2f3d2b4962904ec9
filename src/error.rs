//! Error types for the tmkeys library.
//!
//! Every failure in the keyring is reported to the immediate caller through
//! [`KeysError`]; nothing in the library aborts the process.

use thiserror::Error;

/// The main error type for keyring operations.
#[derive(Error, Debug)]
pub enum KeysError {
    /// No key is stored under the requested name or address
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// A key is already stored under the requested name
    #[error("Already exists: {0}")]
    AlreadyExistsError(String),

    /// Decryption failed: wrong passphrase or tampered ciphertext
    #[error("Invalid passphrase")]
    InvalidPassphraseError,

    /// Unknown algorithm name or type tag
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithmError(String),

    /// Text is not a well-formed armor block
    #[error("Malformed armor: {0}")]
    MalformedArmorError(String),

    /// Armor block carries a different label than expected
    #[error("Unknown block type: expected '{expected}', found '{found}'")]
    UnknownBlockTypeError { expected: String, found: String },

    /// A single-signature envelope was signed a second time
    #[error("Transaction already signed")]
    AlreadySignedError,

    /// Signature or public key is absent
    #[error("Missing signature: {0}")]
    MissingSignatureError(String),

    /// A signature does not verify against the payload
    #[error("Invalid signature: {0}")]
    InvalidSignatureError(String),

    /// The private key file was removed but the public file was not
    #[error("Partial delete of '{name}': {source}")]
    PartialDeleteError {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Key name cannot be used as a storage key
    #[error("Invalid key name: {0}")]
    InvalidNameError(String),

    /// Invalid key format or content
    #[error("Invalid key: {0}")]
    InvalidKeyError(String),

    /// Cryptographic operation failed
    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    /// Encryption failed or ciphertext is structurally broken
    #[error("Encryption/decryption error: {0}")]
    EncryptionError(String),

    /// Key derivation failed
    #[error("Key derivation error: {0}")]
    KeyDerivationError(String),

    /// Binary wire data could not be decoded
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Secret phrase could not be encoded or decoded
    #[error("Codec error: {0}")]
    CodecError(String),

    /// A configuration value or command-line argument could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Storage I/O error
    #[error("Storage I/O error: {0}")]
    StorageError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for keyring operations.
pub type Result<T> = std::result::Result<T, KeysError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KeysError::NotFoundError("alice".to_string());
        assert_eq!(err.to_string(), "Not found: alice");

        let err = KeysError::UnknownBlockTypeError {
            expected: "Tendermint Light Client".to_string(),
            found: "CERTIFICATE".to_string(),
        };
        assert!(err.to_string().contains("CERTIFICATE"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KeysError>();
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err: KeysError = io.into();
        assert!(matches!(err, KeysError::StorageError(_)));
    }
}
