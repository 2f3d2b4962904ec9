//! Cryptographic primitives for the keyring.
//!
//! - [`keys`]: algorithm-tagged private and public keys, addresses
//! - [`generator`]: deterministic key generation from a seed
//! - [`password`]: Argon2id key derivation
//! - [`encryption`]: passphrase encryption of private keys
//!
//! # Example
//!
//! ```rust
//! use tmkeys::crypto::encryption::{Encoder, SecretBox};
//! use tmkeys::crypto::generator::{generate_seed, generator_by_name};
//! use tmkeys::crypto::password::KdfParams;
//!
//! # fn example() -> tmkeys::error::Result<()> {
//! let key = generator_by_name("ed25519")?.generate(&generate_seed()[..])?;
//!
//! let encoder = SecretBox::new(KdfParams::low_cost());
//! let secret = encoder.encrypt(&key, "secure-passphrase")?;
//! let decrypted = encoder.decrypt(&secret, "secure-passphrase")?;
//! assert_eq!(key.public_key(), decrypted.public_key());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod encryption;
pub mod generator;
pub mod keys;
pub mod password;

pub use encryption::{EncryptedSecret, Encoder, Noop, SecretBox};
pub use generator::Generator;
pub use keys::{Address, Algorithm, PrivateKey, PublicKey};
pub use password::KdfParams;
