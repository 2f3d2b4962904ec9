//! tmkeys: a local keyring for light clients
//!
//! This library keeps signing keys on disk, encrypted under a passphrase,
//! and signs transaction envelopes with them. It provides:
//!
//! - Ed25519 and secp256k1 keys, generated deterministically from a seed
//! - Argon2id + AES-256-GCM passphrase encryption
//! - File-backed storage in armored text files, or in-memory storage
//! - Single- and multi-signature envelopes with JSON and binary encodings
//!
//! # Architecture
//!
//! [`Manager`] is built from three pluggable parts: an
//! [`Encoder`](crypto::Encoder) that encrypts keys, a
//! [`Storage`](storage::Storage) that persists them, and a
//! [`Codec`](codec::Codec) that turns secrets into phrases. Every operation
//! returns a [`Result`]; nothing in the library panics on bad input.
//!
//! # Example
//!
//! ```rust
//! use tmkeys::config::{Backend, KeysConfig};
//! use tmkeys::crypto::password::KdfParams;
//! use tmkeys::tx::{Sig, Signable};
//!
//! fn example() -> tmkeys::Result<()> {
//!     let manager = KeysConfig::new("unused")
//!         .with_backend(Backend::Memory)
//!         .with_kdf(KdfParams::low_cost())
//!         .build()?;
//!
//!     let info = manager.create("alice", "passphrase", "ed25519")?;
//!
//!     let mut tx = Sig::new(b"send 10 atoms to bob".to_vec());
//!     manager.sign("alice", "passphrase", &mut tx)?;
//!     assert_eq!(tx.signers()?, vec![info.public_key]);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod manager;
pub mod storage;
pub mod tx;

// Re-export commonly used types
pub use config::KeysConfig;
pub use error::{KeysError, Result};
pub use manager::Manager;
pub use storage::{Info, Infos};
