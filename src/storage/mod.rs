//! Key storage.
//!
//! A [`Storage`] persists `name -> (EncryptedSecret, Info)` records. Two
//! backends share the same contract: [`file::FileStorage`] writes armored
//! files to a directory, [`memory::MemoryStorage`] keeps records in a map.

pub mod armor;
pub mod file;
pub mod memory;
pub mod metadata;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use metadata::{Info, Infos};

use crate::crypto::encryption::EncryptedSecret;
use crate::error::{KeysError, Result};

/// The persisted unit: public info plus the encrypted private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub info: Info,
    pub secret: EncryptedSecret,
}

/// Backend contract shared by every key store.
pub trait Storage: Send + Sync {
    /// Persist a new record. Fails with `AlreadyExistsError` if `name` is taken.
    fn put(&self, name: &str, secret: &EncryptedSecret, info: &Info) -> Result<()>;

    /// Fetch a record. Fails with `NotFoundError` if `name` is absent.
    fn get(&self, name: &str) -> Result<StoredRecord>;

    /// All stored infos, sorted by name. Empty is not an error.
    fn list(&self) -> Result<Infos>;

    /// Remove a record. Fails with `NotFoundError` if `name` is absent.
    fn delete(&self, name: &str) -> Result<()>;
}

/// Reject names that cannot safely double as file names.
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.starts_with('.') {
        "name starts with '.'"
    } else if name.contains(['/', '\\', '\0']) {
        "name contains a path separator or NUL"
    } else if name.contains(['\n', '\r']) {
        "name contains a line break"
    } else {
        return Ok(());
    };
    Err(KeysError::InvalidNameError(format!("'{}': {}", name.escape_debug(), reason)))
}

fn check_record_name(name: &str, info: &Info) -> Result<()> {
    validate_name(name)?;
    if info.name != name {
        return Err(KeysError::InvalidNameError(format!(
            "record for '{}' carries info named '{}'",
            name, info.name
        )));
    }
    Ok(())
}
