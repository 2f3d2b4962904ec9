//! Keyring configuration.

use crate::codec::HexCodec;
use crate::crypto::encryption::SecretBox;
use crate::crypto::password::KdfParams;
use crate::error::{KeysError, Result};
use crate::manager::Manager;
use crate::storage::{FileStorage, MemoryStorage, Storage};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Environment variable that overrides the key directory.
pub const HOME_ENV: &str = "TMKEYS_HOME";

/// Where keys are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Armored files under the home directory.
    #[default]
    File,
    /// Process memory only. Keys vanish on exit.
    Memory,
}

impl FromStr for Backend {
    type Err = KeysError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "file" => Ok(Backend::File),
            "memory" => Ok(Backend::Memory),
            _ => Err(KeysError::ParseError(format!(
                "Unsupported backend: '{}'. Use 'file' or 'memory'",
                s
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::File => "file",
            Backend::Memory => "memory",
        })
    }
}

/// Everything needed to assemble a [`Manager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysConfig {
    pub home: PathBuf,
    pub backend: Backend,
    pub kdf: KdfParams,
}

impl KeysConfig {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            backend: Backend::default(),
            kdf: KdfParams::default(),
        }
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// `$HOME/.tmkeys/keys`, or `.tmkeys/keys` when no home directory is known.
    pub fn default_home() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_default()
            .join(".tmkeys")
            .join("keys")
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Open the storage backend and wire up a [`Manager`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use tmkeys::config::{Backend, KeysConfig};
    /// use tmkeys::crypto::password::KdfParams;
    ///
    /// # fn example() -> tmkeys::error::Result<()> {
    /// let manager = KeysConfig::new("unused")
    ///     .with_backend(Backend::Memory)
    ///     .with_kdf(KdfParams::low_cost())
    ///     .build()?;
    /// manager.create("alice", "passphrase", "ed25519")?;
    /// assert_eq!(manager.list()?.len(), 1);
    /// # Ok(())
    /// # }
    /// # example().unwrap();
    /// ```
    pub fn build(&self) -> Result<Manager> {
        let storage: Box<dyn Storage> = match self.backend {
            Backend::File => Box::new(FileStorage::new(&self.home)?),
            Backend::Memory => Box::new(MemoryStorage::new()),
        };
        debug!(backend = %self.backend, home = %self.home.display(), "Building keyring");

        Ok(Manager::new(Box::new(SecretBox::new(self.kdf)), storage, Box::new(HexCodec))
            .with_export_params(self.kdf))
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self::new(Self::default_home())
    }
}
