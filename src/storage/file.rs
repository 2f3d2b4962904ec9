//! Directory-backed key storage.
//!
//! Each key maps to two armored files in the key directory:
//!
//! - `<name>.pub`: header `name`, body is the tagged public key
//! - `<name>.tlc`: headers `name` and `salt`, body is the encrypted secret
//!
//! Files are created exclusively with mode `0600` so that two writers racing
//! on the same name end with one success and one `AlreadyExistsError`.

use crate::crypto::encryption::EncryptedSecret;
use crate::crypto::keys::PublicKey;
use crate::error::{KeysError, Result};
use crate::storage::armor::{encode_armor, unarmor, Armor, Headers};
use crate::storage::metadata::{Info, Infos};
use crate::storage::{check_record_name, validate_name, Storage, StoredRecord};
use std::fs::{self, DirBuilder, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Armor label for both key files.
pub const BLOCK_TYPE: &str = "Tendermint Light Client";

pub const PUBLIC_EXTENSION: &str = "pub";
pub const PRIVATE_EXTENSION: &str = "tlc";

const NAME_HEADER: &str = "name";
const SALT_HEADER: &str = "salt";

/// Key storage rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open a key directory, creating it and any missing parents with mode
    /// `0700`.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use tmkeys::storage::FileStorage;
    ///
    /// let storage = FileStorage::new("/tmp/keys").unwrap();
    /// assert!(storage.dir().exists());
    /// ```
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder.create(&dir)?;

        debug!(dir = %dir.display(), "Opened key directory");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn public_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, PUBLIC_EXTENSION))
    }

    fn private_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, PRIVATE_EXTENSION))
    }

    fn read_info(&self, path: &Path, name: &str) -> Result<Info> {
        let armor = unarmor(&read_key_file(path, name)?, BLOCK_TYPE)?;
        let stored_name = header(&armor, NAME_HEADER)?.to_string();
        let public_key = PublicKey::from_bytes(&armor.body)?;
        Ok(Info::new(stored_name, public_key))
    }
}

/// Create `path` exclusively with owner-only permissions and write `contents`.
fn write_exclusive(path: &Path, contents: &str) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

fn read_key_file(path: &Path, name: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => KeysError::NotFoundError(format!("Key '{}' not found", name)),
        _ => KeysError::StorageError(e),
    })
}

fn header<'a>(armor: &'a Armor, key: &str) -> Result<&'a str> {
    armor
        .headers
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| KeysError::MalformedArmorError(format!("missing '{}' header", key)))
}

fn exists_error(e: io::Error, name: &str) -> KeysError {
    match e.kind() {
        io::ErrorKind::AlreadyExists => {
            KeysError::AlreadyExistsError(format!("Key '{}' already exists", name))
        }
        _ => KeysError::StorageError(e),
    }
}

impl Storage for FileStorage {
    fn put(&self, name: &str, secret: &EncryptedSecret, info: &Info) -> Result<()> {
        check_record_name(name, info)?;

        let mut headers = Headers::new();
        headers.insert(NAME_HEADER.to_string(), name.to_string());
        let public_text = encode_armor(BLOCK_TYPE, &headers, &info.public_key.to_bytes())?;

        if !secret.salt().is_empty() {
            headers.insert(SALT_HEADER.to_string(), hex::encode_upper(secret.salt()));
        }
        let private_text = encode_armor(BLOCK_TYPE, &headers, secret.ciphertext())?;

        let public_path = self.public_path(name);
        write_exclusive(&public_path, &public_text).map_err(|e| exists_error(e, name))?;

        if let Err(e) = write_exclusive(&self.private_path(name), &private_text) {
            warn!(name = %name, error = %e, "Private key write failed, removing public file");
            if let Err(cleanup) = fs::remove_file(&public_path) {
                warn!(name = %name, error = %cleanup, "Could not remove public file after failed put");
            }
            return Err(exists_error(e, name));
        }

        debug!(name = %name, dir = %self.dir.display(), "Stored key files");
        Ok(())
    }

    fn get(&self, name: &str) -> Result<StoredRecord> {
        validate_name(name)?;

        let info = self.read_info(&self.public_path(name), name)?;
        let armor = unarmor(&read_key_file(&self.private_path(name), name)?, BLOCK_TYPE)?;
        let salt = match armor.headers.get(SALT_HEADER) {
            Some(salt) => hex::decode(salt).map_err(|e| {
                KeysError::MalformedArmorError(format!("invalid salt header: {}", e))
            })?,
            None => Vec::new(),
        };

        Ok(StoredRecord {
            info,
            secret: EncryptedSecret::new(salt, armor.body),
        })
    }

    fn list(&self) -> Result<Infos> {
        let mut infos = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some(PUBLIC_EXTENSION) {
                continue;
            }
            let stem = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            infos.push(self.read_info(&path, &stem)?);
        }

        debug!(count = infos.len(), "Listed keys");
        Ok(Infos::new(infos))
    }

    fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let public_path = self.public_path(name);

        match fs::remove_file(self.private_path(name)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if !public_path.exists() {
                    return Err(KeysError::NotFoundError(format!("Key '{}' not found", name)));
                }
                warn!(name = %name, "Private key file missing, public file left in place");
                return Err(KeysError::StorageError(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Private key file for '{}' is missing", name),
                )));
            }
            Err(e) => return Err(KeysError::StorageError(e)),
        }

        if let Err(source) = fs::remove_file(&public_path) {
            warn!(name = %name, error = %source, "Private key removed but public file remains");
            return Err(KeysError::PartialDeleteError {
                name: name.to_string(),
                source,
            });
        }

        debug!(name = %name, "Deleted key files");
        Ok(())
    }
}
