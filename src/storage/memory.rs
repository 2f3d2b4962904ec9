//! In-process key storage for tests and throwaway keyrings.

use crate::crypto::encryption::EncryptedSecret;
use crate::error::{KeysError, Result};
use crate::storage::metadata::{Info, Infos};
use crate::storage::{check_record_name, Storage, StoredRecord};
use std::collections::BTreeMap;
use std::io;
use std::sync::RwLock;

/// Records held in a map behind a lock. Nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: RwLock<BTreeMap<String, StoredRecord>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> KeysError {
    KeysError::StorageError(io::Error::new(io::ErrorKind::Other, e.to_string()))
}

fn not_found(name: &str) -> KeysError {
    KeysError::NotFoundError(format!("Key '{}' not found", name))
}

impl Storage for MemoryStorage {
    fn put(&self, name: &str, secret: &EncryptedSecret, info: &Info) -> Result<()> {
        check_record_name(name, info)?;

        let mut records = self.records.write().map_err(poisoned)?;
        if records.contains_key(name) {
            return Err(KeysError::AlreadyExistsError(format!(
                "Key '{}' already exists",
                name
            )));
        }
        records.insert(
            name.to_string(),
            StoredRecord {
                info: info.clone(),
                secret: secret.clone(),
            },
        );
        Ok(())
    }

    fn get(&self, name: &str) -> Result<StoredRecord> {
        self.records
            .read()
            .map_err(poisoned)?
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    fn list(&self) -> Result<Infos> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.values().map(|record| record.info.clone()).collect())
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.records
            .write()
            .map_err(poisoned)?
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::encryption::{Encoder, Noop};
    use crate::crypto::generator::{Generator, Secp256k1Generator};

    fn record(name: &str) -> (EncryptedSecret, Info) {
        let key = Secp256k1Generator.generate(name.as_bytes()).unwrap();
        (Noop.encrypt(&key, "").unwrap(), Info::new(name, key.public_key()))
    }

    #[test]
    fn test_put_get_roundtrip() {
        let storage = MemoryStorage::new();
        let (secret, info) = record("alice");

        storage.put("alice", &secret, &info).unwrap();
        let stored = storage.get("alice").unwrap();

        assert_eq!(stored.info, info);
        assert_eq!(stored.secret, secret);
    }

    #[test]
    fn test_put_duplicate_fails() {
        let storage = MemoryStorage::new();
        let (secret, info) = record("test");

        storage.put("test", &secret, &info).unwrap();
        match storage.put("test", &secret, &info) {
            Err(KeysError::AlreadyExistsError(_)) => {}
            _ => panic!("Expected AlreadyExistsError"),
        }
    }

    #[test]
    fn test_missing_names() {
        let storage = MemoryStorage::new();

        assert!(matches!(storage.get("ghost"), Err(KeysError::NotFoundError(_))));
        assert!(matches!(storage.delete("ghost"), Err(KeysError::NotFoundError(_))));
    }

    #[test]
    fn test_delete_removes_from_list() {
        let storage = MemoryStorage::new();
        for name in ["mike", "john", "alice"] {
            let (secret, info) = record(name);
            storage.put(name, &secret, &info).unwrap();
        }

        storage.delete("john").unwrap();

        let names: Vec<String> = storage.list().unwrap().iter().map(|i| i.name.clone()).collect();
        assert_eq!(names, vec!["alice", "mike"]);
        assert!(matches!(storage.delete("john"), Err(KeysError::NotFoundError(_))));
    }

    #[test]
    fn test_mismatched_info_name_rejected() {
        let storage = MemoryStorage::new();
        let (secret, info) = record("alice");

        assert!(matches!(
            storage.put("bob", &secret, &info),
            Err(KeysError::InvalidNameError(_))
        ));
    }
}
