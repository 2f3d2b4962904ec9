//! Public key metadata.
//!
//! [`Info`] is what the keyring reveals about a stored key without a
//! passphrase. It never carries secret material.

use crate::crypto::keys::{Address, Algorithm, PublicKey};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Public information about a stored key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Info {
    /// The logical name of the key.
    pub name: String,

    /// Address derived from the public key.
    pub address: Address,

    pub public_key: PublicKey,
}

impl Info {
    /// Build the info for `public_key`, deriving its address.
    pub fn new(name: impl Into<String>, public_key: PublicKey) -> Self {
        Self {
            name: name.into(),
            address: public_key.address(),
            public_key,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.public_key.algorithm()
    }
}

/// A list of [`Info`], always sorted by name in byte order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Info>", into = "Vec<Info>")]
pub struct Infos(Vec<Info>);

impl Infos {
    pub fn new(mut infos: Vec<Info>) -> Self {
        infos.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
        Self(infos)
    }

    pub fn into_vec(self) -> Vec<Info> {
        self.0
    }
}

impl From<Vec<Info>> for Infos {
    fn from(infos: Vec<Info>) -> Self {
        Self::new(infos)
    }
}

impl From<Infos> for Vec<Info> {
    fn from(infos: Infos) -> Self {
        infos.0
    }
}

impl FromIterator<Info> for Infos {
    fn from_iter<I: IntoIterator<Item = Info>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Deref for Infos {
    type Target = [Info];

    fn deref(&self) -> &[Info] {
        &self.0
    }
}

impl IntoIterator for Infos {
    type Item = Info;
    type IntoIter = std::vec::IntoIter<Info>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Infos {
    type Item = &'a Info;
    type IntoIter = std::slice::Iter<'a, Info>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
