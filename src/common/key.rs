//! Content address of a stored value.

use sha2::{Digest, Sha256};
use std::{
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};

use crate::{Error, Id, Result};

/// The size of keys in bytes.
pub const KEY_SIZE: usize = 32;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// SHA-256 digest of a value, the only key a value may be stored under.
pub struct Key([u8; KEY_SIZE]);

impl Key {
    /// Create a new Key from some bytes. Returns Err if `bytes` is not of length
    /// [KEY_SIZE].
    pub fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Key> {
        let bytes = bytes.as_ref();

        let array: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| Error::InvalidKeySize(bytes.len()))?;

        Ok(Key(array))
    }

    /// The key a value must be stored under.
    pub fn from_value(value: &[u8]) -> Key {
        Key(hash_value(value))
    }

    /// Returns `true` if this key is the digest of `value`.
    pub fn validate(&self, value: &[u8]) -> bool {
        hash_value(value) == self.0
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Integer interpretation of this key: its leading 8 bytes, big endian.
    pub fn to_u64(&self) -> u64 {
        let mut leading = [0_u8; 8];
        leading.copy_from_slice(&self.0[..8]);

        u64::from_be_bytes(leading)
    }

    /// Integer interpretation of this key as an [Id], used for bucket placement.
    ///
    /// `None` if the leading 8 bytes are all zero, in which case the key
    /// has no bucket.
    pub fn to_id(&self) -> Option<Id> {
        Id::new(self.to_u64()).ok()
    }
}

pub(crate) fn hash_value(value: &[u8]) -> [u8; KEY_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(value);

    let mut digest = [0_u8; KEY_SIZE];
    digest.copy_from_slice(&hasher.finalize());

    digest
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Key({self})")
    }
}

impl FromStr for Key {
    type Err = Error;

    /// Parse a hex encoded key.
    fn from_str(s: &str) -> Result<Key> {
        let mut bytes = [0_u8; KEY_SIZE];

        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| Error::InvalidKeyEncoding(s.to_string()))?;

        Ok(Key(bytes))
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
