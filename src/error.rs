//! Main Crate Error

use crate::Key;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Kadstore crate error enum.
pub enum Error {
    /// Peer identifiers are decimal encoded integers.
    #[error("Invalid peer id: {0:?}")]
    InvalidId(String),

    /// Zero has no defined bucket, so it can not identify a peer.
    #[error("Peer id must be non-zero")]
    ZeroId,

    #[error("Invalid key size, expected 32 bytes, got {0}")]
    InvalidKeySize(usize),

    #[error("Invalid hex encoded key: {0:?}")]
    InvalidKeyEncoding(String),

    /// The key is not the SHA-256 digest of the value being stored.
    #[error("Key {0} does not match the SHA-256 digest of the value")]
    ContentMismatch(Key),
}

/// Alias for `Result<T, Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;
