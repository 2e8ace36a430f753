//! A peer's own key/value storage.

use std::collections::HashMap;

use bytes::Bytes;

use crate::common::Key;

#[derive(Debug, Default, Clone)]
/// Values held locally by one peer, keyed by their content address.
pub struct LocalStore {
    items: HashMap<Key, Bytes>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &Key) -> Option<Bytes> {
        self.items.get(key).cloned()
    }

    pub fn has(&self, key: &Key) -> bool {
        self.items.contains_key(key)
    }

    /// Insert unconditionally, the caller is responsible for checking
    /// that `key` is the digest of `value`.
    pub fn put(&mut self, key: Key, value: Bytes) {
        self.items.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.items.keys()
    }
}
