//! Struct and implementation of a peer participating in the network.

use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;
use tracing::debug;

use crate::common::{Id, Key};
use crate::lookup::{Lookup, StoreOutcome};
use crate::routing_table::RoutingTable;
use crate::store::LocalStore;
use crate::Result;

#[derive(Clone)]
/// A participant in the network: an [Id], a handle to the shared
/// [RoutingTable] and its own [LocalStore].
///
/// Cloning is cheap and yields a handle to the same peer.
pub struct Peer(pub(crate) Arc<PeerInner>);

pub(crate) struct PeerInner {
    id: Id,
    table: RoutingTable,
    storage: RwLock<LocalStore>,
}

impl Peer {
    /// Creates a new peer using `table` for forwarding.
    ///
    /// The peer is not a member of `table` until [RoutingTable::insert] is called.
    pub fn new(id: Id, table: &RoutingTable) -> Peer {
        Peer(Arc::new(PeerInner {
            id,
            table: table.clone(),
            storage: RwLock::new(LocalStore::new()),
        }))
    }

    /// Creates a new peer with a random [Id].
    pub fn random(table: &RoutingTable) -> Peer {
        Peer::new(Id::random(), table)
    }

    // === Getters ===

    pub fn id(&self) -> Id {
        self.0.id
    }

    pub fn table(&self) -> &RoutingTable {
        &self.0.table
    }

    // === Public Methods ===

    /// Store `value` under `key` in the network, starting at this peer.
    ///
    /// Returns `false` only if `key` is not the SHA-256 digest of `value`.
    pub fn store(&self, key: &[u8], value: &[u8]) -> bool {
        let key = match Key::from_bytes(key) {
            Ok(key) => key,
            Err(error) => {
                debug!(id = ?self.id(), ?error, "Rejected store");
                return false;
            }
        };

        self.try_store(key, Bytes::copy_from_slice(value)).is_ok()
    }

    /// Store `value` under `key` in the network, starting at this peer.
    ///
    /// Returns [StoreOutcome::AlreadyStored] if another peer in the routing
    /// table already holds `key`, leaving every local store untouched.
    ///
    /// # Errors
    ///
    /// [crate::Error::ContentMismatch] if `key` is not the digest of `value`.
    pub fn try_store(&self, key: Key, value: Bytes) -> Result<StoreOutcome> {
        Lookup::new(key, self.table().config()).store(self, &value)
    }

    /// Find the value stored under `key`, starting at this peer.
    pub fn retrieve(&self, key: &[u8]) -> Option<Bytes> {
        let key = Key::from_bytes(key).ok()?;

        self.get(&key)
    }

    /// Find the value stored under `key`, starting at this peer.
    ///
    /// Forwarded values are only accepted if they hash to `key`.
    pub fn get(&self, key: &Key) -> Option<Bytes> {
        Lookup::new(*key, self.table().config()).retrieve(self)
    }

    // === Local storage ===

    pub fn local_get(&self, key: &Key) -> Option<Bytes> {
        self.storage().get(key)
    }

    pub fn local_has(&self, key: &Key) -> bool {
        self.storage().has(key)
    }

    /// Insert into this peer's own storage without validation or forwarding.
    pub fn local_put(&self, key: Key, value: Bytes) {
        self.storage_mut().put(key, value)
    }

    /// Keys held in this peer's own storage.
    pub fn keys(&self) -> Vec<Key> {
        self.storage().keys().copied().collect()
    }

    /// Number of values held in this peer's own storage.
    pub fn local_len(&self) -> usize {
        self.storage().len()
    }

    // === Private Methods ===

    fn storage(&self) -> RwLockReadGuard<'_, LocalStore> {
        self.0.storage.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn storage_mut(&self) -> RwLockWriteGuard<'_, LocalStore> {
        self.0.storage.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for Peer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for Peer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Peer")
            .field("id", &self.0.id)
            .field("items", &self.local_len())
            .finish()
    }
}
