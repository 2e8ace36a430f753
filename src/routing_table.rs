//! Simplified Kademlia routing table shared by every peer of a network.

use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use tracing::{debug, trace, warn};

use crate::common::{Id, Key, BUCKETS_COUNT};
use crate::config::Config;
use crate::kbucket::{InsertOutcome, KBucket};
use crate::peer::{Peer, PeerInner};

/// Simplified Kademlia routing table.
///
/// A cheap to clone handle to one set of [BUCKETS_COUNT] buckets. Peers are
/// placed by [Id::bucket_index], that is by the magnitude of their own id
/// rather than their distance to a table owner, since the table is a single
/// global view of the network.
///
/// Buckets only hold [Id]s, the peers themselves are looked up in a registry
/// of weak references, so membership never keeps a [Peer] alive.
#[derive(Clone)]
pub struct RoutingTable {
    inner: Arc<RwLock<TableInner>>,
    config: Config,
}

struct TableInner {
    buckets: Box<[KBucket]>,
    registry: HashMap<Id, Weak<PeerInner>>,
}

impl RoutingTable {
    /// Create a new [RoutingTable] with default [Config].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new [RoutingTable] with all of its buckets allocated and empty.
    pub fn with_config(config: Config) -> Self {
        let buckets = (0..BUCKETS_COUNT)
            .map(|index| KBucket::new(index).with_size(config.bucket_size))
            .collect();

        RoutingTable {
            inner: Arc::new(RwLock::new(TableInner {
                buckets,
                registry: HashMap::new(),
            })),
            config,
        }
    }

    // === Getters ===

    pub fn config(&self) -> &Config {
        &self.config
    }

    // === Public Methods ===

    /// Insert a peer into the bucket of its id, evicting a member if that
    /// bucket is full. See [KBucket::add] for the eviction policy.
    ///
    /// Peers created with another table are refused with
    /// [InsertOutcome::ForeignTable], every member forwards through this table.
    pub fn insert(&self, peer: &Peer) -> InsertOutcome {
        let id = peer.id();

        if !self.is_same(peer.table()) {
            warn!(?id, "Refused peer of another routing table");

            return InsertOutcome::ForeignTable;
        }

        let index = id.bucket_index();

        let mut inner = self.write();
        let outcome = inner.buckets[index].add(id);

        match outcome {
            InsertOutcome::AlreadyPresent => {
                // Let a new handle take over an id whose previous peer is gone.
                let entry = inner.registry.entry(id).or_default();
                if entry.upgrade().is_none() {
                    *entry = Arc::downgrade(&peer.0);
                }
            }
            _ => {
                if let Some(evicted) = outcome.evicted() {
                    inner.registry.remove(&evicted);
                }
                inner.registry.insert(id, Arc::downgrade(&peer.0));
            }
        }

        debug!(?id, bucket = index, ?outcome, "Insert peer");

        outcome
    }

    /// Remove a peer from this routing table, returns `true` if it was a member.
    pub fn remove(&self, id: &Id) -> bool {
        let mut inner = self.write();

        inner.registry.remove(id);
        inner.buckets[id.bucket_index()].remove(id)
    }

    /// Returns `true` if any bucket holds this id.
    pub fn contains(&self, id: &Id) -> bool {
        self.read().buckets.iter().any(|bucket| bucket.contains(id))
    }

    /// Up to `limit` live peers of the bucket at `bucket_index`, other than
    /// `excluded`, sorted by their XOR distance to `target`.
    ///
    /// Peers at equal distance keep their bucket order.
    pub fn nearest_excluding(
        &self,
        bucket_index: usize,
        target: &Key,
        excluded: &Id,
        limit: usize,
    ) -> Vec<Peer> {
        let inner = self.read();

        let bucket = match inner.buckets.get(bucket_index) {
            Some(bucket) => bucket,
            None => return Vec::new(),
        };

        let mut nearest: Vec<Peer> = bucket
            .iter()
            .filter(|id| *id != excluded)
            .filter_map(|id| inner.lookup(id))
            .collect();

        nearest.sort_by_key(|peer| peer.id().distance_to_key(target));
        nearest.truncate(limit);

        trace!(bucket = bucket_index, ?target, nearest = nearest.len(), "Nearest peers");

        nearest
    }

    /// All live peers in this routing table, in bucket order.
    pub fn peers(&self) -> Vec<Peer> {
        let inner = self.read();

        inner
            .buckets
            .iter()
            .flat_map(|bucket| bucket.iter())
            .filter_map(|id| inner.lookup(id))
            .collect()
    }

    /// Ids held by the bucket at `index`, from head to tail.
    pub fn bucket_ids(&self, index: usize) -> Vec<Id> {
        self.read()
            .buckets
            .get(index)
            .map(|bucket| bucket.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of buckets, always [BUCKETS_COUNT].
    pub fn buckets_count(&self) -> usize {
        self.read().buckets.len()
    }

    /// Returns `true` if this routing table is empty.
    pub fn is_empty(&self) -> bool {
        self.read().buckets.iter().all(|bucket| bucket.is_empty())
    }

    /// Return the number of ids in this routing table.
    pub fn size(&self) -> usize {
        self.read()
            .buckets
            .iter()
            .fold(0, |acc, bucket| acc + bucket.len())
    }

    // === Private Methods ===

    fn is_same(&self, other: &RoutingTable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn read(&self) -> RwLockReadGuard<'_, TableInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TableInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TableInner {
    fn lookup(&self, id: &Id) -> Option<Peer> {
        self.registry.get(id).and_then(Weak::upgrade).map(Peer)
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for RoutingTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RoutingTable{{ size: {}, config: {:?} }}",
            self.size(),
            self.config
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::StoreOutcome;
    use bytes::Bytes;

    fn peer(table: &RoutingTable, value: u64) -> Peer {
        Peer::new(Id::new(value).unwrap(), table)
    }

    fn ids(peers: &[Peer]) -> Vec<u64> {
        peers.iter().map(|peer| peer.id().get()).collect()
    }

    #[test]
    fn allocates_all_buckets() {
        let table = RoutingTable::new();

        assert_eq!(table.buckets_count(), BUCKETS_COUNT);
        assert!(table.is_empty());
        assert_eq!(table.size(), 0);
    }

    #[test]
    fn table_is_empty() {
        let table = RoutingTable::new();
        let peer = peer(&table, 7);

        table.insert(&peer);
        assert!(!table.is_empty());
    }

    #[test]
    fn contains() {
        let table = RoutingTable::new();
        let peer = peer(&table, 42);

        assert!(!table.contains(&peer.id()));

        table.insert(&peer);
        assert!(table.contains(&peer.id()));
    }

    #[test]
    fn remove() {
        let table = RoutingTable::new();
        let peer = peer(&table, 42);

        table.insert(&peer);
        assert!(table.remove(&peer.id()));
        assert!(!table.contains(&peer.id()));
        assert!(!table.remove(&peer.id()));
    }

    #[test]
    fn buckets_are_sets() {
        let table = RoutingTable::new();
        let peer = peer(&table, 5);

        table.insert(&peer);

        assert_eq!(table.insert(&peer), InsertOutcome::AlreadyPresent);
        assert_eq!(table.size(), 1);
    }

    #[test]
    fn placement() {
        let table = RoutingTable::new();
        let peers: Vec<Peer> = [1, 2, 4, 8].iter().map(|v| peer(&table, *v)).collect();

        for peer in &peers {
            assert_eq!(table.insert(peer), InsertOutcome::Appended);
        }

        for (index, value) in [1, 2, 4, 8].iter().enumerate() {
            assert_eq!(table.bucket_ids(index), vec![Id::new(*value).unwrap()]);
        }
        assert_eq!(ids(&table.peers()), vec![1, 2, 4, 8]);
    }

    #[test]
    fn should_not_hold_more_than_k() {
        let table = RoutingTable::new();
        let k = table.config().bucket_size;

        // 16..32 all land in bucket 4.
        let peers: Vec<Peer> = (16..32).map(|v| peer(&table, v)).collect();

        for peer in &peers {
            table.insert(peer);
        }

        let members = table.bucket_ids(4);
        assert_eq!(members.len(), k);
        assert!(members.iter().all(|id| id.bucket_index() == 4));
        assert_eq!(table.size(), k);
    }

    #[test]
    fn full_bucket_replaces_lexicographically_smallest() {
        let table = RoutingTable::new();
        let peers: Vec<Peer> = [9, 10, 11, 12].iter().map(|v| peer(&table, *v)).collect();

        for peer in &peers[..3] {
            table.insert(peer);
        }

        assert_eq!(
            table.insert(&peers[3]),
            InsertOutcome::Replaced {
                evicted: Id::new(10).unwrap()
            }
        );
        assert_eq!(
            table.bucket_ids(3),
            vec![Id::new(9).unwrap(), Id::new(12).unwrap(), Id::new(11).unwrap()]
        );

        // Evicted peers leave the registry too.
        assert!(!table.contains(&Id::new(10).unwrap()));
        assert_eq!(ids(&table.peers()), vec![9, 12, 11]);
    }

    #[test]
    fn nearest_excluding() {
        let table = RoutingTable::new();
        let peers: Vec<Peer> = [16, 17, 31].iter().map(|v| peer(&table, *v)).collect();

        for peer in &peers {
            table.insert(peer);
        }

        let key = Key::from_value(b"nearest");
        let target = key.to_u64();

        let nearest = table.nearest_excluding(4, &key, &peers[0].id(), 2);

        let mut expected: Vec<u64> = vec![17, 31];
        expected.sort_by_key(|v| v ^ target);

        assert_eq!(ids(&nearest), expected);

        assert_eq!(table.nearest_excluding(4, &key, &peers[0].id(), 1).len(), 1);
        assert!(table.nearest_excluding(5, &key, &peers[0].id(), 2).is_empty());
        assert!(table
            .nearest_excluding(BUCKETS_COUNT, &key, &peers[0].id(), 2)
            .is_empty());
    }

    #[test]
    fn membership_does_not_keep_peers_alive() {
        let table = RoutingTable::new();
        let kept = peer(&table, 2);

        table.insert(&kept);
        {
            let dropped = peer(&table, 3);
            table.insert(&dropped);
        }

        assert_eq!(table.size(), 2);
        assert_eq!(ids(&table.peers()), vec![2]);

        let key = Key::from_value(b"any");
        assert_eq!(
            ids(&table.nearest_excluding(1, &key, &Id::new(5).unwrap(), 2)),
            vec![2]
        );
    }

    #[test]
    fn reinsert_revives_dropped_peer() {
        let table = RoutingTable::new();
        {
            let dropped = peer(&table, 6);
            table.insert(&dropped);
        }

        let revived = peer(&table, 6);
        assert_eq!(table.insert(&revived), InsertOutcome::AlreadyPresent);
        assert_eq!(ids(&table.peers()), vec![6]);
    }

    #[test]
    fn refuse_peer_of_another_table() {
        let a = RoutingTable::new();
        let b = RoutingTable::new();

        let value = b"held in b";
        let key = Key::from_value(value);

        let holder = Peer::new(Id::new(key.to_u64() ^ 1).unwrap(), &b);
        b.insert(&holder);
        assert!(holder.store(key.as_bytes(), value));

        let stray = Peer::new(Id::new(key.to_u64() ^ 2).unwrap(), &a);

        assert_eq!(b.insert(&stray), InsertOutcome::ForeignTable);
        assert!(!b.contains(&stray.id()));
        assert_eq!(b.size(), 1);
        assert_eq!(ids(&b.peers()), vec![holder.id().get()]);

        // A clone of the table handle is the same table.
        let member = Peer::new(Id::new(key.to_u64() ^ 3).unwrap(), &b.clone());
        assert_eq!(b.insert(&member), InsertOutcome::Appended);
        assert_eq!(
            member.try_store(key, Bytes::from_static(value)),
            Ok(StoreOutcome::AlreadyStored {
                holder: holder.id()
            })
        );
        assert!(!member.local_has(&key));
    }

    #[test]
    fn custom_bucket_size() {
        let table = RoutingTable::with_config(Config {
            bucket_size: 5,
            ..Default::default()
        });

        let peers: Vec<Peer> = (32..40).map(|v| peer(&table, v)).collect();
        for peer in &peers {
            table.insert(peer);
        }

        assert_eq!(table.bucket_ids(5).len(), 5);
    }
}
