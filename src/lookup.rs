//! Forward store and retrieve requests toward the peers nearest to a key.
//!
//! Every hop is a direct call into the next [Peer], standing in for an RPC.
//! A [Lookup] remembers which peers it already visited and how deep it is,
//! so forwarding terminates even when peers name each other as nearest.

use std::collections::HashSet;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::common::{Id, Key};
use crate::config::Config;
use crate::peer::Peer;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Successful result of storing a value in the network.
pub enum StoreOutcome {
    /// Another peer already held the key, nothing was written.
    AlreadyStored { holder: Id },
    /// The value was written to the peer the store started at.
    Stored,
}

/// State of a single store or retrieve traversal.
#[derive(Debug)]
pub(crate) struct Lookup {
    key: Key,
    fan_out: usize,
    max_hops: usize,
    visited: HashSet<Id>,
}

impl Lookup {
    pub fn new(key: Key, config: &Config) -> Self {
        Self {
            key,
            fan_out: config.fan_out,
            max_hops: config.max_hops,
            visited: HashSet::new(),
        }
    }

    // === Public Methods ===

    pub fn store(&mut self, origin: &Peer, value: &Bytes) -> Result<StoreOutcome> {
        if !self.key.validate(value) {
            debug!(key = ?self.key, id = ?origin.id(), "Rejected store, key is not the value digest");

            return Err(Error::ContentMismatch(self.key));
        }

        self.store_at(origin, value, 0)
    }

    pub fn retrieve(&mut self, origin: &Peer) -> Option<Bytes> {
        let value = self.retrieve_at(origin, 0);

        debug!(key = ?self.key, id = ?origin.id(), found = value.is_some(), visited = self.visited.len(), "Done retrieve");

        value
    }

    // === Private Methods ===

    fn store_at(&mut self, peer: &Peer, value: &Bytes, hops: usize) -> Result<StoreOutcome> {
        self.visited.insert(peer.id());

        if let Some(holder) = self.holder_other_than(peer) {
            trace!(key = ?self.key, id = ?peer.id(), ?holder, "Already stored");

            return Ok(StoreOutcome::AlreadyStored { holder });
        }

        peer.local_put(self.key, value.clone());
        trace!(key = ?self.key, id = ?peer.id(), hops, "Stored locally");

        for candidate in self.candidates(peer, hops) {
            if self.visited.contains(&candidate.id()) {
                continue;
            }
            if self.store_at(&candidate, value, hops + 1).is_ok() {
                break;
            }
        }

        Ok(StoreOutcome::Stored)
    }

    fn retrieve_at(&mut self, peer: &Peer, hops: usize) -> Option<Bytes> {
        self.visited.insert(peer.id());

        if let Some(value) = peer.local_get(&self.key) {
            trace!(key = ?self.key, id = ?peer.id(), hops, "Found locally");

            return Some(value);
        }

        for candidate in self.candidates(peer, hops) {
            if self.visited.contains(&candidate.id()) {
                continue;
            }
            if let Some(value) = self.retrieve_at(&candidate, hops + 1) {
                if self.key.validate(&value) {
                    return Some(value);
                }

                debug!(key = ?self.key, from = ?candidate.id(), "Discarding value that does not match its key");
            }
        }

        None
    }

    /// Any peer in the routing table, other than `peer`, already holding the key.
    fn holder_other_than(&self, peer: &Peer) -> Option<Id> {
        peer.table()
            .peers()
            .iter()
            .filter(|other| other.id() != peer.id())
            .find(|other| other.local_has(&self.key))
            .map(|other| other.id())
    }

    /// The nearest peers to the key in its bucket, as seen from `peer`,
    /// minus those this lookup already visited.
    fn candidates(&self, peer: &Peer, hops: usize) -> Vec<Peer> {
        if hops >= self.max_hops {
            debug!(key = ?self.key, id = ?peer.id(), hops, "Reached max hops");

            return Vec::new();
        }

        let bucket_index = match self.key.to_id() {
            Some(id) => id.bucket_index(),
            None => return Vec::new(),
        };

        peer.table()
            .nearest_excluding(bucket_index, &self.key, &peer.id(), self.fan_out)
            .into_iter()
            .filter(|candidate| !self.visited.contains(&candidate.id()))
            .collect()
    }
}
