//! Kbuckets
use std::{
    fmt::{self, Debug, Formatter},
    slice::Iter,
};

use crate::{common::Id, config::DEFAULT_BUCKET_SIZE_K};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What happened to a bucket when a peer was inserted.
pub enum InsertOutcome {
    /// The bucket had room, the peer was appended at the tail.
    Appended,
    /// The bucket was full and the peer took the place of `evicted`,
    /// the member with the lexicographically smallest id.
    Replaced { evicted: Id },
    /// The bucket was full, its head `evicted` was dropped and the peer
    /// appended at the tail.
    DroppedHead { evicted: Id },
    /// The peer is already a member, nothing changed.
    AlreadyPresent,
    /// The peer forwards through another routing table, so it was not added.
    ForeignTable,
}

impl InsertOutcome {
    /// The peer that left the bucket to make room, if any.
    pub fn evicted(&self) -> Option<Id> {
        match self {
            InsertOutcome::Replaced { evicted } | InsertOutcome::DroppedHead { evicted } => {
                Some(*evicted)
            }
            _ => None,
        }
    }
}

/// A bounded, ordered group of peers sharing one routing table index.
///
/// Members are ordered from head (oldest) to tail (newest), and the bucket
/// never holds more than `k` of them.
#[derive(Clone)]
pub struct KBucket {
    /// Routing table index of this bucket, `2^index` is the distance band
    /// an incoming peer must fall within to replace an existing member.
    index: usize,
    /// K (as in k-bucket) is the maximum number of peers in a k-bucket.
    k: usize,
    ids: Vec<Id>,
}

impl KBucket {
    pub fn new(index: usize) -> Self {
        KBucket {
            index,
            k: DEFAULT_BUCKET_SIZE_K,
            ids: Vec::with_capacity(DEFAULT_BUCKET_SIZE_K),
        }
    }

    // === Options ===

    /// Set the maximum size of this bucket, at least 1.
    pub fn with_size(mut self, k: usize) -> Self {
        self.k = k.max(1);
        self.ids = Vec::with_capacity(self.k);
        self
    }

    // === Getters ===

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn capacity(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ids.len() >= self.k
    }

    pub fn iter(&self) -> Iter<'_, Id> {
        self.ids.iter()
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.ids.contains(id)
    }

    // === Public Methods ===

    pub fn add(&mut self, incoming: Id) -> InsertOutcome {
        if self.contains(&incoming) {
            return InsertOutcome::AlreadyPresent;
        }

        if !self.is_full() {
            self.ids.push(incoming);
            return InsertOutcome::Appended;
        }

        // The member with the smallest id string stands in for the oldest.
        let (position, oldest) = match self
            .ids
            .iter()
            .copied()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.cmp_lexicographic(b))
        {
            Some(oldest) => oldest,
            None => {
                self.ids.push(incoming);
                return InsertOutcome::Appended;
            }
        };

        if self.within_band(incoming.distance(&oldest)) {
            self.ids[position] = incoming;

            InsertOutcome::Replaced { evicted: oldest }
        } else {
            let evicted = self.ids.remove(0);
            self.ids.push(incoming);

            InsertOutcome::DroppedHead { evicted }
        }
    }

    pub fn remove(&mut self, id: &Id) -> bool {
        let len = self.ids.len();
        self.ids.retain(|member| member != id);

        self.ids.len() != len
    }

    // === Private Methods ===

    /// Returns `true` if `distance < 2^index`. A band wider than the
    /// identifier word admits every distance.
    fn within_band(&self, distance: u64) -> bool {
        u32::try_from(self.index)
            .ok()
            .and_then(|shift| 1_u64.checked_shl(shift))
            .map_or(true, |band| distance < band)
    }
}

impl Debug for KBucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KBucket{{ index: {}, ids: {:?} }}",
            self.index(),
            &self.ids
        )
    }
}
