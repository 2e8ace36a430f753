//! Peer identifier and the XOR metric over it.
use rand::Rng;
use std::{
    cmp::Ordering,
    fmt::{self, Debug, Display, Formatter},
    num::NonZeroU64,
    str::FromStr,
};

use crate::{Error, Key, Result};

/// The size of the identifier space in bits.
pub const ID_SPACE_BITS: u32 = 160;
/// One bucket per bit of the identifier space.
pub const BUCKETS_COUNT: usize = ID_SPACE_BITS as usize;

/// Bits of the identifier space above the machine word an [Id] lives in.
const UNUSED_HIGH_BITS: u32 = ID_SPACE_BITS - u64::BITS;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Peer identifier, a non-zero integer in the low 64 bits of a 160 bit space.
pub struct Id(NonZeroU64);

impl Id {
    /// Create an [Id] from its integer value. Returns Err for `0`.
    pub fn new(value: u64) -> Result<Id> {
        NonZeroU64::new(value).map(Id).ok_or(Error::ZeroId)
    }

    /// Create a random, non-zero [Id].
    pub fn random() -> Id {
        let mut rng = rand::thread_rng();

        loop {
            if let Some(value) = NonZeroU64::new(rng.gen()) {
                return Id(value);
            }
        }
    }

    /// Integer value of this Id.
    pub fn get(&self) -> u64 {
        self.0.get()
    }

    /// Index of the bucket this Id belongs to.
    ///
    /// `159 - leading_zeros` over the full 160 bit space, which for an Id
    /// is the position of its highest set bit, so `1 => 0`, `2..=3 => 1`
    /// and `u64::MAX => 63`.
    ///
    /// NOTE: Kademlia proper indexes by the distance between the table
    /// owner and the peer. Here the raw magnitude of the Id is used.
    pub fn bucket_index(&self) -> usize {
        let leading_zeros = UNUSED_HIGH_BITS + self.0.leading_zeros();

        (ID_SPACE_BITS - 1 - leading_zeros) as usize
    }

    /// XOR distance between this Id and another.
    pub fn distance(&self, other: &Id) -> u64 {
        self.get() ^ other.get()
    }

    /// XOR distance between this Id and the integer interpretation of a key.
    pub fn distance_to_key(&self, key: &Key) -> u64 {
        self.get() ^ key.to_u64()
    }

    /// Compare the decimal encodings of two Ids as strings, so `"10" < "9"`.
    pub fn cmp_lexicographic(&self, other: &Id) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.0)
    }
}

impl FromStr for Id {
    type Err = Error;

    /// Parse a decimal encoded Id.
    fn from_str(s: &str) -> Result<Id> {
        let value = s
            .trim()
            .parse::<u64>()
            .map_err(|_| Error::InvalidId(s.to_string()))?;

        Id::new(value)
    }
}

impl TryFrom<u64> for Id {
    type Error = Error;

    fn try_from(value: u64) -> Result<Id> {
        Id::new(value)
    }
}

impl From<Id> for u64 {
    fn from(id: Id) -> u64 {
        id.get()
    }
}
