#![doc = include_str!("../README.md")]

// Public modules
mod common;
mod config;
mod error;
mod kbucket;
mod lookup;
mod peer;
mod routing_table;
mod store;

pub use crate::common::{Id, Key, BUCKETS_COUNT, ID_SPACE_BITS, KEY_SIZE};
pub use bytes::Bytes;
pub use config::{Config, DEFAULT_BUCKET_SIZE_K, DEFAULT_FORWARDING_FAN_OUT, DEFAULT_MAX_HOPS};
pub use error::{Error, Result};
pub use kbucket::{InsertOutcome, KBucket};
pub use lookup::StoreOutcome;
pub use peer::Peer;
pub use routing_table::RoutingTable;
pub use store::LocalStore;
