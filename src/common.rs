//! Identifiers shared by the routing table and the lookup protocol.

mod id;
mod key;

pub use id::*;
pub use key::*;
