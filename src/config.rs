/// K = the default maximum size of a k-bucket.
pub const DEFAULT_BUCKET_SIZE_K: usize = 3;

/// Number of nearest peers a store or retrieve is forwarded to.
pub const DEFAULT_FORWARDING_FAN_OUT: usize = 2;

/// Default bound on forwarding hops for a single store or retrieve.
pub const DEFAULT_MAX_HOPS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Routing table and lookup configurations
pub struct Config {
    /// Maximum number of peers held by a single bucket.
    ///
    /// Defaults to [DEFAULT_BUCKET_SIZE_K]
    pub bucket_size: usize,
    /// How many of the peers nearest to a key a request is forwarded to.
    ///
    /// Forwarding stops at the first candidate that satisfies the request,
    /// so this is an upper bound on fan-out per hop, not a replication factor.
    ///
    /// Defaults to [DEFAULT_FORWARDING_FAN_OUT]
    pub fan_out: usize,
    /// Maximum depth of forwarding from the peer a request started at.
    ///
    /// Together with the visited set this guarantees termination even when
    /// two peers name each other as nearest.
    ///
    /// Defaults to [DEFAULT_MAX_HOPS]
    pub max_hops: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket_size: DEFAULT_BUCKET_SIZE_K,
            fan_out: DEFAULT_FORWARDING_FAN_OUT,
            max_hops: DEFAULT_MAX_HOPS,
        }
    }
}
