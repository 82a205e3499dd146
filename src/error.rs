use thiserror::Error;

use std::{net::IpAddr, path::PathBuf};

use hickory_resolver::ResolveError;

use crate::cidr::ParseCidrError;

#[derive(Debug, Error)]
pub enum ClientIdError {
    #[error("failed to initialize DNS resolver: {source}")]
    DnsResolverInit {
        #[source]
        source: ResolveError,
    },

    #[error("failed to reverse-resolve address {addr}: {source}")]
    ReverseLookup {
        addr: IpAddr,
        #[source]
        source: ResolveError,
    },

    #[error("no PTR record for address {addr}")]
    NoPtrRecord { addr: IpAddr },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration value for {key}: {reason}")]
    InvalidConfig { key: &'static str, reason: String },

    #[error("invalid network entry '{entry}': {source}")]
    InvalidCidr {
        entry: String,
        #[source]
        source: ParseCidrError,
    },
}

/// Failures reported by a [`KeyValueStore`](crate::net::store::KeyValueStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store partition {partition} is poisoned")]
    Poisoned { partition: usize },

    #[error("store has been shut down")]
    Unavailable,
}

/// Failures of the address resolution cache.
///
/// A cache miss is not an error; lookups report it as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("hostname needs {needed} bytes but the buffer holds {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}
