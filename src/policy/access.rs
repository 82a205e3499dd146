use std::net::IpAddr;

use crate::{
    cidr::{CidrError, NetworkAddress, contains, equals},
    error::ClientIdError,
};

/// Network blocks whose hosts may use an export
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientAccess {
    /// Configured blocks, in the order they were added
    pub blocks: Vec<NetworkAddress>,
}

impl ClientAccess {
    /// Create an empty access list
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an access list from textual entries such as `192.168.0.0/16`
    ///
    /// Blank entries are skipped; the first malformed one is an error.
    pub fn from_entries(entries: &[String]) -> Result<Self, ClientIdError> {
        let mut access = Self::new();
        for raw in entries {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            let block = trimmed
                .parse::<NetworkAddress>()
                .map_err(|source| ClientIdError::InvalidCidr {
                    entry: raw.clone(),
                    source,
                })?;
            access.add_block(block);
        }
        Ok(access)
    }

    /// Add a block (exact duplicates are eliminated)
    pub fn add_block(&mut self, block: NetworkAddress) {
        if !self.has_block(&block) {
            self.blocks.push(block);
        }
    }

    /// True if exactly this network is configured
    pub fn has_block(&self, block: &NetworkAddress) -> bool {
        self.blocks.iter().any(|b| equals(b, block))
    }

    /// Merge another access list
    pub fn merge(&mut self, other: Self) {
        for block in other.blocks {
            self.add_block(block);
        }
    }

    /// First configured block containing `ip`, if any
    pub fn authorize(&self, ip: IpAddr) -> Option<&NetworkAddress> {
        let host = NetworkAddress::host(ip);
        self.blocks.iter().find(|block| match contains(block, &host) {
            Ok(()) => true,
            Err(CidrError::ProtocolMismatch) => false,
            Err(err) => {
                log::trace!("{} not in {}: {}", ip, block, err);
                false
            }
        })
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
