use std::net::IpAddr;

use async_trait::async_trait;
use hickory_resolver::{Resolver, TokioResolver};

#[cfg(test)]
use mockall::automock;

use crate::error::ClientIdError;

/// Reverse name resolution abstraction for testing
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReverseResolver: Send + Sync + 'static {
    /// Resolve `ip` to a hostname.
    ///
    /// May take as long as the upstream resolver needs; callers treat this as
    /// a suspension point.
    async fn reverse_lookup(&self, ip: IpAddr) -> Result<String, ClientIdError>;
}

/// Production reverse resolver using the system resolver configuration
pub struct SystemReverseResolver {
    resolver: TokioResolver,
}

impl SystemReverseResolver {
    /// Build a resolver from the system configuration (`/etc/resolv.conf`)
    pub fn new() -> Result<Self, ClientIdError> {
        let resolver = Resolver::builder_tokio()
            .map_err(|source| ClientIdError::DnsResolverInit { source })?
            .build();
        Ok(Self { resolver })
    }
}

#[async_trait]
impl ReverseResolver for SystemReverseResolver {
    /// Look up the PTR record for `ip` and return the first name
    ///
    /// # Returns
    /// * `Ok(String)` - Hostname without the trailing root dot
    /// * `Err(ClientIdError)` - Lookup failed or returned no PTR record
    async fn reverse_lookup(&self, ip: IpAddr) -> Result<String, ClientIdError> {
        let response = self
            .resolver
            .reverse_lookup(ip)
            .await
            .map_err(|source| ClientIdError::ReverseLookup { addr: ip, source })?;

        response
            .iter()
            .map(|ptr| trim_root(&ptr.to_string()).to_string())
            .find(|name| !name.is_empty())
            .ok_or(ClientIdError::NoPtrRecord { addr: ip })
    }
}

/// Strip the trailing root label from a fully-qualified name
fn trim_root(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}
