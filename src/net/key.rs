use std::{
    fmt,
    hash::{Hash, Hasher},
    net::{IpAddr, SocketAddr},
};

/// Cache key built from a request's source socket address.
///
/// Owns its own copy of the address. The port is carried along but takes no
/// part in hashing or equality: two requests from the same host on different
/// ports share one cache entry.
#[derive(Debug, Clone, Copy)]
pub struct SockKey {
    addr: SocketAddr,
}

impl SockKey {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    pub fn ip(&self) -> IpAddr {
        self.addr.ip()
    }

    pub fn socket_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl From<SocketAddr> for SockKey {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr)
    }
}

impl From<IpAddr> for SockKey {
    fn from(ip: IpAddr) -> Self {
        Self::new(SocketAddr::new(ip, 0))
    }
}

impl PartialEq for SockKey {
    fn eq(&self, other: &Self) -> bool {
        self.addr.ip() == other.addr.ip()
    }
}

impl Eq for SockKey {}

impl Hash for SockKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr.ip().hash(state);
    }
}

impl fmt::Display for SockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.addr.ip())
    }
}
