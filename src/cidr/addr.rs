use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

use thiserror::Error;

use super::bits::BitView;

/// Bit offset at which an IPv4 value starts inside the 128-bit field
pub(crate) const V4_OFFSET: usize = 96;

/// Address family of a [`NetworkAddress`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    /// Blank value, not yet filled in by a parser
    #[default]
    Unspecified,
    V4,
    V6,
}

impl Protocol {
    /// Longest prefix this protocol allows
    pub fn max_prefix_len(self) -> u32 {
        match self {
            Protocol::V4 => 32,
            Protocol::V6 => 128,
            Protocol::Unspecified => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCidrError {
    #[error("empty value")]
    Empty,

    #[error("invalid address '{0}'")]
    Address(String),

    #[error("invalid prefix length '{0}'")]
    PrefixSyntax(String),

    #[error("prefix length {prefix} exceeds {max}")]
    PrefixTooLong { prefix: u32, max: u32 },

    #[error("mask is not a contiguous run of leading ones")]
    NonContiguousMask,

    #[error("IPv4 value has bits set above the low 32")]
    V4HighBits,
}

/// A network block: protocol, address and mask packed into 128-bit fields.
///
/// IPv4 values occupy the low 32 bits; the high 12 bytes of both fields are
/// always zero. The prefix length is derived from the mask on demand.
///
/// The host bits of `address` are kept as given, so `10.1.2.3/8` and
/// `10.0.0.0/8` are different values that contain the same hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkAddress {
    protocol: Protocol,
    address: [u8; 16],
    mask: [u8; 16],
}

impl NetworkAddress {
    /// Build a block from an IP address and prefix length
    pub fn new(ip: IpAddr, prefix_len: u32) -> Result<Self, ParseCidrError> {
        let protocol = match ip {
            IpAddr::V4(_) => Protocol::V4,
            IpAddr::V6(_) => Protocol::V6,
        };
        let max = protocol.max_prefix_len();
        if prefix_len > max {
            return Err(ParseCidrError::PrefixTooLong {
                prefix: prefix_len,
                max,
            });
        }

        let (address, mask) = match ip {
            IpAddr::V4(v4) => {
                let mask = u32::MAX.checked_shl(32 - prefix_len).unwrap_or(0);
                (u128::from(v4.to_bits()), u128::from(mask))
            }
            IpAddr::V6(v6) => {
                let mask = u128::MAX.checked_shl(128 - prefix_len).unwrap_or(0);
                (v6.to_bits(), mask)
            }
        };

        Ok(Self {
            protocol,
            address: address.to_be_bytes(),
            mask: mask.to_be_bytes(),
        })
    }

    /// A single-host block (`/32` or `/128`)
    pub fn host(ip: IpAddr) -> Self {
        let prefix_len = match ip {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        Self::new(ip, prefix_len).unwrap_or_default()
    }

    /// Build a block from raw fields as delivered by another component.
    ///
    /// Rejects IPv4 values with bits above the low 32 and masks that are not
    /// a contiguous run of leading ones.
    pub fn from_parts(
        protocol: Protocol,
        address: [u8; 16],
        mask: [u8; 16],
    ) -> Result<Self, ParseCidrError> {
        if protocol == Protocol::V4 && (address[..12] != [0; 12] || mask[..12] != [0; 12]) {
            return Err(ParseCidrError::V4HighBits);
        }

        let start = match protocol {
            Protocol::V4 => V4_OFFSET,
            _ => 0,
        };
        let ones = u128::from_be_bytes(mask).count_ones();
        if BitView::new(&mask).leading_ones(start) != ones {
            return Err(ParseCidrError::NonContiguousMask);
        }

        Ok(Self {
            protocol,
            address,
            mask,
        })
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn address(&self) -> &[u8; 16] {
        &self.address
    }

    pub fn mask(&self) -> &[u8; 16] {
        &self.mask
    }

    /// Prefix length, counted from the leading set bits of the mask
    pub fn prefix_len(&self) -> u32 {
        match self.protocol {
            Protocol::V4 => BitView::new(&self.mask).leading_ones(V4_OFFSET),
            Protocol::V6 => BitView::new(&self.mask).leading_ones(0),
            Protocol::Unspecified => 0,
        }
    }

    /// The address part as an `IpAddr`, `None` for a blank value
    pub fn ip(&self) -> Option<IpAddr> {
        let bits = u128::from_be_bytes(self.address);
        match self.protocol {
            Protocol::V4 => Some(IpAddr::V4(Ipv4Addr::from_bits(bits as u32))),
            Protocol::V6 => Some(IpAddr::V6(Ipv6Addr::from_bits(bits))),
            Protocol::Unspecified => None,
        }
    }
}

impl From<IpAddr> for NetworkAddress {
    fn from(ip: IpAddr) -> Self {
        Self::host(ip)
    }
}

impl PartialEq for NetworkAddress {
    fn eq(&self, other: &Self) -> bool {
        super::equals(self, other)
    }
}

impl Eq for NetworkAddress {}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip() {
            Some(ip) => write!(f, "{}/{}", ip, self.prefix_len()),
            None => f.write_str("unspecified"),
        }
    }
}

/// Parse `addr` or `addr/prefix` for either protocol.
///
/// A bare address is a single-host block.
impl FromStr for NetworkAddress {
    type Err = ParseCidrError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ParseCidrError::Empty);
        }

        let (addr_part, prefix_part) = match trimmed.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (trimmed, None),
        };

        let ip = addr_part
            .parse::<IpAddr>()
            .map_err(|_| ParseCidrError::Address(addr_part.to_string()))?;

        match prefix_part {
            Some(prefix) => {
                if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_digit()) {
                    return Err(ParseCidrError::PrefixSyntax(prefix.to_string()));
                }
                let prefix_len = prefix
                    .parse::<u32>()
                    .map_err(|_| ParseCidrError::PrefixSyntax(prefix.to_string()))?;
                Self::new(ip, prefix_len)
            }
            None => Ok(Self::host(ip)),
        }
    }
}
