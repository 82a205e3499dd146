use thiserror::Error;

use super::{
    addr::{NetworkAddress, Protocol, V4_OFFSET},
    bits::{BitView, leading_common_bits},
};

/// Why one block is not inside another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotContainedReason {
    /// The inner block has a shorter prefix, so it is the larger block
    WiderPrefix { big: u32, little: u32 },
    /// The network bits differ at this absolute bit index (0..128)
    BitMismatch { bit: u32 },
}

/// Non-`Ok` outcomes of [`contains`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CidrError {
    #[error("blocks belong to different protocols")]
    ProtocolMismatch,

    #[error("protocol is neither IPv4 nor IPv6")]
    UnsupportedProtocol,

    #[error("block is not contained: {0:?}")]
    NotContained(NotContainedReason),
}

impl CidrError {
    /// True for both flavours of "simply not inside"
    pub fn is_not_contained(&self) -> bool {
        matches!(self, CidrError::NotContained(_))
    }
}

/// Check whether `little` lies entirely inside `big`.
///
/// Only the leading `big.prefix_len()` network bits are compared; host bits
/// past that point are ignored. Does not allocate.
pub fn contains(big: &NetworkAddress, little: &NetworkAddress) -> Result<(), CidrError> {
    if big.protocol() != little.protocol() {
        return Err(CidrError::ProtocolMismatch);
    }

    let offset = match big.protocol() {
        Protocol::V4 => V4_OFFSET as u32,
        Protocol::V6 => 0,
        Protocol::Unspecified => return Err(CidrError::UnsupportedProtocol),
    };

    let big_len = big.prefix_len();
    let little_len = little.prefix_len();
    if little_len < big_len {
        return Err(CidrError::NotContained(NotContainedReason::WiderPrefix {
            big: big_len,
            little: little_len,
        }));
    }

    // V4 values keep the high 96 bits zero, so the common run already covers them.
    let common = leading_common_bits(
        BitView::new(big.address()),
        BitView::new(little.address()),
    );
    if common < offset + big_len {
        return Err(CidrError::NotContained(NotContainedReason::BitMismatch {
            bit: common,
        }));
    }

    Ok(())
}

/// Exact match of protocol, address and mask
pub fn equals(one: &NetworkAddress, two: &NetworkAddress) -> bool {
    if one.protocol() != two.protocol() {
        return false;
    }

    let start = match one.protocol() {
        Protocol::V4 => 12,
        _ => 0,
    };
    one.address()[start..] == two.address()[start..] && one.mask()[start..] == two.mask()[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn net(s: &str) -> NetworkAddress {
        s.parse().unwrap()
    }

    #[rstest]
    #[case("10.0.0.0/8", "10.1.0.0/16")]
    #[case("192.168.0.0/16", "192.168.5.10/32")]
    #[case("0.0.0.0/0", "203.0.113.7")]
    #[case("10.0.0.0/8", "10.0.0.0/8")]
    #[case("10.0.0.0/8", "10.255.255.255/9")]
    #[case("2001:db8::/32", "2001:db8:1::/48")]
    #[case("::/0", "fe80::1")]
    #[case("2001:db8::1", "2001:db8::1")]
    fn contained_blocks(#[case] big: &str, #[case] little: &str) {
        assert_eq!(contains(&net(big), &net(little)), Ok(()));
    }

    #[rstest]
    #[case("10.0.0.0/8")]
    #[case("192.168.5.10")]
    #[case("0.0.0.0/0")]
    #[case("2001:db8::/32")]
    #[case("::1")]
    fn contains_is_reflexive(#[case] block: &str) {
        let block = net(block);
        assert_eq!(contains(&block, &block), Ok(()));
    }

    #[test]
    fn contains_is_not_symmetric() {
        let big = net("10.0.0.0/8");
        let little = net("10.1.0.0/16");
        assert_eq!(contains(&big, &little), Ok(()));
        assert_eq!(
            contains(&little, &big),
            Err(CidrError::NotContained(NotContainedReason::WiderPrefix {
                big: 16,
                little: 8
            }))
        );
    }

    #[test]
    fn sibling_subnet_reports_first_differing_bit() {
        let result = contains(&net("192.168.0.0/24"), &net("192.168.5.10/32"));
        // 192.168.0.x vs 192.168.5.x first differ at bit 21 of the IPv4 word.
        assert_eq!(
            result,
            Err(CidrError::NotContained(NotContainedReason::BitMismatch {
                bit: 96 + 21
            }))
        );
        assert!(result.unwrap_err().is_not_contained());
    }

    #[test]
    fn v6_mismatch_bit_is_absolute() {
        let result = contains(&net("2001:db8::/32"), &net("2001:db9::/48"));
        assert_eq!(
            result,
            Err(CidrError::NotContained(NotContainedReason::BitMismatch {
                bit: 31
            }))
        );
    }

    #[rstest]
    #[case("10.0.0.0/8", "::ffff:10.0.0.1")]
    #[case("::/0", "10.0.0.1")]
    #[case("2001:db8::/32", "192.168.0.0/16")]
    fn cross_protocol_is_mismatch(#[case] a: &str, #[case] b: &str) {
        assert_eq!(contains(&net(a), &net(b)), Err(CidrError::ProtocolMismatch));
        assert_eq!(contains(&net(b), &net(a)), Err(CidrError::ProtocolMismatch));
    }

    #[test]
    fn blank_blocks_are_unsupported() {
        let blank = NetworkAddress::default();
        assert_eq!(
            contains(&blank, &blank),
            Err(CidrError::UnsupportedProtocol)
        );
        assert_eq!(
            contains(&blank, &net("10.0.0.0/8")),
            Err(CidrError::ProtocolMismatch)
        );
    }

    #[rstest]
    #[case("10.0.0.0/8", "10.0.0.0/8", true)]
    #[case("10.0.0.0/8", "10.0.0.0/9", false)]
    #[case("10.0.0.0/8", "10.0.0.1/8", false)]
    #[case("10.0.0.0/8", "::a00:0/104", false)]
    #[case("2001:db8::/32", "2001:db8::/32", true)]
    #[case("2001:db8::/32", "2001:db8::/33", false)]
    #[case("::1", "::2", false)]
    fn equals_is_symmetric(#[case] a: &str, #[case] b: &str, #[case] expected: bool) {
        let (a, b) = (net(a), net(b));
        assert_eq!(equals(&a, &b), expected);
        assert_eq!(equals(&b, &a), expected);
        assert!(equals(&a, &a));
        assert!(equals(&b, &b));
    }

    #[test]
    fn blank_equals_blank() {
        assert!(equals(&NetworkAddress::default(), &NetworkAddress::default()));
    }
}
