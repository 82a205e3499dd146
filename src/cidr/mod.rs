pub mod addr;
pub mod bits;
pub mod compare;

pub use addr::{NetworkAddress, ParseCidrError, Protocol};
pub use bits::{BitView, leading_common_bits};
pub use compare::{CidrError, NotContainedReason, contains, equals};
