/// Read-only bit view over a 128-bit address or mask field.
///
/// Bits are numbered most-significant-bit first, byte-major: bit 0 is the
/// top bit of byte 0 and bit 127 is the bottom bit of byte 15. IPv4 values
/// live in bits 96..128.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitView<'a> {
    bytes: &'a [u8; 16],
}

impl<'a> BitView<'a> {
    pub fn new(bytes: &'a [u8; 16]) -> Self {
        Self { bytes }
    }

    /// Return the bit at `index` (0..128)
    ///
    /// # Panics
    /// Panics if `index >= 128`.
    pub fn get_bit(&self, index: usize) -> bool {
        let byte = self.bytes[index / 8];
        byte & (1 << (7 - (index % 8))) != 0
    }

    /// Number of consecutive set bits starting at bit `start`
    pub fn leading_ones(&self, start: usize) -> u32 {
        if start >= 128 {
            return 0;
        }
        (self.as_u128() << start).leading_ones()
    }

    fn as_u128(&self) -> u128 {
        u128::from_be_bytes(*self.bytes)
    }
}

/// Count how many leading bits two fields share before the first difference.
///
/// Returns 128 when the fields are identical.
pub fn leading_common_bits(a: BitView<'_>, b: BitView<'_>) -> u32 {
    (a.as_u128() ^ b.as_u128()).leading_zeros()
}
