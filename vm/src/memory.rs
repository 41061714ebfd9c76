/// Byte-addressable host memory
///
/// Both the track interpreter and the pixel grids go through this to reach the
/// console's linear memory. 16-bit values are little-endian.
///
/// ```text
///   offset   0     1     2     3     4     5
///          ┌─────┬─────┬─────┬─────┬─────┬─────┐
///          │ op  │ lo  │ hi  │ op  │ u8  │ ... │
///          └─────┴─────┴─────┴─────┴─────┴─────┘
///                 └─ u16 ─┘
/// ```
pub trait Memory {
    fn load_u8(&self, offset: usize) -> u8;

    fn store_u8(&mut self, offset: usize, value: u8);

    fn load_u16(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.load_u8(offset), self.load_u8(offset.wrapping_add(1))])
    }

    fn store_u16(&mut self, offset: usize, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.store_u8(offset, lo);
        self.store_u8(offset.wrapping_add(1), hi);
    }
}

/// Reads past the end yield 0 and writes past the end are dropped.
impl Memory for [u8] {
    fn load_u8(&self, offset: usize) -> u8 {
        self.get(offset).copied().unwrap_or(0)
    }

    fn store_u8(&mut self, offset: usize, value: u8) {
        if let Some(byte) = self.get_mut(offset) {
            *byte = value;
        }
    }
}

impl Memory for Vec<u8> {
    fn load_u8(&self, offset: usize) -> u8 {
        self.as_slice().load_u8(offset)
    }

    fn store_u8(&mut self, offset: usize, value: u8) {
        self.as_mut_slice().store_u8(offset, value)
    }
}

impl<const N: usize> Memory for [u8; N] {
    fn load_u8(&self, offset: usize) -> u8 {
        self.as_slice().load_u8(offset)
    }

    fn store_u8(&mut self, offset: usize, value: u8) {
        self.as_mut_slice().store_u8(offset, value)
    }
}

impl<M: Memory + ?Sized> Memory for &mut M {
    fn load_u8(&self, offset: usize) -> u8 {
        (**self).load_u8(offset)
    }

    fn store_u8(&mut self, offset: usize, value: u8) {
        (**self).store_u8(offset, value)
    }
}

#[cfg(test)]
mod tests {
    use super::Memory;
    use proptest::prelude::*;

    #[test]
    fn test_u16_is_little_endian() {
        let mut memory = vec![0u8; 4];
        memory.store_u16(1, 0xBEEF);
        assert_eq!(memory, vec![0, 0xEF, 0xBE, 0]);
        assert_eq!(memory.load_u16(1), 0xBEEF);
    }

    #[test]
    fn test_out_of_range_reads_zero() {
        let memory = [1u8, 2, 3];
        assert_eq!(memory.load_u8(3), 0);
        assert_eq!(memory.load_u16(2), 3);
    }

    proptest! {
        #[test]
        fn test_store_then_load_is_identity(i in 0..16usize, value in prop::bits::u8::ANY) {
            let mut memory = [0u8; 16];
            memory.store_u8(i, value);
            prop_assert_eq!(memory.load_u8(i), value);
        }

        #[test]
        fn test_out_of_range_store_is_dropped(i in 16..64usize, buf in prop::collection::vec(prop::bits::u8::ANY, 16)) {
            let mut memory = buf.clone();
            memory.store_u8(i, 0xFF);
            prop_assert_eq!(memory, buf);
        }
    }
}
