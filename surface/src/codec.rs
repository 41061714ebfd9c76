/// How many bits one field takes up
///
/// Field 0 is always the most significant one, so the leftmost pixel of a byte sits in its
/// high bits:
///
/// ```text
///   HalfNibble   │ 7 6 │ 5 4 │ 3 2 │ 1 0 │
///   field        │  0  │  1  │  2  │  3  │
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldWidth {
    Bit = 1,
    HalfNibble = 2,
    Nibble = 4,
}

impl FieldWidth {
    pub const fn bits(self) -> u32 {
        self as u32
    }

    pub const fn per_byte(self) -> usize {
        8 / self as usize
    }

    pub const fn mask(self) -> u8 {
        ((1u16 << self as u32) - 1) as u8
    }

    /// Number of distinct values a field can hold
    pub const fn values(self) -> u16 {
        1 << self as u32
    }

    fn shift(self, index: usize) -> u32 {
        8 - self.bits() * (index as u32 + 1)
    }

    /// Field `index` of `byte`. `index` wraps around the fields of a byte.
    pub fn get(self, byte: u8, index: usize) -> u8 {
        (byte >> self.shift(index % self.per_byte())) & self.mask()
    }

    /// `byte` with field `index` replaced. Values wrap modulo `2^W`.
    pub fn set(self, byte: u8, index: usize, value: u8) -> u8 {
        let shift = self.shift(index % self.per_byte());
        (byte & !(self.mask() << shift)) | ((value & self.mask()) << shift)
    }

    /// Every field of `byte`, most significant first
    pub fn split(self, byte: u8) -> impl Iterator<Item = u8> {
        (0..self.per_byte()).map(move |i| self.get(byte, i))
    }

    /// Inverse of [FieldWidth::split]. Missing fields are 0, extra ones are ignored.
    pub fn join(self, fields: impl IntoIterator<Item = u8>) -> u8 {
        fields
            .into_iter()
            .take(self.per_byte())
            .enumerate()
            .fold(0, |byte, (i, value)| self.set(byte, i, value))
    }

    /// A byte with every field set to `value`
    pub fn repeat(self, value: u8) -> u8 {
        self.join(std::iter::repeat(value))
    }
}

/// One unpacked byte: `N` fields of `W` bits.
///
/// `W` and `N` have to cover the byte exactly:
///
/// ```
/// use surface::{Fields, NibbleArray};
///
/// assert_eq!(NibbleArray::split(0xA5).0, [0xA, 0x5]);
/// assert_eq!(Fields::<4, 2>([0x1F, 0x12]).join(), 0xF2);
/// ```
///
/// ```compile_fail
/// let _ = surface::Fields::<4, 8>::split(0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fields<const W: u32, const N: usize>(pub [u8; N]);

pub type BitArray = Fields<1, 8>;
pub type HalfNibbleArray = Fields<2, 4>;
pub type NibbleArray = Fields<4, 2>;

impl<const W: u32, const N: usize> Fields<W, N> {
    const MASK: u8 = ((1u16 << W) - 1) as u8;
    /// `N` fields of `W` bits must fill exactly one byte
    const WHOLE_BYTE: () = assert!(
        matches!(W, 1 | 2 | 4) && W as usize * N == 8,
        "fields must fill exactly one byte"
    );

    const fn shift(index: usize) -> u32 {
        8 - W * (index as u32 + 1)
    }

    pub fn split(byte: u8) -> Self {
        let () = Self::WHOLE_BYTE;
        Self(std::array::from_fn(|i| (byte >> Self::shift(i)) & Self::MASK))
    }

    pub fn join(&self) -> u8 {
        let () = Self::WHOLE_BYTE;
        self.0
            .iter()
            .enumerate()
            .fold(0, |byte, (i, value)| byte | ((value & Self::MASK) << Self::shift(i)))
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    /// Out of range indices are ignored, values wrap modulo `2^W`.
    pub fn set(&mut self, index: usize, value: u8) {
        if let Some(field) = self.0.get_mut(index) {
            *field = value & Self::MASK;
        }
    }
}

impl<const W: u32, const N: usize> From<u8> for Fields<W, N> {
    fn from(byte: u8) -> Self {
        Self::split(byte)
    }
}

impl<const W: u32, const N: usize> From<Fields<W, N>> for u8 {
    fn from(fields: Fields<W, N>) -> Self {
        fields.join()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTHS: [FieldWidth; 3] = [FieldWidth::Bit, FieldWidth::HalfNibble, FieldWidth::Nibble];

    #[test]
    fn test_join_undoes_split() {
        for byte in 0..=u8::MAX {
            for width in WIDTHS {
                assert_eq!(width.join(width.split(byte)), byte);
            }
            assert_eq!(BitArray::split(byte).join(), byte);
            assert_eq!(HalfNibbleArray::split(byte).join(), byte);
            assert_eq!(NibbleArray::split(byte).join(), byte);
        }
    }

    #[test]
    fn test_split_is_most_significant_first() {
        assert_eq!(HalfNibbleArray::split(0b11_10_01_00).0, [3, 2, 1, 0]);
        assert_eq!(NibbleArray::split(0xA5).0, [0xA, 0x5]);
        assert_eq!(BitArray::split(0b1000_0001).0, [1, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(
            FieldWidth::HalfNibble.split(0b11_10_01_00).collect::<Vec<_>>(),
            vec![3, 2, 1, 0]
        );
    }

    #[test]
    fn test_out_of_range_values_wrap() {
        assert_eq!(Fields::<4, 2>([0x1F, 0x12]).join(), 0xF2);
        assert_eq!(FieldWidth::HalfNibble.join([5, 0, 0, 7]), 0b01_00_00_11);
        assert_eq!(FieldWidth::Bit.set(0, 7, 2), 0);
        let mut fields = HalfNibbleArray::split(0);
        fields.set(1, 6);
        fields.set(9, 3);
        assert_eq!(fields.0, [0, 2, 0, 0]);
    }

    #[test]
    fn test_set_replaces_one_field() {
        let byte = FieldWidth::HalfNibble.set(0xFF, 2, 0);
        assert_eq!(byte, 0b11_11_00_11);
        assert_eq!(FieldWidth::HalfNibble.get(byte, 2), 0);
        assert_eq!(FieldWidth::HalfNibble.get(byte, 3), 3);
    }

    #[test]
    fn test_widths() {
        assert_eq!(FieldWidth::Bit.per_byte(), 8);
        assert_eq!(FieldWidth::HalfNibble.mask(), 0b11);
        assert_eq!(FieldWidth::Nibble.values(), 16);
        assert_eq!(FieldWidth::HalfNibble.repeat(2), 0b10_10_10_10);
        assert_eq!(u8::from(NibbleArray::from(0x3C)), 0x3C);
    }
}
