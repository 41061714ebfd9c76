use itertools::iproduct;
use vm::memory::Memory;

use crate::codec::FieldWidth;

/// Maps `(x, y)` onto packed fields in host memory.
///
/// Rows are `width / per_byte` bytes long and start right after each other at `base`.
/// Out of bounds reads are 0 and out of bounds writes are refused, never an error.
///
/// [Grid::set_at] is a read-modify-write of a whole byte: neighbouring pixels share it, so
/// concurrent writers have to be serialized by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
    base: usize,
    width: usize,
    height: usize,
    field: FieldWidth,
}

impl Grid {
    /// `None` unless `width` is a whole number of bytes and both sides fit in an `i32`
    pub fn new(base: usize, width: usize, height: usize, field: FieldWidth) -> Option<Self> {
        i32::try_from(width).ok()?;
        i32::try_from(height).ok()?;
        (width / field.per_byte()).checked_mul(height)?;
        (width % field.per_byte() == 0).then_some(Self {
            base,
            width,
            height,
            field,
        })
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn field_width(&self) -> FieldWidth {
        self.field
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width / self.field.per_byte()
    }

    /// Bytes covered by the whole grid
    pub fn byte_len(&self) -> usize {
        self.stride() * self.height
    }

    /// Byte offset and field index of `(x, y)`
    pub fn locate(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        let x = usize::try_from(x).ok().filter(|x| *x < self.width)?;
        let y = usize::try_from(y).ok().filter(|y| *y < self.height)?;
        let per_byte = self.field.per_byte();
        Some((
            self.base.wrapping_add(y * self.stride() + x / per_byte),
            x % per_byte,
        ))
    }

    pub fn get_at<M: Memory + ?Sized>(&self, memory: &M, x: i32, y: i32) -> u8 {
        self.locate(x, y)
            .map_or(0, |(offset, index)| self.field.get(memory.load_u8(offset), index))
    }

    /// `false` when `(x, y)` is outside the grid, in which case nothing is written.
    /// Values wrap modulo the field width.
    pub fn set_at<M: Memory + ?Sized>(&self, memory: &mut M, x: i32, y: i32, value: u8) -> bool {
        let Some((offset, index)) = self.locate(x, y) else {
            return false;
        };
        let byte = memory.load_u8(offset);
        memory.store_u8(offset, self.field.set(byte, index, value));
        true
    }
}

/// A grid that owns its bytes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    grid: Grid,
    bytes: Vec<u8>,
}

impl Surface {
    pub fn new(width: usize, height: usize, field: FieldWidth) -> Option<Self> {
        let grid = Grid::new(0, width, height, field)?;
        Some(Self {
            bytes: vec![0; grid.byte_len()],
            grid,
        })
    }

    /// Wrap existing packed data. `None` if the length doesn't match the dimensions.
    pub fn from_bytes(
        bytes: Vec<u8>,
        width: usize,
        height: usize,
        field: FieldWidth,
    ) -> Option<Self> {
        let grid = Grid::new(0, width, height, field)?;
        (bytes.len() == grid.byte_len()).then_some(Self { grid, bytes })
    }

    pub fn get(&self, x: i32, y: i32) -> u8 {
        self.grid.get_at(self.bytes.as_slice(), x, y)
    }

    pub fn set(&mut self, x: i32, y: i32, value: u8) -> bool {
        self.grid.set_at(self.bytes.as_mut_slice(), x, y, value)
    }

    pub fn fill(&mut self, value: u8) {
        let byte = self.grid.field_width().repeat(value);
        self.bytes.fill(byte);
    }

    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    /// Every `(x, y, value)`, row by row
    pub fn pixels(&self) -> impl Iterator<Item = (i32, i32, u8)> + '_ {
        iproduct!(0..self.height() as i32, 0..self.width() as i32)
            .map(move |(y, x)| (x, y, self.get(x, y)))
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn field_width(&self) -> FieldWidth {
        self.grid.field_width()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
