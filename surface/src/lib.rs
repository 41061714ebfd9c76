//! Sub-byte pixel storage.
//!
//! The console framebuffer packs 2, 4 or 8 pixels into every byte. [codec] splits and joins
//! those fields, [grid] maps `(x, y)` onto a byte and a field within it.
pub mod codec;
pub mod grid;

pub use codec::{BitArray, FieldWidth, Fields, HalfNibbleArray, NibbleArray};
pub use grid::{Grid, Surface};
