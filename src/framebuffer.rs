use surface::{FieldWidth, Surface};

pub const WIDTH: usize = 160;
pub const HEIGHT: usize = 160;
/// Bytes in one 2bpp buffer
pub const FRAMEBUFFER_LEN: usize = WIDTH * HEIGHT / 4;

/// Four shades, lightest first, as `0xRRGGBBAA`
pub const PALETTE: [u32; 4] = [0xE0F8CFFF, 0x86C06CFF, 0x306850FF, 0x071821FF];

/// Front and back 160×160 2bpp buffers. Drawing goes to the back buffer and shows up on
/// [Framebuffers::flip].
#[derive(Clone, Debug)]
pub struct Framebuffers {
    buffers: [Surface; 2],
    front: usize,
}

impl Default for Framebuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl Framebuffers {
    pub fn new() -> Self {
        let buffer = Surface::new(WIDTH, HEIGHT, FieldWidth::HalfNibble)
            .expect("framebuffer width packs into whole bytes");
        Self {
            buffers: [buffer.clone(), buffer],
            front: 0,
        }
    }

    /// Set one pixel of the back buffer. Off-screen pixels are ignored.
    pub fn draw(&mut self, x: i32, y: i32, color: u8) -> bool {
        self.back_mut().set(x, y, color)
    }

    pub fn front(&self) -> &Surface {
        &self.buffers[self.front]
    }

    pub fn back(&self) -> &Surface {
        &self.buffers[self.front ^ 1]
    }

    pub fn back_mut(&mut self) -> &mut Surface {
        &mut self.buffers[self.front ^ 1]
    }

    pub fn flip(&mut self) {
        self.front ^= 1;
    }

    /// Fill the back buffer with one color
    pub fn clear(&mut self, color: u8) {
        self.back_mut().fill(color);
    }

    /// The front buffer as [PALETTE] colors, row by row
    pub fn to_rgba(&self) -> Vec<u32> {
        self.front()
            .pixels()
            .map(|(_, _, color)| PALETTE[color as usize & 3])
            .collect()
    }
}
