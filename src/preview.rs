use drawille::Canvas;
use surface::Surface;

/// Nonzero fields as braille dots, one character per 2×4 block of pixels.
///
/// Good enough to eyeball a framebuffer from a terminal or a failing test.
pub fn preview(surface: &Surface) -> String {
    let mut canvas = Canvas::new(surface.width() as u32, surface.height() as u32);
    for (x, y, _) in surface.pixels().filter(|(_, _, value)| *value != 0) {
        canvas.set(x as u32, y as u32);
    }
    canvas.frame()
}
