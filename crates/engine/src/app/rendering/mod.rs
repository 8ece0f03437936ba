mod renderer;
pub(crate) mod text;
mod transform;

pub use renderer::Renderer;
pub use transform::{screen_to_world_px, world_to_screen_px, Viewport};

pub const PLACEHOLDER_HALF_SIZE_PX: i32 = 5;

pub(crate) fn write_pixel_rgba_clipped(
    frame: &mut [u8],
    width: usize,
    x: i32,
    y: i32,
    color: [u8; 4],
) {
    if x < 0 || y < 0 || x as usize >= width {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}
