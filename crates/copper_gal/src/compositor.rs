//! Off-screen buffers and presentation
//!
//! The compositor owns a main buffer (cached and non-cached items), an overlay buffer and a
//! backup copy of the main buffer. Presenting merges main then overlay over the background
//! and converts the premultiplied RGBA result into packed RGB rows.

use copper_core::{Color, Point};
use tiny_skia::{Pixmap, PixmapPaint, Transform};
use tracing::debug;

use crate::context::RenderTarget;
use crate::error::{GalError, Result};

/// Row alignment, in bytes, required by the rasterizer's pixel buffers
pub const STRIDE_ALIGNMENT: usize = 4;

/// Width in pixels of rows whose packed RGB size is a multiple of four bytes
pub fn padded_buffer_width(width: u32) -> u32 {
    let mut buffer_width = width;
    while (buffer_width * 3) % 4 != 0 {
        buffer_width += 1;
    }
    buffer_width
}

fn to_skia_color(color: Color) -> tiny_skia::Color {
    let [r, g, b, a] = color.to_rgba8();
    tiny_skia::Color::from_rgba8(r, g, b, a)
}

fn allocate(width: u32, height: u32) -> Result<Pixmap> {
    Pixmap::new(width, height).ok_or(GalError::BufferAllocation { width, height })
}

/// Main + overlay pixel buffers sized to the screen
pub struct Compositor {
    width: u32,
    height: u32,
    buffer_width: u32,
    main: Pixmap,
    overlay: Pixmap,
    backup: Pixmap,
    active: RenderTarget,
}

impl Compositor {
    /// Allocate buffers for a `width` × `height` screen. Zero dimensions are raised to one
    /// pixel.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let width = width.max(1);
        let height = height.max(1);
        let buffer_width = padded_buffer_width(width);

        Ok(Self {
            width,
            height,
            buffer_width,
            main: allocate(buffer_width, height)?,
            overlay: allocate(buffer_width, height)?,
            backup: allocate(buffer_width, height)?,
            active: RenderTarget::Cached,
        })
    }

    /// Replace every buffer. On failure the previous buffers stay in place.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let fresh = Compositor::new(width, height)?;
        debug!(
            "Reallocated buffers: {}x{} (buffer width {})",
            fresh.width, fresh.height, fresh.buffer_width
        );
        *self = Compositor {
            active: self.active,
            ..fresh
        };
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn buffer_width(&self) -> u32 {
        self.buffer_width
    }

    /// Bytes per row of the RGBA buffers
    pub fn stride(&self) -> usize {
        let bytes = self.buffer_width as usize * 4;
        bytes.div_ceil(STRIDE_ALIGNMENT) * STRIDE_ALIGNMENT
    }

    pub fn active(&self) -> RenderTarget {
        self.active
    }

    pub fn set_buffer(&mut self, target: RenderTarget) {
        self.active = target;
    }

    /// Buffer that fills and strokes currently land in
    pub fn active_buffer_mut(&mut self) -> &mut Pixmap {
        self.buffer_mut(self.active)
    }

    pub fn buffer(&self, target: RenderTarget) -> &Pixmap {
        if target.uses_overlay() {
            &self.overlay
        } else {
            &self.main
        }
    }

    fn buffer_mut(&mut self, target: RenderTarget) -> &mut Pixmap {
        if target.uses_overlay() {
            &mut self.overlay
        } else {
            &mut self.main
        }
    }

    /// Clear a buffer to transparent; the active buffer is unchanged
    pub fn clear_buffer(&mut self, target: RenderTarget) {
        self.buffer_mut(target).fill(tiny_skia::Color::TRANSPARENT);
    }

    pub fn save_screen(&mut self) {
        self.backup.data_mut().copy_from_slice(self.main.data());
    }

    pub fn restore_screen(&mut self) {
        self.main.data_mut().copy_from_slice(self.backup.data());
    }

    /// Merge main then overlay over `background`
    pub fn merge(&self, background: Color) -> Pixmap {
        let mut output = self.main.clone();
        output.fill(to_skia_color(background));

        let paint = PixmapPaint::default();
        output.draw_pixmap(0, 0, self.main.as_ref(), &paint, Transform::identity(), None);
        output.draw_pixmap(0, 0, self.overlay.as_ref(), &paint, Transform::identity(), None);
        output
    }

    /// Merge the buffers and convert to packed RGB rows
    pub fn present(&self, background: Color) -> PresentedImage {
        let merged = self.merge(background);
        let mut image = PresentedImage::new(self.width, self.height);

        for y in 0..self.height {
            for x in 0..self.width {
                if let Some(pixel) = merged.pixel(x, y) {
                    let color = pixel.demultiply();
                    image.set_pixel(x, y, [color.red(), color.green(), color.blue()]);
                }
            }
        }

        image
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Presented Image
// ─────────────────────────────────────────────────────────────────────────────

/// Packed 8-bit RGB image whose rows are padded to a multiple of four bytes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresentedImage {
    width: u32,
    height: u32,
    buffer_width: u32,
    data: Vec<u8>,
}

impl PresentedImage {
    /// Black image of the given size
    pub fn new(width: u32, height: u32) -> Self {
        let buffer_width = padded_buffer_width(width);
        Self {
            width,
            height,
            buffer_width,
            data: vec![0; buffer_width as usize * 3 * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row, including padding
    pub fn stride(&self) -> usize {
        self.buffer_width as usize * 3
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride() + x as usize * 3;
        Some([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = y as usize * self.stride() + x as usize * 3;
        self.data[offset..offset + 3].copy_from_slice(&rgb);
    }

    /// Rows without padding, suitable for image encoders
    pub fn to_packed_rgb(&self) -> Vec<u8> {
        let row_bytes = self.width as usize * 3;
        let mut packed = Vec::with_capacity(row_bytes * self.height as usize);
        for row in self.data.chunks_exact(self.stride().max(1)).take(self.height as usize) {
            packed.extend_from_slice(&row[..row_bytes]);
        }
        packed
    }

    /// Draw a crosshair of `size` pixels centered on `center` (screen coordinates)
    pub fn draw_crosshair(&mut self, center: Point, size: i64, rgb: [u8; 3]) {
        let cx = center.x.round() as i64;
        let cy = center.y.round() as i64;
        let half = size / 2;

        for x in (cx - half)..=(cx + half) {
            if x >= 0 && cy >= 0 {
                self.set_pixel(x as u32, cy as u32, rgb);
            }
        }
        for y in (cy - half)..=(cy + half) {
            if y >= 0 && cx >= 0 {
                self.set_pixel(cx as u32, y as u32, rgb);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_rect(pixmap: &mut Pixmap, color: Color) {
        if let Some(rect) = tiny_skia::Rect::from_xywh(0.0, 0.0, 4.0, 4.0) {
            let mut paint = tiny_skia::Paint::default();
            paint.set_color(to_skia_color(color));
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    #[test]
    fn test_buffer_width_padding() {
        assert_eq!(padded_buffer_width(4), 4);
        assert_eq!(padded_buffer_width(5), 8);
        assert_eq!(padded_buffer_width(6), 8);
        assert_eq!(padded_buffer_width(9), 12);
    }

    #[test]
    fn test_stride_is_aligned() {
        let compositor = Compositor::new(5, 3).unwrap();
        assert_eq!(compositor.buffer_width(), 8);
        assert_eq!(compositor.stride() % STRIDE_ALIGNMENT, 0);
        assert_eq!(compositor.buffer(RenderTarget::Cached).width(), 8);
    }

    #[test]
    fn test_overlay_wins_on_merge() {
        let mut compositor = Compositor::new(8, 8).unwrap();
        compositor.set_buffer(RenderTarget::Cached);
        fill_rect(compositor.active_buffer_mut(), Color::RED);
        compositor.set_buffer(RenderTarget::Overlay);
        fill_rect(compositor.active_buffer_mut(), Color::BLUE);

        let image = compositor.present(Color::BLACK);
        assert_eq!(image.pixel(1, 1), Some([0, 0, 255]));
        assert_eq!(image.pixel(6, 6), Some([0, 0, 0]));
    }

    #[test]
    fn test_clear_keeps_active_buffer() {
        let mut compositor = Compositor::new(8, 8).unwrap();
        compositor.set_buffer(RenderTarget::Overlay);
        fill_rect(compositor.active_buffer_mut(), Color::GREEN);
        compositor.clear_buffer(RenderTarget::Cached);
        assert_eq!(compositor.active(), RenderTarget::Overlay);

        compositor.clear_buffer(RenderTarget::Overlay);
        let image = compositor.present(Color::WHITE);
        assert_eq!(image.pixel(1, 1), Some([255, 255, 255]));
    }

    #[test]
    fn test_resize_reallocates_all_buffers() {
        let mut compositor = Compositor::new(8, 8).unwrap();
        compositor.set_buffer(RenderTarget::Overlay);
        compositor.resize(30, 20).unwrap();

        assert_eq!(compositor.width(), 30);
        assert_eq!(compositor.buffer(RenderTarget::Cached).height(), 20);
        assert_eq!(compositor.buffer(RenderTarget::Overlay).height(), 20);
        assert_eq!(compositor.active(), RenderTarget::Overlay);
    }

    #[test]
    fn test_save_and_restore_screen() {
        let mut compositor = Compositor::new(8, 8).unwrap();
        fill_rect(compositor.active_buffer_mut(), Color::RED);
        compositor.save_screen();
        compositor.clear_buffer(RenderTarget::Cached);
        compositor.restore_screen();

        let image = compositor.present(Color::BLACK);
        assert_eq!(image.pixel(2, 2), Some([255, 0, 0]));
    }

    #[test]
    fn test_packed_rgb_strips_padding() {
        let mut image = PresentedImage::new(5, 2);
        image.set_pixel(4, 1, [1, 2, 3]);
        assert_eq!(image.stride(), 24);
        let packed = image.to_packed_rgb();
        assert_eq!(packed.len(), 30);
        assert_eq!(&packed[27..30], &[1, 2, 3]);
    }

    #[test]
    fn test_crosshair_clips_at_edges() {
        let mut image = PresentedImage::new(10, 10);
        image.draw_crosshair(Point::new(0.0, 0.0), 80, [255, 255, 255]);
        assert_eq!(image.pixel(9, 0), Some([255, 255, 255]));
        assert_eq!(image.pixel(0, 9), Some([255, 255, 255]));
        assert_eq!(image.pixel(5, 5), Some([0, 0, 0]));
    }
}
