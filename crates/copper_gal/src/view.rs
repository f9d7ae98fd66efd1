//! View settings and the world ↔ screen transform

use copper_core::{Affine2D, Color, Point};
use serde::{Deserialize, Serialize};

/// How the world is mapped onto the screen
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    /// Zoom factor, 1.0 is natural size
    pub zoom: f64,
    /// World point shown at the screen center
    pub look_at: Point,
    /// Length of one world unit in inches
    pub world_unit_length: f64,
    /// Screen resolution in dots per inch
    pub screen_dpi: f64,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            look_at: Point::ZERO,
            world_unit_length: 1.0 / 25.4,
            screen_dpi: 96.0,
            flip_x: false,
            flip_y: false,
        }
    }
}

impl ViewOptions {
    /// Screen pixels per world unit
    pub fn world_scale(&self) -> f64 {
        self.screen_dpi * self.world_unit_length * self.zoom
    }

    /// `translate(screen / 2) · flip · scale(world_scale) · translate(-look_at)`
    pub fn world_screen_matrix(&self, screen_size: (u32, u32)) -> Affine2D {
        let scale = self.world_scale();
        let center = Affine2D::translation(
            f64::from(screen_size.0) / 2.0,
            f64::from(screen_size.1) / 2.0,
        );
        let flip = Affine2D::scale(
            if self.flip_x { -1.0 } else { 1.0 },
            if self.flip_y { -1.0 } else { 1.0 },
        );

        center
            .then(&flip)
            .then(&Affine2D::scale(scale, scale))
            .then(&Affine2D::translation(-self.look_at.x, -self.look_at.y))
    }

    /// Zoom that makes a world-space box of `width` × `height` fill `fraction` of the screen
    pub fn zoom_to_fit(&self, screen_size: (u32, u32), width: f64, height: f64, fraction: f64) -> f64 {
        let unit = self.screen_dpi * self.world_unit_length;
        if width <= 0.0 || height <= 0.0 || unit <= 0.0 {
            return self.zoom;
        }
        let zx = f64::from(screen_size.0) / (width * unit);
        let zy = f64::from(screen_size.1) / (height * unit);
        zx.min(zy) * fraction
    }
}

/// Renderer display options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalOptions {
    /// Anti-aliased edges
    pub antialias: bool,
    /// Color the screen is cleared to
    pub background: Color,
    pub cursor_enabled: bool,
    pub cursor_color: Color,
    /// Crosshair spanning the whole screen instead of 80 pixels
    pub fullscreen_cursor: bool,
}

impl Default for GalOptions {
    fn default() -> Self {
        Self {
            antialias: false,
            background: Color::BLACK,
            cursor_enabled: false,
            cursor_color: Color::WHITE,
            fullscreen_cursor: false,
        }
    }
}

impl GalOptions {
    /// Crosshair length in pixels
    pub fn cursor_size(&self) -> i64 {
        if self.fullscreen_cursor {
            8000
        } else {
            80
        }
    }

    /// Cursor color premultiplied by its alpha, as opaque 8-bit RGB
    pub fn cursor_rgb(&self) -> [u8; 3] {
        let c = self.cursor_color;
        let q = |v: f64| ((v * c.a).clamp(0.0, 1.0) * 255.0) as u8;
        [q(c.r), q(c.g), q(c.b)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_look_at_maps_to_screen_center() {
        let view = ViewOptions {
            zoom: 2.0,
            look_at: Point::new(10.0, -4.0),
            world_unit_length: 1.0,
            screen_dpi: 1.0,
            ..ViewOptions::default()
        };
        let m = view.world_screen_matrix((200, 100));
        assert_eq!(m.transform_point(Point::new(10.0, -4.0)), Point::new(100.0, 50.0));
        assert_eq!(m.transform_point(Point::new(11.0, -4.0)), Point::new(102.0, 50.0));
    }

    #[test]
    fn test_flip_mirrors_around_center() {
        let view = ViewOptions {
            world_unit_length: 1.0,
            screen_dpi: 1.0,
            flip_x: true,
            ..ViewOptions::default()
        };
        let m = view.world_screen_matrix((100, 100));
        assert_eq!(m.transform_point(Point::new(10.0, 0.0)), Point::new(40.0, 50.0));
    }

    #[test]
    fn test_zoom_to_fit() {
        let view = ViewOptions {
            world_unit_length: 1.0,
            screen_dpi: 1.0,
            ..ViewOptions::default()
        };
        assert_eq!(view.zoom_to_fit((200, 100), 50.0, 50.0, 1.0), 2.0);
    }

    #[test]
    fn test_cursor_color_is_premultiplied() {
        let options = GalOptions {
            cursor_color: Color::rgba(1.0, 0.0, 1.0, 0.5),
            ..GalOptions::default()
        };
        assert_eq!(options.cursor_rgb(), [127, 0, 127]);
    }
}
