//! Drawing state owned by a renderer instance

use copper_core::{Color, Point};

use crate::context::PathContext;

/// Fill/stroke settings read by every drawing call
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawingState {
    pub fill_enabled: bool,
    pub stroke_enabled: bool,
    pub fill_color: Color,
    pub stroke_color: Color,
    /// Requested line width in user units; the applied width may be larger
    pub line_width: f64,
    pub layer_depth: f64,
    pub is_grouping: bool,
    /// Geometry has been issued since the last flush
    pub is_element_added: bool,
}

impl Default for DrawingState {
    fn default() -> Self {
        Self {
            fill_enabled: false,
            stroke_enabled: true,
            fill_color: Color::TRANSPARENT,
            stroke_color: Color::WHITE,
            line_width: 1.0,
            layer_depth: 0.0,
            is_grouping: false,
            is_element_added: false,
        }
    }
}

/// Width of one device pixel in user units
pub fn minimum_line_width<C: PathContext + ?Sized>(context: &C) -> f64 {
    let pixel = context.device_to_user_distance(Point::new(1.0, 1.0));
    pixel.x.abs().min(pixel.y.abs())
}

/// Line width to hand to the context: never thinner than one device pixel
pub fn effective_line_width<C: PathContext + ?Sized>(context: &C, width: f64) -> f64 {
    width.max(minimum_line_width(context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingContext;
    use copper_core::Affine2D;

    #[test]
    fn test_line_width_never_below_one_pixel() {
        let mut context = RecordingContext::new(100, 100);
        context.set_transform(Affine2D::scale(0.25, 0.25));
        assert_eq!(effective_line_width(&context, 1.0), 4.0);
        assert_eq!(effective_line_width(&context, 10.0), 10.0);
    }

    #[test]
    fn test_minimum_width_ignores_flip() {
        let mut context = RecordingContext::new(100, 100);
        context.set_transform(Affine2D::scale(2.0, -2.0));
        assert_eq!(minimum_line_width(&context), 0.5);
    }
}
