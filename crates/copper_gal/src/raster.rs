//! Software path context backed by tiny-skia
//!
//! Geometry is mapped to device space as it is added, the way a cairo context fixes path
//! points under the transform current at construction time. Arcs are approximated by
//! cubic Béziers. Fills and strokes land in the compositor's active buffer.

use copper_core::{Affine2D, Color, LineCap, LineJoin, Path, PathCommand, PathSnapshot, Point};
use lyon::geom::{Angle, Arc, CubicBezierSegment};
use smallvec::SmallVec;
use tiny_skia::{FillRule, Paint, PathBuilder, Stroke, Transform};
use tracing::warn;

use crate::compositor::{Compositor, PresentedImage};
use crate::context::{negative_sweep, positive_sweep, PathContext, RenderSurface, RenderTarget};
use crate::error::Result;

/// Device-space path segment
#[derive(Clone, Copy, Debug, PartialEq)]
enum Segment {
    Move(Point),
    Line(Point),
    Cubic(Point, Point, Point),
    Close,
}

#[derive(Clone, Copy, Debug)]
struct GraphicsState {
    transform: Affine2D,
    line_width: f64,
    line_cap: LineCap,
    line_join: LineJoin,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            transform: Affine2D::IDENTITY,
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
        }
    }
}

/// Rasterizing path context that draws into a [`Compositor`]
pub struct SkiaContext {
    compositor: Compositor,
    path: Path,
    segments: Vec<Segment>,
    current_point: Option<Point>,
    subpath_start: Option<Point>,
    state: GraphicsState,
    stack: SmallVec<[GraphicsState; 8]>,
    antialias: bool,
}

impl SkiaContext {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Ok(Self {
            compositor: Compositor::new(width, height)?,
            path: Path::new(),
            segments: Vec::new(),
            current_point: None,
            subpath_start: None,
            state: GraphicsState::default(),
            stack: SmallVec::new(),
            antialias: false,
        })
    }

    /// Enable anti-aliased edges (off by default)
    pub fn with_antialias(mut self, antialias: bool) -> Self {
        self.antialias = antialias;
        self
    }

    pub fn set_antialias(&mut self, antialias: bool) {
        self.antialias = antialias;
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    fn to_device(&self, point: Point) -> Point {
        self.state.transform.transform_point(point)
    }

    fn device_move_to(&mut self, device: Point) {
        self.segments.push(Segment::Move(device));
        self.current_point = Some(device);
        self.subpath_start = Some(device);
    }

    fn device_line_to(&mut self, device: Point) {
        if self.current_point.is_none() {
            self.device_move_to(device);
            return;
        }
        self.segments.push(Segment::Line(device));
        self.current_point = Some(device);
    }

    fn device_cubic_to(&mut self, c1: Point, c2: Point, end: Point) {
        if self.current_point.is_none() {
            self.device_move_to(c1);
        }
        self.segments.push(Segment::Cubic(c1, c2, end));
        self.current_point = Some(end);
    }

    /// Append an arc; `sweep` is signed
    fn add_arc(&mut self, center: Point, radius: f64, start_angle: f64, sweep: f64) {
        let start = center + Point::from_angle(start_angle) * radius;
        self.device_line_to(self.to_device(start));

        if sweep == 0.0 || radius <= 0.0 {
            return;
        }

        // Positive sweeps only; a negative arc is the reversed positive arc
        let (from_angle, magnitude) = if sweep > 0.0 {
            (start_angle, sweep)
        } else {
            (start_angle + sweep, -sweep)
        };
        let arc = Arc {
            center: lyon::geom::Point::new(center.x, center.y),
            radii: lyon::geom::Vector::new(radius, radius),
            start_angle: Angle::radians(from_angle),
            sweep_angle: Angle::radians(magnitude),
            x_rotation: Angle::radians(0.0),
        };

        let mut curves: Vec<CubicBezierSegment<f64>> = Vec::new();
        arc.for_each_cubic_bezier(&mut |curve: &CubicBezierSegment<f64>| curves.push(*curve));

        if sweep < 0.0 {
            curves.reverse();
            for curve in &mut curves {
                *curve = CubicBezierSegment {
                    from: curve.to,
                    ctrl1: curve.ctrl2,
                    ctrl2: curve.ctrl1,
                    to: curve.from,
                };
            }
        }

        for curve in curves {
            let c1 = self.to_device(Point::new(curve.ctrl1.x, curve.ctrl1.y));
            let c2 = self.to_device(Point::new(curve.ctrl2.x, curve.ctrl2.y));
            let end = self.to_device(Point::new(curve.to.x, curve.to.y));
            self.device_cubic_to(c1, c2, end);
        }
    }

    fn build_path(&self) -> Option<tiny_skia::Path> {
        let mut builder = PathBuilder::new();
        for segment in &self.segments {
            match *segment {
                Segment::Move(p) => builder.move_to(p.x as f32, p.y as f32),
                Segment::Line(p) => builder.line_to(p.x as f32, p.y as f32),
                Segment::Cubic(c1, c2, p) => builder.cubic_to(
                    c1.x as f32,
                    c1.y as f32,
                    c2.x as f32,
                    c2.y as f32,
                    p.x as f32,
                    p.y as f32,
                ),
                Segment::Close => builder.close(),
            }
        }
        builder.finish()
    }

    fn paint_for(&self, color: Color) -> Paint<'static> {
        let [r, g, b, a] = color.to_rgba8();
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = self.antialias;
        paint
    }

    fn fill_current(&mut self, color: Color) {
        let Some(path) = self.build_path() else {
            return;
        };
        let paint = self.paint_for(color);
        self.compositor.active_buffer_mut().fill_path(
            &path,
            &paint,
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    fn stroke_current(&mut self, color: Color) {
        let Some(path) = self.build_path() else {
            return;
        };
        let paint = self.paint_for(color);
        let stroke = Stroke {
            width: (self.state.line_width * self.state.transform.scale_factor()) as f32,
            line_cap: match self.state.line_cap {
                LineCap::Butt => tiny_skia::LineCap::Butt,
                LineCap::Round => tiny_skia::LineCap::Round,
                LineCap::Square => tiny_skia::LineCap::Square,
            },
            line_join: match self.state.line_join {
                LineJoin::Miter => tiny_skia::LineJoin::Miter,
                LineJoin::Round => tiny_skia::LineJoin::Round,
                LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
            },
            ..Stroke::default()
        };
        self.compositor.active_buffer_mut().stroke_path(
            &path,
            &paint,
            &stroke,
            Transform::identity(),
            None,
        );
    }

    fn clear_path(&mut self) {
        self.path.clear();
        self.segments.clear();
        self.current_point = None;
        self.subpath_start = None;
    }
}

impl PathContext for SkiaContext {
    fn move_to(&mut self, point: Point) {
        self.path.push(PathCommand::MoveTo(point));
        self.device_move_to(self.to_device(point));
    }

    fn line_to(&mut self, point: Point) {
        self.path.push(PathCommand::LineTo(point));
        self.device_line_to(self.to_device(point));
    }

    fn arc(&mut self, center: Point, radius: f64, start_angle: f64, end_angle: f64) {
        self.path.push(PathCommand::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        });
        let sweep = positive_sweep(start_angle, end_angle);
        self.add_arc(center, radius, start_angle, sweep);
    }

    fn arc_negative(&mut self, center: Point, radius: f64, start_angle: f64, end_angle: f64) {
        self.path.push(PathCommand::ArcNegative {
            center,
            radius,
            start_angle,
            end_angle,
        });
        let sweep = negative_sweep(start_angle, end_angle);
        self.add_arc(center, radius, start_angle, -sweep);
    }

    fn curve_to(&mut self, control1: Point, control2: Point, end: Point) {
        self.path.push(PathCommand::CurveTo {
            control1,
            control2,
            end,
        });
        let c1 = self.to_device(control1);
        let c2 = self.to_device(control2);
        let end = self.to_device(end);
        self.device_cubic_to(c1, c2, end);
    }

    fn close_path(&mut self) {
        self.path.push(PathCommand::Close);
        if self.current_point.is_some() {
            self.segments.push(Segment::Close);
            self.current_point = self.subpath_start;
        }
    }

    fn new_path(&mut self) {
        self.clear_path();
    }

    fn new_sub_path(&mut self) {
        self.path.push(PathCommand::NewSubPath);
        self.current_point = None;
    }

    fn fill(&mut self, color: Color) {
        self.fill_current(color);
        self.clear_path();
    }

    fn fill_preserve(&mut self, color: Color) {
        self.fill_current(color);
    }

    fn stroke(&mut self, color: Color) {
        self.stroke_current(color);
        self.clear_path();
    }

    fn stroke_preserve(&mut self, color: Color) {
        self.stroke_current(color);
    }

    fn paint(&mut self, color: Color) {
        let [r, g, b, a] = color.to_rgba8();
        self.compositor
            .active_buffer_mut()
            .fill(tiny_skia::Color::from_rgba8(r, g, b, a));
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        match self.stack.pop() {
            Some(state) => self.state = state,
            None => warn!("Unbalanced restore on path context"),
        }
    }

    fn set_transform(&mut self, matrix: Affine2D) {
        self.state.transform = matrix;
    }

    fn current_transform(&self) -> Affine2D {
        self.state.transform
    }

    fn transform(&mut self, matrix: Affine2D) {
        self.state.transform = self.state.transform.then(&matrix);
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.state.line_cap = cap;
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.state.line_join = join;
    }

    fn copy_path(&self) -> PathSnapshot {
        self.path.snapshot()
    }
}

impl RenderSurface for SkiaContext {
    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.compositor.resize(width, height)
    }

    fn screen_size(&self) -> (u32, u32) {
        (self.compositor.width(), self.compositor.height())
    }

    fn set_target(&mut self, target: RenderTarget) {
        self.compositor.set_buffer(target);
    }

    fn clear_target(&mut self, target: RenderTarget) {
        self.compositor.clear_buffer(target);
    }

    fn save_screen(&mut self) {
        self.compositor.save_screen();
    }

    fn restore_screen(&mut self) {
        self.compositor.restore_screen();
    }

    fn present(&mut self, background: Color) -> PresentedImage {
        self.compositor.present(background)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{PI, TAU};

    fn covered(context: &SkiaContext) -> Vec<(u32, u32)> {
        let image = context.compositor().present(Color::BLACK);
        let mut pixels = Vec::new();
        for y in 0..image.height() {
            for x in 0..image.width() {
                if image.pixel(x, y) != Some([0, 0, 0]) {
                    pixels.push((x, y));
                }
            }
        }
        pixels
    }

    #[test]
    fn test_fill_rectangle_covers_pixels() {
        let mut context = SkiaContext::new(20, 20).unwrap();
        context.move_to(Point::new(2.0, 2.0));
        context.line_to(Point::new(12.0, 2.0));
        context.line_to(Point::new(12.0, 12.0));
        context.line_to(Point::new(2.0, 12.0));
        context.close_path();
        context.fill(Color::RED);

        let image = context.compositor().present(Color::BLACK);
        assert_eq!(image.pixel(5, 5), Some([255, 0, 0]));
        assert_eq!(image.pixel(15, 15), Some([0, 0, 0]));
        assert!(context.copy_path().is_empty());
    }

    #[test]
    fn test_transform_applies_at_construction() {
        let mut context = SkiaContext::new(40, 40).unwrap();
        context.set_transform(Affine2D::translation(20.0, 20.0).then(&Affine2D::scale(2.0, 2.0)));
        context.new_sub_path();
        context.arc(Point::ZERO, 5.0, 0.0, TAU);
        context.fill(Color::WHITE);

        let image = context.compositor().present(Color::BLACK);
        assert_eq!(image.pixel(20, 20), Some([255, 255, 255]));
        assert_eq!(image.pixel(28, 20), Some([255, 255, 255]));
        assert_eq!(image.pixel(33, 20), Some([0, 0, 0]));
    }

    #[test]
    fn test_copy_path_keeps_user_space_commands() {
        let mut context = SkiaContext::new(10, 10).unwrap();
        context.set_transform(Affine2D::scale(3.0, 3.0));
        context.move_to(Point::new(1.0, 1.0));
        context.arc_negative(Point::new(2.0, 2.0), 1.0, PI, 0.0);

        let snapshot = context.copy_path();
        assert_eq!(snapshot.commands()[0], PathCommand::MoveTo(Point::new(1.0, 1.0)));
        assert!(matches!(
            snapshot.commands()[1],
            PathCommand::ArcNegative { radius, .. } if radius == 1.0
        ));
    }

    #[test]
    fn test_swapped_arc_is_same_sweep_after_normalization() {
        let mut a = SkiaContext::new(40, 40).unwrap();
        let mut b = SkiaContext::new(40, 40).unwrap();
        for context in [&mut a, &mut b] {
            context.set_line_width(2.0);
        }
        a.new_sub_path();
        a.arc(Point::new(20.0, 20.0), 10.0, 0.5, 2.0);
        a.stroke(Color::WHITE);
        b.new_sub_path();
        b.arc_negative(Point::new(20.0, 20.0), 10.0, 2.0, 0.5);
        b.stroke(Color::WHITE);

        let pa = covered(&a);
        let pb = covered(&b);
        let differing = pa.iter().filter(|p| !pb.contains(p)).count()
            + pb.iter().filter(|p| !pa.contains(p)).count();
        assert!(differing <= 4, "{differing} pixels differ");
    }

    #[test]
    fn test_restore_without_save_is_harmless() {
        let mut context = SkiaContext::new(4, 4).unwrap();
        context.set_line_width(3.0);
        context.restore();
        context.save();
        context.set_line_width(5.0);
        context.restore();
        assert_eq!(context.state.line_width, 3.0);
    }

    #[test]
    fn test_overlay_target_receives_fills() {
        let mut context = SkiaContext::new(8, 8).unwrap();
        context.set_target(RenderTarget::Overlay);
        context.paint(Color::GREEN);
        context.clear_target(RenderTarget::Cached);

        let image = context.present(Color::BLACK);
        assert_eq!(image.pixel(3, 3), Some([0, 255, 0]));
        assert_eq!(context.screen_size(), (8, 8));
    }
}
