//! Recording path context
//!
//! Logs every primitive it receives instead of rasterizing. Used to inspect what the
//! renderer issues, e.g. to check that replaying a group produces the same call sequence
//! every time.

use copper_core::{Affine2D, Color, LineCap, LineJoin, Path, PathCommand, PathSnapshot, Point};

use crate::compositor::PresentedImage;
use crate::context::{PathContext, RenderSurface, RenderTarget};
use crate::error::Result;

/// A primitive call received by a [`RecordingContext`]
#[derive(Clone, Debug, PartialEq)]
pub enum ContextCall {
    MoveTo(Point),
    LineTo(Point),
    Arc {
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    ArcNegative {
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    CurveTo {
        control1: Point,
        control2: Point,
        end: Point,
    },
    ClosePath,
    NewPath,
    NewSubPath,
    Fill(Color),
    FillPreserve(Color),
    Stroke(Color),
    StrokePreserve(Color),
    Paint(Color),
    Save,
    Restore,
    SetTransform(Affine2D),
    Transform(Affine2D),
    SetLineWidth(f64),
    SetLineCap(LineCap),
    SetLineJoin(LineJoin),
    DestroyPath(usize),
    Resize { width: u32, height: u32 },
    SetTarget(RenderTarget),
    ClearTarget(RenderTarget),
    SaveScreen,
    RestoreScreen,
    Present(Color),
}

/// Path context that records calls
#[derive(Debug)]
pub struct RecordingContext {
    calls: Vec<ContextCall>,
    path: Path,
    transform: Affine2D,
    stack: Vec<Affine2D>,
    size: (u32, u32),
}

impl RecordingContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            calls: Vec::new(),
            path: Path::new(),
            transform: Affine2D::IDENTITY,
            stack: Vec::new(),
            size: (width, height),
        }
    }

    /// Get the recorded calls
    pub fn calls(&self) -> &[ContextCall] {
        &self.calls
    }

    /// Take the recorded calls, leaving the log empty
    pub fn take_calls(&mut self) -> Vec<ContextCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    fn record(&mut self, call: ContextCall) {
        self.calls.push(call);
    }
}

impl PathContext for RecordingContext {
    fn move_to(&mut self, point: Point) {
        self.path.push(PathCommand::MoveTo(point));
        self.record(ContextCall::MoveTo(point));
    }

    fn line_to(&mut self, point: Point) {
        self.path.push(PathCommand::LineTo(point));
        self.record(ContextCall::LineTo(point));
    }

    fn arc(&mut self, center: Point, radius: f64, start_angle: f64, end_angle: f64) {
        self.path.push(PathCommand::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        });
        self.record(ContextCall::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        });
    }

    fn arc_negative(&mut self, center: Point, radius: f64, start_angle: f64, end_angle: f64) {
        self.path.push(PathCommand::ArcNegative {
            center,
            radius,
            start_angle,
            end_angle,
        });
        self.record(ContextCall::ArcNegative {
            center,
            radius,
            start_angle,
            end_angle,
        });
    }

    fn curve_to(&mut self, control1: Point, control2: Point, end: Point) {
        self.path.push(PathCommand::CurveTo {
            control1,
            control2,
            end,
        });
        self.record(ContextCall::CurveTo {
            control1,
            control2,
            end,
        });
    }

    fn close_path(&mut self) {
        self.path.push(PathCommand::Close);
        self.record(ContextCall::ClosePath);
    }

    fn new_path(&mut self) {
        self.path.clear();
        self.record(ContextCall::NewPath);
    }

    fn new_sub_path(&mut self) {
        self.path.push(PathCommand::NewSubPath);
        self.record(ContextCall::NewSubPath);
    }

    fn fill(&mut self, color: Color) {
        self.path.clear();
        self.record(ContextCall::Fill(color));
    }

    fn fill_preserve(&mut self, color: Color) {
        self.record(ContextCall::FillPreserve(color));
    }

    fn stroke(&mut self, color: Color) {
        self.path.clear();
        self.record(ContextCall::Stroke(color));
    }

    fn stroke_preserve(&mut self, color: Color) {
        self.record(ContextCall::StrokePreserve(color));
    }

    fn paint(&mut self, color: Color) {
        self.record(ContextCall::Paint(color));
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
        self.record(ContextCall::Save);
    }

    fn restore(&mut self) {
        if let Some(transform) = self.stack.pop() {
            self.transform = transform;
        }
        self.record(ContextCall::Restore);
    }

    fn set_transform(&mut self, matrix: Affine2D) {
        self.transform = matrix;
        self.record(ContextCall::SetTransform(matrix));
    }

    fn current_transform(&self) -> Affine2D {
        self.transform
    }

    fn transform(&mut self, matrix: Affine2D) {
        self.transform = self.transform.then(&matrix);
        self.record(ContextCall::Transform(matrix));
    }

    fn set_line_width(&mut self, width: f64) {
        self.record(ContextCall::SetLineWidth(width));
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.record(ContextCall::SetLineCap(cap));
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.record(ContextCall::SetLineJoin(join));
    }

    fn copy_path(&self) -> PathSnapshot {
        self.path.snapshot()
    }

    fn destroy_path(&mut self, snapshot: PathSnapshot) {
        self.record(ContextCall::DestroyPath(snapshot.len()));
    }
}

impl RenderSurface for RecordingContext {
    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.size = (width, height);
        self.record(ContextCall::Resize { width, height });
        Ok(())
    }

    fn screen_size(&self) -> (u32, u32) {
        self.size
    }

    fn set_target(&mut self, target: RenderTarget) {
        self.record(ContextCall::SetTarget(target));
    }

    fn clear_target(&mut self, target: RenderTarget) {
        self.record(ContextCall::ClearTarget(target));
    }

    fn save_screen(&mut self) {
        self.record(ContextCall::SaveScreen);
    }

    fn restore_screen(&mut self) {
        self.record(ContextCall::RestoreScreen);
    }

    fn present(&mut self, background: Color) -> PresentedImage {
        self.record(ContextCall::Present(background));
        PresentedImage::new(self.size.0, self.size.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_path_reissues_commands() {
        let mut context = RecordingContext::new(10, 10);
        context.new_sub_path();
        context.arc(Point::ZERO, 2.0, 0.0, 1.0);
        let snapshot = context.copy_path();
        context.fill(Color::RED);
        context.clear();

        context.append_path(&snapshot);
        assert_eq!(
            context.calls(),
            &[
                ContextCall::NewSubPath,
                ContextCall::Arc {
                    center: Point::ZERO,
                    radius: 2.0,
                    start_angle: 0.0,
                    end_angle: 1.0,
                },
            ]
        );
    }

    #[test]
    fn test_fill_consumes_path_but_preserve_keeps_it() {
        let mut context = RecordingContext::new(10, 10);
        context.move_to(Point::new(1.0, 1.0));
        context.fill_preserve(Color::RED);
        assert_eq!(context.copy_path().len(), 1);
        context.stroke(Color::RED);
        assert!(context.copy_path().is_empty());
    }

    #[test]
    fn test_device_to_user_distance_follows_transform() {
        let mut context = RecordingContext::new(10, 10);
        context.set_transform(Affine2D::scale(4.0, 4.0));
        let d = context.device_to_user_distance(Point::new(1.0, 1.0));
        assert_eq!(d, Point::new(0.25, 0.25));
    }
}
