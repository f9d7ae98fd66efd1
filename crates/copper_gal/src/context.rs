//! Path context abstraction
//!
//! A [`PathContext`] wraps a rasterizer's path and graphics state: one current path, one
//! current transform, a save/restore stack and stroke styling. The renderer drives it with
//! primitive calls and never touches pixels directly.
//!
//! A [`RenderSurface`] is the buffer side of the same backend: the main and overlay
//! buffers, their size, and presentation of the merged image.

use std::f64::consts::TAU;

use copper_core::{Affine2D, Color, LineCap, LineJoin, PathCommand, PathSnapshot, Point};

use crate::compositor::PresentedImage;
use crate::error::Result;

/// Buffer a drawing call is directed to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// Items that are cached in groups
    #[default]
    Cached,
    /// Items drawn every frame
    NonCached,
    /// Items drawn on top of everything else
    Overlay,
}

impl RenderTarget {
    /// Cached and non-cached items share the main buffer
    pub fn uses_overlay(self) -> bool {
        matches!(self, RenderTarget::Overlay)
    }
}

/// Primitive path and graphics-state operations of a rasterizer.
///
/// All angles are radians. Geometry is given in user space, i.e. it is mapped through the
/// current transform. Snapshots returned by [`copy_path`](Self::copy_path) are expressed in
/// the user space that was current while the path was built; callers must not change the
/// transform while a path is open.
pub trait PathContext {
    fn move_to(&mut self, point: Point);

    /// Line from the current point; behaves like `move_to` when there is none
    fn line_to(&mut self, point: Point);

    /// Arc swept towards increasing angles. If `end_angle < start_angle` it is advanced by
    /// whole turns until it is not.
    fn arc(&mut self, center: Point, radius: f64, start_angle: f64, end_angle: f64);

    /// Arc swept towards decreasing angles
    fn arc_negative(&mut self, center: Point, radius: f64, start_angle: f64, end_angle: f64);

    fn curve_to(&mut self, control1: Point, control2: Point, end: Point);

    fn close_path(&mut self);

    /// Discard the current path
    fn new_path(&mut self);

    /// Start a subpath without a current point
    fn new_sub_path(&mut self);

    /// Fill the current path and discard it
    fn fill(&mut self, color: Color);

    /// Fill the current path and keep it
    fn fill_preserve(&mut self, color: Color);

    /// Stroke the current path and discard it
    fn stroke(&mut self, color: Color);

    /// Stroke the current path and keep it
    fn stroke_preserve(&mut self, color: Color);

    /// Paint the whole active buffer
    fn paint(&mut self, color: Color);

    fn save(&mut self);

    fn restore(&mut self);

    fn set_transform(&mut self, matrix: Affine2D);

    /// Current transform (user space to device space)
    fn current_transform(&self) -> Affine2D;

    /// Concatenate `matrix` onto the current transform
    fn transform(&mut self, matrix: Affine2D);

    fn set_line_width(&mut self, width: f64);

    fn set_line_cap(&mut self, cap: LineCap);

    fn set_line_join(&mut self, join: LineJoin);

    /// Copy the current path into an independently owned snapshot
    fn copy_path(&self) -> PathSnapshot;

    fn translate(&mut self, offset: Point) {
        self.transform(Affine2D::translation(offset.x, offset.y));
    }

    fn rotate(&mut self, angle: f64) {
        self.transform(Affine2D::rotation(angle));
    }

    fn scale(&mut self, factors: Point) {
        self.transform(Affine2D::scale(factors.x, factors.y));
    }

    /// Convert a device-space distance vector to user space
    fn device_to_user_distance(&self, distance: Point) -> Point {
        match self.current_transform().inverse() {
            Some(inverse) => inverse.transform_vector(distance),
            None => distance,
        }
    }

    /// Append a snapshot to the current path by re-issuing its commands
    fn append_path(&mut self, snapshot: &PathSnapshot) {
        for command in snapshot.commands() {
            match *command {
                PathCommand::MoveTo(p) => self.move_to(p),
                PathCommand::LineTo(p) => self.line_to(p),
                PathCommand::CurveTo {
                    control1,
                    control2,
                    end,
                } => self.curve_to(control1, control2, end),
                PathCommand::Arc {
                    center,
                    radius,
                    start_angle,
                    end_angle,
                } => self.arc(center, radius, start_angle, end_angle),
                PathCommand::ArcNegative {
                    center,
                    radius,
                    start_angle,
                    end_angle,
                } => self.arc_negative(center, radius, start_angle, end_angle),
                PathCommand::NewSubPath => self.new_sub_path(),
                PathCommand::Close => self.close_path(),
            }
        }
    }

    /// Release a snapshot. Ownership guarantees each snapshot is released once.
    fn destroy_path(&mut self, snapshot: PathSnapshot) {
        drop(snapshot);
    }
}

/// Pixel buffers behind a path context
pub trait RenderSurface {
    /// Reallocate every buffer for a new screen size. Either all buffers are replaced or
    /// none are.
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    fn screen_size(&self) -> (u32, u32);

    /// Direct subsequent fills and strokes to `target`
    fn set_target(&mut self, target: RenderTarget);

    /// Clear the buffer behind `target` without changing the active target
    fn clear_target(&mut self, target: RenderTarget);

    /// Copy the main buffer aside
    fn save_screen(&mut self);

    /// Bring back the copy made by [`save_screen`](Self::save_screen)
    fn restore_screen(&mut self);

    /// Merge main then overlay over `background` and convert to packed RGB
    fn present(&mut self, background: Color) -> PresentedImage;
}

/// Sweep from `start` to `end` towards increasing angles
pub(crate) fn positive_sweep(start: f64, end: f64) -> f64 {
    let mut end = end;
    while end < start {
        end += TAU;
    }
    end - start
}

/// Sweep magnitude from `start` to `end` towards decreasing angles
pub(crate) fn negative_sweep(start: f64, end: f64) -> f64 {
    let mut end = end;
    while end > start {
        end -= TAU;
    }
    start - end
}
