//! The renderer: drawing primitives, state handling and group recording
//!
//! Every drawing call either paints immediately on the path context or, while a group is
//! being recorded, leaves its geometry pending on the context. Any state change first
//! flushes pending geometry, so a new color or width never applies to geometry issued
//! before it.

use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::ops::{Deref, DerefMut};

use copper_core::{Affine2D, Color, LineCap, LineChain, LineJoin, Point, PolySet};
use tracing::{debug, warn};

use crate::compositor::PresentedImage;
use crate::context::{PathContext, RenderSurface, RenderTarget};
use crate::error::{GalError, Result};
use crate::group::{self, GroupElement, GroupId, GroupStore, PaintSource};
use crate::state::{effective_line_width, DrawingState};
use crate::view::{GalOptions, ViewOptions};

/// Who initialised the native surface
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SurfaceOwner {
    Frame,
    Group,
}

impl SurfaceOwner {
    fn name(self) -> &'static str {
        match self {
            SurfaceOwner::Frame => "frame",
            SurfaceOwner::Group => "group",
        }
    }
}

/// Software renderer over a path context
pub struct Gal<C> {
    context: C,
    state: DrawingState,
    groups: GroupStore,
    current_group: Option<GroupId>,
    options: GalOptions,
    view: ViewOptions,
    screen_size: (u32, u32),
    target: RenderTarget,
    valid_compositor: bool,
    surface: Option<SurfaceOwner>,
    background: Color,
    cursor_position: Point,
}

impl<C: PathContext + RenderSurface> Gal<C> {
    pub fn new(context: C, options: GalOptions, view: ViewOptions) -> Self {
        let screen_size = context.screen_size();
        let background = options.background;
        Self {
            context,
            state: DrawingState::default(),
            groups: GroupStore::new(),
            current_group: None,
            options,
            view,
            screen_size,
            target: RenderTarget::Cached,
            valid_compositor: false,
            surface: None,
            background,
            cursor_position: Point::ZERO,
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn state(&self) -> &DrawingState {
        &self.state
    }

    pub fn groups(&self) -> &GroupStore {
        &self.groups
    }

    pub fn options(&self) -> &GalOptions {
        &self.options
    }

    pub fn view(&self) -> &ViewOptions {
        &self.view
    }

    /// Change the view; takes effect when the surface is next initialised
    pub fn set_view(&mut self, view: ViewOptions) {
        self.view = view;
    }

    pub fn screen_size(&self) -> (u32, u32) {
        self.screen_size
    }

    pub fn world_screen_matrix(&self) -> Affine2D {
        self.view.world_screen_matrix(self.screen_size)
    }

    pub fn to_screen(&self, point: Point) -> Point {
        self.world_screen_matrix().transform_point(point)
    }

    pub fn to_world(&self, point: Point) -> Point {
        match self.world_screen_matrix().inverse() {
            Some(inverse) => inverse.transform_point(point),
            None => point,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Frames and surface
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a frame. Drawing goes through the returned guard; presenting is only possible
    /// by ending it.
    pub fn begin_drawing(&mut self) -> Frame<'_, C> {
        self.init_surface(SurfaceOwner::Frame);

        self.valid_compositor = true;

        self.context.set_target(RenderTarget::Cached);
        self.target = RenderTarget::Cached;
        debug!("Frame started ({}x{})", self.screen_size.0, self.screen_size.1);

        Frame {
            gal: self,
            finished: false,
        }
    }

    /// Merge the buffers and overlay the cursor crosshair
    fn present_frame(&mut self) -> PresentedImage {
        let mut image = self.context.present(self.background);
        if self.options.cursor_enabled {
            let position = self.to_screen(self.cursor_position);
            image.draw_crosshair(position, self.options.cursor_size(), self.options.cursor_rgb());
        }
        image
    }

    fn init_surface(&mut self, owner: SurfaceOwner) {
        if self.surface.is_some() {
            return;
        }

        self.context.new_path();
        let matrix = self.world_screen_matrix();
        self.context.set_transform(matrix);
        self.context.set_line_join(LineJoin::Round);
        self.context.set_line_cap(LineCap::Round);

        self.state.line_width = 0.0;
        let applied = effective_line_width(&self.context, 0.0);
        self.context.set_line_width(applied);

        self.surface = Some(owner);
    }

    fn deinit_surface(&mut self) {
        self.surface = None;
    }

    /// Reallocate the buffers for a new screen size. The compositor is invalid until the
    /// next frame starts.
    ///
    /// Fails while a frame or group recording holds the surface, since its transform was
    /// built for the old size.
    pub fn resize_screen(&mut self, width: u32, height: u32) -> Result<()> {
        if let Some(owner) = self.surface {
            warn!("Resize to {}x{} refused: surface held by {:?}", width, height, owner);
            return Err(GalError::SurfaceHeld {
                width,
                height,
                holder: owner.name(),
            });
        }

        self.deinit_surface();
        self.context.resize(width, height)?;
        self.screen_size = self.context.screen_size();
        self.valid_compositor = false;
        debug!("Screen resized to {}x{}", self.screen_size.0, self.screen_size.1);
        Ok(())
    }

    /// Direct drawing to a buffer. Ignored while the compositor is invalid.
    pub fn set_target(&mut self, target: RenderTarget) {
        if !self.valid_compositor {
            return;
        }

        if self.surface.is_some() {
            self.store_path();
        }

        self.context.set_target(target);
        self.target = target;
    }

    pub fn target(&self) -> RenderTarget {
        self.target
    }

    pub fn clear_target(&mut self, target: RenderTarget) {
        self.context.clear_target(target);
    }

    pub fn save_screen(&mut self) {
        self.context.save_screen();
    }

    pub fn restore_screen(&mut self) {
        self.context.restore_screen();
    }

    /// Paint the active buffer and remember the color as background
    pub fn clear_screen(&mut self, color: Color) {
        self.background = color;
        self.context.paint(color);
    }

    pub fn draw_cursor(&mut self, position: Point) {
        self.cursor_position = position;
    }

    /// Commit pending geometry
    pub fn flush(&mut self) {
        self.store_path();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Drawing primitives
    // ─────────────────────────────────────────────────────────────────────────

    pub fn draw_line(&mut self, start: Point, end: Point) {
        self.context.move_to(start);
        self.context.line_to(end);
        self.shape_added();
    }

    /// Line with a width. In fill mode the centerline is stroked with the fill color;
    /// otherwise a closed outline with round ends is stroked with the stroke color.
    pub fn draw_segment(&mut self, start: Point, end: Point, width: f64) {
        if self.state.fill_enabled {
            self.set_line_width(width);
            self.context.move_to(start);
            self.context.line_to(end);
            self.stroke_with_fill_color();
        } else {
            let radius = width / 2.0;
            let angle = (end - start).angle();

            self.context.new_sub_path();
            self.context
                .arc(start, radius, angle + FRAC_PI_2, angle + 3.0 * FRAC_PI_2);
            self.context
                .arc(end, radius, angle - FRAC_PI_2, angle + FRAC_PI_2);
            self.context.close_path();
            self.shape_added();
        }
    }

    pub fn draw_circle(&mut self, center: Point, radius: f64) {
        self.context.new_sub_path();
        self.context.arc(center, radius, 0.0, TAU);
        self.shape_added();
    }

    /// Arc between two angles (radians). Angles are swapped when `start > end`. When
    /// filling, the arc is closed through its center.
    pub fn draw_arc(&mut self, center: Point, radius: f64, start_angle: f64, end_angle: f64) {
        let (start_angle, end_angle) = ordered(start_angle, end_angle);

        self.context.new_sub_path();
        self.context.arc(center, radius, start_angle, end_angle);

        if self.state.fill_enabled {
            self.context.line_to(center);
            self.context.close_path();
        }

        self.shape_added();
    }

    /// Arc with a width. Same two strategies as [`draw_segment`](Self::draw_segment).
    pub fn draw_arc_segment(
        &mut self,
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        width: f64,
    ) {
        let (start_angle, end_angle) = ordered(start_angle, end_angle);

        if self.state.fill_enabled {
            self.set_line_width(width);
            self.context.new_sub_path();
            self.context.arc(center, radius, start_angle, end_angle);
            self.stroke_with_fill_color();
        } else {
            let half = width / 2.0;
            let start_point = center + Point::from_angle(start_angle) * radius;
            let end_point = center + Point::from_angle(end_angle) * radius;

            self.context.new_sub_path();
            self.context
                .arc(center, radius + half, start_angle, end_angle);
            self.context.arc(end_point, half, end_angle, end_angle + PI);
            self.context
                .arc_negative(center, radius - half, end_angle, start_angle);
            self.context
                .arc(start_point, half, start_angle + PI, start_angle + TAU);
            self.context.close_path();
            self.shape_added();
        }
    }

    pub fn draw_rectangle(&mut self, start: Point, end: Point) {
        self.context.move_to(start);
        self.context.line_to(Point::new(end.x, start.y));
        self.context.line_to(end);
        self.context.line_to(Point::new(start.x, end.y));
        self.context.close_path();
        self.shape_added();
    }

    /// Open polyline. Fewer than two points draw nothing.
    pub fn draw_polyline(&mut self, points: &[Point]) {
        if points.len() < 2 {
            return;
        }
        self.trace_points(points.iter().copied());
        self.shape_added();
    }

    /// Line chain; a closed chain also draws its closing edge. Fewer than two points draw
    /// nothing.
    pub fn draw_line_chain(&mut self, chain: &LineChain) {
        if chain.point_count() < 2 {
            return;
        }
        self.trace_points(chain.stroke_points());
        self.shape_added();
    }

    /// Closed polygon from an ordered point list. Fewer than two points draw nothing.
    pub fn draw_polygon(&mut self, points: &[Point]) {
        if points.len() < 2 {
            return;
        }
        self.trace_points(points.iter().copied());
        self.context.close_path();
        self.shape_added();
    }

    /// Every outline of a polygon set, each as a line chain
    pub fn draw_poly_set(&mut self, poly_set: &PolySet) {
        for outline in &poly_set.outlines {
            self.draw_line_chain(outline);
        }
    }

    pub fn draw_curve(&mut self, start: Point, control1: Point, control2: Point, end: Point) {
        self.context.move_to(start);
        self.context.curve_to(control1, control2, end);
        self.context.line_to(end);
        self.shape_added();
    }

    fn trace_points(&mut self, mut points: impl Iterator<Item = Point>) {
        if let Some(first) = points.next() {
            self.context.move_to(first);
        }
        for point in points {
            self.context.line_to(point);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Drawing state
    // ─────────────────────────────────────────────────────────────────────────

    pub fn set_is_fill(&mut self, enabled: bool) {
        self.store_path();
        self.state.fill_enabled = enabled;
        self.record(GroupElement::SetFill(enabled));
    }

    pub fn set_is_stroke(&mut self, enabled: bool) {
        self.store_path();
        self.state.stroke_enabled = enabled;
        self.record(GroupElement::SetStroke(enabled));
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.store_path();
        self.state.fill_color = color;
        self.record(GroupElement::SetFillColor(color));
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.store_path();
        self.state.stroke_color = color;
        self.record(GroupElement::SetStrokeColor(color));
    }

    /// Requested width in user units. The context never receives less than one device
    /// pixel.
    pub fn set_line_width(&mut self, width: f64) {
        self.store_path();
        self.state.line_width = width;

        if self.state.is_grouping {
            self.record(GroupElement::SetLineWidth(width));
        } else {
            let applied = effective_line_width(&self.context, width);
            self.context.set_line_width(applied);
        }
    }

    pub fn set_layer_depth(&mut self, depth: f64) {
        self.state.layer_depth = depth;
        if self.surface.is_some() {
            self.store_path();
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transformations
    // ─────────────────────────────────────────────────────────────────────────

    /// Concatenate a matrix onto the current transform. Applied directly, never recorded.
    pub fn transform(&mut self, matrix: Affine2D) {
        self.store_path();
        self.context.transform(matrix);
    }

    pub fn rotate(&mut self, angle: f64) {
        self.store_path();
        if self.state.is_grouping {
            self.record(GroupElement::Rotate(angle));
        } else {
            self.context.rotate(angle);
        }
    }

    pub fn translate(&mut self, offset: Point) {
        self.store_path();
        if self.state.is_grouping {
            self.record(GroupElement::Translate(offset));
        } else {
            self.context.translate(offset);
        }
    }

    pub fn scale(&mut self, factors: Point) {
        self.store_path();
        if self.state.is_grouping {
            self.record(GroupElement::Scale(factors));
        } else {
            self.context.scale(factors);
        }
    }

    pub fn save(&mut self) {
        self.store_path();
        if self.state.is_grouping {
            self.record(GroupElement::Save);
        } else {
            self.context.save();
        }
    }

    pub fn restore(&mut self) {
        self.store_path();
        if self.state.is_grouping {
            self.record(GroupElement::Restore);
        } else {
            self.context.restore();
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Groups
    // ─────────────────────────────────────────────────────────────────────────

    /// Start recording a new group and return its id. Pending geometry is flushed first.
    pub fn begin_group(&mut self) -> GroupId {
        self.init_surface(SurfaceOwner::Group);
        self.store_path();

        let id = self.groups.allocate();
        self.current_group = Some(id);
        self.state.is_grouping = true;
        debug!("Recording group {}", id);
        id
    }

    /// Flush pending geometry into the active group and stop recording
    pub fn end_group(&mut self) {
        self.store_path();
        self.state.is_grouping = false;

        if let Some(id) = self.current_group.take() {
            debug!("Finished group {}", id);
        }

        if self.surface == Some(SurfaceOwner::Group) {
            self.deinit_surface();
        }
    }

    /// Replay a group. While recording, the invocation is recorded instead.
    pub fn draw_group(&mut self, id: GroupId) {
        self.store_path();

        if self.state.is_grouping {
            self.record(GroupElement::InvokeGroup(id));
            return;
        }

        group::replay(&self.groups, id, &mut self.context, &mut self.state);
    }

    /// Replace every fill and stroke color recorded in a group
    pub fn change_group_color(&mut self, id: GroupId, color: Color) {
        self.store_path();
        if !self.groups.recolor(id, color) {
            warn!("Cannot recolor group {}: not live", id);
        }
    }

    /// No-op: draw order alone determines stacking, there is no depth channel to update.
    pub fn change_group_depth(&mut self, _id: GroupId, _depth: i32) {}

    /// Release a group and every path snapshot it owns. Unknown ids are ignored.
    pub fn delete_group(&mut self, id: GroupId) {
        self.store_path();

        let Some(group) = self.groups.remove(id) else {
            warn!("Cannot delete group {}: not live", id);
            return;
        };

        for snapshot in group.into_path_snapshots() {
            self.context.destroy_path(snapshot);
        }
        debug!("Deleted group {}", id);
    }

    /// Delete every live group, highest id first
    pub fn clear_cache(&mut self) {
        for id in self.groups.ids_descending() {
            self.delete_group(id);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Path bookkeeping
    // ─────────────────────────────────────────────────────────────────────────

    fn record(&mut self, element: GroupElement) {
        if !self.state.is_grouping {
            return;
        }
        if let Some(id) = self.current_group {
            self.groups.record(id, element);
        }
    }

    /// Geometry for one primitive is complete
    fn shape_added(&mut self) {
        if !self.state.is_grouping {
            self.flush_path();
        }
        self.state.is_element_added = true;
    }

    /// Paint pending geometry now
    fn flush_path(&mut self) {
        let DrawingState {
            fill_enabled,
            stroke_enabled,
            fill_color,
            stroke_color,
            ..
        } = self.state;

        if fill_enabled {
            if stroke_enabled {
                self.context.fill_preserve(fill_color);
            } else {
                self.context.fill(fill_color);
            }
        }

        if stroke_enabled {
            self.context.stroke(stroke_color);
        } else if !fill_enabled {
            self.context.new_path();
        }
    }

    /// Centerline of a filled segment: painted now, or recorded as a stroke that takes the
    /// fill color at replay time
    fn stroke_with_fill_color(&mut self) {
        if self.state.is_grouping {
            let path = self.context.copy_path();
            self.record(GroupElement::StrokePath {
                path,
                source: PaintSource::Fill,
            });
            self.context.new_path();
        } else {
            self.context.stroke(self.state.fill_color);
        }
    }

    /// Commit pending geometry before a state change
    fn store_path(&mut self) {
        if !self.state.is_element_added {
            return;
        }
        self.state.is_element_added = false;

        if self.state.is_grouping {
            let path = self.context.copy_path();
            if !path.is_empty() {
                if self.state.fill_enabled {
                    self.record(GroupElement::FillPath(path.clone()));
                }
                if self.state.stroke_enabled {
                    self.record(GroupElement::StrokePath {
                        path,
                        source: PaintSource::Stroke,
                    });
                }
            }
        }

        self.context.new_path();
    }
}

fn ordered(start: f64, end: f64) -> (f64, f64) {
    if start > end {
        (end, start)
    } else {
        (start, end)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Frame Guard
// ─────────────────────────────────────────────────────────────────────────────

/// An open frame. Dereferences to the renderer for drawing; [`end`](Frame::end) presents.
///
/// Dropping a frame without ending it flushes and releases the surface without presenting.
pub struct Frame<'a, C: PathContext + RenderSurface> {
    gal: &'a mut Gal<C>,
    finished: bool,
}

impl<C: PathContext + RenderSurface> Frame<'_, C> {
    /// Flush, merge the buffers and return the presentable image
    pub fn end(mut self) -> PresentedImage {
        self.finished = true;
        self.gal.flush();
        let image = self.gal.present_frame();
        self.gal.deinit_surface();
        debug!("Frame presented");
        image
    }
}

impl<C: PathContext + RenderSurface> Deref for Frame<'_, C> {
    type Target = Gal<C>;

    fn deref(&self) -> &Gal<C> {
        &*self.gal
    }
}

impl<C: PathContext + RenderSurface> DerefMut for Frame<'_, C> {
    fn deref_mut(&mut self) -> &mut Gal<C> {
        &mut *self.gal
    }
}

impl<C: PathContext + RenderSurface> Drop for Frame<'_, C> {
    fn drop(&mut self) {
        if !self.finished {
            self.gal.flush();
            self.gal.deinit_surface();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::SkiaContext;
    use crate::recording::{ContextCall, RecordingContext};

    fn recording_gal() -> Gal<RecordingContext> {
        Gal::new(
            RecordingContext::new(100, 100),
            GalOptions::default(),
            ViewOptions::default(),
        )
    }

    /// View that maps world coordinates 1:1 onto a `size` × `size` screen
    fn unit_view(size: u32) -> ViewOptions {
        let half = f64::from(size) / 2.0;
        ViewOptions {
            look_at: Point::new(half, half),
            world_unit_length: 1.0,
            screen_dpi: 1.0,
            ..ViewOptions::default()
        }
    }

    fn covered(image: &PresentedImage) -> Vec<(u32, u32)> {
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

    fn bounds(pixels: &[(u32, u32)]) -> (u32, u32, u32, u32) {
        let min_x = pixels.iter().map(|p| p.0).min().unwrap();
        let max_x = pixels.iter().map(|p| p.0).max().unwrap();
        let min_y = pixels.iter().map(|p| p.1).min().unwrap();
        let max_y = pixels.iter().map(|p| p.1).max().unwrap();
        (min_x, max_x, min_y, max_y)
    }

    fn arcs_and_fills(calls: &[ContextCall]) -> Vec<ContextCall> {
        calls
            .iter()
            .filter(|call| matches!(call, ContextCall::Arc { .. } | ContextCall::Fill(_)))
            .cloned()
            .collect()
    }

    fn red_circle_group(gal: &mut Gal<RecordingContext>) -> GroupId {
        let id = gal.begin_group();
        gal.set_is_stroke(false);
        gal.set_is_fill(true);
        gal.set_fill_color(Color::RED);
        gal.draw_circle(Point::ZERO, 5.0);
        gal.end_group();
        id
    }

    #[test]
    fn test_replayed_red_circle_issues_arc_then_fill() {
        let mut gal = recording_gal();
        let id = red_circle_group(&mut gal);

        gal.context_mut().clear();
        gal.draw_group(id);
        gal.draw_group(id);

        let arc = ContextCall::Arc {
            center: Point::ZERO,
            radius: 5.0,
            start_angle: 0.0,
            end_angle: TAU,
        };
        assert_eq!(
            arcs_and_fills(gal.context().calls()),
            vec![
                arc.clone(),
                ContextCall::Fill(Color::RED),
                arc,
                ContextCall::Fill(Color::RED),
            ]
        );
    }

    #[test]
    fn test_replay_is_deterministic() {
        let mut gal = recording_gal();
        let id = gal.begin_group();
        gal.set_is_fill(true);
        gal.set_fill_color(Color::BLUE);
        gal.draw_segment(Point::ZERO, Point::new(10.0, 0.0), 2.0);
        gal.set_is_fill(false);
        gal.set_line_width(0.5);
        gal.draw_rectangle(Point::ZERO, Point::new(4.0, 3.0));
        gal.draw_arc_segment(Point::ZERO, 6.0, 0.0, 1.0, 1.0);
        gal.end_group();

        gal.context_mut().clear();
        gal.draw_group(id);
        let first = gal.context_mut().take_calls();
        gal.draw_group(id);
        let second = gal.context_mut().take_calls();

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_recolor_applies_to_future_replays() {
        let mut gal = recording_gal();
        let id = red_circle_group(&mut gal);
        let other = red_circle_group(&mut gal);

        gal.change_group_color(id, Color::GREEN);
        gal.context_mut().clear();
        gal.draw_group(id);
        gal.draw_group(other);

        let fills: Vec<_> = gal
            .context()
            .calls()
            .iter()
            .filter(|call| matches!(call, ContextCall::Fill(_)))
            .cloned()
            .collect();
        assert_eq!(
            fills,
            vec![ContextCall::Fill(Color::GREEN), ContextCall::Fill(Color::RED)]
        );
    }

    #[test]
    fn test_arc_angles_are_swapped() {
        let mut a = recording_gal();
        let mut b = recording_gal();
        a.draw_arc(Point::new(1.0, 2.0), 3.0, 2.0, 0.5);
        b.draw_arc(Point::new(1.0, 2.0), 3.0, 0.5, 2.0);

        assert_eq!(a.context().calls(), b.context().calls());
        assert!(a.context().calls().contains(&ContextCall::Arc {
            center: Point::new(1.0, 2.0),
            radius: 3.0,
            start_angle: 0.5,
            end_angle: 2.0,
        }));
    }

    #[test]
    fn test_filled_arc_closes_through_center() {
        let mut gal = recording_gal();
        gal.set_is_fill(true);
        gal.context_mut().clear();
        gal.draw_arc(Point::new(1.0, 2.0), 3.0, 0.0, 1.0);

        let calls = gal.context().calls();
        assert_eq!(calls[2], ContextCall::LineTo(Point::new(1.0, 2.0)));
        assert_eq!(calls[3], ContextCall::ClosePath);
    }

    #[test]
    fn test_state_change_commits_pending_geometry_first() {
        let mut gal = recording_gal();
        let id = gal.begin_group();
        gal.set_is_fill(true);
        gal.draw_circle(Point::ZERO, 1.0);
        gal.set_fill_color(Color::RED);
        gal.end_group();

        let elements = gal.groups().get(id).unwrap().elements();
        assert_eq!(elements.len(), 4);
        assert_eq!(elements[0], GroupElement::SetFill(true));
        assert!(matches!(elements[1], GroupElement::FillPath(_)));
        assert!(matches!(
            elements[2],
            GroupElement::StrokePath {
                source: PaintSource::Stroke,
                ..
            }
        ));
        assert_eq!(elements[3], GroupElement::SetFillColor(Color::RED));
    }

    #[test]
    fn test_filled_segment_records_centerline_with_fill_color() {
        let mut gal = recording_gal();
        let id = gal.begin_group();
        gal.set_is_fill(true);
        gal.draw_segment(Point::ZERO, Point::new(5.0, 0.0), 2.0);
        gal.end_group();

        let elements = gal.groups().get(id).unwrap().elements();
        assert_eq!(elements[1], GroupElement::SetLineWidth(2.0));
        match &elements[2] {
            GroupElement::StrokePath { path, source } => {
                assert_eq!(*source, PaintSource::Fill);
                assert_eq!(path.len(), 2);
            }
            other => panic!("unexpected element {other:?}"),
        }
        assert_eq!(elements.len(), 3);
    }

    #[test]
    fn test_outline_segment_is_one_closed_contour() {
        let mut gal = recording_gal();
        gal.context_mut().clear();
        gal.draw_segment(Point::ZERO, Point::new(5.0, 0.0), 2.0);

        let calls = gal.context().calls();
        assert_eq!(calls[0], ContextCall::NewSubPath);
        assert!(matches!(calls[1], ContextCall::Arc { radius, .. } if radius == 1.0));
        assert!(matches!(calls[2], ContextCall::Arc { center, .. } if center == Point::new(5.0, 0.0)));
        assert_eq!(calls[3], ContextCall::ClosePath);
        assert_eq!(calls[4], ContextCall::Stroke(Color::WHITE));
    }

    #[test]
    fn test_degenerate_polygons_are_skipped() {
        let mut gal = recording_gal();
        gal.draw_polygon(&[Point::new(1.0, 1.0)]);
        gal.draw_polyline(&[]);
        gal.draw_line_chain(&LineChain::new(vec![Point::ZERO], true));
        assert!(gal.context().calls().is_empty());
    }

    #[test]
    fn test_closed_chain_draws_closing_edge() {
        let mut gal = recording_gal();
        let points = vec![Point::ZERO, Point::new(4.0, 0.0), Point::new(4.0, 4.0)];
        gal.draw_line_chain(&LineChain::new(points, true));

        assert_eq!(
            gal.context().calls(),
            &[
                ContextCall::MoveTo(Point::ZERO),
                ContextCall::LineTo(Point::new(4.0, 0.0)),
                ContextCall::LineTo(Point::new(4.0, 4.0)),
                ContextCall::LineTo(Point::ZERO),
                ContextCall::Stroke(Color::WHITE),
            ]
        );
    }

    #[test]
    fn test_delete_group_twice_and_clear_cache() {
        let mut gal = recording_gal();
        let id = gal.begin_group();
        gal.draw_circle(Point::ZERO, 1.0);
        gal.end_group();
        red_circle_group(&mut gal);
        red_circle_group(&mut gal);

        gal.context_mut().clear();
        gal.delete_group(id);
        gal.delete_group(id);
        gal.draw_group(id);

        let destroyed = gal
            .context()
            .calls()
            .iter()
            .filter(|call| matches!(call, ContextCall::DestroyPath(_)))
            .count();
        assert_eq!(destroyed, 1);
        assert_eq!(gal.groups().len(), 2);

        gal.clear_cache();
        assert!(gal.groups().is_empty());
        gal.clear_cache();
        assert!(gal.groups().is_empty());
    }

    #[test]
    fn test_draw_group_while_recording_records_invocation() {
        let mut gal = recording_gal();
        let inner = red_circle_group(&mut gal);
        let outer = gal.begin_group();
        gal.draw_group(inner);
        gal.end_group();

        assert_eq!(
            gal.groups().get(outer).unwrap().elements(),
            &[GroupElement::InvokeGroup(inner)]
        );
    }

    #[test]
    fn test_change_group_depth_is_noop() {
        let mut gal = recording_gal();
        let id = red_circle_group(&mut gal);
        let before = gal.groups().get(id).unwrap().elements().to_vec();
        gal.context_mut().clear();
        gal.change_group_depth(id, 5);
        assert_eq!(gal.groups().get(id).unwrap().elements(), before.as_slice());
        assert!(gal.context().calls().is_empty());
    }

    #[test]
    fn test_line_width_applied_is_at_least_one_pixel() {
        let mut gal = recording_gal();
        gal.context_mut().set_transform(Affine2D::scale(0.5, 0.5));
        gal.context_mut().clear();
        gal.set_line_width(0.25);

        assert_eq!(gal.state().line_width, 0.25);
        assert_eq!(gal.context().calls(), &[ContextCall::SetLineWidth(2.0)]);
    }

    #[test]
    fn test_set_target_ignored_until_compositor_is_valid() {
        let mut gal = recording_gal();
        gal.set_target(RenderTarget::Overlay);
        assert_eq!(gal.target(), RenderTarget::Cached);

        {
            let mut frame = gal.begin_drawing();
            frame.set_target(RenderTarget::Overlay);
            assert_eq!(frame.target(), RenderTarget::Overlay);
            frame.end();
        }

        gal.resize_screen(50, 40).unwrap();
        assert_eq!(gal.screen_size(), (50, 40));
        gal.set_target(RenderTarget::NonCached);
        assert_eq!(gal.target(), RenderTarget::Cached);
    }

    #[test]
    fn test_resize_refused_while_surface_is_held() {
        let mut gal = recording_gal();
        let old_matrix = gal.world_screen_matrix();

        {
            let mut frame = gal.begin_drawing();
            assert!(matches!(
                frame.resize_screen(400, 300),
                Err(GalError::SurfaceHeld { holder: "frame", .. })
            ));
            assert_eq!(frame.screen_size(), (100, 100));
            assert_eq!(frame.world_screen_matrix(), old_matrix);
            frame.draw_line(Point::ZERO, Point::new(1.0, 1.0));
            frame.end();
        }

        gal.begin_group();
        assert!(gal.resize_screen(400, 300).is_err());
        gal.end_group();

        gal.resize_screen(400, 300).unwrap();
        let new_matrix = gal.world_screen_matrix();
        assert_ne!(new_matrix, old_matrix);

        gal.context_mut().clear();
        let mut frame = gal.begin_drawing();
        frame.draw_line(Point::ZERO, Point::new(1.0, 1.0));
        frame.end();

        let calls = gal.context().calls();
        let transform = calls
            .iter()
            .position(|call| *call == ContextCall::SetTransform(new_matrix))
            .unwrap();
        let line = calls
            .iter()
            .position(|call| matches!(call, ContextCall::LineTo(_)))
            .unwrap();
        assert!(transform < line);
        assert!(!calls.contains(&ContextCall::SetTransform(old_matrix)));
    }

    #[test]
    fn test_frame_presents_only_when_ended() {
        let mut gal = recording_gal();
        {
            let mut frame = gal.begin_drawing();
            frame.draw_line(Point::ZERO, Point::new(1.0, 1.0));
        }
        assert!(!gal
            .context()
            .calls()
            .iter()
            .any(|call| matches!(call, ContextCall::Present(_))));

        let mut frame = gal.begin_drawing();
        frame.clear_screen(Color::BLUE);
        let image = frame.end();
        assert_eq!((image.width(), image.height()), (100, 100));
        assert!(gal
            .context()
            .calls()
            .contains(&ContextCall::Present(Color::BLUE)));
    }

    #[test]
    fn test_frame_installs_view_and_round_style() {
        let mut gal = recording_gal();
        let matrix = gal.world_screen_matrix();
        let frame = gal.begin_drawing();
        frame.end();

        let calls = gal.context().calls();
        assert!(calls.contains(&ContextCall::SetTransform(matrix)));
        assert!(calls.contains(&ContextCall::SetLineJoin(LineJoin::Round)));
        assert!(calls.contains(&ContextCall::SetLineCap(LineCap::Round)));
    }

    #[test]
    fn test_segment_modes_cover_same_extent() {
        let context = SkiaContext::new(40, 40).unwrap();
        let mut gal = Gal::new(context, GalOptions::default(), unit_view(40));

        let mut frame = gal.begin_drawing();
        frame.clear_screen(Color::BLACK);
        frame.set_is_fill(true);
        frame.set_fill_color(Color::WHITE);
        frame.draw_segment(Point::new(10.0, 20.0), Point::new(30.0, 20.0), 10.0);
        let filled = frame.end();

        let mut frame = gal.begin_drawing();
        frame.clear_screen(Color::BLACK);
        frame.set_is_fill(false);
        frame.draw_segment(Point::new(10.0, 20.0), Point::new(30.0, 20.0), 10.0);
        let outline = frame.end();

        let (filled_pixels, outline_pixels) = (covered(&filled), covered(&outline));
        let (a, b) = (bounds(&filled_pixels), bounds(&outline_pixels));
        assert!(a.0.abs_diff(b.0) <= 1 && a.1.abs_diff(b.1) <= 1, "{a:?} vs {b:?}");
        assert!(a.2.abs_diff(b.2) <= 1 && a.3.abs_diff(b.3) <= 1, "{a:?} vs {b:?}");

        // The contour traces the filled shape's edge, give or take a pixel of rasterization
        for &(x, y) in &outline_pixels {
            assert!(
                filled_pixels
                    .iter()
                    .any(|&(fx, fy)| fx.abs_diff(x) <= 1 && fy.abs_diff(y) <= 1),
                "contour pixel ({x}, {y}) lies outside the filled segment"
            );
        }
        assert!(outline_pixels.len() < filled_pixels.len());
        assert_eq!(filled.pixel(20, 20), Some([255, 255, 255]));
        assert_eq!(outline.pixel(20, 20), Some([0, 0, 0]));
    }

    #[test]
    fn test_group_replay_paints_inside_frame() {
        let context = SkiaContext::new(20, 20).unwrap();
        let mut gal = Gal::new(context, GalOptions::default(), unit_view(20));

        let id = gal.begin_group();
        gal.set_is_stroke(false);
        gal.set_is_fill(true);
        gal.set_fill_color(Color::RED);
        gal.draw_rectangle(Point::new(5.0, 5.0), Point::new(15.0, 15.0));
        gal.end_group();

        let mut frame = gal.begin_drawing();
        frame.clear_screen(Color::BLACK);
        frame.draw_group(id);
        let image = frame.end();

        assert_eq!(image.pixel(10, 10), Some([255, 0, 0]));
        assert_eq!(image.pixel(2, 2), Some([0, 0, 0]));
    }
}
