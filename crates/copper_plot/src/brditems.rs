//! Board item plotting
//!
//! [`BoardItemsPlotter`] walks board items on the layers of a layer mask and emits each
//! one as plotter primitives, deriving fabrication metadata (net and component
//! attribution, aperture function) on the way.

use copper_core::Color;
use lyon::geom::{point, CubicBezierSegment};
use smallvec::SmallVec;
use tracing::trace;

use crate::board::{
    Board, BoardItem, Dimension, DrawSegment, DrillShape, Footprint, Pad, PadAttribute, PadShape,
    ShapeKind, Target, TargetShape, Text, Track, TrackSegment, Via, Zone, ZoneFillMode,
};
use crate::layer::{Layer, LayerSet};
use crate::metadata::{ApertureAttribute, NetInfo, PlotMetadata};
use crate::options::{DrillMarks, PlotOptions};
use crate::plotter::{FillMode, PlotMode, Plotter, TextParams};
use crate::text::line_positions;
use crate::units::{round, IntPoint, IntSize};

/// Flattening tolerance for Bézier curves, in board units
const CURVE_TOLERANCE: f64 = 1000.0;

/// Plots board items through a [`Plotter`]
pub struct BoardItemsPlotter<'a, P: Plotter + ?Sized> {
    plotter: &'a mut P,
    board: &'a Board,
    options: &'a PlotOptions,
    layer_mask: LayerSet,
}

impl<'a, P: Plotter + ?Sized> BoardItemsPlotter<'a, P> {
    pub fn new(
        plotter: &'a mut P,
        board: &'a Board,
        options: &'a PlotOptions,
        layer_mask: LayerSet,
    ) -> Self {
        Self {
            plotter,
            board,
            options,
            layer_mask,
        }
    }

    pub fn layer_mask(&self) -> LayerSet {
        self.layer_mask
    }

    pub fn set_layer_mask(&mut self, mask: LayerSet) {
        self.layer_mask = mask;
    }

    pub fn plot_mode(&self) -> PlotMode {
        self.options.plot_mode
    }

    pub fn set_color(&mut self, color: Color) {
        self.plotter.set_color(color);
    }

    /// Layer color; white becomes light gray so it stays visible on white media
    pub fn get_color(&self, layer: Layer) -> Color {
        visible_color(self.board.layer_color(layer))
    }

    fn is_plotting_copper(&self) -> bool {
        self.layer_mask.intersects(LayerSet::all_cu())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pads
    // ─────────────────────────────────────────────────────────────────────────

    /// Metadata of a pad plotted on the current layer mask
    pub fn pad_metadata(&self, pad: &Pad, reference: &str) -> PlotMetadata {
        let on_copper = self.is_plotting_copper();
        let on_external_copper = self.layer_mask.intersects(LayerSet::external_cu());
        let pad_on_tech = pad.layers.intersects(LayerSet::all_board_tech());

        let mut md = PlotMetadata::new();
        md.set_component_ref(reference);

        if !on_copper {
            md.set_net_info(NetInfo::Component);
            return md;
        }

        md.set_net_info(NetInfo::All);
        if on_external_copper {
            md.set_pad_name(pad.name.as_str());
        }
        md.set_net_name(pad.net_name.as_str());

        if pad.attribute == PadAttribute::HoleNotPlated || pad.name.is_empty() {
            md.not_in_net = true;
        }

        if !on_external_copper || !pad_on_tech {
            // Not a soldered pad: inner layer, or no mask/paste opening
            md.set_net_info(NetInfo::NetAndComponent);

            if !pad_on_tech {
                md.set_aperture(ApertureAttribute::Conductor);
            }

            match pad.attribute {
                PadAttribute::HoleNotPlated => md.set_aperture(ApertureAttribute::WasherPad),
                PadAttribute::Standard => md.set_aperture(ApertureAttribute::ViaPad),
                PadAttribute::Smd | PadAttribute::Connector => {}
            }
        } else {
            let aperture = match pad.attribute {
                PadAttribute::HoleNotPlated => ApertureAttribute::WasherPad,
                PadAttribute::Standard => ApertureAttribute::ComponentPad,
                PadAttribute::Connector => ApertureAttribute::ConnectorPad,
                PadAttribute::Smd if pad.shape == PadShape::Circle => ApertureAttribute::BgaPadCuDef,
                PadAttribute::Smd => ApertureAttribute::SmdPadCuDef,
            };
            md.set_aperture(aperture);
        }

        if pad.attribute == PadAttribute::HoleNotPlated {
            md.set_aperture(ApertureAttribute::WasherPad);
        }

        md
    }

    /// Flash a pad with the primitive matching its shape
    pub fn plot_pad(&mut self, pad: &Pad, reference: &str, color: Color, mode: PlotMode) {
        let md = self.pad_metadata(pad, reference);
        let position = pad.shape_position();

        self.plotter.set_color(visible_color(color));

        match pad.shape {
            PadShape::Circle => {
                self.plotter
                    .flash_pad_circle(position, pad.size.x, mode, Some(&md));
            }
            PadShape::Oval => {
                self.plotter
                    .flash_pad_oval(position, pad.size, pad.orientation, mode, Some(&md));
            }
            PadShape::Trapezoid => {
                let corners = pad.trapezoid_corners();
                self.plotter.flash_pad_trapezoid(
                    position,
                    &corners,
                    pad.orientation,
                    mode,
                    Some(&md),
                );
            }
            PadShape::RoundRect => {
                self.plotter.flash_pad_round_rect(
                    position,
                    pad.size,
                    pad.round_rect_corner_radius(),
                    pad.orientation,
                    mode,
                    Some(&md),
                );
            }
            PadShape::Rect => {
                self.plotter
                    .flash_pad_rect(position, pad.size, pad.orientation, mode, Some(&md));
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Footprint texts and graphics
    // ─────────────────────────────────────────────────────────────────────────

    /// Plot the reference, value and other visible texts of a footprint
    pub fn plot_all_texts_module(&mut self, footprint: &Footprint) {
        let reference = footprint.reference_designator();

        let mut plot_ref = self.options.plot_reference;
        let mut plot_val = self.options.plot_value;

        if !self.text_shown(&footprint.reference) {
            plot_ref = false;
        }
        if !self.text_shown(&footprint.value) {
            plot_val = false;
        }

        if plot_ref {
            let color = self
                .options
                .reference_color
                .or(self.get_color(footprint.reference.layer));
            self.plot_text_module(&footprint.reference, reference, color);
        }

        if plot_val {
            let color = self
                .options
                .value_color
                .or(self.get_color(footprint.value.layer));
            self.plot_text_module(&footprint.value, reference, color);
        }

        for text in footprint.texts() {
            if !text.visible || !self.layer_mask.contains(text.layer) {
                continue;
            }
            let color = self.get_color(text.layer);
            self.plot_text_module(text, reference, color);
        }
    }

    fn text_shown(&self, text: &Text) -> bool {
        self.layer_mask.contains(text.layer) && (text.visible || self.options.plot_invisible_text)
    }

    /// Plot one footprint text with component metadata
    pub fn plot_text_module(&mut self, text: &Text, reference: &str, color: Color) {
        let color = visible_color(color);
        self.plotter.set_color(color);

        let md = PlotMetadata::component(reference);
        let params = text_params(text, text.position, color, &text.text);
        self.plotter.text(&params, Some(&md));
    }

    /// Plot the graphic items of every footprint on the layer mask
    pub fn plot_edges_modules(&mut self) {
        let board = self.board;
        for footprint in &board.footprints {
            for edge in footprint.edges() {
                if self.layer_mask.contains(edge.layer) {
                    self.plot_edge_module(edge, footprint);
                }
            }
        }
    }

    /// Plot one footprint graphic item. Polygon points are footprint-relative.
    pub fn plot_edge_module(&mut self, edge: &DrawSegment, footprint: &Footprint) {
        let color = self.get_color(edge.layer);
        self.plotter.set_color(color);

        let mut md = PlotMetadata::component(footprint.reference_designator());
        if self.is_plotting_copper() {
            md.set_aperture(ApertureAttribute::EtchedComponent);
        } else if edge.layer == Layer::EDGE_CUTS {
            md.set_aperture(ApertureAttribute::NonConductor);
        }

        match edge.shape {
            ShapeKind::Polygon => {
                if edge.poly_points.len() <= 1 {
                    trace!("Skipping malformed polygon on {}", edge.layer);
                    return;
                }
                let corners: Vec<IntPoint> = edge
                    .poly_points
                    .iter()
                    .map(|p| footprint.to_board(*p))
                    .collect();
                self.plotter
                    .plot_poly(&corners, FillMode::FilledShape, edge.width, Some(&md));
            }
            _ => self.plot_shape(edge, &md),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Board graphics
    // ─────────────────────────────────────────────────────────────────────────

    /// Plot board-level drawings, texts, dimensions and targets
    pub fn plot_board_graphic_items(&mut self) {
        let board = self.board;
        for item in &board.drawings {
            match item {
                BoardItem::DrawSegment(segment) => self.plot_draw_segment(segment),
                BoardItem::Text(text) => self.plot_text_pcb(text),
                BoardItem::Dimension(dimension) => self.plot_dimension(dimension),
                BoardItem::Target(target) => self.plot_target(target),
                BoardItem::Marker(_) => {}
            }
        }
    }

    /// Plot a board text. Multiline text is split and each line positioned on its own.
    pub fn plot_text_pcb(&mut self, text: &Text) {
        if text.text.is_empty() || !self.layer_mask.contains(text.layer) {
            return;
        }

        let mut md = PlotMetadata::new();
        if text.layer.is_copper() {
            md.set_aperture(ApertureAttribute::NonConductor);
        }

        let color = self.get_color(text.layer);
        self.plotter.set_color(color);

        if text.multiline {
            let lines: Vec<&str> = text.text.split('\n').collect();
            let positions = line_positions(text, lines.len());
            for (line, position) in lines.iter().zip(positions) {
                let params = text_params(text, position, Color::UNSPECIFIED, line);
                self.plotter.text(&params, Some(&md));
            }
        } else {
            let params = text_params(text, text.position, Color::UNSPECIFIED, &text.text);
            self.plotter.text(&params, Some(&md));
        }
    }

    /// Plot a dimension: its text, then crossbar, feature lines and arrows
    pub fn plot_dimension(&mut self, dimension: &Dimension) {
        if !self.layer_mask.contains(dimension.layer) {
            return;
        }

        let color = self.get_color(dimension.layer);
        self.plotter.set_color(color);
        self.plot_text_pcb(&dimension.text);

        let strokes = [
            (dimension.crossbar_origin, dimension.crossbar_end),
            (dimension.feature_line_g_origin, dimension.feature_line_g_end),
            (dimension.feature_line_d_origin, dimension.feature_line_d_end),
            (dimension.crossbar_end, dimension.arrow_d1_end),
            (dimension.crossbar_end, dimension.arrow_d2_end),
            (dimension.crossbar_origin, dimension.arrow_g1_end),
            (dimension.crossbar_origin, dimension.arrow_g2_end),
        ];
        for (start, end) in strokes {
            let segment = DrawSegment::segment(dimension.layer, start, end, dimension.width);
            self.plot_draw_segment(&segment);
        }
    }

    /// Plot an alignment target: a circle, then a `+` or `X`
    pub fn plot_target(&mut self, target: &Target) {
        if !self.layer_mask.contains(target.layer) {
            return;
        }

        let color = self.get_color(target.layer);
        self.plotter.set_color(color);

        let circle_radius = match target.shape {
            TargetShape::Plus => target.size / 3,
            TargetShape::Cross => target.size / 2,
        };
        let circle =
            DrawSegment::circle(target.layer, target.position, circle_radius, target.width);
        self.plot_draw_segment(&circle);

        let radius = target.size / 2;
        let (d1, d2) = match target.shape {
            TargetShape::Plus => (IntPoint::new(radius, 0), IntPoint::new(0, radius)),
            TargetShape::Cross => (IntPoint::new(radius, radius), IntPoint::new(radius, -radius)),
        };

        for d in [d1, d2] {
            let stroke = DrawSegment::segment(
                target.layer,
                target.position - d,
                target.position + d,
                target.width,
            );
            self.plot_draw_segment(&stroke);
        }
    }

    /// Plot a board graphic on the layer mask
    pub fn plot_draw_segment(&mut self, segment: &DrawSegment) {
        if !self.layer_mask.contains(segment.layer) {
            return;
        }

        let color = self.get_color(segment.layer);
        self.plotter.set_color(color);

        let mut md = PlotMetadata::new();
        if self.is_plotting_copper() && segment.layer == Layer::EDGE_CUTS {
            md.set_aperture(ApertureAttribute::NonConductor);
        }

        match segment.shape {
            ShapeKind::Polygon => {
                if segment.poly_points.len() <= 1 {
                    trace!("Skipping malformed polygon on {}", segment.layer);
                    return;
                }
                self.plotter.plot_poly(
                    &segment.poly_points,
                    FillMode::FilledShape,
                    segment.width,
                    Some(&md),
                );
            }
            _ => self.plot_shape(segment, &md),
        }
    }

    /// Segment, circle, arc or curve in absolute coordinates
    fn plot_shape(&mut self, segment: &DrawSegment, md: &PlotMetadata) {
        let mode = self.plot_mode();
        let width = segment.width;

        match segment.shape {
            ShapeKind::Circle => {
                let radius = segment.radius();
                self.plotter
                    .thick_circle(segment.start, radius * 2, width, mode, Some(md));
            }
            ShapeKind::Arc => {
                let radius = segment.radius();
                let start_angle = segment.start.angle_to(segment.end);
                let end_angle = start_angle + segment.angle;
                self.plotter.thick_arc(
                    segment.start,
                    -end_angle,
                    -start_angle,
                    radius,
                    width,
                    mode,
                    Some(md),
                );
            }
            ShapeKind::Curve => {
                self.plotter.set_current_line_width(width, Some(md));
                let points = curve_points(&segment.bezier_points);
                for pair in points.windows(2) {
                    self.plotter
                        .thick_segment(pair[0], pair[1], width, mode, Some(md));
                }
            }
            ShapeKind::Segment | ShapeKind::Polygon => {
                self.plotter
                    .thick_segment(segment.start, segment.end, width, mode, Some(md));
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Zones, tracks and drill marks
    // ─────────────────────────────────────────────────────────────────────────

    /// Plot the filled areas of a zone, one contour at a time
    pub fn plot_filled_areas(&mut self, zone: &Zone) {
        if zone.filled_polys.is_empty() {
            return;
        }

        let mut md = PlotMetadata::new();
        if zone.is_on_copper_layer() {
            md.set_net_name(zone.net_name.as_str());
            // An unconnected zone carries no current
            if zone.net_name.is_empty() {
                md.set_aperture(ApertureAttribute::NonConductor);
            } else {
                md.set_aperture(ApertureAttribute::Conductor);
                md.set_net_info(NetInfo::Net);
            }
        }

        let color = self.get_color(zone.layer);
        self.plotter.set_color(color);

        let mode = self.plot_mode();
        let thickness = zone.min_thickness;
        let mut corners: Vec<IntPoint> = Vec::new();

        for corner in &zone.filled_polys {
            corners.push(corner.position);

            if !corner.end_contour {
                continue;
            }

            close_contour(&mut corners);

            match mode {
                PlotMode::Filled => match zone.fill_mode {
                    ZoneFillMode::Solid => {
                        self.plotter
                            .plot_poly(&corners, FillMode::FilledShape, thickness, Some(&md));
                    }
                    ZoneFillMode::Segments => {
                        for segment in &zone.fill_segments {
                            self.plotter.thick_segment(
                                segment.start,
                                segment.end,
                                thickness,
                                mode,
                                Some(&md),
                            );
                        }
                        if thickness > 0 {
                            self.plotter
                                .plot_poly(&corners, FillMode::NoFill, thickness, None);
                        }
                    }
                },
                PlotMode::Sketch => {
                    if thickness > 0 {
                        for pair in corners.windows(2) {
                            self.plotter
                                .thick_segment(pair[0], pair[1], thickness, mode, Some(&md));
                        }
                    }
                    self.plotter.set_current_line_width(-1, None);
                }
            }

            corners.clear();
        }
    }

    /// Plot a track segment as conductor
    pub fn plot_track(&mut self, track: &TrackSegment) {
        if !self.layer_mask.contains(track.layer) {
            return;
        }

        let mut md = PlotMetadata::new().with_aperture(ApertureAttribute::Conductor);
        md.set_net_info(NetInfo::Net);
        md.set_net_name(track.net_name.as_str());

        let color = self.get_color(track.layer);
        self.plotter.set_color(color);
        let mode = self.plot_mode();
        self.plotter
            .thick_segment(track.start, track.end, track.width, mode, Some(&md));
    }

    /// Flash a via pad on any of its layers in the mask
    pub fn plot_via(&mut self, via: &Via) {
        let Some(layer) = via.layers.intersection(self.layer_mask).iter().next() else {
            return;
        };

        let mut md = PlotMetadata::new().with_aperture(ApertureAttribute::ViaPad);
        md.set_net_info(NetInfo::Net);
        md.set_net_name(via.net_name.as_str());

        let color = self.get_color(layer);
        self.plotter.set_color(color);
        let mode = self.plot_mode();
        self.plotter
            .flash_pad_circle(via.position, via.width, mode, Some(&md));
    }

    /// Flash one drill mark, compensated by the fine width adjustment and clamped to
    /// `[1, pad size - 1]`
    pub fn plot_one_drill_mark(
        &mut self,
        shape: DrillShape,
        position: IntPoint,
        drill: IntSize,
        pad_size: IntSize,
        orientation: f64,
        small_drill: i32,
    ) {
        let mut drill = drill;
        let adjust = self.options.fine_width_adj;
        let mode = self.plot_mode();

        // Small marks only make sense for round holes
        if small_drill != 0 && shape == DrillShape::Circle {
            drill.x = small_drill.min(drill.x);
        }

        drill.x = clamp(1, drill.x - adjust, pad_size.x - 1);

        match shape {
            DrillShape::Oblong => {
                drill.y = clamp(1, drill.y - adjust, pad_size.y - 1);
                self.plotter
                    .flash_pad_oval(position, drill, orientation, mode, None);
            }
            DrillShape::Circle => {
                self.plotter
                    .flash_pad_circle(position, drill.x, mode, None);
            }
        }
    }

    /// Drill marks of every via, then every drilled pad. In filled mode marks are white
    /// so they punch through the pads under them.
    pub fn plot_drill_marks(&mut self) {
        let small_drill = self.options.small_drill_clamp();
        let filled = self.plot_mode() == PlotMode::Filled;

        if filled {
            self.plotter.set_color(Color::WHITE);
        }

        let board = self.board;
        for via in board.vias() {
            self.plot_one_drill_mark(
                DrillShape::Circle,
                via.position,
                IntSize::new(via.drill, 0),
                IntSize::new(via.width, 0),
                0.0,
                small_drill,
            );
        }

        for footprint in &board.footprints {
            for pad in &footprint.pads {
                if pad.drill_size.x == 0 {
                    continue;
                }
                self.plot_one_drill_mark(
                    pad.drill_shape,
                    pad.position,
                    pad.drill_size,
                    pad.size,
                    pad.orientation,
                    small_drill,
                );
            }
        }

        if filled {
            self.plotter.set_color(self.options.color);
        }
    }
}

/// Plot every item of a board that lands on `layer_mask`: graphics, footprint texts and
/// edges, pads, vias, tracks, zones and, when enabled, drill marks.
pub fn plot_standard_layers<P: Plotter + ?Sized>(
    board: &Board,
    plotter: &mut P,
    options: &PlotOptions,
    layer_mask: LayerSet,
) {
    let mut items = BoardItemsPlotter::new(plotter, board, options, layer_mask);
    items.set_color(options.color);

    items.plot_board_graphic_items();

    for footprint in &board.footprints {
        items.plot_all_texts_module(footprint);
    }

    items.plot_edges_modules();

    for footprint in &board.footprints {
        for pad in &footprint.pads {
            let Some(layer) = pad.layers.intersection(layer_mask).iter().next() else {
                continue;
            };
            if pad.size.x == 0 || pad.size.y == 0 {
                trace!("Skipping zero-size pad {}", pad.name);
                continue;
            }
            let color = items.get_color(layer);
            items.plot_pad(pad, footprint.reference_designator(), color, options.plot_mode);
        }
    }

    for track in &board.tracks {
        match track {
            Track::Segment(segment) => items.plot_track(segment),
            Track::Via(via) => items.plot_via(via),
        }
    }

    for zone in &board.zones {
        if layer_mask.contains(zone.layer) {
            items.plot_filled_areas(zone);
        }
    }

    if options.drill_marks != DrillMarks::None {
        items.plot_drill_marks();
    }
}

fn visible_color(color: Color) -> Color {
    if color == Color::WHITE {
        Color::LIGHT_GRAY
    } else {
        color
    }
}

/// Append the first corner when the contour is not already closed
fn close_contour(corners: &mut Vec<IntPoint>) {
    if let (Some(first), Some(last)) = (corners.first().copied(), corners.last().copied()) {
        if first != last {
            corners.push(first);
        }
    }
}

fn clamp(lower: i32, value: i32, upper: i32) -> i32 {
    if value < lower {
        lower
    } else if value > upper {
        upper
    } else {
        value
    }
}

fn text_params(text: &Text, position: IntPoint, color: Color, line: &str) -> TextParams {
    let mut size = text.size;
    if text.mirrored {
        size.x = -size.x;
    }

    TextParams {
        position,
        color,
        text: line.to_string(),
        angle: text.angle,
        size,
        h_justify: text.h_justify,
        v_justify: text.v_justify,
        thickness: text.thickness,
        italic: text.italic,
        // Thick strokes are managed here, so any thickness counts as bold
        bold: text.bold || text.thickness != 0,
        multiline: false,
    }
}

/// Polyline through a curve: four control points are flattened, anything else is taken as
/// already flattened
fn curve_points(control: &[IntPoint]) -> SmallVec<[IntPoint; 16]> {
    let [from, ctrl1, ctrl2, to] = control else {
        return control.iter().copied().collect();
    };

    let to_lyon = |p: &IntPoint| point(f64::from(p.x), f64::from(p.y));
    let curve = CubicBezierSegment {
        from: to_lyon(from),
        ctrl1: to_lyon(ctrl1),
        ctrl2: to_lyon(ctrl2),
        to: to_lyon(to),
    };

    let mut points: SmallVec<[IntPoint; 16]> = SmallVec::new();
    points.push(*from);
    points.extend(
        curve
            .flattened(CURVE_TOLERANCE)
            .map(|p| IntPoint::new(round(p.x), round(p.y))),
    );
    points
}
