//! Board data model
//!
//! A read-only snapshot of the items the plotter walks. Coordinates are board units and
//! absolute, except footprint polygon points, which are relative to the footprint
//! position at orientation 0.

use copper_core::Color;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{PlotError, Result};
use crate::layer::{Layer, LayerSet};
use crate::plotter::{HorizJustify, VertJustify};
use crate::units::{round, IntPoint, IntSize};

// ─────────────────────────────────────────────────────────────────────────────
// Pads
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadShape {
    #[default]
    Circle,
    Oval,
    Trapezoid,
    RoundRect,
    Rect,
}

/// Electrical role of a pad
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadAttribute {
    /// Plated through hole
    #[default]
    Standard,
    Smd,
    /// Edge connector, no paste
    Connector,
    /// Mechanical, non-plated hole
    HoleNotPlated,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrillShape {
    #[default]
    Circle,
    Oblong,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub shape: PadShape,
    #[serde(default)]
    pub attribute: PadAttribute,
    pub position: IntPoint,
    /// Shape offset from the hole, before rotation
    #[serde(default)]
    pub offset: IntPoint,
    pub size: IntSize,
    /// Trapezoid deformation
    #[serde(default)]
    pub delta: IntSize,
    /// Degrees
    #[serde(default)]
    pub orientation: f64,
    pub layers: LayerSet,
    #[serde(default)]
    pub net_name: String,
    #[serde(default)]
    pub drill_shape: DrillShape,
    #[serde(default)]
    pub drill_size: IntSize,
    /// Round-rect corner radius as a fraction of the smaller side
    #[serde(default = "default_round_rect_ratio")]
    pub round_rect_ratio: f64,
}

fn default_round_rect_ratio() -> f64 {
    0.25
}

impl Pad {
    /// Center of the pad shape: position plus the rotated offset
    pub fn shape_position(&self) -> IntPoint {
        self.position + self.offset.rotated(self.orientation)
    }

    pub fn round_rect_corner_radius(&self) -> i32 {
        round(f64::from(self.size.min_dimension()) * self.round_rect_ratio)
    }

    /// Trapezoid corners relative to the shape position, orientation 0
    pub fn trapezoid_corners(&self) -> [IntPoint; 4] {
        let dx = self.size.x / 2;
        let dy = self.size.y / 2;
        let ddx = self.delta.x / 2;
        let ddy = self.delta.y / 2;

        [
            IntPoint::new(-dx - ddy, dy + ddx),
            IntPoint::new(-dx + ddy, -dy - ddx),
            IntPoint::new(dx - ddy, -dy + ddx),
            IntPoint::new(dx + ddy, dy - ddx),
        ]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Texts and graphics
// ─────────────────────────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

/// Board or footprint text
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    pub position: IntPoint,
    pub size: IntSize,
    /// Degrees, absolute on the board
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub thickness: i32,
    pub layer: Layer,
    #[serde(default)]
    pub h_justify: HorizJustify,
    #[serde(default)]
    pub v_justify: VertJustify,
    #[serde(default)]
    pub mirrored: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub bold: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub multiline: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    #[default]
    Segment,
    Circle,
    Arc,
    Curve,
    Polygon,
}

/// Graphic line, circle, arc, Bézier curve or polygon
///
/// Circles and arcs are centered on `start` and pass through `end`. An arc sweeps `angle`
/// degrees from `end`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawSegment {
    #[serde(default)]
    pub shape: ShapeKind,
    pub layer: Layer,
    #[serde(default)]
    pub start: IntPoint,
    #[serde(default)]
    pub end: IntPoint,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub angle: f64,
    /// Curve control points: start, control 1, control 2, end
    #[serde(default)]
    pub bezier_points: Vec<IntPoint>,
    #[serde(default)]
    pub poly_points: Vec<IntPoint>,
}

impl DrawSegment {
    pub fn segment(layer: Layer, start: IntPoint, end: IntPoint, width: i32) -> Self {
        Self {
            shape: ShapeKind::Segment,
            layer,
            start,
            end,
            width,
            ..Self::default()
        }
    }

    pub fn circle(layer: Layer, center: IntPoint, radius: i32, width: i32) -> Self {
        Self {
            shape: ShapeKind::Circle,
            layer,
            start: center,
            end: IntPoint::new(center.x + radius, center.y),
            width,
            ..Self::default()
        }
    }

    pub fn radius(&self) -> i32 {
        round(self.start.distance(self.end))
    }
}

/// Linear dimension: a text, a crossbar, two feature lines and four arrow strokes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub layer: Layer,
    pub width: i32,
    pub text: Text,
    pub crossbar_origin: IntPoint,
    pub crossbar_end: IntPoint,
    pub feature_line_g_origin: IntPoint,
    pub feature_line_g_end: IntPoint,
    pub feature_line_d_origin: IntPoint,
    pub feature_line_d_end: IntPoint,
    pub arrow_d1_end: IntPoint,
    pub arrow_d2_end: IntPoint,
    pub arrow_g1_end: IntPoint,
    pub arrow_g2_end: IntPoint,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetShape {
    #[default]
    Plus,
    Cross,
}

/// Alignment target
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub layer: Layer,
    pub position: IntPoint,
    pub size: i32,
    pub width: i32,
    #[serde(default)]
    pub shape: TargetShape,
}

/// Design-rule marker; never plotted
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub position: IntPoint,
    #[serde(default)]
    pub message: String,
}

/// Board-level drawing item
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoardItem {
    DrawSegment(DrawSegment),
    Text(Text),
    Dimension(Dimension),
    Target(Target),
    Marker(Marker),
}

// ─────────────────────────────────────────────────────────────────────────────
// Footprints
// ─────────────────────────────────────────────────────────────────────────────

/// Footprint graphic item
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FootprintItem {
    Edge(DrawSegment),
    Text(Text),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub reference: Text,
    pub value: Text,
    pub position: IntPoint,
    /// Degrees
    #[serde(default)]
    pub orientation: f64,
    #[serde(default)]
    pub pads: Vec<Pad>,
    #[serde(default)]
    pub items: Vec<FootprintItem>,
}

impl Footprint {
    pub fn reference_designator(&self) -> &str {
        &self.reference.text
    }

    /// Convert a footprint-relative point to board coordinates
    pub fn to_board(&self, local: IntPoint) -> IntPoint {
        local.rotated(self.orientation) + self.position
    }

    pub fn edges(&self) -> impl Iterator<Item = &DrawSegment> {
        self.items.iter().filter_map(|item| match item {
            FootprintItem::Edge(edge) => Some(edge),
            FootprintItem::Text(_) => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &Text> {
        self.items.iter().filter_map(|item| match item {
            FootprintItem::Text(text) => Some(text),
            FootprintItem::Edge(_) => None,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tracks and zones
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackSegment {
    pub start: IntPoint,
    pub end: IntPoint,
    pub width: i32,
    pub layer: Layer,
    #[serde(default)]
    pub net_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Via {
    pub position: IntPoint,
    /// Pad diameter
    pub width: i32,
    pub drill: i32,
    pub layers: LayerSet,
    #[serde(default)]
    pub net_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Track {
    Segment(TrackSegment),
    Via(Via),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneFillMode {
    /// Filled with solid polygons
    #[default]
    Solid,
    /// Filled with parallel segments
    Segments,
}

/// One point of a zone's filled-region stream
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneCorner {
    pub position: IntPoint,
    /// Last point of its contour
    #[serde(default)]
    pub end_contour: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillSegment {
    pub start: IntPoint,
    pub end: IntPoint,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub layer: Layer,
    #[serde(default)]
    pub net_name: String,
    #[serde(default)]
    pub fill_mode: ZoneFillMode,
    #[serde(default)]
    pub min_thickness: i32,
    #[serde(default)]
    pub filled_polys: Vec<ZoneCorner>,
    #[serde(default)]
    pub fill_segments: Vec<FillSegment>,
}

impl Zone {
    pub fn is_on_copper_layer(&self) -> bool {
        self.layer.is_copper()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Board
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub drawings: Vec<BoardItem>,
    #[serde(default)]
    pub footprints: Vec<Footprint>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub layer_colors: FxHashMap<Layer, Color>,
}

impl Board {
    /// Parse and validate a JSON board snapshot
    pub fn from_json(json: &str) -> Result<Board> {
        let board: Board =
            serde_json::from_str(json).map_err(|e| PlotError::MalformedBoard(e.to_string()))?;
        board.validate()?;
        Ok(board)
    }

    /// Zone point streams must end on a contour marker
    pub fn validate(&self) -> Result<()> {
        for (index, zone) in self.zones.iter().enumerate() {
            if let Some(last) = zone.filled_polys.last() {
                if !last.end_contour {
                    return Err(PlotError::MalformedBoard(format!(
                        "zone {index} on {} ends inside a contour",
                        zone.layer
                    )));
                }
            }
        }
        Ok(())
    }

    /// Display color of a layer, white when none is set
    pub fn layer_color(&self, layer: Layer) -> Color {
        self.layer_colors.get(&layer).copied().unwrap_or(Color::WHITE)
    }

    pub fn set_layer_color(&mut self, layer: Layer, color: Color) {
        self.layer_colors.insert(layer, color);
    }

    pub fn vias(&self) -> impl Iterator<Item = &Via> {
        self.tracks.iter().filter_map(|track| match track {
            Track::Via(via) => Some(via),
            Track::Segment(_) => None,
        })
    }

    /// Bounding box of footprints, tracks, zones and drawn segments as `(min, max)`
    pub fn bounding_box(&self) -> Option<(IntPoint, IntPoint)> {
        let mut points: Vec<IntPoint> = Vec::new();

        for item in &self.drawings {
            if let BoardItem::DrawSegment(segment) = item {
                points.push(segment.start);
                points.push(segment.end);
            }
        }
        for footprint in &self.footprints {
            points.push(footprint.position);
            points.extend(footprint.pads.iter().map(|pad| pad.position));
        }
        for track in &self.tracks {
            match track {
                Track::Segment(segment) => {
                    points.push(segment.start);
                    points.push(segment.end);
                }
                Track::Via(via) => points.push(via.position),
            }
        }
        for zone in &self.zones {
            points.extend(zone.filled_polys.iter().map(|corner| corner.position));
        }

        let first = *points.first()?;
        Some(points.iter().fold((first, first), |(min, max), p| {
            (
                IntPoint::new(min.x.min(p.x), min.y.min(p.y)),
                IntPoint::new(max.x.max(p.x), max.y.max(p.y)),
            )
        }))
    }
}
