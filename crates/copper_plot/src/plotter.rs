//! Plotter sink interface
//!
//! A [`Plotter`] accepts shape primitives in board units with optional fabrication
//! metadata. File writers (Gerber, PDF, SVG, ...) implement it outside this crate;
//! [`RecordingPlotter`] logs calls for inspection.

use copper_core::Color;
use serde::{Deserialize, Serialize};

use crate::metadata::PlotMetadata;
use crate::units::{IntPoint, IntSize};

/// How shapes are traced
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotMode {
    /// Solid shapes
    #[default]
    Filled,
    /// Outlines only
    Sketch,
}

/// Fill of a polygon
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    NoFill,
    FilledShape,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizJustify {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertJustify {
    Top,
    #[default]
    Center,
    Bottom,
}

/// One line of text to plot. A mirrored text has a negative `size.x`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextParams {
    pub position: IntPoint,
    pub color: Color,
    pub text: String,
    /// Degrees
    pub angle: f64,
    pub size: IntSize,
    pub h_justify: HorizJustify,
    pub v_justify: VertJustify,
    pub thickness: i32,
    pub italic: bool,
    pub bold: bool,
    pub multiline: bool,
}

/// Output sink for plotted board geometry. Lengths are board units, angles degrees.
pub trait Plotter {
    fn set_color(&mut self, color: Color);

    /// A negative width restores the plotter's default width
    fn set_current_line_width(&mut self, width: i32, metadata: Option<&PlotMetadata>);

    fn flash_pad_circle(
        &mut self,
        position: IntPoint,
        diameter: i32,
        mode: PlotMode,
        metadata: Option<&PlotMetadata>,
    );

    fn flash_pad_oval(
        &mut self,
        position: IntPoint,
        size: IntSize,
        orientation: f64,
        mode: PlotMode,
        metadata: Option<&PlotMetadata>,
    );

    /// `corners` are relative to `position` before rotation by `orientation`
    fn flash_pad_trapezoid(
        &mut self,
        position: IntPoint,
        corners: &[IntPoint; 4],
        orientation: f64,
        mode: PlotMode,
        metadata: Option<&PlotMetadata>,
    );

    fn flash_pad_round_rect(
        &mut self,
        position: IntPoint,
        size: IntSize,
        corner_radius: i32,
        orientation: f64,
        mode: PlotMode,
        metadata: Option<&PlotMetadata>,
    );

    fn flash_pad_rect(
        &mut self,
        position: IntPoint,
        size: IntSize,
        orientation: f64,
        mode: PlotMode,
        metadata: Option<&PlotMetadata>,
    );

    fn thick_segment(
        &mut self,
        start: IntPoint,
        end: IntPoint,
        width: i32,
        mode: PlotMode,
        metadata: Option<&PlotMetadata>,
    );

    fn thick_circle(
        &mut self,
        center: IntPoint,
        diameter: i32,
        width: i32,
        mode: PlotMode,
        metadata: Option<&PlotMetadata>,
    );

    #[allow(clippy::too_many_arguments)]
    fn thick_arc(
        &mut self,
        center: IntPoint,
        start_angle: f64,
        end_angle: f64,
        radius: i32,
        width: i32,
        mode: PlotMode,
        metadata: Option<&PlotMetadata>,
    );

    fn plot_poly(
        &mut self,
        points: &[IntPoint],
        fill: FillMode,
        width: i32,
        metadata: Option<&PlotMetadata>,
    );

    fn text(&mut self, params: &TextParams, metadata: Option<&PlotMetadata>);
}

/// A call received by a [`RecordingPlotter`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum PlotCall {
    SetColor {
        color: Color,
    },
    SetCurrentLineWidth {
        width: i32,
        metadata: Option<PlotMetadata>,
    },
    FlashPadCircle {
        position: IntPoint,
        diameter: i32,
        mode: PlotMode,
        metadata: Option<PlotMetadata>,
    },
    FlashPadOval {
        position: IntPoint,
        size: IntSize,
        orientation: f64,
        mode: PlotMode,
        metadata: Option<PlotMetadata>,
    },
    FlashPadTrapezoid {
        position: IntPoint,
        corners: [IntPoint; 4],
        orientation: f64,
        mode: PlotMode,
        metadata: Option<PlotMetadata>,
    },
    FlashPadRoundRect {
        position: IntPoint,
        size: IntSize,
        corner_radius: i32,
        orientation: f64,
        mode: PlotMode,
        metadata: Option<PlotMetadata>,
    },
    FlashPadRect {
        position: IntPoint,
        size: IntSize,
        orientation: f64,
        mode: PlotMode,
        metadata: Option<PlotMetadata>,
    },
    ThickSegment {
        start: IntPoint,
        end: IntPoint,
        width: i32,
        mode: PlotMode,
        metadata: Option<PlotMetadata>,
    },
    ThickCircle {
        center: IntPoint,
        diameter: i32,
        width: i32,
        mode: PlotMode,
        metadata: Option<PlotMetadata>,
    },
    ThickArc {
        center: IntPoint,
        start_angle: f64,
        end_angle: f64,
        radius: i32,
        width: i32,
        mode: PlotMode,
        metadata: Option<PlotMetadata>,
    },
    PlotPoly {
        points: Vec<IntPoint>,
        fill: FillMode,
        width: i32,
        metadata: Option<PlotMetadata>,
    },
    Text {
        params: TextParams,
        metadata: Option<PlotMetadata>,
    },
}

impl PlotCall {
    /// Metadata carried by the call, if any
    pub fn metadata(&self) -> Option<&PlotMetadata> {
        match self {
            PlotCall::SetColor { .. } => None,
            PlotCall::SetCurrentLineWidth { metadata, .. }
            | PlotCall::FlashPadCircle { metadata, .. }
            | PlotCall::FlashPadOval { metadata, .. }
            | PlotCall::FlashPadTrapezoid { metadata, .. }
            | PlotCall::FlashPadRoundRect { metadata, .. }
            | PlotCall::FlashPadRect { metadata, .. }
            | PlotCall::ThickSegment { metadata, .. }
            | PlotCall::ThickCircle { metadata, .. }
            | PlotCall::ThickArc { metadata, .. }
            | PlotCall::PlotPoly { metadata, .. }
            | PlotCall::Text { metadata, .. } => metadata.as_ref(),
        }
    }
}

/// Plotter that records every call
#[derive(Debug, Default)]
pub struct RecordingPlotter {
    calls: Vec<PlotCall>,
}

impl RecordingPlotter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[PlotCall] {
        &self.calls
    }

    pub fn into_calls(self) -> Vec<PlotCall> {
        self.calls
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Plotter for RecordingPlotter {
    fn set_color(&mut self, color: Color) {
        self.calls.push(PlotCall::SetColor { color });
    }

    fn set_current_line_width(&mut self, width: i32, metadata: Option<&PlotMetadata>) {
        self.calls.push(PlotCall::SetCurrentLineWidth {
            width,
            metadata: metadata.cloned(),
        });
    }

    fn flash_pad_circle(
        &mut self,
        position: IntPoint,
        diameter: i32,
        mode: PlotMode,
        metadata: Option<&PlotMetadata>,
    ) {
        self.calls.push(PlotCall::FlashPadCircle {
            position,
            diameter,
            mode,
            metadata: metadata.cloned(),
        });
    }

    fn flash_pad_oval(
        &mut self,
        position: IntPoint,
        size: IntSize,
        orientation: f64,
        mode: PlotMode,
        metadata: Option<&PlotMetadata>,
    ) {
        self.calls.push(PlotCall::FlashPadOval {
            position,
            size,
            orientation,
            mode,
            metadata: metadata.cloned(),
        });
    }

    fn flash_pad_trapezoid(
        &mut self,
        position: IntPoint,
        corners: &[IntPoint; 4],
        orientation: f64,
        mode: PlotMode,
        metadata: Option<&PlotMetadata>,
    ) {
        self.calls.push(PlotCall::FlashPadTrapezoid {
            position,
            corners: *corners,
            orientation,
            mode,
            metadata: metadata.cloned(),
        });
    }

    fn flash_pad_round_rect(
        &mut self,
        position: IntPoint,
        size: IntSize,
        corner_radius: i32,
        orientation: f64,
        mode: PlotMode,
        metadata: Option<&PlotMetadata>,
    ) {
        self.calls.push(PlotCall::FlashPadRoundRect {
            position,
            size,
            corner_radius,
            orientation,
            mode,
            metadata: metadata.cloned(),
        });
    }

    fn flash_pad_rect(
        &mut self,
        position: IntPoint,
        size: IntSize,
        orientation: f64,
        mode: PlotMode,
        metadata: Option<&PlotMetadata>,
    ) {
        self.calls.push(PlotCall::FlashPadRect {
            position,
            size,
            orientation,
            mode,
            metadata: metadata.cloned(),
        });
    }

    fn thick_segment(
        &mut self,
        start: IntPoint,
        end: IntPoint,
        width: i32,
        mode: PlotMode,
        metadata: Option<&PlotMetadata>,
    ) {
        self.calls.push(PlotCall::ThickSegment {
            start,
            end,
            width,
            mode,
            metadata: metadata.cloned(),
        });
    }

    fn thick_circle(
        &mut self,
        center: IntPoint,
        diameter: i32,
        width: i32,
        mode: PlotMode,
        metadata: Option<&PlotMetadata>,
    ) {
        self.calls.push(PlotCall::ThickCircle {
            center,
            diameter,
            width,
            mode,
            metadata: metadata.cloned(),
        });
    }

    fn thick_arc(
        &mut self,
        center: IntPoint,
        start_angle: f64,
        end_angle: f64,
        radius: i32,
        width: i32,
        mode: PlotMode,
        metadata: Option<&PlotMetadata>,
    ) {
        self.calls.push(PlotCall::ThickArc {
            center,
            start_angle,
            end_angle,
            radius,
            width,
            mode,
            metadata: metadata.cloned(),
        });
    }

    fn plot_poly(
        &mut self,
        points: &[IntPoint],
        fill: FillMode,
        width: i32,
        metadata: Option<&PlotMetadata>,
    ) {
        self.calls.push(PlotCall::PlotPoly {
            points: points.to_vec(),
            fill,
            width,
            metadata: metadata.cloned(),
        });
    }

    fn text(&mut self, params: &TextParams, metadata: Option<&PlotMetadata>) {
        self.calls.push(PlotCall::Text {
            params: params.clone(),
            metadata: metadata.cloned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_calls_keep_metadata() {
        let mut plotter = RecordingPlotter::new();
        let md = PlotMetadata::component("U1");
        plotter.set_color(Color::RED);
        plotter.thick_segment(IntPoint::ZERO, IntPoint::new(5, 0), 2, PlotMode::Filled, Some(&md));

        assert_eq!(plotter.calls().len(), 2);
        assert_eq!(plotter.calls()[0].metadata(), None);
        assert_eq!(plotter.calls()[1].metadata(), Some(&md));
    }

    #[test]
    fn test_calls_serialize_with_tag() {
        let mut plotter = RecordingPlotter::new();
        plotter.flash_pad_circle(IntPoint::new(1, 2), 30, PlotMode::Sketch, None);
        let json = serde_json::to_value(plotter.calls()).unwrap();
        assert_eq!(json[0]["call"], "flash_pad_circle");
        assert_eq!(json[0]["mode"], "sketch");
        assert_eq!(json[0]["diameter"], 30);
    }
}
