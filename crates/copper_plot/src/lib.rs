//! Copper Board Plotter
//!
//! Turns the items of a board snapshot into calls on a [`Plotter`] backend, one layer mask
//! at a time. Pads, tracks, zones, texts and graphics are flattened into flashes, thick
//! strokes and polygons, each tagged with [`PlotMetadata`] describing its component, net
//! and aperture function.
//!
//! # Example
//!
//! ```ignore
//! use copper_plot::prelude::*;
//!
//! let board = Board::from_json(&std::fs::read_to_string("board.json")?)?;
//! let mut plotter = RecordingPlotter::new();
//! plot_standard_layers(
//!     &board,
//!     &mut plotter,
//!     &PlotOptions::default(),
//!     LayerSet::single(Layer::F_CU),
//! );
//! ```

pub mod board;
pub mod brditems;
pub mod error;
pub mod layer;
pub mod metadata;
pub mod options;
pub mod plotter;
pub mod text;
pub mod units;

pub use board::{
    Board, BoardItem, Dimension, DrawSegment, DrillShape, Footprint, FootprintItem, Pad,
    PadAttribute, PadShape, ShapeKind, Target, TargetShape, Text, Track, TrackSegment, Via,
    Zone, ZoneFillMode,
};
pub use brditems::{plot_standard_layers, BoardItemsPlotter};
pub use error::{PlotError, Result};
pub use layer::{Layer, LayerSet};
pub use metadata::{ApertureAttribute, NetInfo, PlotMetadata};
pub use options::{DrillMarks, PlotOptions};
pub use plotter::{
    FillMode, HorizJustify, PlotCall, PlotMode, Plotter, RecordingPlotter, TextParams,
    VertJustify,
};
pub use units::{IntPoint, IntSize};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::board::Board;
    pub use crate::brditems::{plot_standard_layers, BoardItemsPlotter};
    pub use crate::error::{PlotError, Result};
    pub use crate::layer::{Layer, LayerSet};
    pub use crate::options::{DrillMarks, PlotOptions};
    pub use crate::plotter::{FillMode, PlotMode, Plotter, RecordingPlotter};
    pub use crate::units::{IntPoint, IntSize};
}
