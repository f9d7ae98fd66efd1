//! Copper Core
//!
//! Value types shared by the Copper renderer and board plotter:
//!
//! - **Geometry**: points, sizes, rectangles and 2D affine transforms
//! - **Color**: normalized RGBA with an "unspecified" sentinel
//! - **Paths**: path commands, accumulated paths and immutable path snapshots
//! - **Shapes**: line chains and polygon sets

pub mod color;
pub mod geometry;
pub mod path;
pub mod shape;

pub use color::Color;
pub use geometry::{Affine2D, Point, Rect, Size};
pub use path::{LineCap, LineJoin, Path, PathCommand, PathSnapshot};
pub use shape::{LineChain, PolySet};
