//! Copper Graphics Abstraction Layer
//!
//! Software rendering backend for board views. Drawing calls go through [`Gal`], which
//! either paints immediately or records into numbered groups that can be replayed,
//! recolored and deleted later.
//!
//! # Architecture
//!
//! - [`PathContext`] - primitive path and graphics-state operations of a rasterizer
//! - [`RenderSurface`] - main/overlay buffers and presentation
//! - [`SkiaContext`] - tiny-skia implementation of both
//! - [`RecordingContext`] - logs every primitive call instead of rasterizing
//! - [`Gal`] - drawing primitives, drawing state and the group engine
//! - [`DrawPanel`] - paint/resize/pointer glue towards a host window
//!
//! # Example
//!
//! ```ignore
//! use copper_gal::prelude::*;
//!
//! let context = SkiaContext::new(800, 600)?;
//! let mut gal = Gal::new(context, GalOptions::default(), ViewOptions::default());
//!
//! let pad = gal.begin_group();
//! gal.set_is_fill(true);
//! gal.set_fill_color(Color::RED);
//! gal.draw_circle(Point::ZERO, 0.8);
//! gal.end_group();
//!
//! let mut frame = gal.begin_drawing();
//! frame.clear_screen(Color::BLACK);
//! frame.draw_group(pad);
//! let image = frame.end();
//! ```

pub mod compositor;
pub mod context;
pub mod error;
pub mod gal;
pub mod group;
pub mod panel;
pub mod raster;
pub mod recording;
pub mod state;
pub mod view;

pub use compositor::{Compositor, PresentedImage};
pub use context::{PathContext, RenderSurface, RenderTarget};
pub use error::{GalError, Result};
pub use gal::{Frame, Gal};
pub use group::{Group, GroupElement, GroupId, GroupStore, PaintSource};
pub use panel::{DrawPanel, HostWindow, PointerButton, PointerEvent, PointerListener};
pub use raster::SkiaContext;
pub use recording::{ContextCall, RecordingContext};
pub use state::DrawingState;
pub use view::{GalOptions, ViewOptions};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::{PathContext, RenderSurface, RenderTarget};
    pub use crate::error::{GalError, Result};
    pub use crate::gal::{Frame, Gal};
    pub use crate::group::GroupId;
    pub use crate::raster::SkiaContext;
    pub use crate::view::{GalOptions, ViewOptions};
    pub use copper_core::{Affine2D, Color, LineChain, Point, PolySet};
}
