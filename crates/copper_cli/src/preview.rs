//! Raster preview of plotted layers
//!
//! [`GalPlotter`] maps plotter calls onto renderer primitives so a plot can be rasterized
//! through the software GAL. Texts are not rasterized.

use anyhow::{Context, Result};
use copper_core::{Color, Point};
use copper_gal::{
    DrawPanel, Gal, HostWindow, PathContext, PresentedImage, RenderSurface, SkiaContext,
};
use copper_plot::{
    plot_standard_layers, Board, FillMode, IntPoint, IntSize, LayerSet, PlotMetadata, PlotMode,
    Plotter, TextParams,
};
use tracing::{debug, trace};

use crate::config::CopperConfig;

/// Plotter sink drawing through a [`Gal`]
///
/// Plotter arc angles are degrees counter-clockwise in a Y-up frame. The renderer draws
/// in the board's Y-down frame, so arcs are negated and swapped back before drawing.
pub struct GalPlotter<'g, C: PathContext + RenderSurface> {
    gal: &'g mut Gal<C>,
}

impl<'g, C: PathContext + RenderSurface> GalPlotter<'g, C> {
    pub fn new(gal: &'g mut Gal<C>) -> Self {
        Self { gal }
    }

    /// Solid paint for filled mode, hairline outlines for sketch mode
    fn use_mode(&mut self, mode: PlotMode) {
        match mode {
            PlotMode::Filled => {
                self.gal.set_is_fill(true);
                self.gal.set_is_stroke(false);
            }
            PlotMode::Sketch => {
                self.gal.set_is_fill(false);
                self.gal.set_is_stroke(true);
                self.gal.set_line_width(0.0);
            }
        }
    }

    fn polygon(&mut self, position: IntPoint, corners: &[IntPoint], orientation: f64) {
        let points: Vec<Point> = corners
            .iter()
            .map(|corner| (corner.rotated(orientation) + position).to_point())
            .collect();
        self.gal.draw_polygon(&points);
    }
}

fn rect_corners(half: IntSize) -> [IntPoint; 4] {
    [
        IntPoint::new(-half.x, -half.y),
        IntPoint::new(half.x, -half.y),
        IntPoint::new(half.x, half.y),
        IntPoint::new(-half.x, half.y),
    ]
}

impl<C: PathContext + RenderSurface> Plotter for GalPlotter<'_, C> {
    fn set_color(&mut self, color: Color) {
        if color.is_unspecified() {
            return;
        }
        self.gal.set_fill_color(color);
        self.gal.set_stroke_color(color);
    }

    fn set_current_line_width(&mut self, width: i32, _metadata: Option<&PlotMetadata>) {
        self.gal.set_line_width(f64::from(width.max(0)));
    }

    fn flash_pad_circle(
        &mut self,
        position: IntPoint,
        diameter: i32,
        mode: PlotMode,
        _metadata: Option<&PlotMetadata>,
    ) {
        self.use_mode(mode);
        self.gal
            .draw_circle(position.to_point(), f64::from(diameter) / 2.0);
    }

    fn flash_pad_oval(
        &mut self,
        position: IntPoint,
        size: IntSize,
        orientation: f64,
        mode: PlotMode,
        _metadata: Option<&PlotMetadata>,
    ) {
        let (half_axis, width) = if size.x > size.y {
            (IntPoint::new((size.x - size.y) / 2, 0), size.y)
        } else {
            (IntPoint::new(0, (size.y - size.x) / 2), size.x)
        };
        let half_axis = half_axis.rotated(orientation);

        self.use_mode(mode);
        self.gal.draw_segment(
            (position - half_axis).to_point(),
            (position + half_axis).to_point(),
            f64::from(width),
        );
    }

    fn flash_pad_trapezoid(
        &mut self,
        position: IntPoint,
        corners: &[IntPoint; 4],
        orientation: f64,
        mode: PlotMode,
        _metadata: Option<&PlotMetadata>,
    ) {
        self.use_mode(mode);
        self.polygon(position, corners, orientation);
    }

    fn flash_pad_round_rect(
        &mut self,
        position: IntPoint,
        size: IntSize,
        corner_radius: i32,
        orientation: f64,
        mode: PlotMode,
        _metadata: Option<&PlotMetadata>,
    ) {
        let half = IntSize::new(size.x / 2, size.y / 2);

        match mode {
            PlotMode::Filled => {
                // Inner rectangle stroked with round joins at twice the corner radius
                let inner = IntSize::new(
                    (half.x - corner_radius).max(0),
                    (half.y - corner_radius).max(0),
                );
                self.gal.set_is_fill(true);
                self.gal.set_is_stroke(true);
                self.gal.set_line_width(f64::from(corner_radius * 2));
                self.polygon(position, &rect_corners(inner), orientation);
            }
            PlotMode::Sketch => {
                self.use_mode(mode);
                self.polygon(position, &rect_corners(half), orientation);
            }
        }
    }

    fn flash_pad_rect(
        &mut self,
        position: IntPoint,
        size: IntSize,
        orientation: f64,
        mode: PlotMode,
        _metadata: Option<&PlotMetadata>,
    ) {
        let half = IntSize::new(size.x / 2, size.y / 2);
        self.use_mode(mode);
        self.polygon(position, &rect_corners(half), orientation);
    }

    fn thick_segment(
        &mut self,
        start: IntPoint,
        end: IntPoint,
        width: i32,
        mode: PlotMode,
        _metadata: Option<&PlotMetadata>,
    ) {
        self.use_mode(mode);
        self.gal
            .draw_segment(start.to_point(), end.to_point(), f64::from(width));
    }

    fn thick_circle(
        &mut self,
        center: IntPoint,
        diameter: i32,
        width: i32,
        mode: PlotMode,
        _metadata: Option<&PlotMetadata>,
    ) {
        let radius = f64::from(diameter) / 2.0;
        let width = f64::from(width);

        self.gal.set_is_fill(false);
        self.gal.set_is_stroke(true);

        match mode {
            PlotMode::Filled => {
                self.gal.set_line_width(width);
                self.gal.draw_circle(center.to_point(), radius);
            }
            PlotMode::Sketch => {
                self.gal.set_line_width(0.0);
                self.gal.draw_circle(center.to_point(), radius - width / 2.0);
                self.gal.draw_circle(center.to_point(), radius + width / 2.0);
            }
        }
    }

    fn thick_arc(
        &mut self,
        center: IntPoint,
        start_angle: f64,
        end_angle: f64,
        radius: i32,
        width: i32,
        mode: PlotMode,
        _metadata: Option<&PlotMetadata>,
    ) {
        self.use_mode(mode);
        self.gal.draw_arc_segment(
            center.to_point(),
            f64::from(radius),
            (-end_angle).to_radians(),
            (-start_angle).to_radians(),
            f64::from(width),
        );
    }

    fn plot_poly(
        &mut self,
        points: &[IntPoint],
        fill: FillMode,
        width: i32,
        _metadata: Option<&PlotMetadata>,
    ) {
        let points: Vec<Point> = points.iter().map(|p| p.to_point()).collect();

        match fill {
            FillMode::FilledShape => {
                self.gal.set_is_fill(true);
                self.gal.set_is_stroke(width > 0);
                self.gal.set_line_width(f64::from(width.max(0)));
                self.gal.draw_polygon(&points);
            }
            FillMode::NoFill => {
                self.gal.set_is_fill(false);
                self.gal.set_is_stroke(true);
                self.gal.set_line_width(f64::from(width.max(0)));
                self.gal.draw_polyline(&points);
            }
        }
    }

    fn text(&mut self, params: &TextParams, _metadata: Option<&PlotMetadata>) {
        trace!("Text {:?} not rasterized", params.text);
    }
}

/// Off-screen host window that keeps the last blitted frame
pub struct ImageHost {
    size: (u32, u32),
    image: Option<PresentedImage>,
}

impl ImageHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            image: None,
        }
    }

    pub fn image(&self) -> Option<&PresentedImage> {
        self.image.as_ref()
    }
}

impl HostWindow for ImageHost {
    fn client_size(&self) -> (u32, u32) {
        self.size
    }

    fn request_resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn request_repaint(&mut self) {}

    fn blit(&mut self, image: &PresentedImage) {
        self.image = Some(image.clone());
    }
}

/// Rasterize the items of `board` on `layer_mask`
pub fn render(board: &Board, config: &CopperConfig, layer_mask: LayerSet) -> Result<PresentedImage> {
    let (width, height) = config.view.screen_size();
    let context = SkiaContext::new(width, height)
        .with_context(|| format!("Failed to create a {width}x{height} canvas"))?
        .with_antialias(config.gal.antialias);

    let view = config.view.view_options(board.bounding_box());
    debug!("View zoom {:.6} at ({}, {})", view.zoom, view.look_at.x, view.look_at.y);

    let gal = Gal::new(context, config.gal.clone(), view);
    let mut panel = DrawPanel::new(gal, ImageHost::new(width, height))?;

    panel.deliver_paint(|gal| {
        let mut plotter = GalPlotter::new(gal);
        plot_standard_layers(board, &mut plotter, &config.plot, layer_mask);
    });

    panel
        .host()
        .image()
        .cloned()
        .context("Renderer produced no frame")
}

/// Encode a presented frame as PNG
pub fn save_png(image: &PresentedImage, path: &std::path::Path) -> Result<()> {
    let buffer = image::RgbImage::from_raw(image.width(), image.height(), image.to_packed_rgb())
        .context("Frame size does not match its pixel data")?;
    buffer
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", path.display()))
}
