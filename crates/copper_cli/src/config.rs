//! Copper configuration file handling
//!
//! `copper.toml` holds three tables, all optional:
//! - `[view]` - output size and the world ↔ screen mapping
//! - `[gal]` - renderer display options
//! - `[plot]` - plot options

use anyhow::{Context, Result};
use copper_core::Point;
use copper_gal::{GalOptions, ViewOptions};
use copper_plot::{IntPoint, PlotOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "copper.toml";

/// Top-level configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CopperConfig {
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub gal: GalOptions,
    #[serde(default)]
    pub plot: PlotOptions,
}

/// Output image and view mapping
#[derive(Debug, Deserialize, Serialize)]
pub struct ViewConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    /// Board point shown at the image center
    #[serde(default)]
    pub look_at: Point,
    /// Inches per board unit
    #[serde(default = "default_world_unit_length")]
    pub world_unit_length: f64,
    #[serde(default = "default_screen_dpi")]
    pub screen_dpi: f64,
    #[serde(default)]
    pub flip_x: bool,
    #[serde(default)]
    pub flip_y: bool,
    /// Center and zoom on the board, overriding `zoom` and `look_at`
    #[serde(default = "default_true")]
    pub fit_to_board: bool,
}

fn default_width() -> u32 {
    1024
}

fn default_height() -> u32 {
    768
}

fn default_zoom() -> f64 {
    1.0
}

/// Board units are nanometres
fn default_world_unit_length() -> f64 {
    1.0e-6 / 25.4
}

fn default_screen_dpi() -> f64 {
    96.0
}

fn default_true() -> bool {
    true
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            zoom: default_zoom(),
            look_at: Point::ZERO,
            world_unit_length: default_world_unit_length(),
            screen_dpi: default_screen_dpi(),
            flip_x: false,
            flip_y: false,
            fit_to_board: true,
        }
    }
}

impl ViewConfig {
    pub fn screen_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// View options, fitted to `bounds` (`(min, max)` board corners) when requested
    pub fn view_options(&self, bounds: Option<(IntPoint, IntPoint)>) -> ViewOptions {
        let mut view = ViewOptions {
            zoom: self.zoom,
            look_at: self.look_at,
            world_unit_length: self.world_unit_length,
            screen_dpi: self.screen_dpi,
            flip_x: self.flip_x,
            flip_y: self.flip_y,
        };

        if let (true, Some((min, max))) = (self.fit_to_board, bounds) {
            let (min, max) = (min.to_point(), max.to_point());
            view.look_at = Point::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0);
            view.zoom = view.zoom_to_fit(self.screen_size(), max.x - min.x, max.y - min.y, 0.9);
        }

        view
    }
}

impl CopperConfig {
    /// Load from an explicit path, or from `copper.toml` in the working directory when
    /// present, or fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_path = Path::new(CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copper_core::Color;
    use copper_plot::{DrillMarks, PlotMode};

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = CopperConfig::from_toml("").unwrap();
        assert_eq!(config.view.screen_size(), (1024, 768));
        assert!(config.view.fit_to_board);
        assert_eq!(config.gal, GalOptions::default());
        assert_eq!(config.plot, PlotOptions::default());
    }

    #[test]
    fn test_tables_override_defaults() {
        let config = CopperConfig::from_toml(
            r#"
            [view]
            width = 320
            height = 200
            fit_to_board = false

            [gal]
            antialias = true
            background = { r = 1.0, g = 1.0, b = 1.0, a = 1.0 }

            [plot]
            plot_mode = "sketch"
            drill_marks = "small"
            plot_value = false
            "#,
        )
        .unwrap();

        assert_eq!(config.view.screen_size(), (320, 200));
        assert!(config.gal.antialias);
        assert_eq!(config.gal.background, Color::WHITE);
        assert_eq!(config.plot.plot_mode, PlotMode::Sketch);
        assert_eq!(config.plot.drill_marks, DrillMarks::Small);
        assert!(!config.plot.plot_value);
        assert!(config.plot.plot_reference);
        assert!(config.plot.reference_color.is_unspecified());
    }

    #[test]
    fn test_fit_to_board_centers_bounds() {
        let config = ViewConfig {
            width: 200,
            height: 100,
            world_unit_length: 1.0,
            screen_dpi: 1.0,
            ..ViewConfig::default()
        };
        let view = config.view_options(Some((IntPoint::new(0, 0), IntPoint::new(1000, 100))));
        assert_eq!(view.look_at, Point::new(500.0, 50.0));
        assert!((view.zoom - 0.18).abs() < 1e-9);

        let fixed = ViewConfig {
            fit_to_board: false,
            ..config
        };
        let view = fixed.view_options(Some((IntPoint::new(0, 0), IntPoint::new(1000, 100))));
        assert_eq!(view.look_at, Point::ZERO);
        assert_eq!(view.zoom, 1.0);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = CopperConfig::default();
        let text = config.to_toml().unwrap();
        let back = CopperConfig::from_toml(&text).unwrap();
        assert_eq!(back.view.screen_size(), config.view.screen_size());
        assert_eq!(back.plot, config.plot);
    }
}
