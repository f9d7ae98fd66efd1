//! Plot options

use copper_core::Color;
use serde::{Deserialize, Serialize};

use crate::plotter::PlotMode;

/// Diameter substituted for round drill marks in small-mark mode
pub const SMALL_DRILL: i32 = 350_000;

/// Which drill marks are plotted over pads and vias
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrillMarks {
    #[default]
    None,
    /// Round marks clamped to the small-drill diameter
    Small,
    /// Marks at actual drill size
    Full,
}

/// Options for one plot run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    pub plot_mode: PlotMode,
    pub plot_reference: bool,
    pub plot_value: bool,
    pub plot_invisible_text: bool,
    /// Reference text color; unspecified means the layer color
    pub reference_color: Color,
    /// Value text color; unspecified means the layer color
    pub value_color: Color,
    pub drill_marks: DrillMarks,
    pub small_drill: i32,
    /// Subtracted from drill mark sizes
    pub fine_width_adj: i32,
    /// Plot color restored after drill marks
    pub color: Color,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            plot_mode: PlotMode::Filled,
            plot_reference: true,
            plot_value: true,
            plot_invisible_text: false,
            reference_color: Color::UNSPECIFIED,
            value_color: Color::UNSPECIFIED,
            drill_marks: DrillMarks::None,
            small_drill: SMALL_DRILL,
            fine_width_adj: 0,
            color: Color::BLACK,
        }
    }
}

impl PlotOptions {
    /// Clamp value for round drill marks, `0` when marks are not small
    pub fn small_drill_clamp(&self) -> i32 {
        match self.drill_marks {
            DrillMarks::Small => self.small_drill,
            DrillMarks::None | DrillMarks::Full => 0,
        }
    }
}
