//! Multiline text layout

use crate::board::Text;
use crate::plotter::VertJustify;
use crate::units::{round, IntPoint};

/// Distance between consecutive baselines
pub fn interline(text: &Text) -> i32 {
    round(f64::from(text.size.y.abs()) * 1.5) + text.thickness
}

/// Anchor position of each of `line_count` lines. Lines advance along the text's rotated
/// vertical axis; the block is shifted so the vertical justification applies to the whole
/// block.
pub fn line_positions(text: &Text, line_count: usize) -> Vec<IntPoint> {
    let offset = IntPoint::new(0, interline(text)).rotated(text.angle);
    let mut position = text.position;

    if line_count > 1 {
        let gaps = (line_count - 1) as i32;
        let shift = match text.v_justify {
            VertJustify::Top => IntPoint::ZERO,
            VertJustify::Center => IntPoint::new(offset.x * gaps / 2, offset.y * gaps / 2),
            VertJustify::Bottom => IntPoint::new(offset.x * gaps, offset.y * gaps),
        };
        position = position - shift;
    }

    let mut positions = Vec::with_capacity(line_count);
    for _ in 0..line_count {
        positions.push(position);
        position += offset;
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Layer;
    use crate::plotter::HorizJustify;
    use crate::units::IntSize;

    fn text(v_justify: VertJustify, angle: f64) -> Text {
        Text {
            text: "a\nb\nc".to_string(),
            position: IntPoint::new(1000, 1000),
            size: IntSize::new(100, 100),
            angle,
            thickness: 10,
            layer: Layer::F_SILKS,
            h_justify: HorizJustify::Center,
            v_justify,
            mirrored: false,
            italic: false,
            bold: false,
            visible: true,
            multiline: true,
        }
    }

    #[test]
    fn test_interline_includes_thickness() {
        assert_eq!(interline(&text(VertJustify::Top, 0.0)), 160);
    }

    #[test]
    fn test_positions_follow_justification() {
        assert_eq!(
            line_positions(&text(VertJustify::Top, 0.0), 3),
            vec![
                IntPoint::new(1000, 1000),
                IntPoint::new(1000, 1160),
                IntPoint::new(1000, 1320)
            ]
        );
        assert_eq!(
            line_positions(&text(VertJustify::Center, 0.0), 3)[1],
            IntPoint::new(1000, 1000)
        );
        assert_eq!(
            line_positions(&text(VertJustify::Bottom, 0.0), 3)[2],
            IntPoint::new(1000, 1000)
        );
    }

    #[test]
    fn test_rotated_lines_advance_sideways() {
        let positions = line_positions(&text(VertJustify::Top, 90.0), 2);
        assert_eq!(positions[1], IntPoint::new(1160, 1000));
    }

    #[test]
    fn test_single_line_keeps_position() {
        assert_eq!(
            line_positions(&text(VertJustify::Bottom, 0.0), 1),
            vec![IntPoint::new(1000, 1000)]
        );
    }
}
