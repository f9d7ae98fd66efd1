//! Polylines and polygon sets

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Ordered chain of points, optionally closed back to its first point
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineChain {
    pub points: Vec<Point>,
    #[serde(default)]
    pub closed: bool,
}

impl LineChain {
    pub fn new(points: Vec<Point>, closed: bool) -> Self {
        Self { points, closed }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Points in stroking order; a closed chain repeats its first point at the end
    pub fn stroke_points(&self) -> impl Iterator<Item = Point> + '_ {
        let wrap = if self.closed { self.points.first() } else { None };
        self.points.iter().chain(wrap).copied()
    }
}

/// Set of polygon outlines
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PolySet {
    pub outlines: Vec<LineChain>,
}

impl PolySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_outline(&mut self, outline: LineChain) {
        self.outlines.push(outline);
    }

    pub fn outline_count(&self) -> usize {
        self.outlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outlines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_chain_wraps_to_first_point() {
        let chain = LineChain::new(
            vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)],
            true,
        );
        let points: Vec<_> = chain.stroke_points().collect();
        assert_eq!(points.len(), 4);
        assert_eq!(points[3], Point::new(0.0, 0.0));
    }

    #[test]
    fn test_open_chain_does_not_wrap() {
        let chain = LineChain::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)], false);
        assert_eq!(chain.stroke_points().count(), 2);
    }
}
