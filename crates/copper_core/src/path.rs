//! Path commands and path snapshots
//!
//! A [`Path`] accumulates geometry in user space while a shape is being built. Freezing it
//! yields a [`PathSnapshot`], an immutable copy that owns its memory and can be appended
//! back onto a path context any number of times.

use smallvec::SmallVec;

use crate::geometry::Point;

/// Line cap style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
    /// Flat cap at the endpoint
    #[default]
    Butt,
    /// Rounded cap extending past the endpoint
    Round,
    /// Square cap extending past the endpoint
    Square,
}

/// Line join style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJoin {
    /// Miter join (sharp corner)
    #[default]
    Miter,
    /// Round join
    Round,
    /// Bevel join (flat corner)
    Bevel,
}

// ─────────────────────────────────────────────────────────────────────────────
// Path Types
// ─────────────────────────────────────────────────────────────────────────────

/// Path command, expressed in the user space of the context that received it
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    /// Start a new subpath at a point
    MoveTo(Point),
    /// Line from the current point
    LineTo(Point),
    /// Cubic Bézier from the current point
    CurveTo {
        control1: Point,
        control2: Point,
        end: Point,
    },
    /// Circular arc swept in the direction of increasing angle.
    /// Connects to the current point with a line if there is one.
    Arc {
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    /// Circular arc swept in the direction of decreasing angle
    ArcNegative {
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    /// Begin a subpath without a current point
    NewSubPath,
    /// Close the current subpath
    Close,
}

/// Mutable path being accumulated by a path context
#[derive(Clone, Debug, Default)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, command: PathCommand) {
        self.commands.push(command);
    }

    pub fn extend(&mut self, snapshot: &PathSnapshot) {
        self.commands.extend(snapshot.commands().iter().copied());
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Freeze the current geometry into an independently owned snapshot
    pub fn snapshot(&self) -> PathSnapshot {
        PathSnapshot {
            commands: self.commands.iter().copied().collect(),
        }
    }
}

/// Immutable copy of a path at the moment it was flushed
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathSnapshot {
    commands: SmallVec<[PathCommand; 8]>,
}

impl PathSnapshot {
    pub fn from_commands(commands: impl IntoIterator<Item = PathCommand>) -> Self {
        Self {
            commands: commands.into_iter().collect(),
        }
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_independent_of_path() {
        let mut path = Path::new();
        path.push(PathCommand::MoveTo(Point::new(1.0, 2.0)));
        path.push(PathCommand::LineTo(Point::new(3.0, 4.0)));

        let snapshot = path.snapshot();
        path.clear();

        assert!(path.is_empty());
        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.commands()[1],
            PathCommand::LineTo(Point::new(3.0, 4.0))
        );
    }

    #[test]
    fn test_extend_appends_snapshot() {
        let snapshot = PathSnapshot::from_commands([PathCommand::NewSubPath, PathCommand::Close]);
        let mut path = Path::new();
        path.extend(&snapshot);
        path.extend(&snapshot);
        assert_eq!(path.commands().len(), 4);
    }
}
