//! Retained command groups
//!
//! A group is a numbered, replayable list of drawing and state-change elements. Color and
//! width changes are stored as elements rather than baked into path snapshots, so replay
//! reapplies them in order and recoloring a group only rewrites those elements.

use std::collections::BTreeMap;
use std::fmt;

use copper_core::{Color, PathSnapshot, Point};
use smallvec::SmallVec;
use tracing::{error, warn};

use crate::context::PathContext;
use crate::state::{effective_line_width, DrawingState};

/// Identifier of a live group
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which live color a stroked snapshot is painted with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaintSource {
    /// The stroke color (regular outlines)
    Stroke,
    /// The fill color (centerlines of filled segments and arcs)
    Fill,
}

/// One recorded operation
#[derive(Clone, Debug, PartialEq)]
pub enum GroupElement {
    SetFill(bool),
    SetStroke(bool),
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(f64),
    Rotate(f64),
    Translate(Point),
    Scale(Point),
    Save,
    Restore,
    StrokePath {
        path: PathSnapshot,
        source: PaintSource,
    },
    FillPath(PathSnapshot),
    InvokeGroup(GroupId),
}

/// Recorded element sequence
#[derive(Clone, Debug, Default)]
pub struct Group {
    elements: Vec<GroupElement>,
}

impl Group {
    pub fn elements(&self) -> &[GroupElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Consume the group, yielding every path snapshot it owns
    pub fn into_path_snapshots(self) -> impl Iterator<Item = PathSnapshot> {
        self.elements.into_iter().filter_map(|element| match element {
            GroupElement::StrokePath { path, .. } | GroupElement::FillPath(path) => Some(path),
            _ => None,
        })
    }
}

/// Live groups keyed by id
#[derive(Debug, Default)]
pub struct GroupStore {
    groups: BTreeMap<GroupId, Group>,
    counter: u32,
}

impl GroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh empty group. The id is the first free one at or after the running
    /// counter, which wraps around.
    ///
    /// # Panics
    ///
    /// Panics when every id is live.
    pub fn allocate(&mut self) -> GroupId {
        assert!(
            (self.groups.len() as u64) < u64::from(u32::MAX) + 1,
            "No free slots to store a group"
        );

        while self.groups.contains_key(&GroupId(self.counter)) {
            self.counter = self.counter.wrapping_add(1);
        }

        let id = GroupId(self.counter);
        self.counter = self.counter.wrapping_add(1);
        self.groups.insert(id, Group::default());
        id
    }

    pub fn get(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    pub fn contains(&self, id: GroupId) -> bool {
        self.groups.contains_key(&id)
    }

    /// Append an element to a live group. Returns `false` when the group is not live.
    pub fn record(&mut self, id: GroupId, element: GroupElement) -> bool {
        match self.groups.get_mut(&id) {
            Some(group) => {
                group.elements.push(element);
                true
            }
            None => false,
        }
    }

    /// Rewrite every fill/stroke color element. Returns `false` when the group is not live.
    pub fn recolor(&mut self, id: GroupId, color: Color) -> bool {
        let Some(group) = self.groups.get_mut(&id) else {
            return false;
        };

        for element in &mut group.elements {
            match element {
                GroupElement::SetFillColor(c) | GroupElement::SetStrokeColor(c) => *c = color,
                _ => {}
            }
        }
        true
    }

    pub fn remove(&mut self, id: GroupId) -> Option<Group> {
        self.groups.remove(&id)
    }

    /// Live ids, highest first
    pub fn ids_descending(&self) -> Vec<GroupId> {
        self.groups.keys().rev().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Execute a group against a path context, updating the live drawing state as state
/// elements are met. A group already being replayed further up the call chain is skipped.
pub fn replay<C: PathContext + ?Sized>(
    groups: &GroupStore,
    id: GroupId,
    context: &mut C,
    state: &mut DrawingState,
) {
    let mut active: SmallVec<[GroupId; 8]> = SmallVec::new();
    replay_nested(groups, id, context, state, &mut active);
}

fn replay_nested<C: PathContext + ?Sized>(
    groups: &GroupStore,
    id: GroupId,
    context: &mut C,
    state: &mut DrawingState,
    active: &mut SmallVec<[GroupId; 8]>,
) {
    let Some(group) = groups.get(id) else {
        warn!("Group {} is not live, nothing to draw", id);
        return;
    };

    if active.contains(&id) {
        error!("Group {} invokes itself through {:?}, skipping", id, active);
        return;
    }
    active.push(id);

    for element in group.elements() {
        match element {
            GroupElement::SetFill(enabled) => state.fill_enabled = *enabled,
            GroupElement::SetStroke(enabled) => state.stroke_enabled = *enabled,
            GroupElement::SetFillColor(color) => state.fill_color = *color,
            GroupElement::SetStrokeColor(color) => state.stroke_color = *color,
            GroupElement::SetLineWidth(width) => {
                state.line_width = *width;
                let applied = effective_line_width(context, *width);
                context.set_line_width(applied);
            }
            GroupElement::Rotate(angle) => context.rotate(*angle),
            GroupElement::Translate(offset) => context.translate(*offset),
            GroupElement::Scale(factors) => context.scale(*factors),
            GroupElement::Save => context.save(),
            GroupElement::Restore => context.restore(),
            GroupElement::StrokePath { path, source } => {
                let color = match source {
                    PaintSource::Stroke => state.stroke_color,
                    PaintSource::Fill => state.fill_color,
                };
                context.append_path(path);
                context.stroke(color);
            }
            GroupElement::FillPath(path) => {
                context.append_path(path);
                context.fill(state.fill_color);
            }
            GroupElement::InvokeGroup(inner) => {
                replay_nested(groups, *inner, context, state, active);
            }
        }
    }

    active.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{ContextCall, RecordingContext};
    use copper_core::PathCommand;

    fn circle() -> PathSnapshot {
        PathSnapshot::from_commands([
            PathCommand::NewSubPath,
            PathCommand::Arc {
                center: Point::ZERO,
                radius: 1.0,
                start_angle: 0.0,
                end_angle: std::f64::consts::TAU,
            },
        ])
    }

    #[test]
    fn test_allocate_scans_from_counter() {
        let mut store = GroupStore::new();
        assert_eq!(store.allocate(), GroupId(0));
        assert_eq!(store.allocate(), GroupId(1));
        store.remove(GroupId(0));
        assert_eq!(store.allocate(), GroupId(2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_allocate_skips_live_ids_after_wrap() {
        let mut store = GroupStore::new();
        store.counter = u32::MAX;
        assert_eq!(store.allocate(), GroupId(u32::MAX));
        assert_eq!(store.allocate(), GroupId(0));
        store.counter = u32::MAX;
        assert_eq!(store.allocate(), GroupId(1));
    }

    #[test]
    fn test_recolor_rewrites_only_color_elements() {
        let mut store = GroupStore::new();
        let id = store.allocate();
        let other = store.allocate();
        store.record(id, GroupElement::SetFillColor(Color::RED));
        store.record(id, GroupElement::SetLineWidth(2.0));
        store.record(id, GroupElement::SetStrokeColor(Color::GREEN));
        store.record(other, GroupElement::SetFillColor(Color::RED));

        assert!(store.recolor(id, Color::BLUE));
        assert_eq!(
            store.get(id).unwrap().elements(),
            &[
                GroupElement::SetFillColor(Color::BLUE),
                GroupElement::SetLineWidth(2.0),
                GroupElement::SetStrokeColor(Color::BLUE),
            ]
        );
        assert_eq!(
            store.get(other).unwrap().elements(),
            &[GroupElement::SetFillColor(Color::RED)]
        );
        assert!(!store.recolor(GroupId(99), Color::BLUE));
    }

    #[test]
    fn test_replay_uses_color_in_effect() {
        let mut store = GroupStore::new();
        let id = store.allocate();
        store.record(id, GroupElement::SetFillColor(Color::RED));
        store.record(id, GroupElement::FillPath(circle()));
        store.record(id, GroupElement::SetFillColor(Color::GREEN));
        store.record(
            id,
            GroupElement::StrokePath {
                path: circle(),
                source: PaintSource::Fill,
            },
        );

        let mut context = RecordingContext::new(10, 10);
        let mut state = DrawingState::default();
        replay(&store, id, &mut context, &mut state);

        let paints: Vec<_> = context
            .calls()
            .iter()
            .filter(|call| matches!(call, ContextCall::Fill(_) | ContextCall::Stroke(_)))
            .cloned()
            .collect();
        assert_eq!(
            paints,
            vec![ContextCall::Fill(Color::RED), ContextCall::Stroke(Color::GREEN)]
        );
        assert_eq!(state.fill_color, Color::GREEN);
    }

    #[test]
    fn test_replay_skips_cycles() {
        let mut store = GroupStore::new();
        let a = store.allocate();
        let b = store.allocate();
        store.record(a, GroupElement::FillPath(circle()));
        store.record(a, GroupElement::InvokeGroup(b));
        store.record(b, GroupElement::InvokeGroup(a));
        store.record(b, GroupElement::FillPath(circle()));

        let mut context = RecordingContext::new(10, 10);
        let mut state = DrawingState::default();
        replay(&store, a, &mut context, &mut state);

        let fills = context
            .calls()
            .iter()
            .filter(|call| matches!(call, ContextCall::Fill(_)))
            .count();
        assert_eq!(fills, 2);
    }

    #[test]
    fn test_replay_missing_group_is_noop() {
        let store = GroupStore::new();
        let mut context = RecordingContext::new(10, 10);
        let mut state = DrawingState::default();
        replay(&store, GroupId(7), &mut context, &mut state);
        assert!(context.calls().is_empty());
    }

    #[test]
    fn test_into_path_snapshots() {
        let mut group = Group::default();
        group.elements.push(GroupElement::FillPath(circle()));
        group.elements.push(GroupElement::Save);
        group.elements.push(GroupElement::StrokePath {
            path: circle(),
            source: PaintSource::Stroke,
        });
        assert_eq!(group.into_path_snapshots().count(), 2);
    }
}
