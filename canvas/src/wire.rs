//! Wire geometry: one orthogonal polyline on the grid.
//!
//! A [`Wire`] is an ordered list of control points. Between edits every pair
//! of consecutive points shares an x or a y coordinate; while a point is being
//! dragged, [`Wire::move_point_aligned`] restores that property on every call
//! by bending (and if necessary inserting) the neighbouring points.
//!
//! Points are addressed by index into the wire's own vector. Nothing outside
//! the wire holds references into it, so a point that is the neighbour of two
//! others is only ever read and written through that vector.

#[cfg(test)]
#[path = "wire_test.rs"]
mod wire_test;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grid::{Axis, Cell, CellRect};

/// Stable identifier of a wire within one [`crate::graph::WireGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireId(pub u64);

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Identifier of a component owned by the simulation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub u64);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// An input or output pin of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Input(usize),
    Output(usize),
}

/// Endpoint metadata: the component pin a wire end rests on.
///
/// Carried for the simulation collaborator; routing never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminal {
    pub component: ComponentId,
    pub slot: Slot,
}

/// Which end of a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireEnd {
    First,
    Last,
}

impl WireEnd {
    pub const BOTH: [WireEnd; 2] = [WireEnd::First, WireEnd::Last];

    fn slot(self) -> usize {
        match self {
            Self::First => 0,
            Self::Last => 1,
        }
    }
}

/// An orthogonal polyline of grid cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wire {
    points: Vec<Cell>,
    terminals: [Option<Terminal>; 2],
}

impl Wire {
    /// An empty wire with no geometry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_points(points: Vec<Cell>) -> Self {
        Self { points, terminals: [None, None] }
    }

    /// A fresh wire of two coincident points, ready to have its second point dragged.
    #[must_use]
    pub fn starting_at(cell: Cell) -> Self {
        Self::from_points(vec![cell, cell])
    }

    #[must_use]
    pub fn points(&self) -> &[Cell] {
        &self.points
    }

    /// Replace the whole point list.
    pub fn set_points(&mut self, points: Vec<Cell>) {
        self.points = points;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append a control point.
    pub fn add_point(&mut self, cell: Cell) {
        self.points.push(cell);
    }

    /// Insert a control point before `index` (`index == len` appends).
    pub fn insert_point(&mut self, index: usize, cell: Cell) {
        self.points.insert(index, cell);
    }

    pub fn remove_point(&mut self, index: usize) -> Cell {
        self.points.remove(index)
    }

    pub fn set_point(&mut self, index: usize, cell: Cell) {
        self.points[index] = cell;
    }

    #[must_use]
    pub fn point(&self, index: usize) -> Cell {
        self.points[index]
    }

    #[must_use]
    pub fn first(&self) -> Cell {
        self.points[0]
    }

    #[must_use]
    pub fn last(&self) -> Cell {
        self.points[self.points.len() - 1]
    }

    #[must_use]
    pub fn end(&self, end: WireEnd) -> Cell {
        match end {
            WireEnd::First => self.first(),
            WireEnd::Last => self.last(),
        }
    }

    #[must_use]
    pub fn terminal(&self, end: WireEnd) -> Option<Terminal> {
        self.terminals[end.slot()]
    }

    pub fn set_terminal(&mut self, end: WireEnd, terminal: Option<Terminal>) {
        self.terminals[end.slot()] = terminal;
    }

    /// Consecutive point pairs.
    pub fn segments(&self) -> impl Iterator<Item = (Cell, Cell)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    /// Every cell covered by the wire's segments, endpoints included. A wire
    /// with fewer than two points has no segments and covers nothing.
    #[must_use]
    pub fn cells(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self
            .segments()
            .flat_map(|(a, b)| CellRect::spanning(a, b).cells())
            .collect();
        cells.sort_unstable();
        cells.dedup();
        cells
    }

    /// Whether every consecutive pair of points is axis-aligned.
    #[must_use]
    pub fn is_orthogonal(&self) -> bool {
        self.segments().all(|(a, b)| a.is_aligned_with(b))
    }

    /// Whether the wire covers at most a single cell.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.points.windows(2).all(|w| w[0] == w[1])
    }

    /// Index of the control point exactly at `cell`.
    #[must_use]
    pub fn find_control_point(&self, cell: Cell) -> Option<usize> {
        self.points.iter().position(|&p| p == cell)
    }

    /// Index `i` of the first segment `(points[i], points[i + 1])` whose
    /// bounding rectangle contains `cell`.
    #[must_use]
    pub fn point_to_segment(&self, cell: Cell) -> Option<usize> {
        self.segments().position(|(a, b)| CellRect::spanning(a, b).contains(cell))
    }

    /// Index of the control point at `cell`, inserting one if `cell` lies on a segment.
    pub fn find_or_make_point(&mut self, cell: Cell) -> Option<usize> {
        if let Some(index) = self.find_control_point(cell) {
            return Some(index);
        }
        let segment = self.point_to_segment(cell)?;
        self.points.insert(segment + 1, cell);
        Some(segment + 1)
    }

    /// Move point `index` to `cell` and bend its neighbours so both adjacent
    /// segments are axis-aligned again.
    ///
    /// When a neighbour is a wire endpoint, a duplicate of that endpoint is
    /// inserted first and bent instead, so endpoints stay where they are. The
    /// point list may grow but never shrinks. Returns the (possibly shifted)
    /// index of the moved point.
    pub fn move_point_aligned(&mut self, index: usize, cell: Cell) -> usize {
        let mut index = index;
        self.points[index] = cell;

        for offset in [-1_isize, 1] {
            let Some(mut neighbor) = index.checked_add_signed(offset).filter(|&n| n < self.points.len()) else {
                continue;
            };

            if neighbor == 0 {
                self.points.insert(1, self.points[0]);
                neighbor = 1;
                index += 1;
            } else if neighbor == self.points.len() - 1 {
                self.points.insert(neighbor, self.points[neighbor]);
            }

            let beyond = neighbor.wrapping_add_signed(offset);
            self.align_neighbor(index, neighbor, beyond);
        }

        index
    }

    /// Pull `neighbor` back into line with `index`, keeping it on its run towards `beyond`.
    fn align_neighbor(&mut self, index: usize, neighbor: usize, beyond: usize) {
        let point = self.points[index];
        let near = self.points[neighbor];
        let far = self.points[beyond];

        if point.is_aligned_with(near) {
            return;
        }

        let axis = if near == far {
            if (point.x - near.x).abs() > (point.y - near.y).abs() { Axis::X } else { Axis::Y }
        } else if near.x == far.x {
            Axis::Y
        } else {
            Axis::X
        };

        self.points[neighbor].set(axis, point.get(axis));
    }

    /// Drop interior points whose neighbours are already aligned with each other.
    ///
    /// Walks from the end so removals never shift indices still to be visited.
    pub fn remove_flat_points(&mut self) {
        for i in (1..self.points.len().saturating_sub(1)).rev() {
            if self.points[i - 1].is_aligned_with(self.points[i + 1]) {
                self.points.remove(i);
            }
        }
    }

    /// Cut the wire at interior point `index`.
    ///
    /// `self` keeps `points[..=index]` and its first-end terminal; the returned
    /// tail holds `points[index..]` and the last-end terminal. The point at
    /// `index` belongs to both halves.
    ///
    /// # Panics
    ///
    /// Panics unless `index` is an interior point.
    pub fn split_off(&mut self, index: usize) -> Wire {
        assert!(
            index > 0 && index + 1 < self.points.len(),
            "split index {index} is not interior to a wire of {} points",
            self.points.len()
        );
        let tail_points = self.points.split_off(index);
        self.points.push(tail_points[0]);
        let tail = Wire { points: tail_points, terminals: [None, self.terminals[1]] };
        self.terminals[1] = None;
        tail
    }
}
