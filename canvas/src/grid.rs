//! Grid lattice: integer cells and the world ⇄ cell mapping.
//!
//! Every routing structure in this crate (wires, the occupancy index,
//! junctions) is expressed in [`Cell`]s. Continuous world coordinates are
//! converted to cells only by [`Grid`]; nothing else accepts non-grid
//! positions.

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::camera::Point;

/// An integer grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether the two cells share an x or a y coordinate.
    #[must_use]
    pub fn is_aligned_with(self, other: Cell) -> bool {
        self.x == other.x || self.y == other.y
    }

    /// Coordinate on the given axis.
    #[must_use]
    pub fn get(self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Overwrite the coordinate on the given axis.
    pub fn set(&mut self, axis: Axis, value: i32) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
        }
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the two lattice axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Inclusive axis-aligned rectangle of cells.
///
/// A straight wire segment is a rectangle with one degenerate dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRect {
    pub min: Cell,
    pub max: Cell,
}

impl CellRect {
    /// The smallest rectangle containing both corners, in either order.
    #[must_use]
    pub fn spanning(a: Cell, b: Cell) -> Self {
        Self {
            min: Cell::new(a.x.min(b.x), a.y.min(b.y)),
            max: Cell::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    #[must_use]
    pub fn contains(&self, cell: Cell) -> bool {
        (self.min.x..=self.max.x).contains(&cell.x) && (self.min.y..=self.max.y).contains(&cell.y)
    }

    /// Every cell in the rectangle, column by column.
    pub fn cells(self) -> impl Iterator<Item = Cell> {
        (self.min.x..=self.max.x).flat_map(move |x| (self.min.y..=self.max.y).map(move |y| Cell::new(x, y)))
    }
}

/// Fixed-spacing lattice over world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    spacing_x: f64,
    spacing_y: f64,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(crate::consts::DEFAULT_GRID_SPACING, crate::consts::DEFAULT_GRID_SPACING)
    }
}

impl Grid {
    /// Build a grid with the given cell size in world units.
    ///
    /// # Panics
    ///
    /// Panics if either spacing is not a positive finite number.
    #[must_use]
    pub fn new(spacing_x: f64, spacing_y: f64) -> Self {
        assert!(
            spacing_x.is_finite() && spacing_x > 0.0 && spacing_y.is_finite() && spacing_y > 0.0,
            "grid spacing must be positive and finite, got {spacing_x} x {spacing_y}"
        );
        Self { spacing_x, spacing_y }
    }

    #[must_use]
    pub fn spacing_x(&self) -> f64 {
        self.spacing_x
    }

    #[must_use]
    pub fn spacing_y(&self) -> f64 {
        self.spacing_y
    }

    /// Nearest cell to a world position.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn world_to_grid(&self, pos: Point) -> Cell {
        Cell::new((pos.x / self.spacing_x).round() as i32, (pos.y / self.spacing_y).round() as i32)
    }

    /// World position of a cell's lattice point.
    #[must_use]
    pub fn grid_to_world(&self, cell: Cell) -> Point {
        Point::new(f64::from(cell.x) * self.spacing_x, f64::from(cell.y) * self.spacing_y)
    }

    /// Snap a world position to the nearest lattice point.
    #[must_use]
    pub fn snap(&self, pos: Point) -> Point {
        self.grid_to_world(self.world_to_grid(pos))
    }
}
