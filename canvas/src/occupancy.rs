//! Spatial occupancy index: which entities sit on which grid cell.
//!
//! The index is sparse and keyed lazily per axis (column, then row), so an
//! empty plane costs nothing and a query is two hash lookups. Each cell holds
//! a small set of [`Entry`] values; inserting an entry that is already present
//! is a no-op, and a cell whose last entry is removed is dropped.
//!
//! The [`crate::graph::WireGraph`] keeps this index exactly in step with wire
//! geometry: a cell carries `Entry::Wire(id)` if and only if it lies on one of
//! that wire's segments.

#[cfg(test)]
#[path = "occupancy_test.rs"]
mod occupancy_test;

use std::collections::HashMap;

use crate::grid::{Cell, CellRect};
use crate::wire::{ComponentId, WireId};

/// Something occupying a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entry {
    /// A cell on a segment of this wire.
    Wire(WireId),
    /// A cell inside this component's footprint.
    Component(ComponentId),
    /// A junction marker joining two or more wires.
    Junction,
}

/// Sparse map from grid cell to the entries occupying it.
#[derive(Debug, Clone, Default)]
pub struct OccupancyIndex {
    columns: HashMap<i32, HashMap<i32, Vec<Entry>>>,
}

impl OccupancyIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries at `cell`; empty when nothing is there.
    #[must_use]
    pub fn get(&self, cell: Cell) -> &[Entry] {
        self.columns
            .get(&cell.x)
            .and_then(|column| column.get(&cell.y))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn contains(&self, cell: Cell, entry: Entry) -> bool {
        self.get(cell).contains(&entry)
    }

    /// Add `entry` at `cell`. Returns `false` if it was already there.
    pub fn insert(&mut self, cell: Cell, entry: Entry) -> bool {
        let entries = self.columns.entry(cell.x).or_default().entry(cell.y).or_default();
        if entries.contains(&entry) {
            return false;
        }
        entries.push(entry);
        true
    }

    /// Remove `entry` from `cell`. Returns `false` if it was not there.
    pub fn remove(&mut self, cell: Cell, entry: Entry) -> bool {
        let Some(column) = self.columns.get_mut(&cell.x) else {
            return false;
        };
        let Some(entries) = column.get_mut(&cell.y) else {
            return false;
        };
        let Some(pos) = entries.iter().position(|e| *e == entry) else {
            return false;
        };
        entries.swap_remove(pos);
        if entries.is_empty() {
            column.remove(&cell.y);
            if column.is_empty() {
                self.columns.remove(&cell.x);
            }
        }
        true
    }

    /// Add `entry` to every cell of the inclusive rectangle spanned by `from` and `to`.
    pub fn insert_range(&mut self, from: Cell, to: Cell, entry: Entry) {
        for cell in CellRect::spanning(from, to).cells() {
            self.insert(cell, entry);
        }
    }

    /// Remove `entry` from every cell of the inclusive rectangle spanned by `from` and `to`.
    pub fn remove_range(&mut self, from: Cell, to: Cell, entry: Entry) {
        for cell in CellRect::spanning(from, to).cells() {
            self.remove(cell, entry);
        }
    }

    /// Mark every cell on the segments of `points` as occupied by wire `id`.
    pub fn insert_wire_segments(&mut self, id: WireId, points: &[Cell]) {
        for pair in points.windows(2) {
            self.insert_range(pair[0], pair[1], Entry::Wire(id));
        }
    }

    /// Clear wire `id` from every cell on the segments of `points`.
    pub fn remove_wire_segments(&mut self, id: WireId, points: &[Cell]) {
        for pair in points.windows(2) {
            self.remove_range(pair[0], pair[1], Entry::Wire(id));
        }
    }

    /// Wires occupying `cell`, in ascending id order.
    #[must_use]
    pub fn wires_at(&self, cell: Cell) -> Vec<WireId> {
        let mut wires: Vec<WireId> = self
            .get(cell)
            .iter()
            .filter_map(|entry| match entry {
                Entry::Wire(id) => Some(*id),
                Entry::Component(_) | Entry::Junction => None,
            })
            .collect();
        wires.sort_unstable();
        wires
    }

    /// The component whose footprint covers `cell`, if any.
    #[must_use]
    pub fn component_at(&self, cell: Cell) -> Option<ComponentId> {
        self.get(cell).iter().find_map(|entry| match entry {
            Entry::Component(id) => Some(*id),
            Entry::Wire(_) | Entry::Junction => None,
        })
    }

    /// All cells carrying `entry`, sorted.
    #[must_use]
    pub fn cells_of(&self, entry: Entry) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self
            .columns
            .iter()
            .flat_map(|(&x, column)| {
                column
                    .iter()
                    .filter(move |(_, entries)| entries.contains(&entry))
                    .map(move |(&y, _)| Cell::new(x, y))
            })
            .collect();
        cells.sort_unstable();
        cells
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn clear(&mut self) {
        self.columns.clear();
    }
}
