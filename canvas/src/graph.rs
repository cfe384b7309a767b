//! Wire graph: the set of wires, component footprints, junctions, and the
//! occupancy index that ties them to the grid.
//!
//! DESIGN
//! ======
//! `WireGraph` is the only owner of wire geometry and of the
//! [`OccupancyIndex`]. Every structural edit goes through it so the index can
//! be reconciled in the same call:
//!
//! - [`WireGraph::attach_wire`] registers a finished wire and indexes it.
//! - [`WireGraph::wire_moved`] swaps a wire's old cells for its new ones.
//! - [`WireGraph::delete_wire`] clears a wire and ends its id.
//!
//! After an attach or a move, each endpoint of the wire is checked against the
//! index. Another wire on that cell yields a junction marker, and if the cell
//! is in the middle of that other wire it is split there into two fresh wires.
//! Splits are processed from a work list; each new half is checked in turn,
//! because its far endpoint may itself land mid-way along some third wire.
//!
//! Ids come from a monotonically increasing counter and are never reused.
//! A split ends the split wire's id; both halves get new ones.

#[cfg(test)]
#[path = "graph_test.rs"]
mod graph_test;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::grid::{Cell, CellRect};
use crate::occupancy::{Entry, OccupancyIndex};
use crate::wire::{ComponentId, Slot, Terminal, Wire, WireEnd, WireId};

// =============================================================================
// COMPONENTS
// =============================================================================

/// A pin location on a component footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalCell {
    pub cell: Cell,
    pub slot: Slot,
}

/// The cells a component covers and where its pins are.
///
/// Terminal cells are expected to lie inside `bounds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentFootprint {
    pub bounds: CellRect,
    #[serde(default)]
    pub terminals: Vec<TerminalCell>,
}

impl ComponentFootprint {
    #[must_use]
    pub fn new(bounds: CellRect) -> Self {
        Self { bounds, terminals: Vec::new() }
    }

    #[must_use]
    pub fn with_terminal(mut self, cell: Cell, slot: Slot) -> Self {
        self.terminals.push(TerminalCell { cell, slot });
        self
    }

    /// The pin at `cell`, if any.
    #[must_use]
    pub fn slot_at(&self, cell: Cell) -> Option<Slot> {
        self.terminals.iter().find(|t| t.cell == cell).map(|t| t.slot)
    }
}

// =============================================================================
// CHANGES AND PERSISTENCE
// =============================================================================

/// A structural change recorded for the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    WireAdded(WireId),
    WireRemoved(WireId),
    WireMoved(WireId),
    JunctionAdded(Cell),
    JunctionRemoved(Cell),
}

/// Persisted form of one wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRecord {
    pub id: WireId,
    pub points: Vec<Cell>,
}

/// Persisted form of one component footprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub id: ComponentId,
    pub footprint: ComponentFootprint,
}

/// Everything needed to rebuild a [`WireGraph`]. Junctions are derived on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub wires: Vec<WireRecord>,
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
}

/// Error returned by [`WireGraph::load_snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// A wire needs at least two control points.
    #[error("wire {id} has {count} points; at least two are required")]
    TooFewPoints { id: WireId, count: usize },
    /// All of the wire's points are the same cell.
    #[error("wire {id} has zero length")]
    Degenerate { id: WireId },
    /// Segment `segment` joins two points that share neither coordinate.
    #[error("wire {id} segment {segment} is not axis-aligned")]
    NotOrthogonal { id: WireId, segment: usize },
    /// The same wire id appears twice.
    #[error("wire id {0} appears more than once")]
    DuplicateWire(WireId),
    /// The same component id appears twice.
    #[error("component id {0} appears more than once")]
    DuplicateComponent(ComponentId),
    /// No id is left to allocate after this one.
    #[error("wire id {0} is the largest representable id")]
    IdExhausted(WireId),
}

// =============================================================================
// WIRE GRAPH
// =============================================================================

/// Owner of all wires, component footprints, junction markers and the occupancy index.
#[derive(Debug, Default)]
pub struct WireGraph {
    wires: BTreeMap<WireId, Wire>,
    components: BTreeMap<ComponentId, ComponentFootprint>,
    junctions: BTreeSet<Cell>,
    index: OccupancyIndex,
    next_id: u64,
    changes: Vec<Change>,
}

impl WireGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Wire lifecycle ---

    /// Register a wire with no geometry. It occupies nothing until points are
    /// added and [`Self::wire_moved`] is called.
    pub fn create_wire(&mut self) -> WireId {
        let id = self.register(Wire::new());
        debug!(wire = %id, "created empty wire");
        id
    }

    /// Register a wire that already has its points, index it, and resolve junctions.
    pub fn attach_wire(&mut self, wire: Wire) -> WireId {
        let id = self.register(wire);
        debug!(wire = %id, "attached wire");
        self.settle(id);
        id
    }

    /// Reconcile the index after wire `id`'s points changed from `previous`.
    ///
    /// A wire that has collapsed onto a single cell is deleted.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a live wire.
    pub fn wire_moved(&mut self, id: WireId, previous: &[Cell]) {
        let wire = &self.wires[&id];
        self.index.remove_wire_segments(id, previous);
        self.index.insert_wire_segments(id, wire.points());

        if !wire.is_empty() && wire.is_degenerate() {
            debug!(wire = %id, "wire collapsed to a single cell");
            self.delete_wire(id);
            return;
        }

        self.changes.push(Change::WireMoved(id));
        debug!(wire = %id, points = self.wires[&id].len(), "wire moved");

        // Wires left behind at the old endpoints may still meet each other.
        for cell in [previous.first(), previous.last()].into_iter().flatten() {
            self.refresh_junction(*cell);
        }
        self.settle(id);
    }

    /// Remove wire `id` and everything it occupied. Returns `None` if there
    /// is no such wire.
    pub fn delete_wire(&mut self, id: WireId) -> Option<Wire> {
        let wire = self.wires.remove(&id)?;
        self.index.remove_wire_segments(id, wire.points());
        self.changes.push(Change::WireRemoved(id));
        debug!(wire = %id, "deleted wire");
        self.prune_junctions();
        Some(wire)
    }

    // --- Components ---

    /// Place (or re-place) a component footprint and re-resolve wire terminals.
    pub fn place_component(&mut self, id: ComponentId, footprint: ComponentFootprint) {
        if let Some(old) = self.components.remove(&id) {
            self.index.remove_range(old.bounds.min, old.bounds.max, Entry::Component(id));
        }
        self.index.insert_range(footprint.bounds.min, footprint.bounds.max, Entry::Component(id));
        self.components.insert(id, footprint);
        debug!(component = %id, "placed component");
        self.refresh_terminals();
    }

    /// Remove a component footprint, returning it if it was present.
    pub fn remove_component(&mut self, id: ComponentId) -> Option<ComponentFootprint> {
        let footprint = self.components.remove(&id)?;
        self.index.remove_range(footprint.bounds.min, footprint.bounds.max, Entry::Component(id));
        debug!(component = %id, "removed component");
        self.refresh_terminals();
        Some(footprint)
    }

    // --- Junctions ---

    /// Drop the junction marker at `cell`. Returns `false` if there was none.
    pub fn remove_junction(&mut self, cell: Cell) -> bool {
        if !self.junctions.remove(&cell) {
            return false;
        }
        self.index.remove(cell, Entry::Junction);
        self.changes.push(Change::JunctionRemoved(cell));
        debug!(%cell, "removed junction");
        true
    }

    #[must_use]
    pub fn is_junction(&self, cell: Cell) -> bool {
        self.junctions.contains(&cell)
    }

    /// Junction cells in ascending order.
    pub fn junctions(&self) -> impl Iterator<Item = Cell> + '_ {
        self.junctions.iter().copied()
    }

    // --- Queries ---

    #[must_use]
    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.get(&id)
    }

    /// Mutable access for in-place edits. Call [`Self::wire_moved`] afterwards.
    pub fn wire_mut(&mut self, id: WireId) -> Option<&mut Wire> {
        self.wires.get_mut(&id)
    }

    /// All live wires in ascending id order.
    pub fn wires(&self) -> impl Iterator<Item = (WireId, &Wire)> {
        self.wires.iter().map(|(&id, wire)| (id, wire))
    }

    #[must_use]
    pub fn contains_wire(&self, id: WireId) -> bool {
        self.wires.contains_key(&id)
    }

    /// Number of live wires.
    #[must_use]
    pub fn len(&self) -> usize {
        self.wires.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wires.is_empty()
    }

    #[must_use]
    pub fn component(&self, id: ComponentId) -> Option<&ComponentFootprint> {
        self.components.get(&id)
    }

    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &ComponentFootprint)> {
        self.components.iter().map(|(&id, footprint)| (id, footprint))
    }

    #[must_use]
    pub fn index(&self) -> &OccupancyIndex {
        &self.index
    }

    /// Wires occupying `cell`, in ascending id order.
    #[must_use]
    pub fn wires_at(&self, cell: Cell) -> Vec<WireId> {
        self.index.wires_at(cell)
    }

    /// The component pin at `cell`, if any.
    #[must_use]
    pub fn terminal_at(&self, cell: Cell) -> Option<Terminal> {
        self.index.get(cell).iter().find_map(|entry| match entry {
            Entry::Component(component) => {
                let slot = self.components.get(component)?.slot_at(cell)?;
                Some(Terminal { component: *component, slot })
            }
            Entry::Wire(_) | Entry::Junction => None,
        })
    }

    /// Other wires that also end where the given end of wire `id` is.
    ///
    /// A wire merely passing over that cell is not a neighbour: once settled,
    /// every connection is a shared endpoint.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a live wire with geometry.
    #[must_use]
    pub fn neighbors_at(&self, id: WireId, end: WireEnd) -> Vec<WireId> {
        let cell = self.wires[&id].end(end);
        self.index
            .wires_at(cell)
            .into_iter()
            .filter(|&other| other != id)
            .filter(|other| self.wires.get(other).is_some_and(|w| w.first() == cell || w.last() == cell))
            .collect()
    }

    /// Every wire joined to `id` through shared endpoints or junctions, `id` included.
    #[must_use]
    pub fn net(&self, id: WireId) -> BTreeSet<WireId> {
        let mut seen = BTreeSet::from([id]);
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            let Some(wire) = self.wires.get(&current) else {
                continue;
            };
            if wire.is_empty() {
                continue;
            }
            for end in WireEnd::BOTH {
                for other in self.neighbors_at(current, end) {
                    if seen.insert(other) {
                        stack.push(other);
                    }
                }
            }
        }

        seen
    }

    /// Partition of all wires with geometry into nets.
    #[must_use]
    pub fn nets(&self) -> Vec<BTreeSet<WireId>> {
        let mut assigned = BTreeSet::new();
        let mut nets = Vec::new();
        for (&id, wire) in &self.wires {
            if wire.is_empty() || assigned.contains(&id) {
                continue;
            }
            let net = self.net(id);
            assigned.extend(net.iter().copied());
            nets.push(net);
        }
        nets
    }

    /// Drain the changes recorded since the last call.
    pub fn take_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.changes)
    }

    // --- Persistence ---

    /// Serializable copy of the wires (with geometry) and component footprints.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            wires: self
                .wires
                .iter()
                .filter(|(_, wire)| !wire.is_empty())
                .map(|(&id, wire)| WireRecord { id, points: wire.points().to_vec() })
                .collect(),
            components: self
                .components
                .iter()
                .map(|(&id, footprint)| ComponentRecord { id, footprint: footprint.clone() })
                .collect(),
        }
    }

    /// Replace the whole graph with `snapshot`, keeping wire ids.
    ///
    /// The snapshot is validated before anything is touched; on error the
    /// graph is unchanged. New ids continue after the largest loaded one.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] for duplicate ids, an id with no successor,
    /// wires with fewer than two points, zero-length wires, or non-orthogonal
    /// segments.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) -> Result<(), LoadError> {
        let next_id = validate_snapshot(&snapshot)?;

        *self = Self::new();
        for record in snapshot.components {
            self.index
                .insert_range(record.footprint.bounds.min, record.footprint.bounds.max, Entry::Component(record.id));
            self.components.insert(record.id, record.footprint);
        }

        let ids: Vec<WireId> = snapshot.wires.iter().map(|record| record.id).collect();
        for record in snapshot.wires {
            self.insert_with_id(record.id, Wire::from_points(record.points));
        }
        self.next_id = next_id;

        for id in ids {
            self.settle(id);
        }
        self.changes.clear();

        info!(wires = self.wires.len(), junctions = self.junctions.len(), "loaded snapshot");
        Ok(())
    }

    // --- Internals ---

    fn allocate_id(&mut self) -> WireId {
        assert!(self.next_id < u64::MAX, "wire ids exhausted");
        let id = WireId(self.next_id);
        self.next_id += 1;
        id
    }

    fn register(&mut self, wire: Wire) -> WireId {
        let id = self.allocate_id();
        self.insert_with_id(id, wire);
        id
    }

    fn insert_with_id(&mut self, id: WireId, wire: Wire) {
        self.index.insert_wire_segments(id, wire.points());
        self.wires.insert(id, wire);
        self.changes.push(Change::WireAdded(id));
    }

    /// Junction detection and splitting, starting from the endpoints of `id`.
    fn settle(&mut self, id: WireId) {
        let mut pending = vec![id];
        let mut touched = BTreeSet::new();

        while let Some(current) = pending.pop() {
            let Some(wire) = self.wires.get(&current) else {
                continue;
            };
            if wire.is_empty() {
                continue;
            }
            touched.insert(current);

            for cell in [wire.first(), wire.last()] {
                let others: Vec<WireId> = self
                    .index
                    .wires_at(cell)
                    .into_iter()
                    .filter(|&other| other != current)
                    .collect();
                if others.is_empty() {
                    continue;
                }

                self.place_junction(cell);

                for other in others {
                    let Some(target) = self.wires.get(&other) else {
                        continue;
                    };
                    if target.first() == cell || target.last() == cell {
                        continue;
                    }
                    if let Some(halves) = self.split_wire(other, cell) {
                        pending.extend(halves);
                    }
                }
            }
        }

        for id in touched {
            self.resolve_terminals(id);
        }
        self.prune_junctions();
    }

    /// Replace wire `id` by two wires meeting at `cell`.
    fn split_wire(&mut self, id: WireId, cell: Cell) -> Option<[WireId; 2]> {
        let wire = self.wires.get_mut(&id)?;
        let Some(at) = wire.find_or_make_point(cell) else {
            warn!(wire = %id, %cell, "split target does not cover the junction cell");
            return None;
        };
        if at == 0 || at + 1 == wire.len() {
            return None;
        }

        let mut head = self.wires.remove(&id)?;
        self.index.remove_wire_segments(id, head.points());
        self.changes.push(Change::WireRemoved(id));

        let tail = head.split_off(at);
        let head_id = self.register(head);
        let tail_id = self.register(tail);

        info!(wire = %id, %cell, head = %head_id, tail = %tail_id, "split wire at junction");
        Some([head_id, tail_id])
    }

    fn place_junction(&mut self, cell: Cell) {
        if self.junctions.insert(cell) {
            self.index.insert(cell, Entry::Junction);
            self.changes.push(Change::JunctionAdded(cell));
            debug!(%cell, "placed junction");
        }
    }

    /// Place a marker at `cell` if two or more wires meet there at an endpoint.
    fn refresh_junction(&mut self, cell: Cell) {
        let wires = self.index.wires_at(cell);
        let ends_here = wires
            .iter()
            .any(|id| self.wires.get(id).is_some_and(|w| w.first() == cell || w.last() == cell));
        if wires.len() >= 2 && ends_here {
            self.place_junction(cell);
        }
    }

    /// Drop markers on cells no longer shared by at least two wires.
    fn prune_junctions(&mut self) {
        let stale: Vec<Cell> = self
            .junctions
            .iter()
            .copied()
            .filter(|&cell| self.index.wires_at(cell).len() < 2)
            .collect();
        for cell in stale {
            self.remove_junction(cell);
        }
    }

    fn resolve_terminals(&mut self, id: WireId) {
        let Some(wire) = self.wires.get(&id) else {
            return;
        };
        if wire.is_empty() {
            return;
        }
        let resolved = WireEnd::BOTH.map(|end| self.terminal_at(wire.end(end)));
        if let Some(wire) = self.wires.get_mut(&id) {
            for (end, terminal) in WireEnd::BOTH.into_iter().zip(resolved) {
                wire.set_terminal(end, terminal);
            }
        }
    }

    fn refresh_terminals(&mut self) {
        let ids: Vec<WireId> = self.wires.keys().copied().collect();
        for id in ids {
            self.resolve_terminals(id);
        }
    }
}

/// Check `snapshot` and return the first id free for allocation.
fn validate_snapshot(snapshot: &Snapshot) -> Result<u64, LoadError> {
    let mut seen = BTreeSet::new();
    let mut next_id = 0;
    for record in &snapshot.wires {
        if !seen.insert(record.id) {
            return Err(LoadError::DuplicateWire(record.id));
        }
        let Some(after) = record.id.0.checked_add(1) else {
            return Err(LoadError::IdExhausted(record.id));
        };
        next_id = next_id.max(after);
        if record.points.len() < 2 {
            return Err(LoadError::TooFewPoints { id: record.id, count: record.points.len() });
        }
        if let Some(segment) = record.points.windows(2).position(|w| !w[0].is_aligned_with(w[1])) {
            return Err(LoadError::NotOrthogonal { id: record.id, segment });
        }
        if record.points.windows(2).all(|w| w[0] == w[1]) {
            return Err(LoadError::Degenerate { id: record.id });
        }
    }

    let mut components = BTreeSet::new();
    for record in &snapshot.components {
        if !components.insert(record.id) {
            return Err(LoadError::DuplicateComponent(record.id));
        }
    }
    Ok(next_id)
}
