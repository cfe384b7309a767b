#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::graph::WireGraph;
use crate::grid::Cell;
use crate::wire::{ComponentId, Terminal, WireId};

/// Which part of a wire was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WirePart {
    /// Exactly on control point `n`.
    Point(usize),
    /// On segment `n`, between control points `n` and `n + 1`.
    Segment(usize),
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Junction(Cell),
    Wire { id: WireId, part: WirePart },
    Terminal(Terminal),
    ComponentBody(ComponentId),
}

/// Test what sits on `cell`.
///
/// Junctions win over wires, wires over component pins, and pins over
/// component bodies. Among several wires the lowest id is reported.
#[must_use]
pub fn hit_test(graph: &WireGraph, cell: Cell) -> Option<Hit> {
    if graph.is_junction(cell) {
        return Some(Hit::Junction(cell));
    }

    for id in graph.wires_at(cell) {
        let Some(wire) = graph.wire(id) else {
            continue;
        };
        if let Some(index) = wire.find_control_point(cell) {
            return Some(Hit::Wire { id, part: WirePart::Point(index) });
        }
        if let Some(segment) = wire.point_to_segment(cell) {
            return Some(Hit::Wire { id, part: WirePart::Segment(segment) });
        }
    }

    if let Some(terminal) = graph.terminal_at(cell) {
        return Some(Hit::Terminal(terminal));
    }

    graph.index().component_at(cell).map(Hit::ComponentBody)
}
