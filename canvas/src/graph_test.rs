#![allow(clippy::clone_on_copy)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::camera::Point;
use crate::consts::DEFAULT_GRID_SPACING;
use crate::engine::EngineCore;
use crate::input::{Button, Key};

// =============================================================
// Helpers
// =============================================================

fn c(x: i32, y: i32) -> Cell {
    Cell::new(x, y)
}

fn cells(points: &[(i32, i32)]) -> Vec<Cell> {
    points.iter().map(|&p| Cell::from(p)).collect()
}

fn attach(graph: &mut WireGraph, points: &[(i32, i32)]) -> WireId {
    graph.attach_wire(Wire::from_points(cells(points)))
}

fn ids(graph: &WireGraph) -> Vec<u64> {
    graph.wires().map(|(id, _)| id.0).collect()
}

fn points_of(graph: &WireGraph, id: u64) -> Vec<Cell> {
    graph.wire(WireId(id)).unwrap().points().to_vec()
}

/// Every cell a live wire covers carries exactly that wire, and nothing else
/// carries a wire entry.
fn assert_index_consistent(graph: &WireGraph) {
    let mut expected: BTreeMap<Cell, Vec<WireId>> = BTreeMap::new();
    for (id, wire) in graph.wires() {
        for cell in wire.cells() {
            expected.entry(cell).or_default().push(id);
        }
    }
    for (cell, wires) in &expected {
        assert_eq!(&graph.wires_at(*cell), wires, "index disagrees at {cell}");
    }
    for raw in 0..graph.next_id {
        let id = WireId(raw);
        let indexed = graph.index().cells_of(Entry::Wire(id));
        let actual = graph.wire(id).map(Wire::cells).unwrap_or_default();
        assert_eq!(indexed, actual, "index disagrees for {id}");
    }
    for cell in graph.junctions() {
        assert!(graph.index().contains(cell, Entry::Junction));
        assert!(graph.wires_at(cell).len() >= 2, "junction at {cell} joins fewer than two wires");
    }
    assert_eq!(graph.index().cells_of(Entry::Junction), graph.junctions().collect::<Vec<_>>());
}

fn covered(graph: &WireGraph) -> BTreeSet<Cell> {
    graph.wires().flat_map(|(_, w)| w.cells()).collect()
}

// =============================================================
// Attaching and splitting
// =============================================================

#[test]
fn attach_indexes_every_cell() {
    let mut graph = WireGraph::new();
    let id = attach(&mut graph, &[(0, 0), (3, 0), (3, 2)]);
    assert_eq!(id, WireId(0));
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.wires_at(c(3, 1)), vec![id]);
    assert_eq!(graph.index().len(), 6);
    assert_index_consistent(&graph);
}

#[test]
fn endpoint_landing_mid_wire_splits_it() {
    let mut graph = WireGraph::new();
    attach(&mut graph, &[(0, 0), (10, 0)]);
    let before: BTreeSet<Cell> = covered(&graph)
        .into_iter()
        .chain(Wire::from_points(cells(&[(5, 5), (5, 0)])).cells())
        .collect();

    let b = attach(&mut graph, &[(5, 5), (5, 0)]);

    assert_eq!(b, WireId(1));
    assert_eq!(ids(&graph), vec![1, 2, 3]);
    assert!(!graph.contains_wire(WireId(0)));
    assert_eq!(points_of(&graph, 2), cells(&[(0, 0), (5, 0)]));
    assert_eq!(points_of(&graph, 3), cells(&[(5, 0), (10, 0)]));
    assert_eq!(graph.junctions().collect::<Vec<_>>(), vec![c(5, 0)]);
    assert_eq!(covered(&graph), before);
    assert_eq!(graph.wires_at(c(5, 0)), vec![WireId(1), WireId(2), WireId(3)]);
    assert_index_consistent(&graph);
}

#[test]
fn split_records_changes_in_order() {
    let mut graph = WireGraph::new();
    attach(&mut graph, &[(0, 0), (10, 0)]);
    assert_eq!(graph.take_changes(), vec![Change::WireAdded(WireId(0))]);

    attach(&mut graph, &[(5, 5), (5, 0)]);
    assert_eq!(
        graph.take_changes(),
        vec![
            Change::WireAdded(WireId(1)),
            Change::JunctionAdded(c(5, 0)),
            Change::WireRemoved(WireId(0)),
            Change::WireAdded(WireId(2)),
            Change::WireAdded(WireId(3)),
        ]
    );
    assert!(graph.take_changes().is_empty());
}

#[test]
fn endpoints_meeting_make_junction_without_split() {
    let mut graph = WireGraph::new();
    attach(&mut graph, &[(0, 0), (5, 0)]);
    attach(&mut graph, &[(5, 0), (5, 5)]);
    assert_eq!(ids(&graph), vec![0, 1]);
    assert!(graph.is_junction(c(5, 0)));
    assert_index_consistent(&graph);
}

#[test]
fn crossing_interiors_do_not_connect() {
    let mut graph = WireGraph::new();
    attach(&mut graph, &[(0, 0), (6, 0)]);
    attach(&mut graph, &[(3, -3), (3, 3)]);
    assert_eq!(ids(&graph), vec![0, 1]);
    assert_eq!(graph.junctions().count(), 0);
    assert_eq!(graph.wires_at(c(3, 0)).len(), 2);
    assert_eq!(graph.nets().len(), 2);
    assert_index_consistent(&graph);
}

#[test]
fn endpoint_under_a_later_wire_does_not_connect() {
    let mut graph = WireGraph::new();
    let a = attach(&mut graph, &[(0, 0), (5, 0)]);
    let b = attach(&mut graph, &[(5, -3), (5, 3)]);

    // Only the new wire's endpoints are checked, so nothing is split.
    assert_eq!(ids(&graph), vec![0, 1]);
    assert_eq!(graph.junctions().count(), 0);
    assert_eq!(graph.wires_at(c(5, 0)), vec![a, b]);
    assert!(graph.neighbors_at(a, WireEnd::Last).is_empty());
    assert_eq!(graph.net(a), BTreeSet::from([a]));
    assert_eq!(graph.nets().len(), 2);
    assert_index_consistent(&graph);
}

#[test]
fn both_ends_landing_split_two_wires() {
    let mut graph = WireGraph::new();
    attach(&mut graph, &[(0, 0), (10, 0)]);
    attach(&mut graph, &[(0, 6), (10, 6)]);
    attach(&mut graph, &[(5, 0), (5, 6)]);

    assert_eq!(ids(&graph), vec![2, 3, 4, 5, 6]);
    assert_eq!(graph.junctions().collect::<Vec<_>>(), vec![c(5, 0), c(5, 6)]);
    assert_eq!(graph.nets().len(), 1);
    assert_index_consistent(&graph);
}

#[test]
fn endpoint_on_bend_splits_at_existing_point() {
    let mut graph = WireGraph::new();
    attach(&mut graph, &[(0, 0), (4, 0), (4, 4)]);
    attach(&mut graph, &[(8, 0), (4, 0)]);
    assert_eq!(points_of(&graph, 2), cells(&[(0, 0), (4, 0)]));
    assert_eq!(points_of(&graph, 3), cells(&[(4, 0), (4, 4)]));
    assert!(graph.is_junction(c(4, 0)));
    assert_index_consistent(&graph);
}

#[test]
fn split_keeps_terminals_on_their_ends() {
    let mut graph = WireGraph::new();
    graph.place_component(
        ComponentId(0),
        ComponentFootprint::new(CellRect::spanning(c(-2, -1), c(0, 1))).with_terminal(c(0, 0), Slot::Output(0)),
    );
    attach(&mut graph, &[(0, 0), (10, 0)]);
    attach(&mut graph, &[(5, 5), (5, 0)]);

    let head = graph.wire(WireId(2)).unwrap();
    assert_eq!(head.terminal(WireEnd::First), Some(Terminal { component: ComponentId(0), slot: Slot::Output(0) }));
    assert_eq!(head.terminal(WireEnd::Last), None);
    assert_eq!(graph.wire(WireId(3)).unwrap().terminal(WireEnd::First), None);
}

// =============================================================
// Moving and deleting
// =============================================================

#[test]
fn moving_a_wire_reindexes_it() {
    let mut graph = WireGraph::new();
    let id = attach(&mut graph, &[(0, 0), (4, 0)]);
    let previous = graph.wire(id).unwrap().points().to_vec();
    graph.wire_mut(id).unwrap().set_points(cells(&[(0, 2), (4, 2)]));
    graph.wire_moved(id, &previous);

    assert!(graph.wires_at(c(2, 0)).is_empty());
    assert_eq!(graph.wires_at(c(2, 2)), vec![id]);
    assert_eq!(graph.take_changes().last(), Some(&Change::WireMoved(id)));
    assert_index_consistent(&graph);
}

#[test]
fn moving_an_endpoint_onto_a_wire_splits_it() {
    let mut graph = WireGraph::new();
    attach(&mut graph, &[(0, 0), (10, 0)]);
    let b = attach(&mut graph, &[(5, 5), (5, 2)]);
    assert_eq!(graph.junctions().count(), 0);

    let previous = graph.wire(b).unwrap().points().to_vec();
    graph.wire_mut(b).unwrap().set_point(1, c(5, 0));
    graph.wire_moved(b, &previous);

    assert_eq!(ids(&graph), vec![1, 2, 3]);
    assert!(graph.is_junction(c(5, 0)));
    assert_index_consistent(&graph);
}

#[test]
fn moving_away_keeps_junction_between_remaining_halves() {
    let mut graph = WireGraph::new();
    attach(&mut graph, &[(0, 0), (10, 0)]);
    let b = attach(&mut graph, &[(5, 5), (5, 0)]);

    let previous = graph.wire(b).unwrap().points().to_vec();
    graph.wire_mut(b).unwrap().set_point(1, c(5, 2));
    graph.wire_moved(b, &previous);

    assert!(graph.is_junction(c(5, 0)));
    assert_eq!(graph.wires_at(c(5, 0)), vec![WireId(2), WireId(3)]);
    assert_index_consistent(&graph);
}

#[test]
fn collapsed_wire_is_deleted() {
    let mut graph = WireGraph::new();
    let id = attach(&mut graph, &[(0, 0), (4, 0)]);
    let previous = graph.wire(id).unwrap().points().to_vec();
    graph.wire_mut(id).unwrap().set_points(cells(&[(4, 0), (4, 0)]));
    graph.wire_moved(id, &previous);

    assert!(graph.is_empty());
    assert!(graph.index().is_empty());
    assert!(graph.take_changes().contains(&Change::WireRemoved(id)));
}

#[test]
fn delete_clears_cells_and_prunes_junctions() {
    let mut graph = WireGraph::new();
    attach(&mut graph, &[(0, 0), (10, 0)]);
    attach(&mut graph, &[(5, 5), (5, 0)]);

    graph.delete_wire(WireId(3));
    assert!(graph.is_junction(c(5, 0)));
    assert_index_consistent(&graph);

    let removed = graph.delete_wire(WireId(1)).unwrap();
    assert_eq!(removed.points(), cells(&[(5, 5), (5, 0)]).as_slice());
    assert!(!graph.is_junction(c(5, 0)));
    assert_eq!(ids(&graph), vec![2]);
    assert_index_consistent(&graph);
}

#[test]
fn deleting_unknown_wire_is_none() {
    let mut graph = WireGraph::new();
    let a = attach(&mut graph, &[(0, 0), (1, 0)]);
    assert!(graph.delete_wire(a).is_some());
    graph.take_changes();

    assert!(graph.delete_wire(a).is_none());
    assert!(graph.delete_wire(WireId(99)).is_none());
    assert!(graph.take_changes().is_empty());
}

#[test]
fn ids_are_never_reused() {
    let mut graph = WireGraph::new();
    let a = attach(&mut graph, &[(0, 0), (1, 0)]);
    graph.delete_wire(a);
    let b = attach(&mut graph, &[(0, 0), (1, 0)]);
    assert_ne!(a, b);
}

#[test]
fn create_wire_occupies_nothing() {
    let mut graph = WireGraph::new();
    let id = graph.create_wire();
    assert!(graph.contains_wire(id));
    assert!(graph.index().is_empty());
    assert!(graph.snapshot().wires.is_empty());
    assert!(graph.nets().is_empty());
}

// =============================================================
// Junction markers
// =============================================================

#[test]
fn remove_junction_drops_marker_only() {
    let mut graph = WireGraph::new();
    attach(&mut graph, &[(0, 0), (5, 0)]);
    attach(&mut graph, &[(5, 0), (5, 5)]);

    assert!(graph.remove_junction(c(5, 0)));
    assert!(!graph.remove_junction(c(5, 0)));
    assert!(!graph.is_junction(c(5, 0)));
    assert_eq!(graph.len(), 2);
    assert_index_consistent(&graph);
}

// =============================================================
// Topology queries
// =============================================================

#[test]
fn neighbors_at_each_end() {
    let mut graph = WireGraph::new();
    attach(&mut graph, &[(0, 0), (10, 0)]);
    let b = attach(&mut graph, &[(5, 5), (5, 0)]);

    assert!(graph.neighbors_at(b, WireEnd::First).is_empty());
    assert_eq!(graph.neighbors_at(b, WireEnd::Last), vec![WireId(2), WireId(3)]);
}

#[test]
fn nets_group_connected_wires() {
    let mut graph = WireGraph::new();
    attach(&mut graph, &[(0, 0), (10, 0)]);
    attach(&mut graph, &[(5, 5), (5, 0)]);
    let lone = attach(&mut graph, &[(20, 20), (25, 20)]);

    assert_eq!(graph.net(WireId(1)), BTreeSet::from([WireId(1), WireId(2), WireId(3)]));
    assert_eq!(graph.net(lone), BTreeSet::from([lone]));
    assert_eq!(graph.nets().len(), 2);
}

// =============================================================
// Components and terminals
// =============================================================

fn gate() -> ComponentFootprint {
    ComponentFootprint::new(CellRect::spanning(c(0, 0), c(2, 2)))
        .with_terminal(c(0, 1), Slot::Input(0))
        .with_terminal(c(2, 1), Slot::Output(0))
}

#[test]
fn wire_end_on_pin_resolves_terminal() {
    let mut graph = WireGraph::new();
    graph.place_component(ComponentId(7), gate());
    let id = attach(&mut graph, &[(2, 1), (6, 1)]);

    let wire = graph.wire(id).unwrap();
    assert_eq!(wire.terminal(WireEnd::First), Some(Terminal { component: ComponentId(7), slot: Slot::Output(0) }));
    assert_eq!(wire.terminal(WireEnd::Last), None);
    assert_eq!(graph.terminal_at(c(0, 1)), Some(Terminal { component: ComponentId(7), slot: Slot::Input(0) }));
    assert_eq!(graph.terminal_at(c(1, 1)), None);
}

#[test]
fn placing_and_removing_component_updates_terminals() {
    let mut graph = WireGraph::new();
    let id = attach(&mut graph, &[(-4, 1), (0, 1)]);
    assert_eq!(graph.wire(id).unwrap().terminal(WireEnd::Last), None);

    graph.place_component(ComponentId(1), gate());
    assert_eq!(
        graph.wire(id).unwrap().terminal(WireEnd::Last),
        Some(Terminal { component: ComponentId(1), slot: Slot::Input(0) })
    );

    assert!(graph.remove_component(ComponentId(1)).is_some());
    assert_eq!(graph.wire(id).unwrap().terminal(WireEnd::Last), None);
    assert_eq!(graph.index().component_at(c(1, 1)), None);
    assert!(graph.remove_component(ComponentId(1)).is_none());
}

#[test]
fn replacing_component_moves_footprint() {
    let mut graph = WireGraph::new();
    graph.place_component(ComponentId(1), gate());
    graph.place_component(ComponentId(1), ComponentFootprint::new(CellRect::spanning(c(10, 10), c(11, 11))));
    assert_eq!(graph.index().component_at(c(1, 1)), None);
    assert_eq!(graph.index().component_at(c(11, 10)), Some(ComponentId(1)));
    assert_eq!(graph.components().count(), 1);
}

// =============================================================
// Snapshots
// =============================================================

fn record(id: u64, points: &[(i32, i32)]) -> WireRecord {
    WireRecord { id: WireId(id), points: cells(points) }
}

#[test]
fn snapshot_round_trips_through_json() {
    let mut graph = WireGraph::new();
    graph.place_component(ComponentId(3), gate());
    attach(&mut graph, &[(2, 1), (10, 1)]);
    attach(&mut graph, &[(5, 5), (5, 1)]);

    let json = serde_json::to_string(&graph.snapshot()).unwrap();
    let snapshot: Snapshot = serde_json::from_str(&json).unwrap();

    let mut loaded = WireGraph::new();
    loaded.load_snapshot(snapshot.clone()).unwrap();
    assert_eq!(loaded.snapshot(), snapshot);
    assert_eq!(loaded.junctions().collect::<Vec<_>>(), vec![c(5, 1)]);
    assert_eq!(
        loaded.wire(WireId(2)).unwrap().terminal(WireEnd::First),
        Some(Terminal { component: ComponentId(3), slot: Slot::Output(0) })
    );
    assert!(loaded.take_changes().is_empty());
    assert_index_consistent(&loaded);
}

#[test]
fn load_continues_ids_after_largest() {
    let mut graph = WireGraph::new();
    graph
        .load_snapshot(Snapshot { wires: vec![record(4, &[(0, 0), (0, 3)]), record(9, &[(5, 0), (5, 3)])], components: vec![] })
        .unwrap();
    assert_eq!(graph.create_wire(), WireId(10));
}

#[test]
fn load_rejects_largest_id() {
    let mut graph = WireGraph::new();
    let err = graph
        .load_snapshot(Snapshot { wires: vec![record(u64::MAX, &[(0, 0), (5, 0)])], components: vec![] })
        .unwrap_err();
    assert_eq!(err, LoadError::IdExhausted(WireId(u64::MAX)));
    assert!(graph.is_empty());
}

#[test]
fn load_accepts_id_just_below_largest() {
    let mut graph = WireGraph::new();
    let id = u64::MAX - 1;
    graph.load_snapshot(Snapshot { wires: vec![record(id, &[(0, 0), (5, 0)])], components: vec![] }).unwrap();
    assert_eq!(ids(&graph), vec![id]);
    assert_eq!(graph.wires_at(c(3, 0)), vec![WireId(id)]);
}

#[test]
#[should_panic(expected = "wire ids exhausted")]
fn allocating_past_the_last_id_panics() {
    let mut graph = WireGraph::new();
    graph
        .load_snapshot(Snapshot { wires: vec![record(u64::MAX - 1, &[(0, 0), (5, 0)])], components: vec![] })
        .unwrap();
    graph.create_wire();
}

#[test]
fn load_splits_unsettled_junctions() {
    let mut graph = WireGraph::new();
    graph
        .load_snapshot(Snapshot { wires: vec![record(5, &[(0, 0), (10, 0)]), record(9, &[(5, 5), (5, 0)])], components: vec![] })
        .unwrap();
    assert_eq!(ids(&graph), vec![9, 10, 11]);
    assert!(graph.is_junction(c(5, 0)));
    assert_index_consistent(&graph);
}

#[test]
fn load_accepts_missing_components_field() {
    let snapshot: Snapshot = serde_json::from_str(r#"{"wires":[{"id":0,"points":[{"x":0,"y":0},{"x":2,"y":0}]}]}"#).unwrap();
    let mut graph = WireGraph::new();
    graph.load_snapshot(snapshot).unwrap();
    assert_eq!(graph.len(), 1);
}

#[test]
fn load_rejects_bad_wires() {
    let cases = [
        (vec![record(0, &[(0, 0)])], LoadError::TooFewPoints { id: WireId(0), count: 1 }),
        (vec![record(1, &[(2, 2), (2, 2)])], LoadError::Degenerate { id: WireId(1) }),
        (vec![record(2, &[(0, 0), (0, 4), (3, 7)])], LoadError::NotOrthogonal { id: WireId(2), segment: 1 }),
        (vec![record(3, &[(0, 0), (1, 0)]), record(3, &[(0, 5), (1, 5)])], LoadError::DuplicateWire(WireId(3))),
    ];
    for (wires, expected) in cases {
        let mut graph = WireGraph::new();
        let err = graph.load_snapshot(Snapshot { wires, components: vec![] }).unwrap_err();
        assert_eq!(err, expected);
    }
}

#[test]
fn load_rejects_duplicate_components() {
    let component = ComponentRecord { id: ComponentId(1), footprint: gate() };
    let mut graph = WireGraph::new();
    let err = graph
        .load_snapshot(Snapshot { wires: vec![], components: vec![component.clone(), component] })
        .unwrap_err();
    assert_eq!(err, LoadError::DuplicateComponent(ComponentId(1)));
    assert_eq!(err.to_string(), "component id c1 appears more than once");
}

#[test]
fn failed_load_leaves_graph_untouched() {
    let mut graph = WireGraph::new();
    attach(&mut graph, &[(0, 0), (4, 0)]);
    let before = graph.snapshot();

    let bad = Snapshot { wires: vec![record(0, &[(0, 0), (1, 1)])], components: vec![] };
    assert!(graph.load_snapshot(bad).is_err());
    assert_eq!(graph.snapshot(), before);
    assert_index_consistent(&graph);
}

// =============================================================
// Random editing sessions
// =============================================================

fn screen(cell: Cell) -> Point {
    Point::new(f64::from(cell.x) * DEFAULT_GRID_SPACING, f64::from(cell.y) * DEFAULT_GRID_SPACING)
}

fn random_cell(rng: &mut StdRng) -> Cell {
    c(rng.random_range(-6..=6), rng.random_range(-6..=6))
}

fn assert_settled(graph: &WireGraph) {
    assert_index_consistent(graph);
    for (id, wire) in graph.wires() {
        assert!(wire.is_orthogonal(), "{id} is not orthogonal: {:?}", wire.points());
    }
}

#[test]
fn random_sessions_keep_index_consistent() {
    let mut rng = StdRng::seed_from_u64(0x1dea);
    for _ in 0..20 {
        let mut core = EngineCore::new();
        for _ in 0..30 {
            core.on_pointer_down(screen(random_cell(&mut rng)), Button::Primary);
            for _ in 0..rng.random_range(1..=4) {
                core.on_pointer_move(screen(random_cell(&mut rng)));
            }
            if rng.random_bool(0.2) {
                core.on_key_down(&Key("Escape".to_owned()));
            } else {
                core.on_pointer_up(screen(random_cell(&mut rng)), Button::Primary);
            }
            assert!(core.input.is_idle());
            assert_settled(&core.graph);

            if rng.random_bool(0.1) {
                let live: Vec<WireId> = core.graph.wires().map(|(id, _)| id).collect();
                if !live.is_empty() {
                    core.delete_wire(live[rng.random_range(0..live.len())]);
                    assert_settled(&core.graph);
                }
            }
        }
    }
}
