//! Orthogonal wire routing for the circuit editor canvas.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! wiring layer of the editor: snapping pointer positions to the grid, drawing
//! and reshaping orthogonal wires, tracking which cells every wire and
//! component occupies, and joining wires into junctions. The host JavaScript
//! layer wires DOM events to the engine, forwards component placements from
//! the simulation, and applies the resulting [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`graph`] | Wire graph: topology, junctions, splitting, snapshots |
//! | [`wire`] | Wire geometry and point-alignment |
//! | [`occupancy`] | Sparse cell-to-entity index |
//! | [`grid`] | Grid cells and world/grid conversion |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`input`] | Input event types and the edit state machine |
//! | [`hit`] | Hit-testing a grid cell |
//! | [`render`] | Scene rendering |
//! | [`consts`] | Shared numeric constants (zoom limits, stroke sizes, etc.) |

pub mod camera;
pub mod consts;
pub mod engine;
pub mod graph;
pub mod grid;
pub mod hit;
pub mod input;
pub mod occupancy;
pub mod render;
pub mod wire;
