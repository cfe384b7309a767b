use std::collections::BTreeSet;

use tracing::{debug, warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::camera::{Camera, Point};
use crate::consts::ZOOM_STEP;
use crate::graph::{Change, ComponentFootprint, LoadError, Snapshot, WireGraph};
use crate::grid::{Cell, Grid};
use crate::hit::{self, Hit};
use crate::input::{Button, EditTarget, InputState, Key, WheelDelta};
use crate::render;
use crate::wire::{ComponentId, Wire, WireId};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    WireCreated { id: WireId, points: Vec<Cell> },
    WireUpdated { id: WireId, points: Vec<Cell> },
    WireDeleted { id: WireId },
    /// The full set of junction cells after the change.
    JunctionsChanged(Vec<Cell>),
    RenderNeeded,
}

/// Core engine state: everything that does not touch the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore {
    pub graph: WireGraph,
    pub grid: Grid,
    pub camera: Camera,
    pub input: InputState,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::with_grid(Grid::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_grid(grid: Grid) -> Self {
        Self {
            graph: WireGraph::new(),
            grid,
            camera: Camera::default(),
            input: InputState::default(),
            viewport_width: 0.0,
            viewport_height: 0.0,
            dpr: 1.0,
        }
    }

    // --- Data inputs ---

    /// Replace the graph with a persisted snapshot. Any edit in progress is dropped.
    ///
    /// # Errors
    ///
    /// Returns the snapshot's [`LoadError`]; the graph is left untouched.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) -> Result<Vec<Action>, LoadError> {
        self.graph.load_snapshot(snapshot)?;
        self.input = InputState::Idle;
        Ok(vec![Action::JunctionsChanged(self.graph.junctions().collect()), Action::RenderNeeded])
    }

    /// Place or move a component footprint.
    pub fn place_component(&mut self, id: ComponentId, footprint: ComponentFootprint) -> Vec<Action> {
        self.graph.place_component(id, footprint);
        self.drain_actions()
    }

    pub fn remove_component(&mut self, id: ComponentId) -> Vec<Action> {
        self.graph.remove_component(id);
        self.drain_actions()
    }

    /// Delete a wire. Ignored while that wire is being edited or if it does not exist.
    pub fn delete_wire(&mut self, id: WireId) -> Vec<Action> {
        if self.editing_id() == Some(id) || !self.graph.contains_wire(id) {
            return Vec::new();
        }
        self.graph.delete_wire(id);
        self.drain_actions()
    }

    /// Update viewport dimensions and device pixel ratio.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.viewport_width = width_css;
        self.viewport_height = height_css;
        self.dpr = dpr;
    }

    // --- Input events ---

    /// Start panning, editing the wire under the pointer, or drawing a new wire.
    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button) -> Vec<Action> {
        if !self.input.is_idle() {
            return Vec::new();
        }
        if matches!(button, Button::Middle | Button::Secondary) {
            self.input = InputState::Panning { last_screen: screen_pt };
            return Vec::new();
        }

        let cell = self.cell_at(screen_pt);
        match hit::hit_test(&self.graph, cell) {
            Some(Hit::ComponentBody(_)) => return Vec::new(),
            Some(Hit::Junction(at)) => {
                self.graph.remove_junction(at);
                if let Some(&id) = self.graph.wires_at(at).first() {
                    self.begin_existing_edit(id, at);
                }
            }
            Some(Hit::Wire { id, .. }) => self.begin_existing_edit(id, cell),
            Some(Hit::Terminal(_)) | None => {
                debug!(%cell, "drawing new wire");
                self.input = InputState::Editing { target: EditTarget::New(Wire::starting_at(cell)), point: 1 };
            }
        }
        self.drain_actions()
    }

    /// Drag the selected point, or pan.
    pub fn on_pointer_move(&mut self, screen_pt: Point) -> Vec<Action> {
        let cell = self.cell_at(screen_pt);
        match &mut self.input {
            InputState::Idle => Vec::new(),
            InputState::Panning { last_screen } => {
                let (dx, dy) = (screen_pt.x - last_screen.x, screen_pt.y - last_screen.y);
                *last_screen = screen_pt;
                self.camera.pan_by(dx, dy);
                vec![Action::RenderNeeded]
            }
            InputState::Editing { target, point } => {
                let wire = match target {
                    EditTarget::New(wire) => Some(wire),
                    EditTarget::Existing { id, .. } => self.graph.wire_mut(*id),
                };
                let Some(wire) = wire else {
                    warn!("edited wire disappeared mid-drag");
                    self.input = InputState::Idle;
                    return Vec::new();
                };
                if wire.point(*point) == cell {
                    return Vec::new();
                }
                *point = wire.move_point_aligned(*point, cell);
                vec![Action::RenderNeeded]
            }
        }
    }

    /// Commit the edit in progress.
    pub fn on_pointer_up(&mut self, _screen_pt: Point, _button: Button) -> Vec<Action> {
        let InputState::Editing { target, .. } = std::mem::take(&mut self.input) else {
            return Vec::new();
        };

        match target {
            EditTarget::New(mut wire) => {
                wire.remove_flat_points();
                if wire.is_degenerate() {
                    debug!("discarded zero-length wire");
                    return vec![Action::RenderNeeded];
                }
                self.graph.attach_wire(wire);
            }
            EditTarget::Existing { id, snapshot } => {
                let Some(wire) = self.graph.wire_mut(id) else {
                    warn!(wire = %id, "edited wire disappeared before commit");
                    return Vec::new();
                };
                wire.remove_flat_points();
                self.graph.wire_moved(id, &snapshot);
            }
        }
        self.drain_actions()
    }

    /// Zoom about the pointer.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta) -> Vec<Action> {
        if delta.dy == 0.0 {
            return Vec::new();
        }
        let factor = if delta.dy < 0.0 { ZOOM_STEP } else { ZOOM_STEP.recip() };
        self.camera.zoom_at(screen_pt, factor);
        vec![Action::RenderNeeded]
    }

    /// `Escape` cancels the edit in progress.
    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        if key.is_escape() {
            return self.cancel_edit();
        }
        Vec::new()
    }

    /// Return to idle without committing. An existing wire gets its pre-drag points back.
    pub fn cancel_edit(&mut self) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::Idle | InputState::Panning { .. } => Vec::new(),
            InputState::Editing { target: EditTarget::New(_), .. } => vec![Action::RenderNeeded],
            InputState::Editing { target: EditTarget::Existing { id, snapshot }, .. } => {
                let Some(wire) = self.graph.wire_mut(id) else {
                    return Vec::new();
                };
                wire.set_points(snapshot.clone());
                self.graph.wire_moved(id, &snapshot);
                self.drain_actions()
            }
        }
    }

    // --- Queries ---

    /// The wire currently being drawn or edited, if any.
    #[must_use]
    pub fn editing_wire(&self) -> Option<&Wire> {
        match &self.input {
            InputState::Editing { target: EditTarget::New(wire), .. } => Some(wire),
            InputState::Editing { target: EditTarget::Existing { id, .. }, .. } => self.graph.wire(*id),
            InputState::Idle | InputState::Panning { .. } => None,
        }
    }

    /// The current camera state.
    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.graph.wire(id)
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.graph.snapshot()
    }

    // --- Internals ---

    fn cell_at(&self, screen_pt: Point) -> Cell {
        self.grid.world_to_grid(self.camera.screen_to_world(screen_pt))
    }

    fn editing_id(&self) -> Option<WireId> {
        match &self.input {
            InputState::Editing { target: EditTarget::Existing { id, .. }, .. } => Some(*id),
            _ => None,
        }
    }

    fn begin_existing_edit(&mut self, id: WireId, cell: Cell) {
        let Some(wire) = self.graph.wire_mut(id) else {
            return;
        };
        let snapshot = wire.points().to_vec();
        let Some(point) = wire.find_or_make_point(cell) else {
            return;
        };
        debug!(wire = %id, point, "editing wire");
        self.input = InputState::Editing { target: EditTarget::Existing { id, snapshot }, point };
    }

    /// Fold the graph's change log into host actions.
    ///
    /// Wires created and destroyed within the same batch (intermediate split
    /// halves) are not reported.
    fn drain_actions(&mut self) -> Vec<Action> {
        let mut added = BTreeSet::new();
        let mut removed = BTreeSet::new();
        let mut moved = BTreeSet::new();
        let mut junctions_changed = false;

        for change in self.graph.take_changes() {
            match change {
                Change::WireAdded(id) => {
                    added.insert(id);
                }
                Change::WireRemoved(id) => {
                    moved.remove(&id);
                    if !added.remove(&id) {
                        removed.insert(id);
                    }
                }
                Change::WireMoved(id) => {
                    if !added.contains(&id) {
                        moved.insert(id);
                    }
                }
                Change::JunctionAdded(_) | Change::JunctionRemoved(_) => junctions_changed = true,
            }
        }

        let mut actions: Vec<Action> = removed.into_iter().map(|id| Action::WireDeleted { id }).collect();
        for id in added {
            if let Some(wire) = self.graph.wire(id) {
                actions.push(Action::WireCreated { id, points: wire.points().to_vec() });
            }
        }
        for id in moved {
            if let Some(wire) = self.graph.wire(id) {
                actions.push(Action::WireUpdated { id, points: wire.points().to_vec() });
            }
        }
        if junctions_changed {
            actions.push(Action::JunctionsChanged(self.graph.junctions().collect()));
        }
        actions.push(Action::RenderNeeded);
        actions
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement, grid: Grid) -> Self {
        Self { canvas, core: EngineCore::with_grid(grid) }
    }

    // --- Delegated data inputs ---

    /// # Errors
    ///
    /// See [`EngineCore::load_snapshot`].
    pub fn load_snapshot(&mut self, snapshot: Snapshot) -> Result<Vec<Action>, LoadError> {
        self.core.load_snapshot(snapshot)
    }

    pub fn place_component(&mut self, id: ComponentId, footprint: ComponentFootprint) -> Vec<Action> {
        self.core.place_component(id, footprint)
    }

    pub fn remove_component(&mut self, id: ComponentId) -> Vec<Action> {
        self.core.remove_component(id)
    }

    pub fn delete_wire(&mut self, id: WireId) -> Vec<Action> {
        self.core.delete_wire(id)
    }

    // --- Viewport ---

    /// Update viewport dimensions and device pixel ratio, resizing the backing store.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.core.set_viewport(width_css, height_css, dpr);
        self.canvas.set_width((width_css * dpr).round().max(0.0) as u32);
        self.canvas.set_height((height_css * dpr).round().max(0.0) as u32);
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, button)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt, button)
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta) -> Vec<Action> {
        self.core.on_wheel(screen_pt, delta)
    }

    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        self.core.on_key_down(key)
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the 2D context is unavailable or a draw call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        let ctx = self
            .canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        render::draw(&ctx, &self.core)
    }

    // --- Delegated queries ---

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.core.camera()
    }

    #[must_use]
    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.core.wire(id)
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.core.snapshot()
    }
}
