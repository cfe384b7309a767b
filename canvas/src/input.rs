//! Input model: mouse buttons, keys, and the edit state machine.
//!
//! `InputState` is the gesture being tracked between pointer-down and
//! pointer-up. It is owned by [`crate::engine::EngineCore`]; there is no
//! selection state anywhere else, so two engines never share an edit.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::grid::Cell;
use crate::wire::{Wire, WireId};

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap). Draws and edits wires.
    Primary,
    /// Middle mouse button (scroll wheel click). Pans.
    Middle,
    /// Right mouse button (or two-finger tap). Pans.
    Secondary,
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the browser (e.g. `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape"
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// The wire an edit is working on.
#[derive(Debug, Clone, PartialEq)]
pub enum EditTarget {
    /// A wire being drawn. Not registered with the graph until pointer-up.
    New(Wire),
    /// A registered wire, with its points as they were at pointer-down.
    Existing { id: WireId, snapshot: Vec<Cell> },
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is panning the view.
    Panning {
        /// Screen-space position of the previous pointer event, used to compute pan delta.
        last_screen: Point,
    },
    /// The user is dragging control point `point` of `target`.
    Editing { target: EditTarget, point: usize },
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing { .. })
    }
}
