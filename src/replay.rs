//! Offline driver: replays recorded pointer sessions against an `EngineCore`
//! and checks persisted snapshots.

use std::fs;
use std::path::{Path, PathBuf};

use canvas::camera::Point;
use canvas::engine::{Action, EngineCore};
use canvas::graph::{ComponentFootprint, LoadError, Snapshot, WireGraph};
use canvas::grid::{Cell, Grid};
use canvas::input::{Button, Key, WheelDelta};
use canvas::wire::{ComponentId, WireId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("snapshot rejected: {0}")]
    Load(#[from] LoadError),
    #[error("failed to encode output: {0}")]
    Encode(#[source] serde_json::Error),
}

// =============================================================================
// SESSION FORMAT
// =============================================================================

/// Pointer button as written in session files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

impl From<SessionButton> for Button {
    fn from(button: SessionButton) -> Self {
        match button {
            SessionButton::Primary => Button::Primary,
            SessionButton::Middle => Button::Middle,
            SessionButton::Secondary => Button::Secondary,
        }
    }
}

/// One recorded host event. Pointer coordinates are screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Down {
        x: f64,
        y: f64,
        #[serde(default)]
        button: SessionButton,
    },
    Move {
        x: f64,
        y: f64,
    },
    Up {
        x: f64,
        y: f64,
        #[serde(default)]
        button: SessionButton,
    },
    Key {
        key: String,
    },
    Wheel {
        x: f64,
        y: f64,
        dy: f64,
    },
    PlaceComponent {
        id: ComponentId,
        footprint: ComponentFootprint,
    },
    RemoveComponent {
        id: ComponentId,
    },
    DeleteWire {
        id: WireId,
    },
}

/// A recorded editing session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Graph to start from; empty when absent.
    #[serde(default)]
    pub initial: Option<Snapshot>,
    #[serde(default)]
    pub events: Vec<SessionEvent>,
}

/// Result of a replay, printed as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayOutcome {
    pub snapshot: Snapshot,
    pub junctions: Vec<Cell>,
    pub nets: usize,
    /// Host actions emitted, excluding bare render requests.
    pub actions: usize,
}

/// Summary printed by `check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub wires: usize,
    pub components: usize,
    pub junctions: usize,
    pub nets: usize,
}

// =============================================================================
// REPLAY
// =============================================================================

/// Feed every event of `session` through a fresh engine on `grid`.
///
/// # Errors
///
/// Returns [`ReplayError::Load`] if the initial snapshot is rejected.
pub fn replay(session: Session, grid: Grid) -> Result<ReplayOutcome, ReplayError> {
    let mut core = EngineCore::with_grid(grid);
    if let Some(initial) = session.initial {
        core.load_snapshot(initial)?;
    }

    let mut actions = 0;
    for (n, event) in session.events.into_iter().enumerate() {
        debug!(event = n, ?event, "replaying");
        let emitted = apply(&mut core, event);
        actions += emitted.iter().filter(|a| !matches!(a, Action::RenderNeeded)).count();
    }
    if core.input.is_editing() {
        warn!("session ended mid-edit; uncommitted edit dropped");
        core.cancel_edit();
    }

    let graph = &core.graph;
    let outcome = ReplayOutcome {
        snapshot: graph.snapshot(),
        junctions: graph.junctions().collect(),
        nets: graph.nets().len(),
        actions,
    };
    info!(wires = outcome.snapshot.wires.len(), junctions = outcome.junctions.len(), "replay finished");
    Ok(outcome)
}

fn apply(core: &mut EngineCore, event: SessionEvent) -> Vec<Action> {
    match event {
        SessionEvent::Down { x, y, button } => core.on_pointer_down(Point::new(x, y), button.into()),
        SessionEvent::Move { x, y } => core.on_pointer_move(Point::new(x, y)),
        SessionEvent::Up { x, y, button } => {
            if core.input.is_idle() {
                warn!(x, y, "pointer-up with no active edit");
            }
            core.on_pointer_up(Point::new(x, y), button.into())
        }
        SessionEvent::Key { key } => core.on_key_down(&Key(key)),
        SessionEvent::Wheel { x, y, dy } => core.on_wheel(Point::new(x, y), WheelDelta { dx: 0.0, dy }),
        SessionEvent::PlaceComponent { id, footprint } => core.place_component(id, footprint),
        SessionEvent::RemoveComponent { id } => core.remove_component(id),
        SessionEvent::DeleteWire { id } => core.delete_wire(id),
    }
}

// =============================================================================
// CHECK
// =============================================================================

/// Load `snapshot` into an empty graph and summarise it.
///
/// # Errors
///
/// Returns [`ReplayError::Load`] if the snapshot is rejected.
pub fn check(snapshot: Snapshot) -> Result<CheckReport, ReplayError> {
    let mut graph = WireGraph::new();
    graph.load_snapshot(snapshot)?;
    Ok(CheckReport {
        wires: graph.len(),
        components: graph.components().count(),
        junctions: graph.junctions().count(),
        nets: graph.nets().len(),
    })
}

// =============================================================================
// FILES
// =============================================================================

/// Read and decode a JSON file.
///
/// # Errors
///
/// Returns [`ReplayError::Io`] or [`ReplayError::Json`].
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ReplayError> {
    let raw = fs::read_to_string(path).map_err(|source| ReplayError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_str(&raw).map_err(|source| ReplayError::Json { path: path.to_path_buf(), source })
}

/// Encode `value` as JSON.
///
/// # Errors
///
/// Returns [`ReplayError::Encode`] if serialization fails.
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, ReplayError> {
    let encoded = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    encoded.map_err(ReplayError::Encode)
}

#[cfg(test)]
#[path = "replay_test.rs"]
mod tests;
