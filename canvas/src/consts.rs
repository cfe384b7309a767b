//! Shared numeric constants for the canvas crate.

// ── Grid ────────────────────────────────────────────────────────

/// Default cell size in world units along both axes.
pub const DEFAULT_GRID_SPACING: f64 = 20.0;

// ── Camera ──────────────────────────────────────────────────────

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest allowed zoom factor.
pub const MAX_ZOOM: f64 = 10.0;

/// Zoom multiplier applied per wheel notch.
pub const ZOOM_STEP: f64 = 1.1;

// ── Rendering ───────────────────────────────────────────────────

/// Wire stroke width in world units.
pub const WIRE_STROKE_WIDTH: f64 = 5.0;

/// Radius of a junction dot in world units.
pub const JUNCTION_RADIUS: f64 = 8.0;

/// Half the side of a terminal marker square in world units.
pub const TERMINAL_HALF_SIZE: f64 = 4.0;
