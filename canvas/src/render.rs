//! Rendering: draws the wiring layer to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It reads the engine state and produces pixels. It does not mutate any
//! application state.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::consts::{JUNCTION_RADIUS, TERMINAL_HALF_SIZE, WIRE_STROKE_WIDTH};
use crate::engine::EngineCore;
use crate::graph::ComponentFootprint;
use crate::grid::Grid;
use crate::wire::Wire;

const WIRE_COLOR: &str = "#1f2933";
const EDIT_COLOR: &str = "#1E90FF";
const COMPONENT_COLOR: &str = "#52606d";
const TERMINAL_COLOR: &str = "#d64545";

/// Draw the full scene: components, committed wires, the wire being edited, then junctions.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(ctx: &CanvasRenderingContext2d, core: &EngineCore) -> Result<(), JsValue> {
    let camera = core.camera;
    let grid = &core.grid;

    // Layer 1: clear and set up transforms.
    ctx.set_transform(core.dpr, 0.0, 0.0, core.dpr, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, core.viewport_width, core.viewport_height);
    ctx.translate(camera.pan_x, camera.pan_y)?;
    ctx.scale(camera.zoom, camera.zoom)?;

    // Layer 2: component footprints.
    for (_, footprint) in core.graph.components() {
        draw_component(ctx, grid, footprint);
    }

    // Layer 3: wires. The one under edit is drawn last, on top.
    let editing = core.editing_wire();
    ctx.set_line_width(WIRE_STROKE_WIDTH);
    ctx.set_stroke_style_str(WIRE_COLOR);
    for (_, wire) in core.graph.wires() {
        if editing.is_some_and(|e| std::ptr::eq(e, wire)) {
            continue;
        }
        draw_polyline(ctx, grid, wire);
    }
    if let Some(wire) = editing {
        ctx.set_stroke_style_str(EDIT_COLOR);
        draw_polyline(ctx, grid, wire);
    }

    // Layer 4: junction dots.
    ctx.set_fill_style_str(WIRE_COLOR);
    for cell in core.graph.junctions() {
        let center = grid.grid_to_world(cell);
        ctx.begin_path();
        ctx.arc(center.x, center.y, JUNCTION_RADIUS, 0.0, 2.0 * PI)?;
        ctx.fill();
    }

    Ok(())
}

fn draw_polyline(ctx: &CanvasRenderingContext2d, grid: &Grid, wire: &Wire) {
    let mut points = wire.points().iter().map(|&cell| grid.grid_to_world(cell));
    let Some(start) = points.next() else {
        return;
    };
    ctx.begin_path();
    ctx.move_to(start.x, start.y);
    for pt in points {
        ctx.line_to(pt.x, pt.y);
    }
    ctx.stroke();
}

fn draw_component(ctx: &CanvasRenderingContext2d, grid: &Grid, footprint: &ComponentFootprint) {
    let min = grid.grid_to_world(footprint.bounds.min);
    let max = grid.grid_to_world(footprint.bounds.max);

    ctx.save();
    ctx.set_line_width(1.0);
    ctx.set_stroke_style_str(COMPONENT_COLOR);
    ctx.stroke_rect(min.x, min.y, max.x - min.x, max.y - min.y);

    ctx.set_fill_style_str(TERMINAL_COLOR);
    for terminal in &footprint.terminals {
        let pt = grid.grid_to_world(terminal.cell);
        ctx.fill_rect(
            pt.x - TERMINAL_HALF_SIZE,
            pt.y - TERMINAL_HALF_SIZE,
            TERMINAL_HALF_SIZE * 2.0,
            TERMINAL_HALF_SIZE * 2.0,
        );
    }
    ctx.restore();
}
