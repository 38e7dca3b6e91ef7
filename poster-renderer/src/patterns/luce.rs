//! Light grid: cells of glowing lines composited additively.
//!
//! Laid out in the design space and drawn through a uniform scale. The
//! pointer warp trail only displaces line endpoints; it never touches the
//! stream, and exports leave it out.

use poster_core::{LightPattern, LuceParams};

use super::{centered_indices, RenderContext, WarpSource};
use crate::color::{hue_background, Rgba};
use crate::surface::{BlendMode, Surface};

/// Animation phase after `time` frames.
#[must_use]
pub fn phase_at(params: &LuceParams, time: f64) -> f64 {
    time * 0.01 * params.animation_speed
}

/// Background colour: 0 is black, 360 is white.
#[must_use]
pub fn background(params: &LuceParams) -> Rgba {
    hue_background(params.bg_hue, 60.0, 30.0)
}

/// Displace `(x, y)` away from the strongest warp source within
/// `mouseRadius`, with a quadratic falloff.
#[must_use]
pub fn warp_point(params: &LuceParams, x: f64, y: f64, sources: &[WarpSource]) -> (f64, f64) {
    if sources.is_empty() || params.mouse_force <= 0.0 || params.mouse_radius <= 0.0 {
        return (x, y);
    }
    let mut best = 0.0;
    let mut best_d = (0.0, 0.0);
    for s in sources {
        let (dx, dy) = (x - s.x, y - s.y);
        let dist = dx.hypot(dy);
        if dist > params.mouse_radius || dist < 1e-6 {
            continue;
        }
        let falloff = 1.0 - dist / params.mouse_radius;
        let norm = params.mouse_force * falloff * falloff * s.intensity / dist;
        if norm > best {
            best = norm;
            best_d = (dx, dy);
        }
    }
    (x + best_d.0 * best, y + best_d.1 * best)
}

struct Cell {
    row: u32,
    col: u32,
    cx: f64,
    cy: f64,
    w: f64,
    h: f64,
}

fn cells(params: &LuceParams, width: f64, height: f64) -> Vec<Cell> {
    if params.grid_rows == 0 || params.grid_cols == 0 {
        return Vec::new();
    }
    let w = width / f64::from(params.grid_cols);
    let h = height / f64::from(params.grid_rows);
    let mut out = Vec::with_capacity((params.grid_rows * params.grid_cols) as usize);
    for row in 0..params.grid_rows {
        for col in 0..params.grid_cols {
            out.push(Cell {
                row,
                col,
                cx: f64::from(col) * w + w / 2.0,
                cy: f64::from(row) * h + h / 2.0,
                w,
                h,
            });
        }
    }
    out
}

/// Draw the light grid.
pub fn render<S: Surface + ?Sized>(surface: &mut S, params: &LuceParams, time: f64, ctx: &RenderContext<'_>) {
    let params = params.clone().clamped();
    surface.background(background(&params));
    let trail: &[WarpSource] = ctx.interaction.map_or(&[], |i| i.warp_trail.as_slice());
    let phase = phase_at(&params, time);
    let grid = cells(&params, ctx.design_width, ctx.design_height);

    surface.push();
    surface.scale(ctx.scale);
    match params.pattern_type {
        LightPattern::DiagonalGrid => diagonal_grid(surface, &params, &grid, phase, trail),
        LightPattern::Moire => moire_grid(surface, &params, &grid, phase, trail),
    }
    surface.blend(BlendMode::Normal);
    surface.pop();
}

fn warped_line<S: Surface + ?Sized>(
    surface: &mut S,
    params: &LuceParams,
    cell: &Cell,
    (x1, x2, y): (f64, f64, f64),
    trail: &[WarpSource],
) {
    let p1 = warp_point(params, cell.cx + x1, cell.cy + y, trail);
    let p2 = warp_point(params, cell.cx + x2, cell.cy + y, trail);
    surface.line(p1.0 - cell.cx, p1.1 - cell.cy, p2.0 - cell.cx, p2.1 - cell.cy);
}

fn diagonal_grid<S: Surface + ?Sized>(
    surface: &mut S,
    params: &LuceParams,
    grid: &[Cell],
    phase: f64,
    trail: &[WarpSource],
) {
    surface.blend(BlendMode::Add);
    for cell in grid {
        let wobble = (phase + f64::from(cell.row) * 0.3 + f64::from(cell.col) * 0.3).sin() * 0.2;
        let spacing = cell.w.min(cell.h) / f64::from(params.line_count);
        surface.push();
        surface.translate(cell.cx, cell.cy);
        surface.rotate((params.rotation_angle + wobble * 30.0).to_radians());
        for i in centered_indices(params.line_count) {
            let pos = i * spacing;
            for layer in (0..3u8).rev() {
                let layer = f64::from(layer);
                surface.stroke(Rgba::hsb(params.hue, 80.0, 80.0, 0.15 / (layer + 1.0)));
                surface.stroke_weight(1.0 + layer);
                warped_line(surface, params, cell, (-cell.w, cell.w, pos), trail);
            }
        }
        surface.pop();
    }
}

fn moire_grid<S: Surface + ?Sized>(
    surface: &mut S,
    params: &LuceParams,
    grid: &[Cell],
    phase: f64,
    trail: &[WarpSource],
) {
    surface.blend(BlendMode::Normal);
    surface.stroke_weight(2.0);
    for cell in grid {
        let spacing = cell.w.min(cell.h) / f64::from(params.line_count);
        surface.push();
        surface.translate(cell.cx, cell.cy);
        surface.stroke(Rgba::hsb(0.0, 0.0, 80.0, 0.3));
        for i in centered_indices(params.line_count) {
            warped_line(surface, params, cell, (-cell.w / 2.0, cell.w / 2.0, i * spacing), trail);
        }
        surface.push();
        surface.rotate(params.rotation_angle.to_radians() + phase * 0.5);
        surface.stroke(Rgba::hsb(params.hue, 70.0, 80.0, 0.3));
        for i in centered_indices(params.line_count) {
            let pos = i * spacing;
            surface.line(-cell.w / 2.0, pos, cell.w / 2.0, pos);
        }
        surface.pop();
        surface.pop();
    }

    surface.blend(BlendMode::Add);
    surface.no_stroke();
    for cell in grid {
        for layer in (1..=3u8).rev() {
            let layer = f64::from(layer);
            let size = params.depth * layer / 3.0;
            surface.fill(Rgba::hsb(params.hue, 60.0, 85.0, 0.05 / layer));
            surface.ellipse(cell.cx, cell.cy, size, size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::Interaction;
    use crate::surface::{DrawOp, RecordingSurface};

    fn small() -> LuceParams {
        LuceParams {
            grid_rows: 2,
            grid_cols: 3,
            line_count: 4,
            ..LuceParams::default()
        }
    }

    fn record(params: &LuceParams, ctx: &RenderContext<'_>) -> Vec<DrawOp> {
        let mut surface = RecordingSurface::new(500, 750);
        render(&mut surface, params, 10.0, ctx);
        surface.into_list().ops
    }

    #[test]
    fn diagonal_grid_draws_three_glow_passes_per_line() {
        let ops = record(&small(), &RenderContext::new(500, 750, 1.0));
        let lines: Vec<_> = ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Line { paint, .. } => Some(paint),
                _ => None,
            })
            .collect();
        assert_eq!(lines.len(), 2 * 3 * 4 * 3);
        assert!(lines.iter().all(|p| p.blend == BlendMode::Add));
        assert!((lines[0].stroke_weight - 3.0).abs() < 1e-9);
        assert!((lines[2].stroke_weight - 1.0).abs() < 1e-9);
    }

    #[test]
    fn moire_variant_adds_glow_discs() {
        let params = LuceParams {
            pattern_type: LightPattern::Moire,
            ..small()
        };
        let ops = record(&params, &RenderContext::new(500, 750, 1.0));
        let discs = ops.iter().filter(|op| matches!(op, DrawOp::Ellipse { .. })).count();
        let lines = ops.iter().filter(|op| matches!(op, DrawOp::Line { .. })).count();
        assert_eq!(discs, 6 * 3);
        assert_eq!(lines, 6 * 4 * 2);
    }

    #[test]
    fn warp_pushes_points_away() {
        let params = LuceParams::default();
        let source = WarpSource {
            x: 0.0,
            y: 0.0,
            intensity: 1.0,
        };
        let (x, y) = warp_point(&params, 10.0, 0.0, &[source]);
        assert!(x > 10.0);
        assert!(y.abs() < 1e-12);
        assert_eq!(warp_point(&params, 500.0, 0.0, &[source]), (500.0, 0.0));
        assert_eq!(warp_point(&params, 10.0, 0.0, &[]), (10.0, 0.0));
    }

    #[test]
    fn warp_changes_lines_only_when_present() {
        let trail = Interaction {
            warp_trail: vec![WarpSource {
                x: 100.0,
                y: 100.0,
                intensity: 1.0,
            }],
            ..Interaction::default()
        };
        let plain = record(&small(), &RenderContext::new(500, 750, 1.0));
        let warped = record(&small(), &RenderContext::new(500, 750, 1.0).with_interaction(&trail));
        assert_eq!(plain.len(), warped.len());
        assert_ne!(plain, warped);
    }

    #[test]
    fn empty_grid_draws_background_only() {
        let params = LuceParams {
            grid_rows: 0,
            ..LuceParams::default()
        };
        assert_eq!(record(&params, &RenderContext::new(500, 750, 1.0)).len(), 1);
    }
}
