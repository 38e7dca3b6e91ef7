//! Griglie: overlapping line layers rotating about the centre.
//!
//! Layer 0 is a set of concentric circles; every other layer draws one
//! stream choice (horizontal or vertical) and then parallel lines. Each layer
//! also takes a small seeded angular offset, so the stream is consumed as
//! `offset₀, offset₁, choice₁, offset₂, choice₂, ...`.

use poster_core::{GriglieParams, LineColor, RandomStream, Tone};

use super::RenderContext;
use crate::color::Rgba;
use crate::surface::Surface;

/// Line width in preview pixels.
const STROKE: f64 = 1.5;

/// Seeded spread of each layer's angular offset, in radians.
const LAYER_JITTER: f64 = 0.3;

/// Global rotation after `time` frames.
#[must_use]
pub fn angle_at(params: &GriglieParams, time: f64) -> f64 {
    time * params.rotation_speed * f64::from(params.rotation_direction) * 0.01
}

/// Background colour.
#[must_use]
pub fn background(params: &GriglieParams) -> Rgba {
    match params.bg_color {
        Tone::Black => Rgba::BLACK,
        Tone::White => Rgba::WHITE,
    }
}

/// Line colour.
#[must_use]
pub fn line_color(params: &GriglieParams) -> Rgba {
    match params.line_color {
        LineColor::Black => Rgba::BLACK,
        LineColor::White => Rgba::WHITE,
        LineColor::Color => Rgba::hsb_opaque(params.hue, 80.0, 90.0),
    }
}

/// Draw the line layers.
pub fn render<S: Surface + ?Sized>(
    surface: &mut S,
    params: &GriglieParams,
    seed: u32,
    time: f64,
    ctx: &RenderContext<'_>,
) {
    let params = params.clone().clamped();
    let mut rng = RandomStream::new(seed);
    surface.background(background(&params));
    surface.stroke(line_color(&params));
    surface.stroke_weight(STROKE * ctx.scale);
    surface.no_fill();

    let (w, h) = (surface.width(), surface.height());
    let max_dim = w.max(h);
    let spacing = params.line_spacing * params.grid_size * ctx.scale;
    if spacing <= 0.0 {
        return;
    }
    let angle = angle_at(&params, time);

    surface.push();
    surface.translate(w / 2.0, h / 2.0);
    for layer in 0..params.layer_count {
        let base = f64::from(layer) * params.layer_rotation.to_radians();
        let jitter = rng.centered(LAYER_JITTER);
        surface.push();
        surface.rotate(angle + base + jitter);
        if layer == 0 {
            draw_circles(surface, max_dim, spacing);
        } else {
            let vertical = rng.index(2) == 1;
            draw_lines(surface, max_dim, spacing, vertical);
        }
        surface.pop();
    }
    surface.pop();
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn draw_lines<S: Surface + ?Sized>(surface: &mut S, max_dim: f64, spacing: f64, vertical: bool) {
    let count = (max_dim / spacing).floor() as u32 + 2;
    let half = max_dim / 2.0;
    for i in 0..count {
        let pos = -half + f64::from(i) * spacing;
        if vertical {
            surface.line(pos, -half, pos, half);
        } else {
            surface.line(-half, pos, half, pos);
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn draw_circles<S: Surface + ?Sized>(surface: &mut S, max_dim: f64, spacing: f64) {
    let count = (max_dim * 0.8 / spacing).floor() as u32;
    for i in 1..=count {
        let d = f64::from(i) * spacing * 2.0;
        surface.ellipse(0.0, 0.0, d, d);
    }
}
