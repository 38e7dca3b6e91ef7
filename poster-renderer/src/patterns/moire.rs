//! Moiré: two layers of wavy lines, the second multiplied over the first.
//!
//! Nothing here draws from the stream; the seed only names the file.

use poster_core::{MoireColorMode, MoireParams};

use super::{centered_indices, map_range, RenderContext};
use crate::color::Rgba;
use crate::surface::{BlendMode, Surface};

/// Horizontal step between polyline vertices, in design pixels.
const VERTEX_STEP: f64 = 5.0;

/// Line width in design pixels.
const STROKE: f64 = 2.0;

/// Colour of line `index` in a layer of `count` lines.
#[must_use]
pub fn line_color(params: &MoireParams, index: f64) -> Rgba {
    let half = f64::from(params.line_count) / 2.0;
    match params.color_mode {
        MoireColorMode::Bw => Rgba::BLACK,
        MoireColorMode::Gradient => {
            let t = map_range(index, -half, half, 0.0, 1.0);
            Rgba::hsb_opaque(params.hue, 70.0, 100.0 - t * 50.0)
        }
        MoireColorMode::Interference => {
            let t = map_range(index, -half, half, 0.0, 360.0);
            Rgba::hsb_opaque((params.hue + t) % 360.0, 80.0, 80.0)
        }
    }
}

/// Draw both layers.
pub fn render<S: Surface + ?Sized>(surface: &mut S, params: &MoireParams, ctx: &RenderContext<'_>) {
    let params = params.clone().clamped();
    surface.background(Rgba::WHITE);
    surface.push();
    surface.translate(surface.width() / 2.0, surface.height() / 2.0);
    surface.scale(ctx.scale);
    draw_layer(surface, &params, params.rotation1, 0.0, ctx.design_width);
    surface.blend(BlendMode::Multiply);
    draw_layer(surface, &params, params.rotation2, params.wave_amplitude, ctx.design_width);
    surface.blend(BlendMode::Normal);
    surface.pop();
}

fn draw_layer<S: Surface + ?Sized>(
    surface: &mut S,
    params: &MoireParams,
    rotation: f64,
    amplitude: f64,
    design_width: f64,
) {
    surface.push();
    surface.rotate(rotation.to_radians());
    surface.no_fill();
    surface.stroke_weight(STROKE);

    let mut xs = Vec::new();
    let mut x = -design_width;
    while x < design_width {
        xs.push(x);
        x += VERTEX_STEP;
    }

    for i in centered_indices(params.line_count) {
        let y = i * params.line_spacing;
        surface.stroke(line_color(params, i));
        let points: Vec<(f64, f64)> = xs
            .iter()
            .map(|&x| {
                let wave = ((x + y) * 0.01 * params.wave_frequency).sin() * amplitude;
                (x, y + wave)
            })
            .collect();
        surface.polyline(&points);
    }
    surface.pop();
}
