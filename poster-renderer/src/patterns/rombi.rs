//! Rombi: concentric diamond outlines, outermost first, pulsing in size and
//! cycling in hue.

use poster_core::RombiParams;

use super::{map_range, RenderContext};
use crate::color::Rgba;
use crate::surface::Surface;

/// Size multiplier after `time` frames, in `1 ± pulseAmount`.
#[must_use]
pub fn pulse_at(params: &RombiParams, time: f64) -> f64 {
    map_range(
        (time * params.pulse_speed * 0.08).sin(),
        -1.0,
        1.0,
        1.0 - params.pulse_amount,
        1.0 + params.pulse_amount,
    )
}

/// Hue of band `index` of `total` at `time`.
#[must_use]
pub fn band_hue(params: &RombiParams, index: u32, total: u32, time: f64) -> f64 {
    let t = f64::from(index) / f64::from(total.max(1));
    let pulse = pulse_at(params, time);
    let osc = map_range((f64::from(index) * 0.08 + time * 0.02).sin(), -1.0, 1.0, -30.0, 30.0);
    let shift = (time * 0.15) % 360.0;
    (params.hue + (1.0 - t) * 120.0 + osc * pulse + shift) % 360.0
}

/// Draw the bands.
pub fn render<S: Surface + ?Sized>(surface: &mut S, params: &RombiParams, time: f64, ctx: &RenderContext<'_>) {
    let params = params.clone().clamped();
    surface.background(Rgba::BLACK);
    let (w, h) = (surface.width(), surface.height());
    let total = params.line_count;
    let pulse = pulse_at(&params, time);
    let min_size = w * 0.02;
    let max_size = w.min(h) * 0.95;
    let step = (max_size - min_size) / f64::from(total.max(1));

    surface.push();
    surface.translate(w / 2.0, h / 2.0);
    surface.scale(params.scale);
    surface.rotate((time * params.rotation_speed).to_radians());
    surface.no_fill();
    surface.stroke_weight(params.stroke_weight * ctx.scale);
    for i in (0..total).rev() {
        let half = (min_size + f64::from(i) * step) * pulse / 2.0;
        surface.stroke(Rgba::hsb_opaque(band_hue(&params, i, total, time), 100.0, 100.0));
        surface.polygon(&[(-half, 0.0), (0.0, -half), (half, 0.0), (0.0, half)]);
    }
    surface.pop();
}
