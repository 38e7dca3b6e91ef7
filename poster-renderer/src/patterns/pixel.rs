//! Pixelation: a source raster resampled on a coarse block grid.
//!
//! The source is centre-cropped to the poster aspect ratio, then each block
//! samples one source pixel. Stripes of eight columns can slide up and down
//! over time, and click bulges push the sampling point outward while
//! enlarging the blocks under them.

use poster_core::PixelParams;

use super::{map_range, Bulge, RenderContext};
use crate::color::{hue_background, Rgba};
use crate::source::SourceImage;
use crate::surface::{HAlign, Surface, TextStyle, VAlign};

/// Columns per animated stripe.
const STRIPE_WIDTH: u32 = 8;

/// Upper bound on blocks per frame. Larger grids coarsen the block size.
pub const MAX_BLOCKS: f64 = 250_000.0;

/// Placeholder text shown with no source raster.
pub const PLACEHOLDER: &str = "Load an image";

/// Background colour: 0 is black, 360 is white.
#[must_use]
pub fn background(params: &PixelParams) -> Rgba {
    hue_background(params.bg_hue, 50.0, 90.0)
}

/// Source rectangle `(x, y, w, h)` matching the aspect of `width × height`.
#[must_use]
pub fn crop_rect(source: &SourceImage, width: f64, height: f64) -> (f64, f64, f64, f64) {
    let (iw, ih) = (f64::from(source.width()), f64::from(source.height()));
    let poster_aspect = width / height;
    if iw / ih > poster_aspect {
        let cw = ih * poster_aspect;
        ((iw - cw) / 2.0, 0.0, cw, ih)
    } else {
        let ch = iw / poster_aspect;
        (0.0, (ih - ch) / 2.0, iw, ch)
    }
}

/// Vertical sampling offset of column `x` at `time`, in cells.
#[must_use]
pub fn stripe_offset(params: &PixelParams, column: u32, time: f64) -> f64 {
    if !params.animate {
        return 0.0;
    }
    let t = time * params.animation_speed;
    let stripe = column / STRIPE_WIDTH;
    let direction = if stripe % 2 == 0 { 1.0 } else { -1.0 };
    (t + f64::from(stripe) * 0.5).sin() * params.animation_amount * 10.0 * direction
}

/// Final colour of a sampled pixel: tinted for hues strictly inside
/// `(0, 360)`, otherwise the original RGB.
#[must_use]
pub fn tint(params: &PixelParams, sample: Rgba) -> Rgba {
    if params.hue > 0.0 && params.hue < 360.0 {
        Rgba::hsb_opaque(params.hue, 80.0, sample.brightness())
    } else {
        Rgba::rgb(sample.r, sample.g, sample.b)
    }
}

/// Sample-point displacement (in cells) and strongest factor of the bulges
/// covering a block centred at `(cx, cy)`. Bulge geometry is given in design
/// space and scaled by `k`.
fn bulge_displacement(bulges: &[Bulge], cx: f64, cy: f64, px: f64, k: f64) -> (f64, f64, f64) {
    let (mut dx, mut dy, mut max_factor) = (0.0, 0.0, 0.0_f64);
    for bulge in bulges {
        let (bx, by, radius) = (bulge.x * k, bulge.y * k, bulge.radius * k);
        let distance = (cx - bx).hypot(cy - by);
        if distance >= radius {
            continue;
        }
        let nd = distance / radius;
        let factor = (1.0 - nd * nd) * bulge.strength * bulge.envelope();
        max_factor = max_factor.max(factor);
        let angle = (cy - by).atan2(cx - bx);
        let displacement = factor * radius * 0.5;
        dx -= angle.cos() * displacement / px;
        dy -= angle.sin() * displacement / px;
    }
    (dx, dy, max_factor)
}

/// Draw the pixelated source, or a placeholder when none is attached.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn render<S: Surface + ?Sized>(surface: &mut S, params: &PixelParams, time: f64, ctx: &RenderContext<'_>) {
    let params = params.clone().clamped();
    surface.background(background(&params));
    let (w, h) = (surface.width(), surface.height());

    let Some(source) = ctx.source else {
        surface.push();
        surface.no_stroke();
        surface.fill(Rgba::rgb(150, 150, 150));
        surface.text(
            PLACEHOLDER,
            w / 2.0,
            h / 2.0,
            &TextStyle::new(16.0 * ctx.scale, HAlign::Center, VAlign::Middle),
        );
        surface.pop();
        return;
    };

    if params.pixel_size <= 0.0 || w <= 0.0 || h <= 0.0 {
        return;
    }
    let px = (params.pixel_size * ctx.scale).max((w * h / MAX_BLOCKS).sqrt());
    let cols = (w / px).ceil() as u32;
    let rows = (h / px).ceil() as u32;
    let (crop_x, crop_y, crop_w, crop_h) = crop_rect(source, w, h);
    let bulges = ctx.interaction.map_or(&[][..], |i| i.bulges.as_slice());
    let max_x = f64::from(source.width() - 1);
    let max_y = f64::from(source.height() - 1);

    surface.push();
    surface.no_stroke();
    for y in 0..rows {
        for x in 0..cols {
            let (mut block_x, mut block_y) = (f64::from(x) * px, f64::from(y) * px);
            let sample_y = f64::from(y) + stripe_offset(&params, x, time);
            let (dx, dy, factor) =
                bulge_displacement(bulges, block_x + px / 2.0, block_y + px / 2.0, px, ctx.scale);
            let size = px * (1.0 + factor * 3.0);
            block_x -= (size - px) / 2.0;
            block_y -= (size - px) / 2.0;

            let src_x = map_range(f64::from(x) + dx, 0.0, f64::from(cols), crop_x, crop_x + crop_w)
                .floor()
                .clamp(0.0, max_x);
            let src_y = map_range(sample_y + dy, 0.0, f64::from(rows), crop_y, crop_y + crop_h)
                .floor()
                .clamp(0.0, max_y);
            let sample = source.pixel(src_x as u32, src_y as u32);

            surface.fill(tint(&params, sample));
            surface.rect(block_x, block_y, size, size);
        }
    }
    surface.pop();
}
