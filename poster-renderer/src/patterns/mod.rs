//! Pattern renderers.
//!
//! Every family is a pure function of the [`RenderSnapshot`] and the
//! [`RenderContext`]: the stream is re-seeded at the start of each call, so
//! two renders of one snapshot are identical and an export at scale `k` is
//! the preview with every size multiplied by `k`.
//!
//! Families that lay out directly on the surface (scatter, griglie, rombi,
//! pixel) multiply their size constants by [`RenderContext::scale`]. Families
//! that simulate or draw in the design space (moiré, light grid, crash
//! clock, sand) run at the preview size and are drawn through a uniform
//! scale transform.

pub mod crash_clock;
pub mod griglie;
pub mod luce;
pub mod moire;
pub mod pixel;
pub mod rombi;
pub mod sand;
pub mod scatter;

use poster_core::{EditorKind, PatternParams, RenderSnapshot};

use crate::color::Rgba;
use crate::source::SourceImage;
use crate::surface::Surface;

/// Click bulge radius in design pixels.
pub const BULGE_RADIUS: f64 = 180.0;
/// Peak bulge strength.
pub const BULGE_STRENGTH: f64 = 0.4;
/// Frames a bulge takes to rise and fall.
pub const BULGE_FRAMES: u32 = 200;

/// One point of the pointer warp trail, fading from 1 to 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpSource {
    /// X in design space.
    pub x: f64,
    /// Y in design space.
    pub y: f64,
    /// Remaining strength in `0..=1`.
    pub intensity: f64,
}

/// A click bulge deforming the pixelation sampling grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bulge {
    /// Centre X in design space.
    pub x: f64,
    /// Centre Y in design space.
    pub y: f64,
    /// Radius in design space.
    pub radius: f64,
    /// Peak strength.
    pub strength: f64,
    /// Frames since the click.
    pub time: u32,
    /// Lifetime in frames.
    pub max_time: u32,
}

impl Bulge {
    /// Fresh bulge at a click position.
    #[must_use]
    pub const fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            radius: BULGE_RADIUS,
            strength: BULGE_STRENGTH,
            time: 0,
            max_time: BULGE_FRAMES,
        }
    }

    /// Rise/fall envelope: `sin(progress·π)`, mirrored around the midpoint.
    #[must_use]
    pub fn envelope(&self) -> f64 {
        if self.max_time == 0 {
            return 0.0;
        }
        let progress = f64::from(self.time) / f64::from(self.max_time);
        if progress < 0.5 {
            (progress * std::f64::consts::PI).sin()
        } else {
            ((1.0 - progress) * std::f64::consts::PI).sin()
        }
    }

    /// Advance one frame. Returns `false` once the bulge has expired.
    pub fn advance(&mut self) -> bool {
        self.time += 1;
        self.time < self.max_time
    }
}

/// Pointer state fed to the interactive editors.
///
/// None of it is part of a saved poster: exports that must match a preview
/// pass no interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interaction {
    /// Pointer held down at this design-space position (crash clock force).
    pub pointer: Option<(f64, f64)>,
    /// Recent drag positions warping light-grid lines.
    pub warp_trail: Vec<WarpSource>,
    /// Active pixelation bulges.
    pub bulges: Vec<Bulge>,
    /// Sand obstacle presses, applied in order after the initial settle.
    pub presses: Vec<(f64, f64)>,
}

impl Interaction {
    /// Whether nothing is active.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pointer.is_none()
            && self.warp_trail.is_empty()
            && self.bulges.is_empty()
            && self.presses.is_empty()
    }
}

/// Everything a renderer needs besides the snapshot.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Output size divided by the design size.
    pub scale: f64,
    /// Width of the preview canvas the editor lays out against.
    pub design_width: f64,
    /// Height of the preview canvas.
    pub design_height: f64,
    /// Optional pointer interaction.
    pub interaction: Option<&'a Interaction>,
    /// Source raster for the pixelation editor.
    pub source: Option<&'a SourceImage>,
}

impl<'a> RenderContext<'a> {
    /// Context for a `design_width × design_height` layout drawn at `scale`.
    #[must_use]
    pub fn new(design_width: u32, design_height: u32, scale: f64) -> Self {
        Self {
            scale,
            design_width: f64::from(design_width),
            design_height: f64::from(design_height),
            interaction: None,
            source: None,
        }
    }

    /// Context for drawing `kind` at its own design size.
    #[must_use]
    pub fn preview(kind: EditorKind) -> Self {
        let (w, h) = kind.design_size();
        Self::new(w, h, 1.0)
    }

    /// Context for re-rendering a `preview` layout at `export_width`.
    #[must_use]
    pub fn for_export(preview: (u32, u32), export_width: u32) -> Self {
        let scale = if preview.0 == 0 {
            1.0
        } else {
            f64::from(export_width) / f64::from(preview.0)
        };
        Self::new(preview.0, preview.1, scale)
    }

    /// Attach pointer interaction.
    #[must_use]
    pub fn with_interaction(self, interaction: &'a Interaction) -> Self {
        Self {
            interaction: Some(interaction),
            ..self
        }
    }

    /// Attach a source raster.
    #[must_use]
    pub fn with_source(self, source: &'a SourceImage) -> Self {
        Self {
            source: Some(source),
            ..self
        }
    }

    /// Output surface size for this context, rounded to whole pixels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn output_size(&self) -> (u32, u32) {
        (
            (self.design_width * self.scale).round().max(1.0) as u32,
            (self.design_height * self.scale).round().max(1.0) as u32,
        )
    }
}

/// Draw `snapshot` onto `surface`.
pub fn render<S: Surface + ?Sized>(surface: &mut S, snapshot: &RenderSnapshot, ctx: &RenderContext<'_>) {
    let seed = snapshot.seed.value;
    let time = snapshot.time;
    tracing::trace!(
        editor = %snapshot.kind(),
        seed,
        time,
        scale = ctx.scale,
        "render"
    );
    match &snapshot.params {
        PatternParams::Poster(p) => scatter::render(surface, p, seed, ctx),
        PatternParams::Griglie(p) => griglie::render(surface, p, seed, time, ctx),
        PatternParams::Moire(p) => moire::render(surface, p, ctx),
        PatternParams::Luce(p) => luce::render(surface, p, time, ctx),
        PatternParams::Rombi(p) => rombi::render(surface, p, time, ctx),
        PatternParams::CrashClock(p) => crash_clock::render(surface, p, seed, time, ctx),
        PatternParams::Sand(p) => sand::render(surface, p, seed, time, ctx),
        PatternParams::Pixel(p) => pixel::render(surface, p, time, ctx),
    }
}

/// Background colour a family paints first; the overlay contrasts with it.
#[must_use]
pub fn background_color(params: &PatternParams) -> Rgba {
    match params {
        PatternParams::Poster(p) => scatter::background(p),
        PatternParams::Griglie(p) => griglie::background(p),
        PatternParams::Moire(_) => Rgba::WHITE,
        PatternParams::Luce(p) => luce::background(p),
        PatternParams::Rombi(_) | PatternParams::Sand(_) => Rgba::BLACK,
        PatternParams::CrashClock(p) => crash_clock::background(p),
        PatternParams::Pixel(p) => pixel::background(p),
    }
}

/// Linear re-map of `value` from `[a0, a1]` to `[b0, b1]`.
pub(crate) fn map_range(value: f64, a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    if (a1 - a0).abs() < f64::EPSILON {
        return b0;
    }
    b0 + (value - a0) / (a1 - a0) * (b1 - b0)
}

/// Longest simulation a single render will run, in frames.
pub const MAX_SIMULATED_FRAMES: u32 = 3600;

/// Whole frames to simulate for animation time `time`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn simulated_frames(time: f64) -> u32 {
    if time.is_nan() || time <= 0.0 {
        return 0;
    }
    time.floor().min(f64::from(MAX_SIMULATED_FRAMES)) as u32
}

/// Centred index offsets `-n/2, -n/2 + 1, ...` (`n` values).
pub(crate) fn centered_indices(n: u32) -> impl Iterator<Item = f64> {
    let half = f64::from(n) / 2.0;
    (0..n).map(move |i| f64::from(i) - half)
}
