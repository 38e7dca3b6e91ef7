//! Pattern parameter model.
//!
//! Each pattern family has a flat struct of named controls. [`PatternParams`]
//! wraps them in a tagged enum so a full editor state can travel as JSON
//! (`{"editor": "griglie", "lineSpacing": 12, ...}`). Missing names take their
//! defaults and out-of-range values are clamped, never rejected.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult};
use crate::seed::{Seed, SeedRule, DEFAULT_SEED};

/// Clamp a float into `[lo, hi]`, mapping NaN to `lo`.
fn clamp_f(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        lo
    } else {
        value.clamp(lo, hi)
    }
}

/// Which editor (pattern family) produced a poster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorKind {
    /// Scatter shapes.
    Poster,
    /// Rotating overlapping line grids.
    Griglie,
    /// Two-layer wavy moiré.
    Moire,
    /// Light grid with additive glow.
    Luce,
    /// Concentric diamond bands.
    Rombi,
    /// Kinetic particle field.
    #[serde(rename = "crashclock")]
    CrashClock,
    /// Kinetic sand on curved obstacles.
    Sand,
    /// Pixelated source image.
    Pixel,
}

impl EditorKind {
    /// Every editor, in gallery order.
    pub const ALL: [Self; 8] = [
        Self::Poster,
        Self::Griglie,
        Self::Moire,
        Self::Luce,
        Self::Rombi,
        Self::CrashClock,
        Self::Sand,
        Self::Pixel,
    ];

    /// Identifier stored with saved posters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Poster => "poster",
            Self::Griglie => "griglie",
            Self::Moire => "moire",
            Self::Luce => "luce",
            Self::Rombi => "rombi",
            Self::CrashClock => "crashclock",
            Self::Sand => "sand",
            Self::Pixel => "pixel",
        }
    }

    /// Size of the on-screen canvas the editor lays out against.
    #[must_use]
    pub const fn design_size(self) -> (u32, u32) {
        match self {
            Self::Moire | Self::Rombi => (600, 900),
            Self::Sand => (1000, 1500),
            _ => (500, 750),
        }
    }

    /// Default export resolution.
    #[must_use]
    pub const fn export_size(self) -> (u32, u32) {
        match self {
            Self::Moire => (1800, 2700),
            Self::Luce | Self::Pixel => (500, 750),
            _ => (1000, 1500),
        }
    }

    /// How this editor reads its seed field.
    #[must_use]
    pub const fn seed_rule(self) -> SeedRule {
        match self {
            Self::Griglie | Self::Luce | Self::Pixel => SeedRule::Hash,
            Self::Poster => SeedRule::NonZeroInteger { fallback: 42 },
            Self::Sand => SeedRule::Integer {
                fallback: DEFAULT_SEED,
            },
            Self::Moire | Self::Rombi | Self::CrashClock => SeedRule::Auto,
        }
    }

    /// Parse a seed field the way this editor does.
    #[must_use]
    pub fn parse_seed(self, input: &str) -> Seed {
        Seed::parse_with(input, self.seed_rule())
    }

    /// Stable download filename for an export of this editor.
    ///
    /// `extension` is written without the leading dot.
    #[must_use]
    pub fn filename(self, seed: &Seed, width: u32, height: u32, extension: &str) -> String {
        let value = seed.value;
        match self {
            Self::Poster => format!("poster-seed{value}-{width}x{height}.{extension}"),
            Self::Griglie => format!("griglie-poster-{value}.{extension}"),
            Self::Moire => format!("moire-pattern-{value}.{extension}"),
            Self::Luce => format!("light-effects-{value}.{extension}"),
            Self::Rombi => format!("rombi-poster-{value}.{extension}"),
            Self::CrashClock => format!("crashclock-{value}.{extension}"),
            Self::Sand => format!("sand-kinetic-{value}.{extension}"),
            Self::Pixel => format!("pixel-{value}.{extension}"),
        }
    }
}

impl fmt::Display for EditorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditorKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .ok_or_else(|| CoreError::UnknownEditor(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Scatter
// ---------------------------------------------------------------------------

/// Layout used to place scatter shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Composition {
    /// Jittered regular lattice.
    Grid,
    /// Ring around the centre.
    Radial,
    /// Along the main diagonal.
    Diagonal,
    /// Uniform random.
    #[default]
    Random,
}

/// Shape drawn by the scatter generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    /// Ellipse with a random aspect.
    Ellipse,
    /// Centered rectangle with a random aspect.
    Rect,
    /// Isosceles triangle.
    Triangle,
    /// One of the three, drawn from the stream per shape.
    #[default]
    Mixed,
}

/// Controls for the scatter poster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScatterParams {
    /// Number of shapes.
    pub shape_count: u32,
    /// Smallest shape size in preview pixels.
    pub min_size: f64,
    /// Largest shape size in preview pixels.
    pub max_size: f64,
    /// Base hue in degrees.
    pub hue: f64,
    /// Base saturation, 0 to 100.
    pub saturation: f64,
    /// Background colour as `#rrggbb`.
    pub bg_color: String,
    /// Shape type.
    pub shape_type: ShapeType,
    /// Maximum rotation spread in degrees.
    pub rotation: f64,
    /// Layout.
    pub composition: Composition,
}

impl Default for ScatterParams {
    fn default() -> Self {
        Self {
            shape_count: 40,
            min_size: 20.0,
            max_size: 120.0,
            hue: 200.0,
            saturation: 70.0,
            bg_color: "#f5f0e8".to_string(),
            shape_type: ShapeType::Mixed,
            rotation: 45.0,
            composition: Composition::Random,
        }
    }
}

impl ScatterParams {
    /// Clamp every control into its documented range.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.shape_count = self.shape_count.min(500);
        self.min_size = clamp_f(self.min_size, 0.0, 400.0);
        self.max_size = clamp_f(self.max_size, self.min_size, 600.0);
        self.hue = clamp_f(self.hue, 0.0, 360.0);
        self.saturation = clamp_f(self.saturation, 0.0, 100.0);
        self.rotation = clamp_f(self.rotation, 0.0, 360.0);
        self
    }
}

// ---------------------------------------------------------------------------
// Griglie
// ---------------------------------------------------------------------------

/// Black or white fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Black.
    #[default]
    Black,
    /// White.
    White,
}

/// Line colour choice for griglie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineColor {
    /// Black lines.
    Black,
    /// White lines.
    #[default]
    White,
    /// Lines in the selected hue.
    Color,
}

/// Controls for the rotating line grids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GriglieParams {
    /// Angular speed multiplier.
    pub rotation_speed: f64,
    /// `1` for clockwise, `-1` for counter-clockwise.
    pub rotation_direction: i8,
    /// Background tone.
    pub bg_color: Tone,
    /// Line colour.
    pub line_color: LineColor,
    /// Hue used when `line_color` is `color`.
    pub hue: f64,
    /// Distance between lines in preview pixels.
    pub line_spacing: f64,
    /// Number of overlapping layers.
    pub layer_count: u32,
    /// Rotation step between layers in degrees.
    pub layer_rotation: f64,
    /// Spacing multiplier.
    pub grid_size: f64,
}

impl Default for GriglieParams {
    fn default() -> Self {
        Self {
            rotation_speed: 1.0,
            rotation_direction: 1,
            bg_color: Tone::Black,
            line_color: LineColor::White,
            hue: 200.0,
            line_spacing: 15.0,
            layer_count: 4,
            layer_rotation: 45.0,
            grid_size: 1.0,
        }
    }
}

impl GriglieParams {
    /// Clamp every control into its documented range.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.rotation_speed = clamp_f(self.rotation_speed, 0.0, 10.0);
        self.rotation_direction = if self.rotation_direction < 0 { -1 } else { 1 };
        self.hue = clamp_f(self.hue, 0.0, 360.0);
        self.line_spacing = clamp_f(self.line_spacing, 2.0, 100.0);
        self.layer_count = self.layer_count.min(12);
        self.layer_rotation = clamp_f(self.layer_rotation, 0.0, 180.0);
        self.grid_size = clamp_f(self.grid_size, 0.25, 4.0);
        self
    }
}

// ---------------------------------------------------------------------------
// Moiré
// ---------------------------------------------------------------------------

/// Line colouring for the moiré layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoireColorMode {
    /// Black lines.
    #[default]
    Bw,
    /// Brightness gradient in one hue.
    Gradient,
    /// Hue sweep across the layer.
    Interference,
}

/// Controls for the two-layer moiré.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MoireParams {
    /// Lines per layer.
    pub line_count: u32,
    /// Distance between lines.
    pub line_spacing: f64,
    /// Rotation of the straight layer in degrees.
    pub rotation1: f64,
    /// Rotation of the wavy layer in degrees.
    pub rotation2: f64,
    /// Wave amplitude of the second layer.
    pub wave_amplitude: f64,
    /// Wave frequency multiplier.
    pub wave_frequency: f64,
    /// Colour mode.
    pub color_mode: MoireColorMode,
    /// Base hue.
    pub hue: f64,
}

impl Default for MoireParams {
    fn default() -> Self {
        Self {
            line_count: 80,
            line_spacing: 8.0,
            rotation1: 0.0,
            rotation2: 15.0,
            wave_amplitude: 30.0,
            wave_frequency: 2.0,
            color_mode: MoireColorMode::Bw,
            hue: 200.0,
        }
    }
}

impl MoireParams {
    /// Clamp every control into its documented range.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.line_count = self.line_count.min(400);
        self.line_spacing = clamp_f(self.line_spacing, 1.0, 50.0);
        self.rotation1 = clamp_f(self.rotation1, -180.0, 180.0);
        self.rotation2 = clamp_f(self.rotation2, -180.0, 180.0);
        self.wave_amplitude = clamp_f(self.wave_amplitude, 0.0, 200.0);
        self.wave_frequency = clamp_f(self.wave_frequency, 0.0, 20.0);
        self.hue = clamp_f(self.hue, 0.0, 360.0);
        self
    }
}

// ---------------------------------------------------------------------------
// Luce
// ---------------------------------------------------------------------------

/// Light grid variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LightPattern {
    /// Rotated glowing line cells.
    #[default]
    DiagonalGrid,
    /// Crossed line cells with glow discs.
    Moire,
}

/// Controls for the light grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LuceParams {
    /// Variant.
    pub pattern_type: LightPattern,
    /// Cell rows.
    pub grid_rows: u32,
    /// Cell columns.
    pub grid_cols: u32,
    /// Lines per cell.
    pub line_count: u32,
    /// Base line rotation in degrees.
    pub rotation_angle: f64,
    /// Line hue.
    pub hue: f64,
    /// Background hue: 0 is black, 360 is white.
    pub bg_hue: f64,
    /// Glow disc size.
    pub depth: f64,
    /// Animation speed multiplier.
    pub animation_speed: f64,
    /// Pointer warp strength.
    pub mouse_force: f64,
    /// Pointer warp radius.
    pub mouse_radius: f64,
}

impl Default for LuceParams {
    fn default() -> Self {
        Self {
            pattern_type: LightPattern::DiagonalGrid,
            grid_rows: 8,
            grid_cols: 7,
            line_count: 20,
            rotation_angle: 45.0,
            hue: 120.0,
            bg_hue: 0.0,
            depth: 50.0,
            animation_speed: 0.3,
            mouse_force: 12.0,
            mouse_radius: 200.0,
        }
    }
}

impl LuceParams {
    /// Clamp every control into its documented range.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.grid_rows = self.grid_rows.min(40);
        self.grid_cols = self.grid_cols.min(40);
        self.line_count = self.line_count.min(200);
        self.rotation_angle = clamp_f(self.rotation_angle, -180.0, 180.0);
        self.hue = clamp_f(self.hue, 0.0, 360.0);
        self.bg_hue = clamp_f(self.bg_hue, 0.0, 360.0);
        self.depth = clamp_f(self.depth, 0.0, 300.0);
        self.animation_speed = clamp_f(self.animation_speed, 0.0, 5.0);
        self.mouse_force = clamp_f(self.mouse_force, 0.0, 100.0);
        self.mouse_radius = clamp_f(self.mouse_radius, 0.0, 1000.0);
        self
    }
}

// ---------------------------------------------------------------------------
// Rombi
// ---------------------------------------------------------------------------

/// Controls for the concentric diamonds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RombiParams {
    /// Whole-figure rotation per frame in degrees.
    pub rotation_speed: f64,
    /// Number of bands.
    pub line_count: u32,
    /// Band outline width.
    pub stroke_weight: f64,
    /// Figure scale.
    pub scale: f64,
    /// Base hue.
    pub hue: f64,
    /// Pulse speed.
    pub pulse_speed: f64,
    /// Pulse depth; sizes swing within `1 ± pulseAmount`.
    pub pulse_amount: f64,
}

impl Default for RombiParams {
    fn default() -> Self {
        Self {
            rotation_speed: 0.0,
            line_count: 120,
            stroke_weight: 1.0,
            scale: 1.0,
            hue: 190.0,
            pulse_speed: 1.0,
            pulse_amount: 0.25,
        }
    }
}

impl RombiParams {
    /// Clamp every control into its documented range.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.rotation_speed = clamp_f(self.rotation_speed, -10.0, 10.0);
        self.line_count = self.line_count.min(600);
        self.stroke_weight = clamp_f(self.stroke_weight, 0.1, 20.0);
        self.scale = clamp_f(self.scale, 0.1, 5.0);
        self.hue = clamp_f(self.hue, 0.0, 360.0);
        self.pulse_speed = clamp_f(self.pulse_speed, 0.0, 10.0);
        self.pulse_amount = clamp_f(self.pulse_amount, 0.0, 0.9);
        self
    }
}

// ---------------------------------------------------------------------------
// Crash clock
// ---------------------------------------------------------------------------

/// Pointer force direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseMode {
    /// Push particles away.
    #[default]
    Repel,
    /// Pull particles in.
    Attract,
}

/// Controls for the particle field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CrashClockParams {
    /// Phase speed of the wobble.
    pub rotation_speed: f64,
    /// Wobble strength.
    pub wobble_amp: f64,
    /// Wobble spatial frequency.
    pub wobble_freq: f64,
    /// Particle hue: 0 is black, 360 is white.
    pub hue: f64,
    /// Background hue: 0 is black, 360 is white.
    pub bg_hue: f64,
    /// Noise drift strength.
    pub noise_flow: f64,
    /// Mean particle diameter.
    pub particle_size: f64,
    /// Spread of particle diameters.
    pub particle_size_jitter: f64,
    /// Number of particles.
    pub particle_count: u32,
    /// Pointer force.
    pub mouse_force: f64,
    /// Pointer radius.
    pub mouse_radius: f64,
    /// Pointer direction.
    pub mouse_mode: MouseMode,
    /// Velocity retained per frame.
    pub friction: f64,
}

impl Default for CrashClockParams {
    fn default() -> Self {
        Self {
            rotation_speed: 0.02,
            wobble_amp: 10.0,
            wobble_freq: 0.5,
            hue: 0.0,
            bg_hue: 360.0,
            noise_flow: 0.12,
            particle_size: 6.0,
            particle_size_jitter: 8.0,
            particle_count: 2200,
            mouse_force: 18.0,
            mouse_radius: 140.0,
            mouse_mode: MouseMode::Repel,
            friction: 0.92,
        }
    }
}

impl CrashClockParams {
    /// Clamp every control into its documented range.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.rotation_speed = clamp_f(self.rotation_speed, 0.0, 1.0);
        self.wobble_amp = clamp_f(self.wobble_amp, 0.0, 100.0);
        self.wobble_freq = clamp_f(self.wobble_freq, 0.0, 10.0);
        self.hue = clamp_f(self.hue, 0.0, 360.0);
        self.bg_hue = clamp_f(self.bg_hue, 0.0, 360.0);
        self.noise_flow = clamp_f(self.noise_flow, 0.0, 2.0);
        self.particle_size = clamp_f(self.particle_size, 0.5, 50.0);
        self.particle_size_jitter = clamp_f(self.particle_size_jitter, 0.0, 50.0);
        self.particle_count = self.particle_count.min(5000);
        self.mouse_force = clamp_f(self.mouse_force, 0.0, 100.0);
        self.mouse_radius = clamp_f(self.mouse_radius, 0.0, 1000.0);
        self.friction = clamp_f(self.friction, 0.0, 1.0);
        self
    }
}

// ---------------------------------------------------------------------------
// Sand
// ---------------------------------------------------------------------------

/// Grain colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandColorMode {
    /// Near-white grains.
    Mono,
    /// Hue jitter per grain.
    #[default]
    Gradient,
    /// Hue shifts with height.
    Depth,
    /// Warm noise field.
    Warm,
}

/// Controls for kinetic sand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SandParams {
    /// Number of grains.
    pub sand_amount: u32,
    /// Number of curved obstacles.
    pub obstacle_count: u32,
    /// Gravity.
    pub gravity: f64,
    /// Grain diameter.
    pub particle_size: f64,
    /// Colour mode.
    pub color_mode: SandColorMode,
    /// Base hue.
    pub hue: f64,
    /// Saturation, 0 to 100.
    pub saturation: f64,
    /// Gravity multiplier.
    pub sand_flow: f64,
}

impl Default for SandParams {
    fn default() -> Self {
        Self {
            sand_amount: 5000,
            obstacle_count: 8,
            gravity: 1.0,
            particle_size: 4.0,
            color_mode: SandColorMode::Gradient,
            hue: 30.0,
            saturation: 70.0,
            sand_flow: 0.8,
        }
    }
}

impl SandParams {
    /// Clamp every control into its documented range.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.sand_amount = self.sand_amount.min(20_000);
        self.obstacle_count = self.obstacle_count.min(30);
        self.gravity = clamp_f(self.gravity, 0.0, 5.0);
        self.particle_size = clamp_f(self.particle_size, 1.0, 20.0);
        self.hue = clamp_f(self.hue, 0.0, 360.0);
        self.saturation = clamp_f(self.saturation, 0.0, 100.0);
        self.sand_flow = clamp_f(self.sand_flow, 0.0, 3.0);
        self
    }
}

// ---------------------------------------------------------------------------
// Pixel
// ---------------------------------------------------------------------------

/// Smallest non-zero block size, in preview pixels.
pub const MIN_PIXEL_SIZE: f64 = 2.0;

/// Controls for the pixelation editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PixelParams {
    /// Block size in preview pixels. Zero draws no blocks.
    pub pixel_size: f64,
    /// Tint hue; 0 and 360 keep the source colours.
    pub hue: f64,
    /// Background hue: 0 is black, 360 is white.
    pub bg_hue: f64,
    /// Enables the stripe animation.
    pub animate: bool,
    /// Stripe animation speed.
    pub animation_speed: f64,
    /// Stripe displacement amount.
    pub animation_amount: f64,
}

impl Default for PixelParams {
    fn default() -> Self {
        Self {
            pixel_size: 10.0,
            hue: 0.0,
            bg_hue: 0.0,
            animate: true,
            animation_speed: 0.02,
            animation_amount: 0.12,
        }
    }
}

impl PixelParams {
    /// Clamp every control into its documented range.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.pixel_size = match clamp_f(self.pixel_size, 0.0, 100.0) {
            size if size > 0.0 => size.max(MIN_PIXEL_SIZE),
            _ => 0.0,
        };
        self.hue = clamp_f(self.hue, 0.0, 360.0);
        self.bg_hue = clamp_f(self.bg_hue, 0.0, 360.0);
        self.animation_speed = clamp_f(self.animation_speed, 0.0, 1.0);
        self.animation_amount = clamp_f(self.animation_amount, 0.0, 2.0);
        self
    }
}

// ---------------------------------------------------------------------------
// Tagged union
// ---------------------------------------------------------------------------

/// Parameters of any pattern family, tagged by editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "editor", rename_all = "lowercase")]
pub enum PatternParams {
    /// Scatter shapes.
    Poster(ScatterParams),
    /// Rotating line grids.
    Griglie(GriglieParams),
    /// Two-layer moiré.
    Moire(MoireParams),
    /// Light grid.
    Luce(LuceParams),
    /// Concentric diamonds.
    Rombi(RombiParams),
    /// Particle field.
    #[serde(rename = "crashclock")]
    CrashClock(CrashClockParams),
    /// Kinetic sand.
    Sand(SandParams),
    /// Pixelation.
    Pixel(PixelParams),
}

impl PatternParams {
    /// Default parameters for `kind`.
    #[must_use]
    pub fn defaults(kind: EditorKind) -> Self {
        match kind {
            EditorKind::Poster => Self::Poster(ScatterParams::default()),
            EditorKind::Griglie => Self::Griglie(GriglieParams::default()),
            EditorKind::Moire => Self::Moire(MoireParams::default()),
            EditorKind::Luce => Self::Luce(LuceParams::default()),
            EditorKind::Rombi => Self::Rombi(RombiParams::default()),
            EditorKind::CrashClock => Self::CrashClock(CrashClockParams::default()),
            EditorKind::Sand => Self::Sand(SandParams::default()),
            EditorKind::Pixel => Self::Pixel(PixelParams::default()),
        }
    }

    /// Build parameters for `kind` from a JSON object of named values.
    ///
    /// Missing names take defaults; the result is clamped.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidParameter`] if `values` is not an object or
    /// a value has the wrong type.
    pub fn from_values(kind: EditorKind, values: &Value) -> CoreResult<Self> {
        let object = match values {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            _ => {
                return Err(CoreError::InvalidParameter {
                    name: kind.to_string(),
                    reason: "parameters must be a JSON object".into(),
                })
            }
        };
        let parsed = match kind {
            EditorKind::Poster => Self::Poster(decode(kind, object)?),
            EditorKind::Griglie => Self::Griglie(decode(kind, object)?),
            EditorKind::Moire => Self::Moire(decode(kind, object)?),
            EditorKind::Luce => Self::Luce(decode(kind, object)?),
            EditorKind::Rombi => Self::Rombi(decode(kind, object)?),
            EditorKind::CrashClock => Self::CrashClock(decode(kind, object)?),
            EditorKind::Sand => Self::Sand(decode(kind, object)?),
            EditorKind::Pixel => Self::Pixel(decode(kind, object)?),
        };
        Ok(parsed.clamped())
    }

    /// The editor these parameters belong to.
    #[must_use]
    pub const fn kind(&self) -> EditorKind {
        match self {
            Self::Poster(_) => EditorKind::Poster,
            Self::Griglie(_) => EditorKind::Griglie,
            Self::Moire(_) => EditorKind::Moire,
            Self::Luce(_) => EditorKind::Luce,
            Self::Rombi(_) => EditorKind::Rombi,
            Self::CrashClock(_) => EditorKind::CrashClock,
            Self::Sand(_) => EditorKind::Sand,
            Self::Pixel(_) => EditorKind::Pixel,
        }
    }

    /// Clamp every control of the inner struct.
    #[must_use]
    pub fn clamped(self) -> Self {
        match self {
            Self::Poster(p) => Self::Poster(p.clamped()),
            Self::Griglie(p) => Self::Griglie(p.clamped()),
            Self::Moire(p) => Self::Moire(p.clamped()),
            Self::Luce(p) => Self::Luce(p.clamped()),
            Self::Rombi(p) => Self::Rombi(p.clamped()),
            Self::CrashClock(p) => Self::CrashClock(p.clamped()),
            Self::Sand(p) => Self::Sand(p.clamped()),
            Self::Pixel(p) => Self::Pixel(p.clamped()),
        }
    }

    /// Named values of the inner struct as a JSON object (without the tag).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Serialization`] if encoding fails.
    pub fn values(&self) -> CoreResult<Map<String, Value>> {
        let Value::Object(mut map) = serde_json::to_value(self)? else {
            return Ok(Map::new());
        };
        map.remove("editor");
        Ok(map)
    }

    /// Return a copy with the control `name` set to `value`.
    ///
    /// The receiver is left untouched, so a render already holding it keeps
    /// seeing a consistent set of values.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownParameter`] if the editor has no control
    /// named `name`, or [`CoreError::InvalidParameter`] if `value` has the
    /// wrong type.
    pub fn with_value(&self, name: &str, value: Value) -> CoreResult<Self> {
        let kind = self.kind();
        let mut map = self.values()?;
        let Some(slot) = map.get_mut(name) else {
            return Err(CoreError::UnknownParameter {
                editor: kind.to_string(),
                name: name.to_string(),
            });
        };
        *slot = value;
        Self::from_values(kind, &Value::Object(map))
    }
}

fn decode<T: DeserializeOwned>(kind: EditorKind, object: Map<String, Value>) -> CoreResult<T> {
    serde_json::from_value(Value::Object(object)).map_err(|e| CoreError::InvalidParameter {
        name: kind.to_string(),
        reason: e.to_string(),
    })
}

/// Immutable input of one render call.
///
/// UI handlers build a new snapshot instead of mutating the one a render is
/// reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    /// Seed.
    pub seed: Seed,
    /// Pattern parameters.
    pub params: PatternParams,
    /// Animation time in frames. Held fixed, renders are reproducible.
    #[serde(default)]
    pub time: f64,
}

impl RenderSnapshot {
    /// Snapshot at time zero.
    #[must_use]
    pub fn new(seed: Seed, params: PatternParams) -> Self {
        Self {
            seed,
            params,
            time: 0.0,
        }
    }

    /// Copy at animation time `time`.
    #[must_use]
    pub fn at_time(&self, time: f64) -> Self {
        Self {
            time,
            ..self.clone()
        }
    }

    /// Copy with different parameters.
    #[must_use]
    pub fn with_params(&self, params: PatternParams) -> Self {
        Self {
            params,
            ..self.clone()
        }
    }

    /// Editor of the snapshot's parameters.
    #[must_use]
    pub const fn kind(&self) -> EditorKind {
        self.params.kind()
    }
}
