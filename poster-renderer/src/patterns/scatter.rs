//! Scatter poster: seeded shapes in one of four layouts.
//!
//! The stream is consumed in a fixed order per shape. [`draw_order`] spells
//! that order out as data and [`layout`] walks it, so changing the order is a
//! visible change to the list and not a silent reshuffle of every poster.

use poster_core::{Composition, RandomStream, ScatterParams, ShapeType};

use super::RenderContext;
use crate::color::Rgba;
use crate::surface::Surface;

/// Background used when `bgColor` is not a valid hex colour.
const FALLBACK_BACKGROUND: Rgba = Rgba::rgb(0xf5, 0xf0, 0xe8);

/// Grid jitter span in preview pixels.
pub const GRID_JITTER: f64 = 50.0;

/// Diagonal jitter span in preview pixels.
const DIAGONAL_JITTER: f64 = 100.0;

/// One named draw from the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Draw {
    /// Grid or diagonal jitter on x.
    JitterX,
    /// Grid or diagonal jitter on y.
    JitterY,
    /// Radial distance fraction.
    Radius,
    /// Uniform x.
    X,
    /// Uniform y.
    Y,
    /// Size between `minSize` and `maxSize`.
    Size,
    /// Hue offset of ±30°.
    Hue,
    /// Saturation offset of ±15.
    Saturation,
    /// Brightness in `40..90`.
    Brightness,
    /// Alpha in `0.7..1`.
    Alpha,
    /// Rotation within ±`rotation`/2 degrees.
    Rotation,
    /// Shape type, only when the type is mixed.
    Kind,
}

/// Stream draws made for each shape, in order.
#[must_use]
pub fn draw_order(composition: Composition, shape_type: ShapeType) -> Vec<Draw> {
    let mut order = match composition {
        Composition::Grid | Composition::Diagonal => vec![Draw::JitterX, Draw::JitterY],
        Composition::Radial => vec![Draw::Radius],
        Composition::Random => vec![Draw::X, Draw::Y],
    };
    order.extend([
        Draw::Size,
        Draw::Hue,
        Draw::Saturation,
        Draw::Brightness,
        Draw::Alpha,
        Draw::Rotation,
    ]);
    if shape_type == ShapeType::Mixed {
        order.push(Draw::Kind);
    }
    order
}

/// Concrete shape of one scatter element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// Ellipse `size × size·aspect`.
    Ellipse,
    /// Centred rectangle `size × size·aspect`.
    Rect,
    /// Triangle with apex up.
    Triangle,
}

impl ShapeKind {
    const MIXED: [Self; 3] = [Self::Ellipse, Self::Rect, Self::Triangle];

    fn fixed(shape_type: ShapeType) -> Self {
        match shape_type {
            ShapeType::Rect => Self::Rect,
            ShapeType::Triangle => Self::Triangle,
            ShapeType::Ellipse | ShapeType::Mixed => Self::Ellipse,
        }
    }
}

/// One laid-out shape, in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterShape {
    /// Centre x.
    pub x: f64,
    /// Centre y.
    pub y: f64,
    /// Width.
    pub size: f64,
    /// Hue in degrees.
    pub hue: f64,
    /// Saturation, 0 to 100.
    pub saturation: f64,
    /// Brightness, 0 to 100.
    pub brightness: f64,
    /// Alpha, 0 to 1.
    pub alpha: f64,
    /// Rotation in radians.
    pub rotation: f64,
    /// Shape.
    pub kind: ShapeKind,
    /// Height over width; 1 for triangles.
    pub aspect: f64,
}

impl ScatterShape {
    /// Fill colour.
    #[must_use]
    pub fn color(&self) -> Rgba {
        Rgba::hsb(self.hue, self.saturation, self.brightness, self.alpha)
    }
}

/// Lattice shape for `count` grid cells: `(cols, rows)`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn grid_dimensions(count: u32) -> (u32, u32) {
    if count == 0 {
        return (0, 0);
    }
    let cols = f64::from(count).sqrt().ceil() as u32;
    (cols, count.div_ceil(cols))
}

/// Lay out every shape of `params` on a `width × height` surface.
#[must_use]
pub fn layout(params: &ScatterParams, seed: u32, width: f64, height: f64, scale: f64) -> Vec<ScatterShape> {
    let params = params.clone().clamped();
    let count = params.shape_count;
    let (cols, rows) = grid_dimensions(count);
    let order = draw_order(params.composition, params.shape_type);
    let min_size = params.min_size * scale;
    let max_size = params.max_size * scale;
    let mut rng = RandomStream::new(seed);
    let mut shapes = Vec::with_capacity(count as usize);

    for i in 0..count {
        let progress = f64::from(i) / f64::from(count);
        let (anchor_x, anchor_y, jitter) = match params.composition {
            Composition::Grid => {
                let col = i % cols;
                let row = i / cols;
                (
                    width / f64::from(cols + 1) * f64::from(col + 1),
                    height / f64::from(rows + 1) * f64::from(row + 1),
                    GRID_JITTER * scale,
                )
            }
            Composition::Diagonal => (width * progress, height * progress, DIAGONAL_JITTER * scale),
            Composition::Radial | Composition::Random => (0.0, 0.0, 0.0),
        };

        let mut shape = ScatterShape {
            x: anchor_x,
            y: anchor_y,
            size: min_size,
            hue: params.hue,
            saturation: params.saturation,
            brightness: 0.0,
            alpha: 1.0,
            rotation: 0.0,
            kind: ShapeKind::fixed(params.shape_type),
            aspect: 1.0,
        };

        for draw in &order {
            let r = rng.next_f64();
            match draw {
                Draw::JitterX => shape.x += (r - 0.5) * jitter,
                Draw::JitterY => shape.y += (r - 0.5) * jitter,
                Draw::Radius => {
                    let angle = progress * std::f64::consts::TAU;
                    let radius = (height / 3.0) * (0.3 + r * 0.7);
                    shape.x = width / 2.0 + angle.cos() * radius;
                    shape.y = height / 2.0 + angle.sin() * radius;
                }
                Draw::X => shape.x = r * width,
                Draw::Y => shape.y = r * height,
                Draw::Size => shape.size = min_size + (max_size - min_size) * r,
                Draw::Hue => shape.hue = (params.hue + (r - 0.5) * 60.0 + 360.0) % 360.0,
                Draw::Saturation => {
                    shape.saturation = (params.saturation + (r - 0.5) * 30.0).clamp(0.0, 100.0);
                }
                Draw::Brightness => shape.brightness = 40.0 + r * 50.0,
                Draw::Alpha => shape.alpha = 0.7 + r * 0.3,
                Draw::Rotation => shape.rotation = ((r - 0.5) * params.rotation).to_radians(),
                Draw::Kind => {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let pick = ((r * 3.0).floor() as usize).min(2);
                    shape.kind = ShapeKind::MIXED[pick];
                }
            }
        }
        shapes.push(shape);
    }

    // Aspect ratios are drawn after the whole layout, in shape order.
    for shape in &mut shapes {
        shape.aspect = match shape.kind {
            ShapeKind::Ellipse => 0.7 + rng.next_f64() * 0.6,
            ShapeKind::Rect => 0.6 + rng.next_f64() * 0.8,
            ShapeKind::Triangle => 1.0,
        };
    }
    shapes
}

/// Background colour.
#[must_use]
pub fn background(params: &ScatterParams) -> Rgba {
    Rgba::from_hex(&params.bg_color).unwrap_or_else(|| {
        tracing::debug!("Invalid scatter background {:?}, using default", params.bg_color);
        FALLBACK_BACKGROUND
    })
}

/// Draw the scatter poster.
pub fn render<S: Surface + ?Sized>(surface: &mut S, params: &ScatterParams, seed: u32, ctx: &RenderContext<'_>) {
    surface.background(background(params));
    let shapes = layout(params, seed, surface.width(), surface.height(), ctx.scale);
    surface.no_stroke();
    for shape in &shapes {
        surface.push();
        surface.translate(shape.x, shape.y);
        surface.rotate(shape.rotation);
        surface.fill(shape.color());
        let s = shape.size;
        match shape.kind {
            ShapeKind::Ellipse => surface.ellipse(0.0, 0.0, s, s * shape.aspect),
            ShapeKind::Rect => {
                let h = s * shape.aspect;
                surface.rect(-s / 2.0, -h / 2.0, s, h);
            }
            ShapeKind::Triangle => {
                surface.polygon(&[(-s / 2.0, s / 2.0), (0.0, -s / 2.0), (s / 2.0, s / 2.0)]);
            }
        }
        surface.pop();
    }
}
