//! Drawing surfaces.
//!
//! Every pattern renderer draws through the [`Surface`] trait, so the same code
//! paints the preview, the off-screen export and the recorded display list
//! used to check proportional scaling.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               Surface Trait                 │
//! ├─────────────┬─────────────┬─────────────────┤
//! │ Pixmap      │ Svg         │ Recording       │
//! │ (tiny-skia) │ (vector)    │ (display list)  │
//! └─────────────┴─────────────┴─────────────────┘
//! ```

pub mod pixmap;
pub mod recording;
pub mod svg;

pub use pixmap::PixmapSurface;
pub use recording::{DisplayList, DrawOp, RecordingSurface};
pub use svg::SvgSurface;

use crate::color::Rgba;

/// How a primitive is composited over what is already drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Source-over.
    #[default]
    Normal,
    /// Channel-wise multiply.
    Multiply,
    /// Additive (lighter).
    Add,
}

/// Horizontal text anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HAlign {
    /// Text starts at `x`.
    #[default]
    Left,
    /// Text is centred on `x`.
    Center,
    /// Text ends at `x`.
    Right,
}

/// Vertical text anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
    /// Top edge at `y`.
    #[default]
    Top,
    /// Centred on `y`.
    Middle,
    /// Bottom edge at `y`.
    Bottom,
}

/// Monospace text placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in local units.
    pub size: f64,
    /// Horizontal anchor.
    pub h_align: HAlign,
    /// Vertical anchor.
    pub v_align: VAlign,
}

impl TextStyle {
    /// Style with the given size and anchors.
    #[must_use]
    pub const fn new(size: f64, h_align: HAlign, v_align: VAlign) -> Self {
        Self {
            size,
            h_align,
            v_align,
        }
    }
}

/// A 2-D affine transform `(a, b, c, d, e, f)` mapping `(x, y)` to
/// `(a·x + c·y + e, b·x + d·y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    /// Row 1, column 1.
    pub a: f64,
    /// Row 2, column 1.
    pub b: f64,
    /// Row 1, column 2.
    pub c: f64,
    /// Row 2, column 2.
    pub d: f64,
    /// X translation.
    pub e: f64,
    /// Y translation.
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// `self` followed by `other` in local space (`self · other`).
    #[must_use]
    pub fn then(self, other: Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Pure translation.
    #[must_use]
    pub const fn translation(x: f64, y: f64) -> Self {
        Self {
            e: x,
            f: y,
            ..Self::IDENTITY
        }
    }

    /// Pure rotation by `angle` radians (clockwise on screen).
    #[must_use]
    pub fn rotation(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Uniform scale.
    #[must_use]
    pub const fn scaling(s: f64) -> Self {
        Self {
            a: s,
            d: s,
            ..Self::IDENTITY
        }
    }

    /// Map a point.
    #[must_use]
    pub fn apply(self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Uniform scale factor: square root of the determinant's magnitude.
    #[must_use]
    pub fn scale_factor(self) -> f64 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }

    /// Rotation angle in radians.
    #[must_use]
    pub fn angle(self) -> f64 {
        self.b.atan2(self.a)
    }

    /// Convert to a tiny-skia transform.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_skia(self) -> tiny_skia::Transform {
        tiny_skia::Transform::from_row(
            self.a as f32,
            self.b as f32,
            self.c as f32,
            self.d as f32,
            self.e as f32,
            self.f as f32,
        )
    }
}

/// Current drawing state: transform, paint and blend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    /// Local-to-device transform.
    pub transform: Affine,
    /// Fill colour; `None` disables fill.
    pub fill: Option<Rgba>,
    /// Stroke colour; `None` disables stroke.
    pub stroke: Option<Rgba>,
    /// Stroke width in local units.
    pub stroke_weight: f64,
    /// Blend mode.
    pub blend: BlendMode,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            fill: Some(Rgba::WHITE),
            stroke: Some(Rgba::BLACK),
            stroke_weight: 1.0,
            blend: BlendMode::Normal,
        }
    }
}

/// Save/restore stack of [`DrawState`].
#[derive(Debug, Clone, Default)]
pub struct StateStack {
    current: DrawState,
    saved: Vec<DrawState>,
}

impl StateStack {
    /// Current state.
    #[must_use]
    pub fn current(&self) -> &DrawState {
        &self.current
    }

    /// Mutable current state.
    pub fn current_mut(&mut self) -> &mut DrawState {
        &mut self.current
    }

    /// Save the current state.
    pub fn push(&mut self) {
        self.saved.push(self.current);
    }

    /// Restore the last saved state. Unbalanced pops are ignored.
    pub fn pop(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.current = state;
        } else {
            tracing::trace!("pop without matching push");
        }
    }

    /// Number of saved states.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

/// A drawing target.
///
/// Implementors provide the primitives; transform and paint state live in a
/// [`StateStack`] exposed through [`Surface::stack`] and [`Surface::stack_mut`].
pub trait Surface {
    /// Surface width in device pixels.
    fn width(&self) -> f64;

    /// Surface height in device pixels.
    fn height(&self) -> f64;

    /// State stack.
    fn stack(&self) -> &StateStack;

    /// Mutable state stack.
    fn stack_mut(&mut self) -> &mut StateStack;

    /// Fill the whole surface, ignoring the transform.
    fn background(&mut self, color: Rgba);

    /// Straight line, stroked.
    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64);

    /// Ellipse centred on `(cx, cy)` with diameters `w` and `h`.
    fn ellipse(&mut self, cx: f64, cy: f64, w: f64, h: f64);

    /// Axis-aligned rectangle with its top-left corner at `(x, y)`.
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64);

    /// Closed polygon, filled and stroked.
    fn polygon(&mut self, points: &[(f64, f64)]);

    /// Open polyline, stroked only.
    fn polyline(&mut self, points: &[(f64, f64)]);

    /// Monospace text in the current fill colour.
    fn text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle);

    /// Current state.
    fn state(&self) -> &DrawState {
        self.stack().current()
    }

    /// Save the current state.
    fn push(&mut self) {
        self.stack_mut().push();
    }

    /// Restore the last saved state.
    fn pop(&mut self) {
        self.stack_mut().pop();
    }

    /// Translate the local origin.
    fn translate(&mut self, x: f64, y: f64) {
        let state = self.stack_mut().current_mut();
        state.transform = state.transform.then(Affine::translation(x, y));
    }

    /// Rotate local axes by `angle` radians.
    fn rotate(&mut self, angle: f64) {
        let state = self.stack_mut().current_mut();
        state.transform = state.transform.then(Affine::rotation(angle));
    }

    /// Scale local axes uniformly.
    fn scale(&mut self, s: f64) {
        let state = self.stack_mut().current_mut();
        state.transform = state.transform.then(Affine::scaling(s));
    }

    /// Set the fill colour.
    fn fill(&mut self, color: Rgba) {
        self.stack_mut().current_mut().fill = Some(color);
    }

    /// Disable fill.
    fn no_fill(&mut self) {
        self.stack_mut().current_mut().fill = None;
    }

    /// Set the stroke colour.
    fn stroke(&mut self, color: Rgba) {
        self.stack_mut().current_mut().stroke = Some(color);
    }

    /// Disable stroke.
    fn no_stroke(&mut self) {
        self.stack_mut().current_mut().stroke = None;
    }

    /// Set the stroke width in local units.
    fn stroke_weight(&mut self, weight: f64) {
        self.stack_mut().current_mut().stroke_weight = weight.max(0.0);
    }

    /// Set the blend mode.
    fn blend(&mut self, mode: BlendMode) {
        self.stack_mut().current_mut().blend = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn translate_then_rotate_applies_rotation_first() {
        let m = Affine::translation(10.0, 20.0).then(Affine::rotation(std::f64::consts::FRAC_PI_2));
        assert!(close(m.apply(1.0, 0.0), (10.0, 21.0)));
    }

    #[test]
    fn scale_factor_of_scaled_rotation() {
        let m = Affine::rotation(0.7).then(Affine::scaling(3.0));
        assert!((m.scale_factor() - 3.0).abs() < 1e-9);
        assert!((m.angle() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn stack_restores_state() {
        let mut stack = StateStack::default();
        stack.push();
        stack.current_mut().stroke_weight = 5.0;
        assert_eq!(stack.depth(), 1);
        stack.pop();
        assert!((stack.current().stroke_weight - 1.0).abs() < f64::EPSILON);
        stack.pop();
        assert_eq!(stack.depth(), 0);
    }
}
