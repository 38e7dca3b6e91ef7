//! Display-list surface.
//!
//! Records every primitive in device coordinates with the stroke width and
//! sizes already multiplied by the transform's scale. Two renders of the same
//! snapshot at scales 1 and `k` must produce lists where each operation of the
//! second is the first multiplied by `k`; [`DisplayList::is_scaled_copy`]
//! checks exactly that.

use super::{BlendMode, HAlign, StateStack, Surface, TextStyle, VAlign};
use crate::color::Rgba;

/// Paint applied to a recorded primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedPaint {
    /// Fill colour.
    pub fill: Option<Rgba>,
    /// Stroke colour.
    pub stroke: Option<Rgba>,
    /// Stroke width in device pixels.
    pub stroke_weight: f64,
    /// Blend mode.
    pub blend: BlendMode,
}

/// One recorded primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Full-surface fill.
    Background(Rgba),
    /// Stroked line.
    Line {
        /// Start point.
        from: (f64, f64),
        /// End point.
        to: (f64, f64),
        /// Paint.
        paint: RecordedPaint,
    },
    /// Ellipse.
    Ellipse {
        /// Centre.
        center: (f64, f64),
        /// Horizontal diameter before rotation.
        width: f64,
        /// Vertical diameter before rotation.
        height: f64,
        /// Rotation in radians.
        rotation: f64,
        /// Paint.
        paint: RecordedPaint,
    },
    /// Closed polygon (rectangles are recorded as their four corners).
    Polygon {
        /// Corners.
        points: Vec<(f64, f64)>,
        /// Paint.
        paint: RecordedPaint,
    },
    /// Open polyline.
    Polyline {
        /// Vertices.
        points: Vec<(f64, f64)>,
        /// Paint.
        paint: RecordedPaint,
    },
    /// Text.
    Text {
        /// Content.
        text: String,
        /// Anchor point.
        at: (f64, f64),
        /// Font size in device pixels.
        size: f64,
        /// Horizontal anchor.
        h_align: HAlign,
        /// Vertical anchor.
        v_align: VAlign,
        /// Colour.
        color: Option<Rgba>,
    },
}

fn pt_scaled(a: (f64, f64), b: (f64, f64), k: f64, tol: f64) -> bool {
    (a.0 * k - b.0).abs() <= tol && (a.1 * k - b.1).abs() <= tol
}

fn len_scaled(a: f64, b: f64, k: f64, tol: f64) -> bool {
    (a * k - b).abs() <= tol
}

fn paint_scaled(a: &RecordedPaint, b: &RecordedPaint, k: f64, tol: f64) -> bool {
    a.fill == b.fill
        && a.stroke == b.stroke
        && a.blend == b.blend
        && (a.stroke.is_none() || len_scaled(a.stroke_weight, b.stroke_weight, k, tol))
}

fn points_scaled(a: &[(f64, f64)], b: &[(f64, f64)], k: f64, tol: f64) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(p, q)| pt_scaled(*p, *q, k, tol))
}

impl DrawOp {
    /// Whether `other` is `self` with every position and size multiplied by
    /// `k`, within `tol` device pixels. Colours must match exactly.
    #[must_use]
    pub fn is_scaled_copy(&self, other: &Self, k: f64, tol: f64) -> bool {
        match (self, other) {
            (Self::Background(a), Self::Background(b)) => a == b,
            (
                Self::Line {
                    from: f1,
                    to: t1,
                    paint: p1,
                },
                Self::Line {
                    from: f2,
                    to: t2,
                    paint: p2,
                },
            ) => pt_scaled(*f1, *f2, k, tol) && pt_scaled(*t1, *t2, k, tol) && paint_scaled(p1, p2, k, tol),
            (
                Self::Ellipse {
                    center: c1,
                    width: w1,
                    height: h1,
                    rotation: r1,
                    paint: p1,
                },
                Self::Ellipse {
                    center: c2,
                    width: w2,
                    height: h2,
                    rotation: r2,
                    paint: p2,
                },
            ) => {
                pt_scaled(*c1, *c2, k, tol)
                    && len_scaled(*w1, *w2, k, tol)
                    && len_scaled(*h1, *h2, k, tol)
                    && (r1 - r2).abs() <= 1e-6
                    && paint_scaled(p1, p2, k, tol)
            }
            (
                Self::Polygon {
                    points: a,
                    paint: p1,
                },
                Self::Polygon {
                    points: b,
                    paint: p2,
                },
            )
            | (
                Self::Polyline {
                    points: a,
                    paint: p1,
                },
                Self::Polyline {
                    points: b,
                    paint: p2,
                },
            ) => points_scaled(a, b, k, tol) && paint_scaled(p1, p2, k, tol),
            (
                Self::Text {
                    text: t1,
                    at: a1,
                    size: s1,
                    h_align: h1,
                    v_align: v1,
                    color: c1,
                },
                Self::Text {
                    text: t2,
                    at: a2,
                    size: s2,
                    h_align: h2,
                    v_align: v2,
                    color: c2,
                },
            ) => {
                t1 == t2
                    && pt_scaled(*a1, *a2, k, tol)
                    && len_scaled(*s1, *s2, k, tol)
                    && h1 == h2
                    && v1 == v2
                    && c1 == c2
            }
            _ => false,
        }
    }
}

/// Ordered list of recorded primitives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    /// Operations in draw order.
    pub ops: Vec<DrawOp>,
}

impl DisplayList {
    /// Number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing was drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Operations other than backgrounds.
    pub fn shapes(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops
            .iter()
            .filter(|op| !matches!(op, DrawOp::Background(_)))
    }

    /// Whether `other` is this list scaled by `k`, operation by operation.
    #[must_use]
    pub fn is_scaled_copy(&self, other: &Self, k: f64, tol: f64) -> bool {
        self.ops.len() == other.ops.len()
            && self
                .ops
                .iter()
                .zip(&other.ops)
                .all(|(a, b)| a.is_scaled_copy(b, k, tol))
    }

    /// Index of the first operation that is not a scaled copy, for test
    /// diagnostics.
    #[must_use]
    pub fn first_mismatch(&self, other: &Self, k: f64, tol: f64) -> Option<usize> {
        if self.ops.len() != other.ops.len() {
            return Some(self.ops.len().min(other.ops.len()));
        }
        self.ops
            .iter()
            .zip(&other.ops)
            .position(|(a, b)| !a.is_scaled_copy(b, k, tol))
    }
}

/// Surface that records primitives instead of drawing them.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: f64,
    height: f64,
    stack: StateStack,
    list: DisplayList,
}

impl RecordingSurface {
    /// Create a recorder for a `width × height` surface.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: f64::from(width),
            height: f64::from(height),
            stack: StateStack::default(),
            list: DisplayList::default(),
        }
    }

    /// Recorded operations so far.
    #[must_use]
    pub fn list(&self) -> &DisplayList {
        &self.list
    }

    /// Consume the recorder, returning the display list.
    #[must_use]
    pub fn into_list(self) -> DisplayList {
        self.list
    }

    fn paint(&self) -> RecordedPaint {
        let state = self.stack.current();
        RecordedPaint {
            fill: state.fill,
            stroke: state.stroke,
            stroke_weight: state.stroke_weight * state.transform.scale_factor(),
            blend: state.blend,
        }
    }

    fn map(&self, x: f64, y: f64) -> (f64, f64) {
        self.stack.current().transform.apply(x, y)
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn stack(&self) -> &StateStack {
        &self.stack
    }

    fn stack_mut(&mut self) -> &mut StateStack {
        &mut self.stack
    }

    fn background(&mut self, color: Rgba) {
        self.list.ops.push(DrawOp::Background(color));
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        let op = DrawOp::Line {
            from: self.map(x1, y1),
            to: self.map(x2, y2),
            paint: self.paint(),
        };
        self.list.ops.push(op);
    }

    fn ellipse(&mut self, cx: f64, cy: f64, w: f64, h: f64) {
        let transform = self.stack.current().transform;
        let s = transform.scale_factor();
        let op = DrawOp::Ellipse {
            center: self.map(cx, cy),
            width: w * s,
            height: h * s,
            rotation: transform.angle(),
            paint: self.paint(),
        };
        self.list.ops.push(op);
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let points = vec![
            self.map(x, y),
            self.map(x + w, y),
            self.map(x + w, y + h),
            self.map(x, y + h),
        ];
        let op = DrawOp::Polygon {
            points,
            paint: self.paint(),
        };
        self.list.ops.push(op);
    }

    fn polygon(&mut self, points: &[(f64, f64)]) {
        let points = points.iter().map(|&(x, y)| self.map(x, y)).collect();
        let op = DrawOp::Polygon {
            points,
            paint: self.paint(),
        };
        self.list.ops.push(op);
    }

    fn polyline(&mut self, points: &[(f64, f64)]) {
        let points = points.iter().map(|&(x, y)| self.map(x, y)).collect();
        let op = DrawOp::Polyline {
            points,
            paint: self.paint(),
        };
        self.list.ops.push(op);
    }

    fn text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle) {
        let op = DrawOp::Text {
            text: text.to_string(),
            at: self.map(x, y),
            size: style.size * self.stack.current().transform.scale_factor(),
            h_align: style.h_align,
            v_align: style.v_align,
            color: self.stack.current().fill,
        };
        self.list.ops.push(op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(surface: &mut RecordingSurface, k: f64) {
        surface.background(Rgba::BLACK);
        surface.push();
        surface.translate(10.0 * k, 20.0 * k);
        surface.rotate(0.3);
        surface.stroke_weight(2.0 * k);
        surface.line(0.0, 0.0, 5.0 * k, 0.0);
        surface.ellipse(1.0 * k, 1.0 * k, 4.0 * k, 2.0 * k);
        surface.pop();
        surface.stroke_weight(k);
        surface.rect(0.0, 0.0, 3.0 * k, 3.0 * k);
    }

    #[test]
    fn records_in_device_space() {
        let mut surface = RecordingSurface::new(100, 100);
        surface.translate(10.0, 0.0);
        surface.scale(2.0);
        surface.line(1.0, 1.0, 2.0, 2.0);
        let DrawOp::Line { from, to, paint } = &surface.list().ops[0] else {
            panic!("expected a line");
        };
        assert_eq!(*from, (12.0, 2.0));
        assert_eq!(*to, (14.0, 4.0));
        assert!((paint.stroke_weight - 2.0).abs() < 1e-12);
    }

    #[test]
    fn scaled_copy_detection() {
        let mut a = RecordingSurface::new(100, 100);
        let mut b = RecordingSurface::new(200, 200);
        draw(&mut a, 1.0);
        draw(&mut b, 2.0);
        assert!(a.list().is_scaled_copy(b.list(), 2.0, 1e-9));
        assert!(!a.list().is_scaled_copy(b.list(), 3.0, 1e-9));
        assert_eq!(a.list().first_mismatch(b.list(), 2.0, 1e-9), None);
        assert_eq!(a.list().shapes().count(), 3);
    }

    #[test]
    fn unstroked_fills_ignore_the_pen_weight() {
        let fill_only = |k: f64| {
            let mut surface = RecordingSurface::new(100, 100);
            surface.no_stroke();
            surface.fill(Rgba::WHITE);
            surface.rect(5.0 * k, 5.0 * k, 10.0 * k, 10.0 * k);
            surface.into_list()
        };
        let preview = fill_only(1.0);
        let export = fill_only(2.0);
        assert!(preview.is_scaled_copy(&export, 2.0, 1e-9));

        let stroked = |k: f64, weight: f64| {
            let mut surface = RecordingSurface::new(100, 100);
            surface.stroke_weight(weight);
            surface.line(0.0, 0.0, 10.0 * k, 0.0);
            surface.into_list()
        };
        assert!(!stroked(1.0, 1.0).is_scaled_copy(&stroked(2.0, 1.0), 2.0, 1e-9));
    }

    #[test]
    fn rect_records_four_corners() {
        let mut surface = RecordingSurface::new(10, 10);
        surface.rect(1.0, 2.0, 3.0, 4.0);
        let DrawOp::Polygon { points, .. } = &surface.list().ops[0] else {
            panic!("expected polygon");
        };
        assert_eq!(points, &vec![(1.0, 2.0), (4.0, 2.0), (4.0, 6.0), (1.0, 6.0)]);
    }
}
