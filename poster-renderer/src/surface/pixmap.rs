//! Raster surface backed by a tiny-skia pixmap.
//!
//! Shapes go straight to tiny-skia. Text has no tiny-skia equivalent, so each
//! string is wrapped in a one-element SVG document and rendered onto the same
//! pixmap with resvg.

use std::fmt::Write;
use std::sync::{Arc, OnceLock};

use tiny_skia::{FillRule, LineCap, Paint, PathBuilder, Pixmap, Rect, Stroke};

use super::{BlendMode, HAlign, StateStack, Surface, TextStyle, VAlign};
use crate::color::Rgba;
use crate::error::{RenderError, RenderResult};
use crate::surface::svg::escape_xml;

/// System fonts, loaded once per process.
fn font_database() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    Arc::clone(FONTS.get_or_init(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!("Loaded {} font faces", db.len());
        Arc::new(db)
    }))
}

fn skia_blend(mode: BlendMode) -> tiny_skia::BlendMode {
    match mode {
        BlendMode::Normal => tiny_skia::BlendMode::SourceOver,
        BlendMode::Multiply => tiny_skia::BlendMode::Multiply,
        BlendMode::Add => tiny_skia::BlendMode::Plus,
    }
}

fn skia_color(color: Rgba) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

/// Off-screen raster surface.
pub struct PixmapSurface {
    pixmap: Pixmap,
    stack: StateStack,
}

impl std::fmt::Debug for PixmapSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixmapSurface")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .finish_non_exhaustive()
    }
}

impl PixmapSurface {
    /// Allocate a transparent `width × height` surface.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Surface`] if either dimension is zero or the
    /// allocation fails.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            RenderError::Surface(format!("cannot allocate {width}x{height} pixmap"))
        })?;
        Ok(Self {
            pixmap,
            stack: StateStack::default(),
        })
    }

    /// Underlying pixmap.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Consume the surface, returning the pixmap.
    #[must_use]
    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    /// Premultiplied RGBA bytes, row-major.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Colour of one pixel (demultiplied), if in bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let p = self.pixmap.pixel(x, y)?.demultiply();
        Some(Rgba::rgba(p.red(), p.green(), p.blue(), p.alpha()))
    }

    fn paint(color: Rgba, blend: BlendMode) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(skia_color(color));
        paint.anti_alias = true;
        paint.blend_mode = skia_blend(blend);
        paint
    }

    #[allow(clippy::cast_possible_truncation)]
    fn draw_path(&mut self, path: &tiny_skia::Path, fill: bool) {
        let state = *self.stack.current();
        let transform = state.transform.to_skia();
        if fill {
            if let Some(color) = state.fill {
                let paint = Self::paint(color, state.blend);
                self.pixmap
                    .fill_path(path, &paint, FillRule::Winding, transform, None);
            }
        }
        if let Some(color) = state.stroke {
            if state.stroke_weight > 0.0 {
                let paint = Self::paint(color, state.blend);
                let stroke = Stroke {
                    width: state.stroke_weight as f32,
                    line_cap: LineCap::Round,
                    ..Stroke::default()
                };
                self.pixmap
                    .stroke_path(path, &paint, &stroke, transform, None);
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn build(points: &[(f64, f64)], close: bool) -> Option<tiny_skia::Path> {
        let (first, rest) = points.split_first()?;
        let mut pb = PathBuilder::new();
        pb.move_to(first.0 as f32, first.1 as f32);
        for &(x, y) in rest {
            pb.line_to(x as f32, y as f32);
        }
        if close {
            pb.close();
        }
        pb.finish()
    }

    /// Render one string through resvg.
    fn draw_text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle) -> RenderResult<()> {
        let state = *self.stack.current();
        let Some(color) = state.fill else {
            return Ok(());
        };
        let t = state.transform;
        let anchor = match style.h_align {
            HAlign::Left => "start",
            HAlign::Center => "middle",
            HAlign::Right => "end",
        };
        let baseline = match style.v_align {
            VAlign::Top => "text-before-edge",
            VAlign::Middle => "central",
            VAlign::Bottom => "text-after-edge",
        };
        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}"><text x="{x}" y="{y}" transform="matrix({a} {b} {c} {d} {e} {f})" font-family="monospace" font-size="{size}" text-anchor="{anchor}" dominant-baseline="{baseline}" fill="{fill}" fill-opacity="{opacity}">{content}</text></svg>"#,
            w = self.pixmap.width(),
            h = self.pixmap.height(),
            a = t.a,
            b = t.b,
            c = t.c,
            d = t.d,
            e = t.e,
            f = t.f,
            size = style.size,
            fill = color.to_hex(),
            opacity = color.alpha_f(),
            content = escape_xml(text),
        );
        let mut options = usvg::Options::default();
        options.fontdb = font_database();
        let tree = usvg::Tree::from_str(&svg, &options)
            .map_err(|e| RenderError::Export(format!("text layout failed: {e}")))?;
        resvg::render(&tree, tiny_skia::Transform::identity(), &mut self.pixmap.as_mut());
        Ok(())
    }

    /// Encode as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Export`] if encoding fails.
    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
    }

    /// Straight (non-premultiplied) RGBA bytes.
    #[must_use]
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }
}

impl Surface for PixmapSurface {
    fn width(&self) -> f64 {
        f64::from(self.pixmap.width())
    }

    fn height(&self) -> f64 {
        f64::from(self.pixmap.height())
    }

    fn stack(&self) -> &StateStack {
        &self.stack
    }

    fn stack_mut(&mut self) -> &mut StateStack {
        &mut self.stack
    }

    fn background(&mut self, color: Rgba) {
        self.pixmap.fill(skia_color(color));
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        if let Some(path) = Self::build(&[(x1, y1), (x2, y2)], false) {
            self.draw_path(&path, false);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn ellipse(&mut self, cx: f64, cy: f64, w: f64, h: f64) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let Some(rect) = Rect::from_xywh(
            (cx - w / 2.0) as f32,
            (cy - h / 2.0) as f32,
            w as f32,
            h as f32,
        ) else {
            return;
        };
        if let Some(path) = PathBuilder::from_oval(rect) {
            self.draw_path(&path, true);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let Some(rect) = Rect::from_xywh(x as f32, y as f32, w as f32, h as f32) else {
            return;
        };
        let path = PathBuilder::from_rect(rect);
        self.draw_path(&path, true);
    }

    fn polygon(&mut self, points: &[(f64, f64)]) {
        if let Some(path) = Self::build(points, true) {
            self.draw_path(&path, true);
        }
    }

    fn polyline(&mut self, points: &[(f64, f64)]) {
        if let Some(path) = Self::build(points, false) {
            self.draw_path(&path, false);
        }
    }

    fn text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle) {
        if let Err(e) = self.draw_text(text, x, y, style) {
            tracing::warn!("Failed to draw text {text:?}: {e}");
        }
    }
}
