//! Vector surface producing an SVG document.
//!
//! Every primitive becomes one element carrying its own `transform` matrix,
//! paint attributes and, for non-normal blends, a `mix-blend-mode` style.
//! SVG has no additive blend, so [`BlendMode::Add`] is written as `screen`.

use std::fmt::Write;

use super::{Affine, BlendMode, DrawState, HAlign, StateStack, Surface, TextStyle, VAlign};
use crate::color::Rgba;

/// Surface that accumulates SVG markup.
#[derive(Debug, Clone)]
pub struct SvgSurface {
    width: u32,
    height: u32,
    stack: StateStack,
    body: String,
}

impl SvgSurface {
    /// Create an empty `width × height` document.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            stack: StateStack::default(),
            body: String::with_capacity(4096),
        }
    }

    /// Close the document and return the SVG markup.
    #[must_use]
    pub fn finish(self) -> String {
        let mut svg = String::with_capacity(self.body.len() + 256);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
            w = self.width,
            h = self.height,
        );
        svg.push_str(&self.body);
        svg.push_str("</svg>");
        svg
    }

    fn attrs(state: &DrawState, fill: bool) -> String {
        let mut out = String::new();
        write_matrix(&mut out, state.transform);
        match state.fill.filter(|_| fill) {
            Some(color) => write_paint(&mut out, "fill", color),
            None => out.push_str(" fill=\"none\""),
        }
        match state.stroke.filter(|_| state.stroke_weight > 0.0) {
            Some(color) => {
                write_paint(&mut out, "stroke", color);
                let _ = write!(
                    out,
                    " stroke-width=\"{}\" stroke-linecap=\"round\"",
                    state.stroke_weight
                );
            }
            None => out.push_str(" stroke=\"none\""),
        }
        match state.blend {
            BlendMode::Normal => {}
            BlendMode::Multiply => out.push_str(" style=\"mix-blend-mode:multiply\""),
            BlendMode::Add => out.push_str(" style=\"mix-blend-mode:screen\""),
        }
        out
    }

    fn points_attr(points: &[(f64, f64)]) -> String {
        let mut out = String::with_capacity(points.len() * 12);
        for (i, (x, y)) in points.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{x},{y}");
        }
        out
    }
}

fn write_matrix(out: &mut String, t: Affine) {
    if t != Affine::IDENTITY {
        let _ = write!(
            out,
            " transform=\"matrix({} {} {} {} {} {})\"",
            t.a, t.b, t.c, t.d, t.e, t.f
        );
    }
}

fn write_paint(out: &mut String, attr: &str, color: Rgba) {
    let _ = write!(out, " {attr}=\"{}\"", color.to_hex());
    if color.a < 255 {
        let _ = write!(out, " {attr}-opacity=\"{:.4}\"", color.alpha_f());
    }
}

/// Escape special XML characters.
pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

impl Surface for SvgSurface {
    fn width(&self) -> f64 {
        f64::from(self.width)
    }

    fn height(&self) -> f64 {
        f64::from(self.height)
    }

    fn stack(&self) -> &StateStack {
        &self.stack
    }

    fn stack_mut(&mut self) -> &mut StateStack {
        &mut self.stack
    }

    fn background(&mut self, color: Rgba) {
        let mut paint = String::new();
        write_paint(&mut paint, "fill", color);
        let _ = write!(self.body, "<rect width=\"100%\" height=\"100%\"{paint}/>");
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        let attrs = Self::attrs(self.stack.current(), false);
        let _ = write!(
            self.body,
            "<line x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\"{attrs}/>"
        );
    }

    fn ellipse(&mut self, cx: f64, cy: f64, w: f64, h: f64) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let attrs = Self::attrs(self.stack.current(), true);
        let _ = write!(
            self.body,
            "<ellipse cx=\"{cx}\" cy=\"{cy}\" rx=\"{}\" ry=\"{}\"{attrs}/>",
            w / 2.0,
            h / 2.0
        );
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let attrs = Self::attrs(self.stack.current(), true);
        let _ = write!(
            self.body,
            "<rect x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\"{attrs}/>"
        );
    }

    fn polygon(&mut self, points: &[(f64, f64)]) {
        if points.is_empty() {
            return;
        }
        let attrs = Self::attrs(self.stack.current(), true);
        let pts = Self::points_attr(points);
        let _ = write!(self.body, "<polygon points=\"{pts}\"{attrs}/>");
    }

    fn polyline(&mut self, points: &[(f64, f64)]) {
        if points.is_empty() {
            return;
        }
        let attrs = Self::attrs(self.stack.current(), false);
        let pts = Self::points_attr(points);
        let _ = write!(self.body, "<polyline points=\"{pts}\"{attrs}/>");
    }

    fn text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle) {
        let state = self.stack.current();
        let Some(color) = state.fill else {
            return;
        };
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
        let mut attrs = String::new();
        write_matrix(&mut attrs, state.transform);
        write_paint(&mut attrs, "fill", color);
        let _ = write!(
            self.body,
            "<text x=\"{x}\" y=\"{y}\" font-family=\"monospace\" font-size=\"{}\" text-anchor=\"{anchor}\" dominant-baseline=\"{baseline}\"{attrs}>{}</text>",
            style.size,
            escape_xml(text)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document() {
        let svg = SvgSurface::new(100, 150).finish();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("viewBox=\"0 0 100 150\""));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn primitives_carry_transform_and_paint() {
        let mut surface = SvgSurface::new(10, 10);
        surface.translate(5.0, 5.0);
        surface.stroke(Rgba::rgb(255, 0, 0));
        surface.stroke_weight(2.0);
        surface.line(0.0, 0.0, 1.0, 1.0);
        let svg = surface.finish();
        assert!(svg.contains("<line"));
        assert!(svg.contains("matrix(1 0 0 1 5 5)"));
        assert!(svg.contains("stroke=\"#ff0000\""));
        assert!(svg.contains("stroke-width=\"2\""));
    }

    #[test]
    fn blend_modes_become_styles() {
        let mut surface = SvgSurface::new(10, 10);
        surface.blend(BlendMode::Multiply);
        surface.rect(0.0, 0.0, 2.0, 2.0);
        surface.blend(BlendMode::Add);
        surface.ellipse(1.0, 1.0, 2.0, 2.0);
        let svg = surface.finish();
        assert!(svg.contains("mix-blend-mode:multiply"));
        assert!(svg.contains("mix-blend-mode:screen"));
    }

    #[test]
    fn text_is_escaped() {
        let mut surface = SvgSurface::new(10, 10);
        surface.fill(Rgba::WHITE);
        surface.text("<a & b>", 0.0, 0.0, &TextStyle::new(12.0, HAlign::Left, VAlign::Top));
        let svg = surface.finish();
        assert!(svg.contains("&lt;a &amp; b&gt;"));
    }

    #[test]
    fn escape_all_entities() {
        assert_eq!(escape_xml("'\""), "&apos;&quot;");
    }
}
