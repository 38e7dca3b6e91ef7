//! Export re-renderer.
//!
//! An export never scales up the preview bitmap. It re-runs the same pattern
//! renderer on an off-screen surface at the export resolution with every
//! size constant multiplied by `k = export_width / preview_width`, draws the
//! metadata overlay, then encodes the result as PNG, JPEG or SVG.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use image::ImageEncoder;
use poster_core::RenderSnapshot;
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::overlay::{draw_overlay, PosterDate};
use crate::patterns::{self, RenderContext};
use crate::source::SourceImage;
use crate::surface::{PixmapSurface, SvgSurface};

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PNG image.
    #[default]
    Png,
    /// JPEG image, composited over the poster background.
    Jpeg,
    /// SVG vector graphics.
    Svg,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Svg => "svg",
        }
    }

    /// MIME type.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Svg => "image/svg+xml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "svg" => Ok(Self::Svg),
            other => Err(RenderError::InvalidRequest(format!(
                "unsupported export format: {other}"
            ))),
        }
    }
}

/// Configuration for poster export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// JPEG quality 1-100 (default: 95).
    pub jpeg_quality: u8,
    /// Date printed on the poster (default: today).
    pub date: Option<PosterDate>,
    /// Whether to draw the metadata overlay (default: true).
    pub overlay: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 95,
            date: None,
            overlay: true,
        }
    }
}

/// An encoded export.
#[derive(Clone, PartialEq, Eq)]
pub struct ExportedImage {
    /// Encoded file contents.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub mime: &'static str,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Download filename.
    pub filename: String,
}

impl fmt::Debug for ExportedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedImage")
            .field("bytes", &self.bytes.len())
            .field("mime", &self.mime)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("filename", &self.filename)
            .finish()
    }
}

impl ExportedImage {
    /// `data:<mime>;base64,...` form used by the gallery.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Re-renders snapshots at export resolution.
#[derive(Debug, Clone, Default)]
pub struct PosterExporter {
    config: ExportConfig,
}

impl PosterExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Render `snapshot`, laid out for `preview_size`, at `export_size` and
    /// encode it.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidRequest`] for a zero-sized preview or
    /// export, and [`RenderError::Export`] if encoding fails.
    pub fn export(
        &self,
        snapshot: &RenderSnapshot,
        preview_size: (u32, u32),
        export_size: (u32, u32),
        format: ExportFormat,
        source: Option<&SourceImage>,
    ) -> RenderResult<ExportedImage> {
        if preview_size.0 == 0 || preview_size.1 == 0 {
            return Err(RenderError::InvalidRequest("preview size must be non-zero".into()));
        }
        let (width, height) = export_size;
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidRequest("export size must be non-zero".into()));
        }

        let mut ctx = RenderContext::for_export(preview_size, width);
        if let Some(source) = source {
            ctx = ctx.with_source(source);
        }
        tracing::debug!(
            editor = %snapshot.kind(),
            seed = snapshot.seed.value,
            width,
            height,
            scale = ctx.scale,
            %format,
            "Exporting poster"
        );

        let bytes = match format {
            ExportFormat::Png => self.render_pixmap(snapshot, &ctx, export_size)?.encode_png()?,
            ExportFormat::Jpeg => {
                let surface = self.render_pixmap(snapshot, &ctx, export_size)?;
                self.encode_jpeg(&surface, snapshot, width, height)?
            }
            ExportFormat::Svg => {
                let mut surface = SvgSurface::new(width, height);
                patterns::render(&mut surface, snapshot, &ctx);
                if self.config.overlay {
                    draw_overlay(&mut surface, snapshot, self.date(), ctx.scale);
                }
                surface.finish().into_bytes()
            }
        };

        Ok(ExportedImage {
            bytes,
            mime: format.mime(),
            width,
            height,
            filename: snapshot
                .kind()
                .filename(&snapshot.seed, width, height, format.extension()),
        })
    }

    /// Render `snapshot` with the overlay onto a fresh raster surface.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Surface`] if the surface cannot be allocated.
    pub fn render_pixmap(
        &self,
        snapshot: &RenderSnapshot,
        ctx: &RenderContext<'_>,
        size: (u32, u32),
    ) -> RenderResult<PixmapSurface> {
        let mut surface = PixmapSurface::new(size.0, size.1)?;
        patterns::render(&mut surface, snapshot, ctx);
        if self.config.overlay {
            draw_overlay(&mut surface, snapshot, self.date(), ctx.scale);
        }
        Ok(surface)
    }

    fn date(&self) -> PosterDate {
        self.config.date.unwrap_or_else(PosterDate::today)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn encode_jpeg(
        &self,
        surface: &PixmapSurface,
        snapshot: &RenderSnapshot,
        width: u32,
        height: u32,
    ) -> RenderResult<Vec<u8>> {
        let bg = patterns::background_color(&snapshot.params);
        let bg = [bg.r, bg.g, bg.b];
        let mut rgb_data = Vec::with_capacity(width as usize * height as usize * 3);
        for pixel in surface.to_rgba8().chunks_exact(4) {
            let alpha = f32::from(pixel[3]) / 255.0;
            let inv = 1.0 - alpha;
            for c in 0..3 {
                rgb_data.push(f32::from(pixel[c]).mul_add(alpha, f32::from(bg[c]) * inv).round() as u8);
            }
        }

        let mut buf = std::io::Cursor::new(Vec::new());
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, self.config.jpeg_quality);
        encoder
            .write_image(&rgb_data, width, height, image::ColorType::Rgb8.into())
            .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {e}")))?;

        Ok(buf.into_inner())
    }
}

/// Export `snapshot` with the default configuration.
///
/// # Errors
///
/// See [`PosterExporter::export`].
pub fn export_at(
    snapshot: &RenderSnapshot,
    preview_size: (u32, u32),
    export_size: (u32, u32),
    format: ExportFormat,
) -> RenderResult<ExportedImage> {
    PosterExporter::with_defaults().export(snapshot, preview_size, export_size, format, None)
}
