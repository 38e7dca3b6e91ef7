//! Source rasters for the pixelation editor.
//!
//! Supports loading images from raw bytes and from base64 or
//! percent-encoded data URLs, as produced by a file upload.

use base64::Engine;

use crate::color::Rgba;
use crate::error::{RenderError, RenderResult};

/// Longest side kept after loading; larger uploads are downsampled.
pub const MAX_SOURCE_SIDE: u32 = 2048;

/// Encoded image formats recognised on upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// GIF, first frame only.
    Gif,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/gif" => Self::Gif,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Self::Png
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else if data.starts_with(b"GIF8") {
            Self::Gif
        } else {
            Self::Unknown
        }
    }
}

/// Decoded RGBA raster.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl SourceImage {
    /// Wrap straight RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] if the image is empty or `data` is
    /// not `width × height × 4` bytes long.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> RenderResult<Self> {
        let expected = u64::from(width) * u64::from(height) * 4;
        if width == 0 || height == 0 || data.len() as u64 != expected {
            return Err(RenderError::Resource(format!(
                "expected {expected} bytes for a {width}x{height} image, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build an image by evaluating `f` at every pixel.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] if either dimension is zero.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> Rgba) -> RenderResult<Self> {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                let c = f(x, y);
                data.extend_from_slice(&[c.r, c.g, c.b, c.a]);
            }
        }
        Self::from_rgba(width, height, data)
    }

    /// Decode PNG, JPEG or GIF bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] if the bytes cannot be decoded.
    pub fn decode(bytes: &[u8]) -> RenderResult<Self> {
        let format = ImageFormat::from_magic_bytes(bytes);
        let img = image::load_from_memory(bytes)
            .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;
        let img = if img.width().max(img.height()) > MAX_SOURCE_SIDE {
            tracing::debug!(
                "Downsampling {:?} source from {}x{}",
                format,
                img.width(),
                img.height()
            );
            img.resize(MAX_SOURCE_SIDE, MAX_SOURCE_SIDE, image::imageops::FilterType::Triangle)
        } else {
            img
        };
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(width, height, rgba.into_raw())
    }

    /// Decode a `data:` URL.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] if the URL is malformed, the
    /// declared image type disagrees with the payload, or the image cannot
    /// be decoded.
    pub fn from_data_url(url: &str) -> RenderResult<Self> {
        let (mime, bytes) = parse_data_url(url)?;
        let declared = ImageFormat::from_mime(&mime);
        let actual = ImageFormat::from_magic_bytes(&bytes);
        if declared != ImageFormat::Unknown && actual != ImageFormat::Unknown && declared != actual {
            return Err(RenderError::Resource(format!(
                "data URL declares {mime} but holds {actual:?} data"
            )));
        }
        Self::decode(&bytes)
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Colour at `(x, y)`, clamped to the image bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let i = (y * self.width as usize + x) * 4;
        Rgba::rgba(self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3])
    }
}

/// Split a `data:` URL into its MIME type and decoded payload.
///
/// Supports `data:image/png;base64,...` and percent-encoded payloads.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the URL is not a data URL or the
/// payload is not valid base64.
pub fn parse_data_url(url: &str) -> RenderResult<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;
    let mime = metadata.split(';').next().unwrap_or_default().to_string();
    let bytes = if metadata.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))?
    } else {
        percent_decode(payload)?
    };
    Ok((mime, bytes))
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}
