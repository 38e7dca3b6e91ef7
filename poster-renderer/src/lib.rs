//! # Program.A Poster Renderer
//!
//! Pattern renderers, export re-rendering and encoders for the generative
//! poster editors.
//!
//! ## Pipeline
//!
//! ```text
//! RenderSnapshot ──► patterns::render ──► Surface ──► overlay ──► encode
//!   (seed, params,      (re-seeded         pixmap      brand,      PNG
//!    time)               every call)       svg         date,       JPEG
//!                                          recording   seed, name  SVG / GIF
//! ```
//!
//! Rendering the same snapshot twice gives the same image, and rendering it
//! at scale `k` gives the preview with every coordinate and size multiplied
//! by `k`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod color;
pub mod error;
pub mod export;
pub mod overlay;
pub mod patterns;
pub mod source;
pub mod surface;

pub use animation::{record_gif, FrameRecorder, GifPlan, RecordingHandle};
pub use color::Rgba;
pub use error::{RenderError, RenderResult};
pub use export::{export_at, ExportConfig, ExportFormat, ExportedImage, PosterExporter};
pub use overlay::{draw_overlay, PosterDate};
pub use patterns::{background_color, render, Bulge, Interaction, RenderContext, WarpSource};
pub use source::{ImageFormat, SourceImage};
pub use surface::{
    BlendMode, DisplayList, DrawOp, PixmapSurface, RecordingSurface, Surface, SvgSurface,
};
