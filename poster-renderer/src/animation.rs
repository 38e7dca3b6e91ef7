//! Multi-frame capture and animated GIF encoding.
//!
//! A [`FrameRecorder`] collects rendered frames until it holds the planned
//! count. Recording can be cancelled from another thread through its
//! [`RecordingHandle`]; the recorder checks the shared flag before every
//! frame and discards what it has collected once the flag is cleared.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use poster_core::{EditorKind, RenderSnapshot};

use crate::error::{RenderError, RenderResult};
use crate::export::{ExportedImage, PosterExporter};
use crate::patterns::RenderContext;
use crate::surface::PixmapSurface;

/// Frame count and timing of an editor's GIF capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GifPlan {
    /// Frames to capture.
    pub frames: usize,
    /// Display time of each frame in milliseconds.
    pub delay_ms: u32,
    /// Animation frames advanced between captured frames.
    pub time_step: u32,
}

impl GifPlan {
    /// Capture plan for `kind`, or `None` for editors without animation.
    #[must_use]
    pub const fn for_editor(kind: EditorKind) -> Option<Self> {
        match kind {
            // 5 s at 15 fps, sampled from a 60 fps animation.
            EditorKind::Griglie => Some(Self {
                frames: 75,
                delay_ms: 67,
                time_step: 4,
            }),
            EditorKind::Luce => Some(Self {
                frames: 60,
                delay_ms: 33,
                time_step: 1,
            }),
            EditorKind::Rombi => Some(Self {
                frames: 36,
                delay_ms: 30,
                time_step: 1,
            }),
            EditorKind::CrashClock | EditorKind::Sand | EditorKind::Pixel => Some(Self {
                frames: 150,
                delay_ms: 33,
                time_step: 1,
            }),
            EditorKind::Poster | EditorKind::Moire => None,
        }
    }
}

/// Shared recording flag. Clearing it cancels the capture.
#[derive(Debug, Clone)]
pub struct RecordingHandle(Arc<AtomicBool>);

impl RecordingHandle {
    /// Whether the capture is still wanted.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Cancel the capture.
    pub fn cancel(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Collects frames for an animated export.
#[derive(Debug)]
pub struct FrameRecorder {
    target: usize,
    recording: Arc<AtomicBool>,
    frames: Vec<RgbaImage>,
}

impl FrameRecorder {
    /// Recorder that stops after `target` frames.
    #[must_use]
    pub fn new(target: usize) -> Self {
        Self {
            target,
            recording: Arc::new(AtomicBool::new(true)),
            frames: Vec::with_capacity(target),
        }
    }

    /// Recorder sized for `kind`'s capture plan.
    #[must_use]
    pub fn for_editor(kind: EditorKind) -> Option<Self> {
        GifPlan::for_editor(kind).map(|plan| Self::new(plan.frames))
    }

    /// Handle for cancelling this recording.
    #[must_use]
    pub fn handle(&self) -> RecordingHandle {
        RecordingHandle(Arc::clone(&self.recording))
    }

    /// Frames collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frame has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Whether the planned number of frames has been collected.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.frames.len() >= self.target
    }

    /// Add a rendered frame. Returns `true` once the recorder is complete.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Cancelled`] if the recording flag was cleared;
    /// the collected frames are dropped. Returns [`RenderError::Export`] if
    /// the frame does not match the size of the earlier ones.
    pub fn push(&mut self, surface: &PixmapSurface) -> RenderResult<bool> {
        if !self.recording.load(Ordering::Acquire) {
            let collected = self.frames.len();
            self.frames.clear();
            tracing::info!("Recording cancelled after {collected} frames");
            return Err(RenderError::Cancelled(collected));
        }
        if self.is_complete() {
            return Ok(true);
        }
        let pixmap = surface.pixmap();
        let frame = RgbaImage::from_raw(pixmap.width(), pixmap.height(), surface.to_rgba8())
            .ok_or_else(|| RenderError::Export("frame buffer size mismatch".into()))?;
        if let Some(first) = self.frames.first() {
            if first.dimensions() != frame.dimensions() {
                return Err(RenderError::Export(format!(
                    "frame is {:?}, expected {:?}",
                    frame.dimensions(),
                    first.dimensions()
                )));
            }
        }
        self.frames.push(frame);
        Ok(self.is_complete())
    }

    /// Encode the collected frames as a looping GIF.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Export`] if there are no frames or encoding
    /// fails.
    pub fn encode_gif(self, delay_ms: u32) -> RenderResult<Vec<u8>> {
        if self.frames.is_empty() {
            return Err(RenderError::Export("no frames recorded".into()));
        }
        let delay = Delay::from_numer_denom_ms(delay_ms, 1);
        let mut buf = Vec::new();
        {
            let mut encoder = GifEncoder::new_with_speed(&mut buf, 10);
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(|e| RenderError::Export(format!("GIF encoding failed: {e}")))?;
            encoder
                .encode_frames(
                    self.frames
                        .into_iter()
                        .map(|image| Frame::from_parts(image, 0, 0, delay)),
                )
                .map_err(|e| RenderError::Export(format!("GIF encoding failed: {e}")))?;
        }
        Ok(buf)
    }
}

/// Render an animated GIF of `snapshot` following its editor's plan.
///
/// Frame `i` shows animation time `snapshot.time + i × time_step`. Pass a
/// recorder from [`FrameRecorder::for_editor`] and keep its handle to be
/// able to cancel.
///
/// # Errors
///
/// Returns [`RenderError::InvalidRequest`] for editors without animation,
/// [`RenderError::Cancelled`] if the recorder is cancelled mid-way, and
/// encoding errors from [`FrameRecorder::encode_gif`].
pub fn record_gif(
    exporter: &PosterExporter,
    snapshot: &RenderSnapshot,
    ctx: &RenderContext<'_>,
    mut rec: FrameRecorder,
) -> RenderResult<ExportedImage> {
    let kind = snapshot.kind();
    let plan = GifPlan::for_editor(kind)
        .ok_or_else(|| RenderError::InvalidRequest(format!("{kind} has no animation")))?;
    let size = ctx.output_size();
    tracing::debug!(editor = %kind, frames = plan.frames, "Recording GIF");

    let mut frame = 0_u32;
    loop {
        let time = snapshot.time + f64::from(frame * plan.time_step);
        let surface = exporter.render_pixmap(&snapshot.at_time(time), ctx, size)?;
        if rec.push(&surface)? {
            break;
        }
        frame += 1;
    }

    let bytes = rec.encode_gif(plan.delay_ms)?;
    Ok(ExportedImage {
        bytes,
        mime: "image/gif",
        width: size.0,
        height: size.1,
        filename: kind.filename(&snapshot.seed, size.0, size.1, "gif"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::surface::Surface;

    fn frame(color: Rgba) -> PixmapSurface {
        let mut surface = PixmapSurface::new(8, 12).expect("surface");
        surface.background(color);
        surface
    }

    #[test]
    fn completes_at_target() {
        let mut rec = FrameRecorder::new(2);
        assert!(!rec.push(&frame(Rgba::BLACK)).expect("first"));
        assert!(rec.push(&frame(Rgba::WHITE)).expect("second"));
        assert!(rec.is_complete());
        let gif = rec.encode_gif(33).expect("gif");
        assert!(gif.starts_with(b"GIF89a"));
    }

    #[test]
    fn cancelling_discards_frames() {
        let mut rec = FrameRecorder::new(5);
        let handle = rec.handle();
        rec.push(&frame(Rgba::BLACK)).expect("first");
        handle.cancel();
        assert!(!handle.is_recording());
        assert!(matches!(rec.push(&frame(Rgba::BLACK)), Err(RenderError::Cancelled(1))));
        assert!(rec.is_empty());
        assert!(rec.encode_gif(33).is_err());
    }

    #[test]
    fn mismatched_frames_are_rejected() {
        let mut rec = FrameRecorder::new(3);
        rec.push(&frame(Rgba::BLACK)).expect("first");
        let other = PixmapSurface::new(4, 4).expect("surface");
        assert!(rec.push(&other).is_err());
    }

    #[test]
    fn static_editors_have_no_plan() {
        assert!(GifPlan::for_editor(EditorKind::Poster).is_none());
        assert_eq!(GifPlan::for_editor(EditorKind::Griglie).map(|p| p.frames), Some(75));
        assert_eq!(GifPlan::for_editor(EditorKind::Sand).map(|p| p.frames), Some(150));
    }

    #[test]
    fn cancelled_before_start_records_nothing() {
        use poster_core::{PatternParams, Seed};
        let snapshot = RenderSnapshot::new(Seed::from_value(3), PatternParams::defaults(EditorKind::Rombi));
        let rec = FrameRecorder::for_editor(EditorKind::Rombi).expect("plan");
        rec.handle().cancel();
        let ctx = RenderContext::new(60, 90, 1.0);
        let result = record_gif(&PosterExporter::with_defaults(), &snapshot, &ctx, rec);
        assert!(matches!(result, Err(RenderError::Cancelled(0))));
    }
}
