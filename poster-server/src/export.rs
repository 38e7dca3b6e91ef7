//! Server-side export.
//!
//! `POST /api/export` re-renders a snapshot at export resolution, answers
//! with the encoded file as an attachment and saves the poster to storage
//! on a separate task. A failed save is logged and never affects the
//! download.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use poster_core::{EditorKind, PatternParams, PosterId, RenderSnapshot, SeedLabel};
use poster_renderer::{
    record_gif, ExportFormat, ExportedImage, FrameRecorder, PosterExporter, RenderContext,
    RenderError, RenderResult, SourceImage,
};
use serde::Deserialize;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::error::ApiError;
use crate::metrics;
use crate::storage::{dispatch_save, upload_for, PosterStorage};
use crate::validation::{
    validate_export_size, validate_preview_size, validate_seed, validate_source, validate_time,
    ValidationError,
};
use crate::AppState;

/// Requested output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// A single frame.
    Still(ExportFormat),
    /// An animated capture following the editor's frame plan.
    Gif,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Still(ExportFormat::Png)
    }
}

impl FromStr for OutputFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("gif") {
            Ok(Self::Gif)
        } else {
            s.parse().map(Self::Still)
        }
    }
}

/// Body of `POST /api/export`. Everything but `editor` is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// Editor to render.
    pub editor: Option<EditorKind>,
    /// Seed text or number. Blank or absent uses the default seed.
    #[serde(default)]
    pub seed: Option<SeedLabel>,
    /// Named parameter values; missing names take defaults.
    #[serde(default)]
    pub params: Option<Value>,
    /// Preview width the layout was designed at.
    pub preview_width: Option<u32>,
    /// Preview height the layout was designed at.
    pub preview_height: Option<u32>,
    /// Export width.
    pub width: Option<u32>,
    /// Export height.
    pub height: Option<u32>,
    /// `png`, `jpg`, `svg` or `gif`.
    pub format: Option<String>,
    /// Animation time in frames.
    #[serde(default)]
    pub time: f64,
    /// Source image data URL for the pixel editor.
    pub source: Option<String>,
    /// Whether to save the export to storage (default: true).
    pub save: Option<bool>,
}

/// A validated export, ready to render.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// What to draw.
    pub snapshot: RenderSnapshot,
    /// Preview size the layout refers to.
    pub preview: (u32, u32),
    /// Output size.
    pub export: (u32, u32),
    /// Output encoding.
    pub format: OutputFormat,
    /// Source image data URL.
    pub source: Option<String>,
    /// Whether the result should be saved.
    pub save: bool,
}

impl ExportRequest {
    /// Validate the request and resolve its defaults.
    ///
    /// The preview defaults to the editor's design size. A still export
    /// defaults to the editor's export size; a GIF to the preview size. If
    /// only one export side is given the other follows the preview aspect.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::BadRequest`] for a missing editor, bad
    /// parameters, an unknown format or out-of-range values.
    pub fn into_job(self) -> Result<RenderJob, ApiError> {
        let kind = self.editor.ok_or_else(|| ApiError::bad_request("Missing editor"))?;
        let seed_text = self.seed.map(|s| s.to_string()).unwrap_or_default();
        check(validate_seed(&seed_text))?;
        check(validate_time(self.time))?;
        if let Some(source) = &self.source {
            check(validate_source(source))?;
        }

        let params = match &self.params {
            Some(values) => PatternParams::from_values(kind, values)
                .map_err(|e| ApiError::bad_request(e.to_string()))?,
            None => PatternParams::defaults(kind),
        };
        let format = self
            .format
            .as_deref()
            .map(str::parse::<OutputFormat>)
            .transpose()?
            .unwrap_or_default();

        let (dw, dh) = kind.design_size();
        let preview = (
            self.preview_width.unwrap_or(dw),
            self.preview_height.unwrap_or(dh),
        );
        check(validate_preview_size(preview.0, preview.1))?;

        let fallback = match format {
            OutputFormat::Still(_) => kind.export_size(),
            OutputFormat::Gif => preview,
        };
        let export = match (self.width, self.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, follow_aspect(w, preview.1, preview.0)),
            (None, Some(h)) => (follow_aspect(h, preview.0, preview.1), h),
            (None, None) => fallback,
        };
        check(validate_export_size(export.0, export.1))?;

        Ok(RenderJob {
            snapshot: RenderSnapshot::new(kind.parse_seed(&seed_text), params).at_time(self.time),
            preview,
            export,
            format,
            source: self.source,
            save: self.save.unwrap_or(true),
        })
    }
}

fn check(result: Result<(), ValidationError>) -> Result<(), ApiError> {
    result.map_err(|err| {
        metrics::record_validation_failure(err.kind());
        ApiError::from(err)
    })
}

/// `side × num / den`, rounded, saturating at `u32::MAX`.
fn follow_aspect(side: u32, num: u32, den: u32) -> u32 {
    let den = u64::from(den.max(1));
    let scaled = (u64::from(side) * u64::from(num) + den / 2) / den;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

impl RenderJob {
    /// File extension of the output.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self.format {
            OutputFormat::Still(format) => format.extension(),
            OutputFormat::Gif => "gif",
        }
    }

    /// Render and encode. Blocking; run it off the async runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] if the source image cannot be
    /// decoded, [`RenderError::InvalidRequest`] for a GIF of an editor
    /// without animation, and encoder errors.
    pub fn run(&self, exporter: &PosterExporter) -> RenderResult<ExportedImage> {
        let source = self
            .source
            .as_deref()
            .map(SourceImage::from_data_url)
            .transpose()?;
        match self.format {
            OutputFormat::Still(format) => {
                exporter.export(&self.snapshot, self.preview, self.export, format, source.as_ref())
            }
            OutputFormat::Gif => {
                let kind = self.snapshot.kind();
                let recorder = FrameRecorder::for_editor(kind).ok_or_else(|| {
                    RenderError::InvalidRequest(format!("{kind} has no animation"))
                })?;
                let mut ctx = RenderContext::for_export(self.preview, self.export.0);
                if let Some(source) = &source {
                    ctx = ctx.with_source(source);
                }
                record_gif(exporter, &self.snapshot, &ctx, recorder)
            }
        }
    }
}

/// Run `job` on the blocking pool and record how long it took.
///
/// # Errors
///
/// Returns the render error, or [`ApiError::Internal`] if the task panicked.
pub async fn render_job(
    job: RenderJob,
    exporter: PosterExporter,
) -> Result<(RenderJob, ExportedImage), ApiError> {
    let start = Instant::now();
    let (job, result) = tokio::task::spawn_blocking(move || {
        let result = job.run(&exporter);
        (job, result)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("render task failed: {e}")))?;
    let image = result?;
    metrics::record_export(
        job.snapshot.kind().as_str(),
        job.extension(),
        start.elapsed().as_secs_f64(),
    );
    Ok((job, image))
}

/// Hand a finished export to storage without waiting for it.
///
/// Returns `None` when the job asked not to be saved.
#[must_use = "dropping the handle detaches the save"]
pub fn save_in_background(
    storage: &Arc<dyn PosterStorage>,
    job: &RenderJob,
    image: &ExportedImage,
) -> Option<JoinHandle<Option<PosterId>>> {
    job.save
        .then(|| dispatch_save(Arc::clone(storage), upload_for(image, &job.snapshot)))
}

/// Export endpoint.
///
/// # Errors
///
/// Returns [`ApiError::BadRequest`] for invalid requests and undecodable
/// sources, [`ApiError::Internal`] for render failures.
#[tracing::instrument(
    name = "export",
    skip(state, body),
    fields(editor = tracing::field::Empty)
)]
pub async fn export_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: ExportRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid export request: {e}")))?;
    let job = request.into_job()?;
    tracing::Span::current().record("editor", job.snapshot.kind().as_str());

    let (job, image) = render_job(job, state.exporter.clone()).await?;
    tracing::info!(
        filename = %image.filename,
        bytes = image.bytes.len(),
        "Export rendered"
    );
    drop(save_in_background(&state.storage, &job, &image));

    let disposition = format!("attachment; filename=\"{}\"", image.filename);
    Ok((
        [
            (header::CONTENT_TYPE, image.mime.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        image.bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> ExportRequest {
        serde_json::from_value(value).expect("request")
    }

    #[test]
    fn defaults_follow_the_editor() {
        let job = request(json!({ "editor": "griglie" })).into_job().expect("job");
        assert_eq!(job.preview, (500, 750));
        assert_eq!(job.export, EditorKind::Griglie.export_size());
        assert_eq!(job.snapshot.seed, poster_core::Seed::default());
        assert_eq!(job.format, OutputFormat::Still(ExportFormat::Png));
        assert!(job.save);
    }

    #[test]
    fn one_side_keeps_the_aspect() {
        let job = request(json!({
            "editor": "rombi",
            "seed": 42,
            "previewWidth": 400,
            "previewHeight": 600,
            "width": 1000,
            "format": "jpg"
        }))
        .into_job()
        .expect("job");
        assert_eq!(job.export, (1000, 1500));
        assert_eq!(job.snapshot.seed.value, 42);

        let hashed = request(json!({ "editor": "griglie", "seed": 42 }))
            .into_job()
            .expect("job");
        assert_eq!(hashed.snapshot.seed.value, 1662);
        assert_eq!(job.extension(), "jpg");
    }

    #[test]
    fn gif_defaults_to_preview_size() {
        let job = request(json!({ "editor": "luce", "format": "GIF" }))
            .into_job()
            .expect("job");
        assert_eq!(job.format, OutputFormat::Gif);
        assert_eq!(job.export, job.preview);
    }

    #[test]
    fn bad_requests() {
        assert!(request(json!({})).into_job().is_err());
        assert!(request(json!({ "editor": "sand", "format": "bmp" }))
            .into_job()
            .is_err());
        assert!(request(json!({ "editor": "sand", "width": 0, "height": 10 }))
            .into_job()
            .is_err());
        assert!(request(json!({ "editor": "sand", "time": -3.0 }))
            .into_job()
            .is_err());
        assert!(request(json!({ "editor": "moire", "params": [1, 2] }))
            .into_job()
            .is_err());
    }

    #[test]
    fn follow_aspect_rounds() {
        assert_eq!(follow_aspect(1000, 750, 500), 1500);
        assert_eq!(follow_aspect(333, 3, 2), 500);
        assert_eq!(follow_aspect(7, 1, 0), 7);
    }

    #[test]
    fn static_editors_cannot_be_animated() {
        let job = request(json!({ "editor": "moire", "format": "gif", "width": 30, "height": 45 }))
            .into_job()
            .expect("job");
        let result = job.run(&PosterExporter::with_defaults());
        assert!(matches!(result, Err(RenderError::InvalidRequest(_))));
    }
}
