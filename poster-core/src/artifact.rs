//! Saved poster artifacts.
//!
//! A [`PosterArtifact`] is an exported image (as a data URL) plus the metadata
//! needed to list it in the gallery. Artifacts are created from a
//! [`NewPoster`] upload, never edited in place, and removed only on request.
//! JSON field names follow the storage HTTP contract.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::seed::Seed;

/// Editor name stored when the upload omits one.
pub const UNKNOWN_EDITOR: &str = "unknown";

/// Width stored when the upload omits one.
pub const DEFAULT_WIDTH: u32 = 1000;

/// Height stored when the upload omits one.
pub const DEFAULT_HEIGHT: u32 = 1500;

/// Unique identifier of a saved poster.
///
/// Locally generated ids are UUID v4 strings; ids coming from another
/// storage backend are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PosterId(String);

impl PosterId {
    /// Create a new unique poster ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PosterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PosterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Seed as recorded with a poster: the user's text or a bare number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeedLabel {
    /// Numeric seed.
    Number(u64),
    /// Seed text.
    Text(String),
}

impl From<&Seed> for SeedLabel {
    fn from(seed: &Seed) -> Self {
        match seed.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Self::Text(text.to_string()),
            _ => Self::Number(u64::from(seed.value)),
        }
    }
}

impl fmt::Display for SeedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(t) => f.write_str(t),
        }
    }
}

/// Upload payload for a new poster. Every field is optional on the wire;
/// [`PosterArtifact::from_upload`] fills defaults and rejects a missing image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewPoster {
    /// Encoded image as a data URL.
    #[serde(rename = "dataURL", default, skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
    /// Editor identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
    /// Seed label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<SeedLabel>,
    /// Creation time in Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    /// Download filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Image width in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Image height in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl NewPoster {
    /// Upload for an exported image.
    #[must_use]
    pub fn new(data_url: impl Into<String>) -> Self {
        Self {
            data_url: Some(data_url.into()),
            ..Self::default()
        }
    }

    /// Set the editor identifier.
    #[must_use]
    pub fn with_editor(mut self, editor: impl Into<String>) -> Self {
        self.editor = Some(editor.into());
        self
    }

    /// Set the seed label.
    #[must_use]
    pub fn with_seed(mut self, seed: SeedLabel) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the download filename.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set the image dimensions.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set the creation time.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// A saved poster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosterArtifact {
    /// Identifier.
    pub id: PosterId,
    /// Encoded image as a data URL.
    #[serde(rename = "dataURL")]
    pub data_url: String,
    /// Editor identifier.
    pub editor: String,
    /// Seed label, if known.
    pub seed: Option<SeedLabel>,
    /// Creation time in Unix milliseconds.
    pub timestamp: u64,
    /// Download filename.
    pub filename: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl PosterArtifact {
    /// Turn an upload into an artifact, filling defaults for absent fields.
    ///
    /// Empty strings and zero values count as absent, except the seed
    /// number, where zero is a valid seed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingField`] if the upload carries no image.
    pub fn from_upload(upload: NewPoster, now_ms: u64) -> CoreResult<Self> {
        let data_url = upload
            .data_url
            .filter(|d| !d.is_empty())
            .ok_or(CoreError::MissingField("dataURL"))?;
        let seed = upload.seed.filter(|s| match s {
            SeedLabel::Text(t) => !t.is_empty(),
            SeedLabel::Number(_) => true,
        });
        Ok(Self {
            id: PosterId::new(),
            data_url,
            editor: upload
                .editor
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| UNKNOWN_EDITOR.to_string()),
            seed,
            timestamp: upload.timestamp.filter(|t| *t > 0).unwrap_or(now_ms),
            filename: upload
                .filename
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| format!("poster-{now_ms}.png")),
            width: upload.width.filter(|w| *w > 0).unwrap_or(DEFAULT_WIDTH),
            height: upload.height.filter(|h| *h > 0).unwrap_or(DEFAULT_HEIGHT),
        })
    }
}

/// Get the current Unix timestamp in milliseconds.
#[must_use]
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        // Timestamp will not exceed u64 max for millennia
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upload_defaults() {
        let artifact =
            PosterArtifact::from_upload(NewPoster::new("data:image/png;base64,AAAA"), 1_700)
                .expect("valid upload");
        assert_eq!(artifact.editor, "unknown");
        assert!(artifact.seed.is_none());
        assert_eq!(artifact.timestamp, 1_700);
        assert_eq!(artifact.filename, "poster-1700.png");
        assert_eq!((artifact.width, artifact.height), (1000, 1500));
    }

    #[test]
    fn upload_without_image_is_rejected() {
        let result = PosterArtifact::from_upload(NewPoster::default(), 1);
        let err = result.expect_err("missing image");
        assert_eq!(err.to_string(), "Missing dataURL");

        let result = PosterArtifact::from_upload(NewPoster::new(""), 1);
        assert!(matches!(result, Err(CoreError::MissingField("dataURL"))));
    }

    #[test]
    fn upload_keeps_supplied_fields() {
        let upload = NewPoster::new("data:image/png;base64,AAAA")
            .with_editor("griglie")
            .with_seed(SeedLabel::Text("alpha".into()))
            .with_filename("griglie-poster-92909918.png")
            .with_size(1000, 1500)
            .with_timestamp(42);
        let artifact = PosterArtifact::from_upload(upload, 9_999).expect("valid");
        assert_eq!(artifact.editor, "griglie");
        assert_eq!(artifact.seed, Some(SeedLabel::Text("alpha".into())));
        assert_eq!(artifact.timestamp, 42);
        assert_eq!(artifact.filename, "griglie-poster-92909918.png");
    }

    #[test]
    fn wire_names_match_contract() {
        let upload: NewPoster = serde_json::from_value(json!({
            "dataURL": "data:image/png;base64,AAAA",
            "editor": "luce",
            "seed": 12345,
            "width": 500,
            "height": 750
        }))
        .expect("deserialize");
        assert_eq!(upload.seed, Some(SeedLabel::Number(12345)));

        let artifact = PosterArtifact::from_upload(upload, 5).expect("valid");
        let value = serde_json::to_value(&artifact).expect("serialize");
        assert!(value.get("dataURL").is_some());
        assert_eq!(value["seed"], 12345);
        assert_eq!(value["editor"], "luce");
        assert!(value["id"].is_string());
    }

    #[test]
    fn seed_label_from_seed() {
        assert_eq!(SeedLabel::from(&Seed::parse("alpha")), SeedLabel::Text("alpha".into()));
        assert_eq!(SeedLabel::from(&Seed::from_value(7)), SeedLabel::Number(7));
        assert_eq!(SeedLabel::Text("x".into()).to_string(), "x");
    }

    #[test]
    fn poster_ids_are_unique() {
        assert_ne!(PosterId::new(), PosterId::new());
        assert_eq!(PosterId::from_string("abc").as_str(), "abc");
    }
}
