//! Input validation for untrusted data.
//!
//! Request fields that size allocations or reach the renderer are checked
//! here before use.

use thiserror::Error;

/// Maximum length for poster ids (UUIDs are 36 chars).
pub const MAX_POSTER_ID_LEN: usize = 64;
/// Maximum length for seed text.
pub const MAX_SEED_LEN: usize = 256;
/// Largest export side in pixels.
pub const MAX_EXPORT_SIDE: u32 = 8000;
/// Largest preview side in pixels.
pub const MAX_PREVIEW_SIDE: u32 = 4000;
/// Maximum request body size, enough for a 1000×1500 PNG data URL.
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;
/// Maximum length of a source image data URL.
pub const MAX_DATA_URL_LEN: usize = 24 * 1024 * 1024;

/// Validation error types.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Poster id exceeds maximum length.
    #[error("id too long (max {MAX_POSTER_ID_LEN} chars)")]
    PosterIdTooLong,
    /// Poster id contains invalid characters.
    #[error("id contains invalid characters")]
    PosterIdInvalidChars,
    /// Seed text exceeds maximum length.
    #[error("seed too long (max {MAX_SEED_LEN} chars)")]
    SeedTooLong,
    /// A width or height is zero or too large.
    #[error("{which} size {width}x{height} out of range (1..={max})")]
    SizeOutOfRange {
        /// "export" or "preview".
        which: &'static str,
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// Largest allowed side.
        max: u32,
    },
    /// Animation time is negative or not finite.
    #[error("time must be a finite, non-negative frame count")]
    InvalidTime,
    /// Source image is not an image data URL.
    #[error("source must be a data:image/... URL")]
    SourceNotImage,
    /// Source image data URL is too large.
    #[error("source too large (max {MAX_DATA_URL_LEN} bytes)")]
    SourceTooLarge,
}

impl ValidationError {
    /// Short label used in metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PosterIdTooLong | Self::PosterIdInvalidChars => "poster_id",
            Self::SeedTooLong => "seed",
            Self::SizeOutOfRange { .. } => "size",
            Self::InvalidTime => "time",
            Self::SourceNotImage | Self::SourceTooLarge => "source",
        }
    }
}

/// Check if a character is valid for ids (alphanumeric, hyphen, or underscore).
fn is_valid_id_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

/// Validate a poster id.
///
/// # Errors
///
/// Returns [`ValidationError::PosterIdTooLong`] if the id exceeds 64
/// characters and [`ValidationError::PosterIdInvalidChars`] if it contains
/// anything but alphanumerics, hyphens and underscores.
pub fn validate_poster_id(id: &str) -> Result<(), ValidationError> {
    if id.len() > MAX_POSTER_ID_LEN {
        return Err(ValidationError::PosterIdTooLong);
    }
    if id.is_empty() || !id.chars().all(is_valid_id_char) {
        return Err(ValidationError::PosterIdInvalidChars);
    }
    Ok(())
}

/// Validate seed text.
///
/// # Errors
///
/// Returns [`ValidationError::SeedTooLong`] past [`MAX_SEED_LEN`] characters.
pub fn validate_seed(seed: &str) -> Result<(), ValidationError> {
    if seed.chars().count() > MAX_SEED_LEN {
        return Err(ValidationError::SeedTooLong);
    }
    Ok(())
}

/// Validate export dimensions.
///
/// # Errors
///
/// Returns [`ValidationError::SizeOutOfRange`] for a zero side or one over
/// [`MAX_EXPORT_SIDE`].
pub fn validate_export_size(width: u32, height: u32) -> Result<(), ValidationError> {
    check_size("export", width, height, MAX_EXPORT_SIDE)
}

/// Validate preview dimensions.
///
/// # Errors
///
/// Returns [`ValidationError::SizeOutOfRange`] for a zero side or one over
/// [`MAX_PREVIEW_SIDE`].
pub fn validate_preview_size(width: u32, height: u32) -> Result<(), ValidationError> {
    check_size("preview", width, height, MAX_PREVIEW_SIDE)
}

fn check_size(
    which: &'static str,
    width: u32,
    height: u32,
    max: u32,
) -> Result<(), ValidationError> {
    if (1..=max).contains(&width) && (1..=max).contains(&height) {
        Ok(())
    } else {
        Err(ValidationError::SizeOutOfRange {
            which,
            width,
            height,
            max,
        })
    }
}

/// Validate an animation time in frames.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTime`] for negative or non-finite values.
pub fn validate_time(time: f64) -> Result<(), ValidationError> {
    if time.is_finite() && time >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidTime)
    }
}

/// Validate a source image data URL.
///
/// # Errors
///
/// Returns [`ValidationError::SourceTooLarge`] past [`MAX_DATA_URL_LEN`]
/// bytes and [`ValidationError::SourceNotImage`] if it is not a
/// `data:image/` URL.
pub fn validate_source(data_url: &str) -> Result<(), ValidationError> {
    if data_url.len() > MAX_DATA_URL_LEN {
        return Err(ValidationError::SourceTooLarge);
    }
    if !data_url.starts_with("data:image/") {
        return Err(ValidationError::SourceNotImage);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn poster_ids() {
        assert!(validate_poster_id("0b9c1a52-6f3e-4a5e-9a7e-2d7f1c8e4b10").is_ok());
        assert!(validate_poster_id("abc_123").is_ok());
        assert!(matches!(
            validate_poster_id(""),
            Err(ValidationError::PosterIdInvalidChars)
        ));
        assert!(matches!(
            validate_poster_id("../etc/passwd"),
            Err(ValidationError::PosterIdInvalidChars)
        ));
        assert!(matches!(
            validate_poster_id(&"a".repeat(65)),
            Err(ValidationError::PosterIdTooLong)
        ));
    }

    #[test]
    fn sizes() {
        assert!(validate_export_size(1000, 1500).is_ok());
        assert!(validate_export_size(MAX_EXPORT_SIDE, 1).is_ok());
        assert!(validate_export_size(0, 1500).is_err());
        assert!(validate_export_size(1000, MAX_EXPORT_SIDE + 1).is_err());
        let err = validate_preview_size(5000, 10).unwrap_err();
        assert_eq!(err.to_string(), "preview size 5000x10 out of range (1..=4000)");
        assert_eq!(err.kind(), "size");
    }

    #[test]
    fn times_and_sources() {
        assert!(validate_time(0.0).is_ok());
        assert!(validate_time(120.5).is_ok());
        assert!(validate_time(-1.0).is_err());
        assert!(validate_time(f64::NAN).is_err());
        assert!(validate_source("data:image/png;base64,AAAA").is_ok());
        assert!(matches!(
            validate_source("data:text/plain,hi"),
            Err(ValidationError::SourceNotImage)
        ));
    }

    proptest! {
        #[test]
        fn seeds_within_limit_pass(seed in ".{0,256}") {
            prop_assert!(validate_seed(&seed).is_ok());
        }

        #[test]
        fn uuid_like_ids_pass(id in "[a-f0-9-]{1,64}") {
            prop_assert!(validate_poster_id(&id).is_ok());
        }
    }
}
