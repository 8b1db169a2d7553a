//! Upload validation for reference photos and verification clips.
//!
//! Checks run in a fixed order and the first failing rule wins:
//! empty payload, declared Content-Type family, then size ceiling.
//! Only the declared type string is inspected; bytes are never sniffed.

use thiserror::Error;

/// Maximum reference photo size in bytes (10 MiB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Maximum verification clip size in bytes (50 MiB)
pub const MAX_VIDEO_SIZE: usize = 50 * 1024 * 1024;

/// Media family an upload is expected to belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Reference profile photo (`image/*`)
    Image,
    /// Verification clip (`video/*`)
    Video,
}

impl MediaKind {
    /// Content-Type prefix a payload of this kind must declare.
    pub fn mime_prefix(self) -> &'static str {
        match self {
            Self::Image => "image/",
            Self::Video => "video/",
        }
    }

    /// Size ceiling in bytes.
    pub fn max_size(self) -> usize {
        match self {
            Self::Image => MAX_IMAGE_SIZE,
            Self::Video => MAX_VIDEO_SIZE,
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

/// An uploaded file as received at request ingress.
#[derive(Debug, Clone, Default)]
pub struct MediaPayload {
    /// Raw bytes
    pub data: Vec<u8>,
    /// Content-Type declared by the client (if provided)
    pub content_type: Option<String>,
    /// Original filename hint (if provided)
    pub file_name: Option<String>,
}

impl MediaPayload {
    pub fn new(
        data: Vec<u8>,
        content_type: Option<String>,
        file_name: Option<String>,
    ) -> Self {
        Self {
            data,
            content_type,
            file_name,
        }
    }

    /// Declared size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Why an upload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("No {0} file provided")]
    Empty(&'static str),

    #[error("Invalid file type. Please upload {expected} file.")]
    WrongType {
        expected: &'static str,
        declared: Option<String>,
    },

    #[error("{noun} file too large: {size} bytes exceeds maximum of {max_mb} MB")]
    TooLarge {
        noun: &'static str,
        size: usize,
        max_mb: usize,
    },
}

/// Validate a payload against the rules for `kind`.
pub fn validate(payload: &MediaPayload, kind: MediaKind) -> Result<(), Rejection> {
    if payload.is_empty() {
        return Err(Rejection::Empty(kind.noun()));
    }

    validate_content_type(payload.content_type.as_deref(), kind)?;
    validate_file_size(payload.len(), kind)
}

/// Checks that a Content-Type is present and starts with the family prefix.
pub fn validate_content_type(content_type: Option<&str>, kind: MediaKind) -> Result<(), Rejection> {
    let expected = match kind {
        MediaKind::Image => "an image",
        MediaKind::Video => "a video",
    };

    match content_type {
        Some(ct) if ct.to_ascii_lowercase().starts_with(kind.mime_prefix()) => Ok(()),
        declared => Err(Rejection::WrongType {
            expected,
            declared: declared.map(str::to_string),
        }),
    }
}

/// Checks the size ceiling for `kind`. Exactly the ceiling is accepted.
pub fn validate_file_size(size: usize, kind: MediaKind) -> Result<(), Rejection> {
    let max = kind.max_size();
    if size > max {
        Err(Rejection::TooLarge {
            noun: kind.noun(),
            size,
            max_mb: max / (1024 * 1024),
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(len: usize, content_type: Option<&str>) -> MediaPayload {
        MediaPayload::new(vec![0u8; len], content_type.map(str::to_string), None)
    }

    #[test]
    fn test_empty_payload_rejected_regardless_of_type() {
        for ct in [Some("video/mp4"), Some("text/plain"), None] {
            assert_eq!(
                validate(&payload(0, ct), MediaKind::Video),
                Err(Rejection::Empty("video"))
            );
        }
        assert_eq!(
            validate(&payload(0, Some("image/png")), MediaKind::Image),
            Err(Rejection::Empty("image"))
        );
    }

    #[test]
    fn test_video_requires_video_prefix() {
        assert!(validate(&payload(16, Some("video/mp4")), MediaKind::Video).is_ok());
        assert!(validate(&payload(16, Some("video/webm")), MediaKind::Video).is_ok());
        assert!(validate(&payload(16, Some("VIDEO/MP4")), MediaKind::Video).is_ok());

        for ct in ["image/png", "application/octet-stream", "text/html"] {
            assert!(matches!(
                validate(&payload(16, Some(ct)), MediaKind::Video),
                Err(Rejection::WrongType { .. })
            ));
        }
    }

    #[test]
    fn test_content_type_match_ignores_case() {
        assert!(validate(&payload(16, Some("Video/QuickTime")), MediaKind::Video).is_ok());
        assert!(validate(&payload(16, Some("IMAGE/JPEG")), MediaKind::Image).is_ok());
        assert!(matches!(
            validate(&payload(16, Some("VIDEO/MP4")), MediaKind::Image),
            Err(Rejection::WrongType { expected: "an image", .. })
        ));
    }

    #[test]
    fn test_missing_content_type_rejected() {
        assert!(matches!(
            validate(&payload(16, None), MediaKind::Image),
            Err(Rejection::WrongType { declared: None, .. })
        ));
    }

    #[test]
    fn test_wrong_type_wins_over_size() {
        // Type is checked before size
        let oversized = payload(MAX_VIDEO_SIZE + 1, Some("image/jpeg"));
        assert!(matches!(
            validate(&oversized, MediaKind::Video),
            Err(Rejection::WrongType { .. })
        ));
    }

    #[test]
    fn test_size_ceilings() {
        assert!(validate_file_size(MAX_IMAGE_SIZE, MediaKind::Image).is_ok());
        assert!(validate_file_size(MAX_IMAGE_SIZE + 1, MediaKind::Image).is_err());
        assert!(validate_file_size(MAX_VIDEO_SIZE, MediaKind::Video).is_ok());
        assert!(validate_file_size(MAX_VIDEO_SIZE + 1, MediaKind::Video).is_err());
        // A video-sized image is too large
        assert!(validate_file_size(MAX_IMAGE_SIZE * 2, MediaKind::Image).is_err());
    }

    #[test]
    fn test_too_large_message() {
        let err = validate_file_size(MAX_IMAGE_SIZE + 1, MediaKind::Image).unwrap_err();
        assert!(err.to_string().contains("10 MB"));
    }
}
