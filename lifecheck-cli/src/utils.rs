//! Common utility functions shared across CLI commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use lifecheck_core::{gateway::guess_mime, MediaPayload};
use tracing::debug;

/// Default staging directory for clips under check.
pub fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("lifecheck-videos")
}

/// Read a local file into a payload, deriving its content type from the
/// extension the way a browser upload would declare it.
pub async fn load_media(path: &Path) -> Result<MediaPayload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let content_type = guess_mime(path);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());

    debug!(
        path = %path.display(),
        bytes = bytes.len(),
        content_type,
        "Loaded media"
    );

    Ok(MediaPayload::new(
        bytes,
        Some(content_type.to_string()),
        file_name,
    ))
}

/// Parse an RFC 3339 instant into UTC.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value.trim())
        .with_context(|| format!("Invalid RFC 3339 timestamp: {value}"))?;
    Ok(parsed.with_timezone(&Utc))
}

/// Format an instant as a human-readable UTC string.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instant_normalizes_offset() {
        let at = parse_instant("2026-03-01T12:00:00+02:00").unwrap();
        assert_eq!(format_timestamp(at), "2026-03-01 10:00:00 UTC");
    }

    #[test]
    fn test_parse_instant_rejects_garbage() {
        let err = parse_instant("last tuesday").unwrap_err();
        assert!(format!("{err:#}").contains("Invalid RFC 3339 timestamp"));
    }

    #[tokio::test]
    async fn test_load_media_derives_content_type() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("clip.MOV");
        std::fs::write(&path, b"frames").unwrap();

        let payload = load_media(&path).await.unwrap();

        assert_eq!(payload.content_type.as_deref(), Some("video/quicktime"));
        assert_eq!(payload.file_name.as_deref(), Some("clip.MOV"));
        assert_eq!(payload.len(), 6);
    }

    #[tokio::test]
    async fn test_load_media_missing_file() {
        let err = load_media(Path::new("/nonexistent/clip.mp4"))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read file"));
    }
}
