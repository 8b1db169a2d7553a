//! Scoped staging of uploaded video bytes.
//!
//! A [`StagedVideo`] owns its file for the duration of one liveness call. The
//! file is removed exactly once: either by an explicit [`StagedVideo::release`]
//! or when the guard is dropped on any other exit path. Removal failures are
//! logged and never surface to the caller.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::{LivenessError, Result};

/// Maximum length kept from a client-supplied filename.
const MAX_HINT_LEN: usize = 64;

/// Staging area for verification clips.
#[derive(Debug, Clone)]
pub struct TemporaryMediaStore {
    dir: PathBuf,
}

impl TemporaryMediaStore {
    /// Create the store, creating its directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            LivenessError::Internal(format!(
                "Could not initialize staging directory {}: {e}",
                dir.display()
            ))
        })?;
        Ok(Self { dir })
    }

    /// Staging directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` under a fresh unique name and return the owning guard.
    #[instrument(level = "debug", skip(self, bytes), fields(staged_bytes = bytes.len()))]
    pub async fn stage(&self, bytes: Vec<u8>, hint: Option<&str>) -> Result<StagedVideo> {
        let dir = self.dir.clone();
        let name = unique_name(hint);
        let len = bytes.len() as u64;

        let path = tokio::task::spawn_blocking(move || persist_atomically(&dir, &name, &bytes))
            .await
            .map_err(|e| LivenessError::Internal(format!("Staging task failed: {e}")))??;

        debug!(path = %path.display(), "Staged video");
        Ok(StagedVideo {
            path,
            len,
            released: false,
        })
    }
}

/// A staged video file, removed when released or dropped.
#[derive(Debug)]
pub struct StagedVideo {
    path: PathBuf,
    len: u64,
    released: bool,
}

impl StagedVideo {
    /// Resolved location of the staged file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Source byte length.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Delete the staged file now.
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Released staged video"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Staged video already gone");
            }
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to clean up staged video"
            ),
        }
    }
}

impl Drop for StagedVideo {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Write `bytes` to `dir/name` via a temp file in the same directory and a rename,
/// so a crash never leaves a partially written file under the final name.
pub(crate) fn persist_atomically(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    let target = dir.join(name);
    tmp.persist_noclobber(&target)
        .map_err(|e| LivenessError::Internal(format!("Failed to persist {}: {}", name, e.error)))?;
    Ok(target)
}

/// `<uuid>_<sanitized hint>`
pub(crate) fn unique_name(hint: Option<&str>) -> String {
    format!("{}_{}", Uuid::new_v4(), sanitize_hint(hint.unwrap_or("")))
}

/// Keep only the final path component and a conservative character set.
pub(crate) fn sanitize_hint(hint: &str) -> String {
    let base = hint.rsplit(['/', '\\']).next().unwrap_or("");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_HINT_LEN)
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
