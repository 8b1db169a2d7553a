//! Reference photo storage.
//!
//! Photos are stored flat under one upload directory. User records hold only
//! the relative file name; [`PhotoStore::resolve`] turns it back into a path.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{info, instrument};

use crate::error::{LivenessError, Result};
use crate::staging::{persist_atomically, unique_name};

#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    /// Create the store, creating its directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            LivenessError::Internal(format!(
                "Could not initialize upload directory {}: {e}",
                dir.display()
            ))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a stored relative reference to a path inside the upload directory.
    ///
    /// Returns `None` for empty references or ones that try to leave the
    /// directory. Existence is not checked here.
    pub fn resolve(&self, reference: &str) -> Option<PathBuf> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }

        let relative = Path::new(reference);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        contained.then(|| self.dir.join(relative))
    }

    /// Resolve a reference and require that the file exists.
    pub async fn resolve_existing(&self, reference: &str) -> Option<PathBuf> {
        let path = self.resolve(reference)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(path),
            _ => None,
        }
    }

    /// Save a new reference photo and return its relative reference.
    #[instrument(level = "debug", skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn save(&self, bytes: Vec<u8>, hint: Option<&str>) -> Result<String> {
        let dir = self.dir.clone();
        let name = unique_name(hint);

        let stored = name.clone();
        tokio::task::spawn_blocking(move || persist_atomically(&dir, &stored, &bytes))
            .await
            .map_err(|e| LivenessError::Internal(format!("Photo save task failed: {e}")))??;

        info!(reference = %name, "Saved reference photo");
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_rejects_escapes() {
        let tmp = TempDir::new().unwrap();
        let store = PhotoStore::new(tmp.path()).unwrap();

        assert_eq!(
            store.resolve("abc_me.png"),
            Some(tmp.path().join("abc_me.png"))
        );
        assert!(store.resolve("").is_none());
        assert!(store.resolve("   ").is_none());
        assert!(store.resolve("../secret.png").is_none());
        assert!(store.resolve("/etc/passwd").is_none());
    }

    #[tokio::test]
    async fn test_save_then_resolve_existing() {
        let tmp = TempDir::new().unwrap();
        let store = PhotoStore::new(tmp.path().join("uploads")).unwrap();

        let reference = store
            .save(b"\x89PNG fake".to_vec(), Some("portrait.png"))
            .await
            .unwrap();
        assert!(reference.ends_with("_portrait.png"));

        let path = store.resolve_existing(&reference).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"\x89PNG fake");

        assert!(store.resolve_existing("missing.png").await.is_none());
    }
}
