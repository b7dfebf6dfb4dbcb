//! Blob storage for uploaded flight logos.
//!
//! Handlers talk to the [`BlobStore`] trait so tests can swap the backend;
//! the default [`DiskStore`] writes files under the configured uploads
//! directory and hands back the stored filename.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Replace every character outside `[A-Za-z0-9.-]` with an underscore.
/// Strips path separators, so a hostile original filename cannot escape
/// the uploads directory.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist `data` under a name derived from `original_name` and return
    /// the stored filename.
    async fn put(&self, original_name: &str, data: &[u8]) -> Result<String>;
}

/// Filesystem-backed store. Stored names are prefixed with the upload time
/// in milliseconds so repeated uploads of the same file never collide.
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create uploads directory {}", dir.display()))?;
        Ok(Self { dir })
    }
}

#[async_trait]
impl BlobStore for DiskStore {
    async fn put(&self, original_name: &str, data: &[u8]) -> Result<String> {
        let stored_name = format!(
            "{}-{}",
            chrono::Utc::now().timestamp_millis(),
            sanitize_filename(original_name)
        );
        let path = self.dir.join(&stored_name);
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write upload to {}", path.display()))?;
        Ok(stored_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_safe_characters() {
        assert_eq!(sanitize_filename("logo-v2.png"), "logo-v2.png");
        assert_eq!(sanitize_filename("Airline Logo (1).png"), "Airline_Logo__1_.png");
    }

    #[test]
    fn test_sanitize_strips_path_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("a/b\\c"), "a_b_c");
    }

    #[tokio::test]
    async fn test_disk_store_put_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path()).unwrap();

        let name = store.put("tail fin.png", b"png-bytes").await.unwrap();
        assert!(name.ends_with("-tail_fin.png"));

        let written = std::fs::read(dir.path().join(&name)).unwrap();
        assert_eq!(written, b"png-bytes");
    }
}
