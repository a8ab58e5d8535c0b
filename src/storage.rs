use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::StorageConfig;

/// A validated upload persisted to the uploads directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredVideo {
    pub filename: String,
    pub original_name: String,
    pub size: u64,
    pub path: PathBuf,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("only video files are allowed: {0}")]
    InvalidFile(String),

    #[error("file exceeds the upload size limit: {0} bytes")]
    TooLarge(u64),

    #[error("invalid video filename: {0}")]
    InvalidFilename(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Disk-backed store for uploaded source videos.
///
/// The store only supplies paths to the rest of the system; it never
/// manages the lifecycle of the artifacts derived from them.
#[derive(Clone)]
pub struct UploadStore {
    config: StorageConfig,
}

impl UploadStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Validate and persist an uploaded video, returning its server-side
    /// identity. Server-side names embed a timestamp and a short hash so
    /// concurrent uploads of the same file never collide.
    pub async fn store(
        &self,
        original_name: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<StoredVideo, StorageError> {
        if self.config.max_file_size > 0 && data.len() as u64 > self.config.max_file_size {
            return Err(StorageError::TooLarge(data.len() as u64));
        }

        let extension = Path::new(original_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if !self.config.allowed_extensions.contains(&extension) {
            return Err(StorageError::InvalidFile(original_name.to_string()));
        }

        let mime_re =
            Regex::new(r"(?i)^(video/(mp4|quicktime|x-msvideo|x-matroska|webm)|application/octet-stream)$")
                .unwrap();
        if !mime_re.is_match(mime_type) {
            return Err(StorageError::InvalidFile(format!(
                "{} ({})",
                original_name, mime_type
            )));
        }

        let millis = Utc::now().timestamp_millis();
        let digest = md5::compute(format!("{}-{}", original_name, millis));
        let suffix = format!("{:x}", digest);
        let filename = format!("video-{}-{}.{}", millis, &suffix[..8], extension);

        tokio::fs::create_dir_all(&self.config.uploads_dir).await?;
        let path = self.config.uploads_dir.join(&filename);
        tokio::fs::write(&path, data).await?;

        info!(
            "📥 Stored upload {} as {} ({} bytes)",
            original_name,
            filename,
            data.len()
        );

        Ok(StoredVideo {
            filename,
            original_name: original_name.to_string(),
            size: data.len() as u64,
            path,
        })
    }

    /// Resolve a previously stored filename to its on-disk path. Filenames
    /// are opaque tokens: anything that could escape the uploads root is
    /// rejected.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, StorageError> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(StorageError::InvalidFilename(filename.to_string()));
        }

        let path = self.config.uploads_dir.join(filename);
        debug!("Resolved video path: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_for(dir: &Path) -> UploadStore {
        UploadStore::new(StorageConfig {
            uploads_dir: dir.to_path_buf(),
            max_file_size: 1024,
            allowed_extensions: vec!["mp4".to_string(), "webm".to_string()],
        })
    }

    #[tokio::test]
    async fn test_store_accepts_valid_video() {
        let temp = TempDir::new().unwrap();
        let store = store_for(temp.path());

        let stored = store
            .store("demo.mp4", "video/mp4", b"fake video bytes")
            .await
            .unwrap();

        assert!(stored.filename.starts_with("video-"));
        assert!(stored.filename.ends_with(".mp4"));
        assert_eq!(stored.original_name, "demo.mp4");
        assert!(stored.path.exists());
    }

    #[tokio::test]
    async fn test_store_rejects_disallowed_extension() {
        let temp = TempDir::new().unwrap();
        let store = store_for(temp.path());

        let result = store.store("notes.txt", "video/mp4", b"data").await;
        assert!(matches!(result, Err(StorageError::InvalidFile(_))));
    }

    #[tokio::test]
    async fn test_store_rejects_bad_mime_type() {
        let temp = TempDir::new().unwrap();
        let store = store_for(temp.path());

        let result = store.store("demo.mp4", "text/plain", b"data").await;
        assert!(matches!(result, Err(StorageError::InvalidFile(_))));
    }

    #[tokio::test]
    async fn test_store_enforces_size_limit() {
        let temp = TempDir::new().unwrap();
        let store = store_for(temp.path());

        let oversized = vec![0u8; 2048];
        let result = store.store("demo.mp4", "video/mp4", &oversized).await;
        assert!(matches!(result, Err(StorageError::TooLarge(_))));
    }

    #[tokio::test]
    async fn test_octet_stream_mime_is_accepted() {
        let temp = TempDir::new().unwrap();
        let store = store_for(temp.path());

        let stored = store
            .store("demo.webm", "application/octet-stream", b"bytes")
            .await
            .unwrap();
        assert!(stored.filename.ends_with(".webm"));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let temp = TempDir::new().unwrap();
        let store = store_for(temp.path());

        assert!(store.resolve("../secret.mp4").is_err());
        assert!(store.resolve("a/b.mp4").is_err());
        assert!(store.resolve("").is_err());
        assert!(store.resolve("video-1-abc.mp4").is_ok());
    }
}
