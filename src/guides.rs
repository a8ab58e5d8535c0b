use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::GuidesConfig;

/// A finalized, marker-substituted guide document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guide {
    pub source_video_id: String,
    pub document_text: String,
    pub created_at: DateTime<Utc>,
}

impl Guide {
    pub fn new(source_video_id: String, document_text: String) -> Self {
        Self {
            source_video_id,
            document_text,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GuideStoreError {
    #[error("invalid guide filename: {0}")]
    InvalidFilename(String),

    #[error("guide not found: {0}")]
    NotFound(String),

    #[error("failed to decode guide {0}: {1}")]
    Corrupt(String, serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Append-mostly JSON store for finalized guides.
///
/// Guides are immutable once persisted: saving under an existing name
/// creates a new timestamped file instead of overwriting.
#[derive(Clone)]
pub struct GuideStore {
    config: GuidesConfig,
}

impl GuideStore {
    pub fn new(config: GuidesConfig) -> Self {
        Self { config }
    }

    /// Persist a guide under a caller-supplied filename, returning the
    /// filename actually used.
    pub async fn save(&self, guide: &Guide, filename: &str) -> Result<String, GuideStoreError> {
        let filename = validate_filename(filename)?;
        tokio::fs::create_dir_all(&self.config.guides_dir).await?;

        let mut target = filename.clone();
        let mut path = self.guide_path(&target);
        if tokio::fs::metadata(&path).await.is_ok() {
            // Never overwrite a persisted guide.
            let stem = target.trim_end_matches(".json").to_string();
            target = format!("{}-{}.json", stem, Utc::now().timestamp_millis());
            path = self.guide_path(&target);
            warn!("Guide {} already exists, saving as {}", filename, target);
        }

        let json = serde_json::to_string_pretty(guide)
            .map_err(|e| GuideStoreError::Corrupt(target.clone(), e))?;
        tokio::fs::write(&path, json).await?;

        info!("💾 Guide saved: {}", path.display());
        Ok(target)
    }

    /// List persisted guide filenames, lexicographically sorted.
    pub async fn list(&self) -> Result<Vec<String>, GuideStoreError> {
        tokio::fs::create_dir_all(&self.config.guides_dir).await?;

        let mut filenames = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.config.guides_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(".json") {
                filenames.push(name);
            }
        }

        filenames.sort();
        Ok(filenames)
    }

    /// Load a persisted guide.
    pub async fn get(&self, filename: &str) -> Result<Guide, GuideStoreError> {
        let filename = validate_filename(filename)?;
        let path = self.guide_path(&filename);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GuideStoreError::NotFound(filename));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| GuideStoreError::Corrupt(filename, e))
    }

    fn guide_path(&self, filename: &str) -> PathBuf {
        self.config.guides_dir.join(filename)
    }
}

/// Guide filenames are opaque tokens from the caller; anything that could
/// traverse outside the guides root is rejected. The `.json` extension is
/// appended when missing.
fn validate_filename(filename: &str) -> Result<String, GuideStoreError> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return Err(GuideStoreError::InvalidFilename(filename.to_string()));
    }

    if filename.ends_with(".json") {
        Ok(filename.to_string())
    } else {
        Ok(format!("{}.json", filename))
    }
}
