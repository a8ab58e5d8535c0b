use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::config::SynthesisConfig;
use crate::markers::{Marker, MarkerKind};
use crate::timecode;

/// A deduplicated unit of synthesis work derived from one or more markers.
///
/// Identity is `(source_video_id, kind, start_instant, duration_seconds)`;
/// two requests with the same identity are synthesis-equivalent and share a
/// single ffmpeg invocation per batch. `start_token` only feeds the artifact
/// filename and is excluded from identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub source_video_id: String,
    pub kind: MarkerKind,
    pub start_instant: u64,
    pub duration_seconds: Option<u64>,
    pub start_token: String,
}

impl ExtractionRequest {
    pub fn from_marker(marker: &Marker, source_video_id: &str) -> Self {
        let duration_seconds = match marker.kind {
            MarkerKind::Point => None,
            MarkerKind::Range => Some(marker.duration_seconds()),
        };

        Self {
            source_video_id: source_video_id.to_string(),
            kind: marker.kind,
            start_instant: marker.start_instant,
            duration_seconds,
            start_token: timecode::to_safe_token(marker.start_text()),
        }
    }

    fn identity(&self) -> (&str, MarkerKind, u64, Option<u64>) {
        (
            &self.source_video_id,
            self.kind,
            self.start_instant,
            self.duration_seconds,
        )
    }
}

impl PartialEq for ExtractionRequest {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for ExtractionRequest {}

impl Hash for ExtractionRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

/// Outcome of executing one extraction request.
///
/// Created once the ffmpeg invocation finished and the output file was
/// checked on disk. Artifacts with `present_on_disk == false` are recorded
/// as failures and never referenced in rendered output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisArtifact {
    pub request: ExtractionRequest,
    /// Server-relative URL of the artifact, usable by a renderer.
    pub relative_path: String,
    pub present_on_disk: bool,
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("source video not found: {0}")]
    SourceMissing(PathBuf),

    #[error("failed to prepare artifact directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Drives ffmpeg to synthesize screenshots and clips for extraction
/// requests, with bounded concurrency and per-request failure isolation.
#[derive(Clone)]
pub struct MediaSynthesizer {
    config: SynthesisConfig,
    worker_semaphore: Arc<Semaphore>,
}

impl MediaSynthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        let workers = config.max_workers.max(1);
        Self {
            config,
            worker_semaphore: Arc::new(Semaphore::new(workers)),
        }
    }

    /// Canonical artifact filename for a request: the source video's
    /// basename joined with the filesystem-safe start token.
    pub fn artifact_filename(&self, request: &ExtractionRequest) -> String {
        let stem = Path::new(&request.source_video_id)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| request.source_video_id.clone());

        match request.kind {
            MarkerKind::Point => format!("{}_{}.jpg", stem, request.start_token),
            MarkerKind::Range => format!("{}_{}.gif", stem, request.start_token),
        }
    }

    /// Absolute on-disk path and server-relative URL for a request's
    /// artifact.
    pub fn artifact_paths(&self, request: &ExtractionRequest) -> (PathBuf, String) {
        let filename = self.artifact_filename(request);
        match request.kind {
            MarkerKind::Point => (
                self.config.screenshots_dir.join(&filename),
                format!("/screenshots/{}", filename),
            ),
            MarkerKind::Range => (
                self.config.gifs_dir.join(&filename),
                format!("/gifs/{}", filename),
            ),
        }
    }

    /// Execute all distinct requests against the source video.
    ///
    /// A missing source video fails the whole pass before any per-request
    /// attempt. Individual failures (non-zero exit, missing output, timeout)
    /// are recorded per request and never abort siblings. Artifacts already
    /// on disk at their canonical path short-circuit without invoking
    /// ffmpeg, which makes repeated renders of the same guide cheap.
    pub async fn synthesize(
        &self,
        source_video_path: &Path,
        requests: &[ExtractionRequest],
    ) -> Result<HashMap<ExtractionRequest, SynthesisArtifact>, SynthesisError> {
        if tokio::fs::metadata(source_video_path).await.is_err() {
            return Err(SynthesisError::SourceMissing(
                source_video_path.to_path_buf(),
            ));
        }

        tokio::fs::create_dir_all(&self.config.screenshots_dir).await?;
        tokio::fs::create_dir_all(&self.config.gifs_dir).await?;

        // Dedup on request identity, keeping first appearance.
        let mut seen = HashSet::new();
        let distinct: Vec<ExtractionRequest> = requests
            .iter()
            .filter(|r| seen.insert((*r).clone()))
            .cloned()
            .collect();

        if distinct.is_empty() {
            return Ok(HashMap::new());
        }

        info!(
            "🎬 Synthesizing {} artifact(s) from {} ({} requested)",
            distinct.len(),
            source_video_path.display(),
            requests.len()
        );

        let (tx, mut rx) = mpsc::channel(distinct.len());

        for request in distinct {
            let synthesizer = self.clone();
            let source = source_video_path.to_path_buf();
            let tx = tx.clone();
            let semaphore = Arc::clone(&self.worker_semaphore);

            tokio::spawn(async move {
                let _permit = semaphore.acquire().await.unwrap();
                let artifact = synthesizer.execute_request(&source, &request).await;
                if tx.send((request, artifact)).await.is_err() {
                    warn!("Synthesis result receiver dropped");
                }
            });
        }
        drop(tx);

        let mut artifacts = HashMap::new();
        while let Some((request, artifact)) = rx.recv().await {
            artifacts.insert(request, artifact);
        }

        let failed = artifacts.values().filter(|a| !a.present_on_disk).count();
        if failed > 0 {
            warn!(
                "⚠️ Synthesis finished with {}/{} failed artifact(s)",
                failed,
                artifacts.len()
            );
        } else {
            info!("✅ Synthesized {} artifact(s)", artifacts.len());
        }

        Ok(artifacts)
    }

    /// Run one extraction, short-circuiting if the artifact already exists.
    async fn execute_request(
        &self,
        source_video_path: &Path,
        request: &ExtractionRequest,
    ) -> SynthesisArtifact {
        let (output_path, relative_path) = self.artifact_paths(request);

        if tokio::fs::metadata(&output_path).await.is_ok() {
            debug!("♻️ Artifact already on disk: {}", output_path.display());
            return SynthesisArtifact {
                request: request.clone(),
                relative_path,
                present_on_disk: true,
            };
        }

        let present_on_disk = match self
            .invoke_ffmpeg(source_video_path, request, &output_path)
            .await
        {
            Ok(()) => tokio::fs::metadata(&output_path).await.is_ok(),
            Err(e) => {
                warn!(
                    "❌ Extraction failed at {} for {}: {}",
                    request.start_token, request.source_video_id, e
                );
                false
            }
        };

        SynthesisArtifact {
            request: request.clone(),
            relative_path,
            present_on_disk,
        }
    }

    async fn invoke_ffmpeg(
        &self,
        source_video_path: &Path,
        request: &ExtractionRequest,
        output_path: &Path,
    ) -> anyhow::Result<()> {
        let source = source_video_path.to_string_lossy().to_string();
        let output = output_path.to_string_lossy().to_string();
        let start = request.start_instant.to_string();

        let mut command = tokio::process::Command::new(&self.config.ffmpeg_path);
        match request.kind {
            MarkerKind::Point => {
                command.args([
                    "-i", source.as_str(),
                    "-ss", start.as_str(),
                    "-vframes", "1",
                    "-q:v", "2",
                    "-y",
                    output.as_str(),
                ]);
            }
            MarkerKind::Range => {
                let duration = request.duration_seconds.unwrap_or(0).to_string();
                let filters = format!(
                    "fps={},scale={}:-1:flags=lanczos",
                    self.config.gif_fps, self.config.gif_width
                );
                command.args([
                    "-i", source.as_str(),
                    "-ss", start.as_str(),
                    "-t", duration.as_str(),
                    "-vf", filters.as_str(),
                    "-loop", "0",
                    "-y",
                    output.as_str(),
                ]);
            }
        }

        debug!(
            "🎞️ Extracting {:?} at {}s from {}",
            request.kind, request.start_instant, source
        );

        // On timeout the child is left to finish on its own; a complete
        // output file still serves the next idempotent pass.
        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let status = tokio::time::timeout(timeout, command.status())
            .await
            .map_err(|_| anyhow::anyhow!("extraction timed out after {:?}", timeout))??;

        if !status.success() {
            anyhow::bail!("ffmpeg exited with {}", status);
        }

        Ok(())
    }
}
