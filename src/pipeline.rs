use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::markers;
use crate::reconcile;
use crate::render;
use crate::synthesis::{ExtractionRequest, MediaSynthesizer, SynthesisError};
use crate::vision::VisionClient;

/// Failure of a whole synthesis pass. Per-marker problems never surface
/// here: they degrade to placeholders inside the rendered document.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source video not found: {0}")]
    SourceMissing(PathBuf),

    #[error("vision analysis failed: {0}")]
    UpstreamAnalysis(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<SynthesisError> for PipelineError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::SourceMissing(path) => PipelineError::SourceMissing(path),
            SynthesisError::Io(e) => PipelineError::Io(e),
        }
    }
}

/// Summary of one marker-to-artifact pass over a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Document with every marker replaced by a reference or placeholder.
    pub final_text: String,
    pub markers_total: usize,
    pub synthesized: usize,
    pub failed: usize,
}

/// Orchestrates the marker-driven media synthesis pipeline:
/// parse → dedup → synthesize → reconcile → substitute.
pub struct GuidePipeline {
    synthesizer: MediaSynthesizer,
}

impl GuidePipeline {
    pub fn new(synthesizer: MediaSynthesizer) -> Self {
        Self { synthesizer }
    }

    /// Run one synthesis pass over already-generated document text.
    pub async fn run(
        &self,
        source_video_path: &Path,
        source_video_id: &str,
        document_text: &str,
    ) -> Result<PipelineReport, PipelineError> {
        let parsed = markers::parse(document_text);

        if parsed.is_empty() {
            debug!("No markers in document, nothing to synthesize");
            return Ok(PipelineReport {
                final_text: document_text.to_string(),
                markers_total: 0,
                synthesized: 0,
                failed: 0,
            });
        }

        info!(
            "📋 Guide contains {} marker(s) for {}",
            parsed.len(),
            source_video_id
        );

        let requests: Vec<ExtractionRequest> = parsed
            .iter()
            .map(|m| ExtractionRequest::from_marker(m, source_video_id))
            .collect();

        let artifacts = self
            .synthesizer
            .synthesize(source_video_path, &requests)
            .await?;

        let reconciled = reconcile::reconcile(&parsed, &artifacts, source_video_id);
        let synthesized = reconciled.iter().filter(|(_, a)| a.is_some()).count();
        let failed = reconciled.len() - synthesized;

        let final_text = render::substitute(document_text, &reconciled);

        Ok(PipelineReport {
            final_text,
            markers_total: reconciled.len(),
            synthesized,
            failed,
        })
    }

    /// Full video-to-guide flow: upload the video to the vision service,
    /// analyze it with the prompt, then run the synthesis pass over the
    /// generated text.
    pub async fn generate(
        &self,
        vision: &dyn VisionClient,
        source_video_path: &Path,
        source_video_id: &str,
        mime_type: &str,
        prompt: &str,
    ) -> Result<PipelineReport, PipelineError> {
        // Fail once, up front, before spending an upload on a missing file.
        if tokio::fs::metadata(source_video_path).await.is_err() {
            return Err(PipelineError::SourceMissing(
                source_video_path.to_path_buf(),
            ));
        }

        let uri = vision
            .upload_video(source_video_path, mime_type)
            .await
            .map_err(|e| PipelineError::UpstreamAnalysis(e.to_string()))?;

        let document_text = vision
            .analyze(&uri, prompt)
            .await
            .map_err(|e| PipelineError::UpstreamAnalysis(e.to_string()))?;

        self.run(source_video_path, source_video_id, &document_text)
            .await
    }
}
