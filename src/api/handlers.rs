//! API request handlers

use anyhow::Result;
use serde_json::Value;

use crate::guides::{Guide, GuideStore};
use crate::markers::MarkerKind;
use crate::pipeline::GuidePipeline;
use crate::storage::UploadStore;
use crate::synthesis::{ExtractionRequest, MediaSynthesizer};
use crate::timecode;
use crate::vision::VisionClient;

use super::models::{GenerateGuideRequest, SaveGuideRequest};

/// Handle health check requests
pub async fn health_check() -> Result<Value> {
    Ok(serde_json::json!({
        "status": "OK",
        "service": "video-guide",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Upload a stored video to the vision service, returning its file URI
pub async fn vision_upload(
    vision: &dyn VisionClient,
    uploads: &UploadStore,
    video_filename: &str,
    mime_type: &str,
) -> Result<Value> {
    let video_path = uploads.resolve(video_filename)?;
    let uri = vision.upload_video(&video_path, mime_type).await?;

    Ok(serde_json::json!({
        "success": true,
        "uri": uri
    }))
}

/// Analyze an uploaded video URI with a prompt
pub async fn vision_analyze(vision: &dyn VisionClient, uri: &str, prompt: &str) -> Result<Value> {
    let document_text = vision.analyze(uri, prompt).await?;

    Ok(serde_json::json!({
        "success": true,
        "result": { "gemini_response": document_text }
    }))
}

/// Synthesize one screenshot per requested timestamp.
///
/// Returns a timestamp-to-URL map with `null` for failed extractions so
/// the caller can render what succeeded.
pub async fn batch_screenshots(
    synthesizer: &MediaSynthesizer,
    uploads: &UploadStore,
    video_filename: &str,
    timestamps: &[String],
) -> Result<Value> {
    let video_path = uploads.resolve(video_filename)?;

    let requests: Vec<ExtractionRequest> = timestamps
        .iter()
        .map(|ts| ExtractionRequest {
            source_video_id: video_filename.to_string(),
            kind: MarkerKind::Point,
            start_instant: timecode::to_ordinal(ts),
            duration_seconds: None,
            start_token: timecode::to_safe_token(ts),
        })
        .collect();

    let artifacts = synthesizer.synthesize(&video_path, &requests).await?;

    let mut results = serde_json::Map::new();
    for (timestamp, request) in timestamps.iter().zip(&requests) {
        let url = artifacts
            .get(request)
            .filter(|a| a.present_on_disk)
            .map(|a| Value::String(a.relative_path.clone()))
            .unwrap_or(Value::Null);
        results.insert(timestamp.clone(), url);
    }

    Ok(serde_json::json!({ "results": results }))
}

/// Run the full video-to-guide flow for a stored video
pub async fn generate_guide(
    pipeline: &GuidePipeline,
    vision: &dyn VisionClient,
    uploads: &UploadStore,
    request: &GenerateGuideRequest,
) -> Result<Value> {
    let video_path = uploads.resolve(&request.video_filename)?;

    let report = pipeline
        .generate(
            vision,
            &video_path,
            &request.video_filename,
            &request.mime_type,
            &request.prompt,
        )
        .await?;

    Ok(serde_json::json!({
        "success": true,
        "guide": report.final_text,
        "markersTotal": report.markers_total,
        "synthesized": report.synthesized,
        "failed": report.failed
    }))
}

/// Persist a finalized guide
pub async fn save_guide(guides: &GuideStore, request: &SaveGuideRequest) -> Result<Value> {
    let guide = Guide::new(
        request.video_filename.clone().unwrap_or_default(),
        request.text.clone(),
    );
    let saved = guides.save(&guide, &request.filename).await?;

    Ok(serde_json::json!({
        "success": true,
        "filename": saved
    }))
}

/// List persisted guides
pub async fn list_guides(guides: &GuideStore) -> Result<Value> {
    let filenames = guides.list().await?;
    Ok(serde_json::json!({ "guides": filenames }))
}

/// Load one persisted guide
pub async fn get_guide(guides: &GuideStore, filename: &str) -> Result<Value> {
    let guide = guides.get(filename).await?;

    Ok(serde_json::json!({
        "filename": filename,
        "sourceVideoId": guide.source_video_id,
        "createdAt": guide.created_at.to_rfc3339(),
        "text": guide.document_text
    }))
}
