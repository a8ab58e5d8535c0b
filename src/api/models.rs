//! API data models

use serde::Deserialize;

/// Request an upload of a stored video to the vision service
#[derive(Debug, Deserialize)]
pub struct VisionUploadRequest {
    #[serde(rename = "videoFilename")]
    pub video_filename: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// Analyze an already-uploaded video URI with a prompt
#[derive(Debug, Deserialize)]
pub struct VisionAnalyzeRequest {
    pub uri: String,
    pub prompt: String,
}

/// Batch point-in-time screenshot synthesis
#[derive(Debug, Deserialize)]
pub struct ScreenshotsRequest {
    #[serde(rename = "videoFilename")]
    pub video_filename: String,
    pub timestamps: Vec<String>,
}

/// Full video-to-guide generation
#[derive(Debug, Deserialize)]
pub struct GenerateGuideRequest {
    #[serde(rename = "videoFilename")]
    pub video_filename: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub prompt: String,
}

/// Persist a finalized guide
#[derive(Debug, Deserialize)]
pub struct SaveGuideRequest {
    pub text: String,
    pub filename: String,
    #[serde(rename = "videoFilename", default)]
    pub video_filename: Option<String>,
}
