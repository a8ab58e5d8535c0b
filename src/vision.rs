use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::config::VisionConfig;

/// Trait for the vision-language service the guide generation flow calls.
///
/// The pipeline only consumes generated document text; hiding the transport
/// behind a trait lets tests substitute a fake without network access.
#[async_trait]
pub trait VisionClient: Send + Sync {
    /// Upload a video and return the service's stable file URI.
    async fn upload_video(&self, video_path: &Path, mime_type: &str) -> Result<String>;

    /// Analyze a previously uploaded video with a prompt, returning the
    /// generated document text.
    async fn analyze(&self, uri: &str, prompt: &str) -> Result<String>;
}

/// Gemini-backed implementation of the two-step upload contract:
/// request an upload slot, PUT the raw bytes, then submit for analysis.
pub struct GeminiClient {
    config: VisionConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct UploadSlotRequest {
    #[serde(rename = "fileSize")]
    file_size: u64,
    #[serde(rename = "mimeType")]
    mime_type: String,
}

#[derive(Debug, Deserialize)]
struct UploadSlotResponse {
    results: Option<Vec<UploadSlot>>,
}

#[derive(Debug, Deserialize)]
struct UploadSlot {
    upload_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FinalizeResponse {
    file: Option<FinalizedFile>,
}

#[derive(Debug, Deserialize)]
struct FinalizedFile {
    uri: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest {
    prompt: String,
    uri: String,
}

impl GeminiClient {
    pub fn new(config: VisionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }

    fn bearer_token(&self) -> Result<&str> {
        self.config
            .bearer_token
            .as_deref()
            .ok_or_else(|| anyhow!("Vision service bearer token not configured"))
    }
}

#[async_trait]
impl VisionClient for GeminiClient {
    async fn upload_video(&self, video_path: &Path, mime_type: &str) -> Result<String> {
        let token = self.bearer_token()?;
        let file_size = tokio::fs::metadata(video_path).await?.len();

        // Step 1: request a signed upload URL
        debug!("Requesting upload slot for {}", video_path.display());
        let response = self
            .client
            .post(format!("{}/Gemini/Upload", self.config.base_url))
            .bearer_auth(token)
            .json(&UploadSlotRequest {
                file_size,
                mime_type: mime_type.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Upload slot request failed {}: {}", status, text));
        }

        let slot: UploadSlotResponse = response.json().await?;
        let upload_url = slot
            .results
            .and_then(|r| r.into_iter().next())
            .and_then(|s| s.upload_url)
            .ok_or_else(|| anyhow!("Failed to get upload URL"))?;

        // Step 2: PUT the raw bytes and finalize in one request
        debug!("Uploading {} bytes to signed URL", file_size);
        let file_data = tokio::fs::read(video_path).await?;
        let response = self
            .client
            .put(&upload_url)
            .header("Content-Length", file_size.to_string())
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header("Content-Type", mime_type)
            .body(file_data)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("File upload failed {}: {}", status, text));
        }

        let finalized: FinalizeResponse = response.json().await?;
        let uri = finalized
            .file
            .and_then(|f| f.uri)
            .ok_or_else(|| anyhow!("Failed to get file URI from upload response"))?;

        debug!("Upload finalized with URI {}", uri);
        Ok(uri)
    }

    async fn analyze(&self, uri: &str, prompt: &str) -> Result<String> {
        let token = self.bearer_token()?;

        debug!("Submitting analysis for {}", uri);
        let response = self
            .client
            .post(format!("{}/Gemini/Analyze", self.config.base_url))
            .bearer_auth(token)
            .json(&AnalyzeRequest {
                prompt: prompt.to_string(),
                uri: uri.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Analysis request failed {}: {}", status, text));
        }

        let body: serde_json::Value = response.json().await?;
        extract_document_text(&body)
    }
}

/// Pull the generated document text out of an analysis response.
///
/// The service has returned several envelope shapes over time; accept each
/// of them and fail loudly on anything else so the caller can surface a
/// single upstream failure.
pub fn extract_document_text(body: &serde_json::Value) -> Result<String> {
    let first_result = body.get("results").and_then(|r| r.get(0));

    if let Some(result) = first_result {
        if let Some(text) = result.as_str() {
            return Ok(text.to_string());
        }
        if let Some(text) = result.get("gemini_response").and_then(|v| v.as_str()) {
            return Ok(text.to_string());
        }
    }

    if let Some(text) = body.get("gemini_response").and_then(|v| v.as_str()) {
        return Ok(text.to_string());
    }

    Err(anyhow!("Unexpected analysis response shape: {}", body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_from_results_string() {
        let body = json!({"results": ["# Guide\ntext"]});
        assert_eq!(extract_document_text(&body).unwrap(), "# Guide\ntext");
    }

    #[test]
    fn test_extract_from_results_object() {
        let body = json!({"results": [{"gemini_response": "guide body"}]});
        assert_eq!(extract_document_text(&body).unwrap(), "guide body");
    }

    #[test]
    fn test_extract_from_top_level_field() {
        let body = json!({"gemini_response": "top-level body"});
        assert_eq!(extract_document_text(&body).unwrap(), "top-level body");
    }

    #[test]
    fn test_extract_rejects_unknown_shape() {
        assert!(extract_document_text(&json!({"status": "ok"})).is_err());
        assert!(extract_document_text(&json!({"results": []})).is_err());
        assert!(extract_document_text(&json!({"results": [{"other": 1}]})).is_err());
    }

    #[test]
    fn test_client_requires_bearer_token() {
        let client = GeminiClient::new(VisionConfig {
            base_url: "http://localhost:1".to_string(),
            bearer_token: None,
            timeout_seconds: 5,
        })
        .unwrap();

        assert!(client.bearer_token().is_err());
    }
}
