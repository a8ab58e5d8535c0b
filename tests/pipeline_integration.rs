use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use tempfile::TempDir;

use video_guide_rust::config::SynthesisConfig;
use video_guide_rust::pipeline::{GuidePipeline, PipelineError};
use video_guide_rust::synthesis::MediaSynthesizer;
use video_guide_rust::vision::VisionClient;

/// Vision client that returns a canned document without any network access.
struct FakeVisionClient {
    document: String,
    fail_analysis: bool,
}

#[async_trait]
impl VisionClient for FakeVisionClient {
    async fn upload_video(&self, _video_path: &Path, _mime_type: &str) -> Result<String> {
        Ok("files/fake-uri".to_string())
    }

    async fn analyze(&self, uri: &str, _prompt: &str) -> Result<String> {
        if self.fail_analysis {
            anyhow::bail!("analysis backend unavailable");
        }
        assert_eq!(uri, "files/fake-uri");
        Ok(self.document.clone())
    }
}

fn pipeline_for(dir: &Path) -> GuidePipeline {
    GuidePipeline::new(MediaSynthesizer::new(SynthesisConfig {
        screenshots_dir: dir.join("screenshots"),
        gifs_dir: dir.join("gifs"),
        max_workers: 3,
        timeout_seconds: 5,
        gif_fps: 10,
        gif_width: 480,
        // Missing on purpose: every live extraction fails, so these tests
        // exercise the cache path and failure tolerance deterministically.
        ffmpeg_path: "ffmpeg-test-missing".to_string(),
    }))
}

async fn seed_video(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("video-42.mp4");
    tokio::fs::write(&path, b"fake video bytes").await.unwrap();
    path
}

async fn seed_gif(dir: &Path, name: &str) {
    let gifs = dir.join("gifs");
    tokio::fs::create_dir_all(&gifs).await.unwrap();
    tokio::fs::write(gifs.join(name), b"gif bytes").await.unwrap();
}

#[tokio::test]
async fn test_generated_guide_renders_with_cached_artifacts() {
    let temp = TempDir::new().unwrap();
    let pipeline = pipeline_for(temp.path());
    let video = seed_video(temp.path()).await;

    seed_gif(temp.path(), "video-42_00_05.gif").await;

    let vision = FakeVisionClient {
        document: "**5.1 Preparation**\n1. Clear the area.\n[GIF: 00:05 - 00:08]\n".to_string(),
        fail_analysis: false,
    };

    let report = pipeline
        .generate(&vision, &video, "video-42.mp4", "video/mp4", "make a guide")
        .await
        .unwrap();

    assert_eq!(report.markers_total, 1);
    assert_eq!(report.synthesized, 1);
    assert_eq!(report.failed, 0);
    assert!(report
        .final_text
        .contains("![00:05 - 00:08](/gifs/video-42_00_05.gif)"));
    assert!(!report.final_text.contains("[GIF:"));
}

#[tokio::test]
async fn test_duplicate_markers_reference_one_artifact() {
    let temp = TempDir::new().unwrap();
    let pipeline = pipeline_for(temp.path());
    let video = seed_video(temp.path()).await;

    seed_gif(temp.path(), "video-42_00_05.gif").await;

    let vision = FakeVisionClient {
        document: "Step 1. [GIF: 00:05 - 00:08] Step 2. [GIF: 00:05 - 00:08]".to_string(),
        fail_analysis: false,
    };

    let report = pipeline
        .generate(&vision, &video, "video-42.mp4", "video/mp4", "make a guide")
        .await
        .unwrap();

    assert_eq!(report.markers_total, 2);
    assert_eq!(report.synthesized, 2);
    assert_eq!(
        report.final_text.matches("/gifs/video-42_00_05.gif").count(),
        2
    );
}

#[tokio::test]
async fn test_partial_failure_keeps_the_document_renderable() {
    let temp = TempDir::new().unwrap();
    let pipeline = pipeline_for(temp.path());
    let video = seed_video(temp.path()).await;

    // Only the first range has a cached artifact; the second fails live.
    seed_gif(temp.path(), "video-42_00_10.gif").await;

    let vision = FakeVisionClient {
        document: "A [GIF: 00:10 - 00:12] B [GIF: 00:20 - 00:22] C".to_string(),
        fail_analysis: false,
    };

    let report = pipeline
        .generate(&vision, &video, "video-42.mp4", "video/mp4", "make a guide")
        .await
        .unwrap();

    assert_eq!(report.synthesized, 1);
    assert_eq!(report.failed, 1);
    assert!(report
        .final_text
        .contains("![00:10 - 00:12](/gifs/video-42_00_10.gif)"));
    assert!(report
        .final_text
        .contains("*(capture unavailable: 00:20 - 00:22)*"));
}

#[tokio::test]
async fn test_upstream_failure_is_a_single_typed_error() {
    let temp = TempDir::new().unwrap();
    let pipeline = pipeline_for(temp.path());
    let video = seed_video(temp.path()).await;

    let vision = FakeVisionClient {
        document: String::new(),
        fail_analysis: true,
    };

    let result = pipeline
        .generate(&vision, &video, "video-42.mp4", "video/mp4", "make a guide")
        .await;

    match result {
        Err(PipelineError::UpstreamAnalysis(cause)) => {
            assert!(cause.contains("analysis backend unavailable"));
        }
        other => panic!("expected upstream analysis failure, got {:?}", other.map(|r| r.final_text)),
    }
}

#[tokio::test]
async fn test_missing_video_fails_before_upload() {
    let temp = TempDir::new().unwrap();
    let pipeline = pipeline_for(temp.path());

    let vision = FakeVisionClient {
        document: "[PHOTO: 00:00:10]".to_string(),
        fail_analysis: false,
    };

    let result = pipeline
        .generate(
            &vision,
            &temp.path().join("missing.mp4"),
            "missing.mp4",
            "video/mp4",
            "make a guide",
        )
        .await;

    assert!(matches!(result, Err(PipelineError::SourceMissing(_))));
}
