/// Video Guide Generator - Rust Implementation
///
/// Converts uploaded videos into work-instruction guides by delegating
/// understanding to a vision-language service and synthesizing screenshots
/// and clips at the timestamps embedded in the generated text.

pub mod api;
pub mod config;
pub mod guides;
pub mod markers;
pub mod pipeline;
pub mod reconcile;
pub mod render;
pub mod storage;
pub mod synthesis;
pub mod timecode;
pub mod vision;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder};
pub use crate::guides::{Guide, GuideStore};
pub use crate::markers::{Marker, MarkerKind};
pub use crate::pipeline::{GuidePipeline, PipelineError, PipelineReport};
pub use crate::storage::{StoredVideo, UploadStore};
pub use crate::synthesis::{ExtractionRequest, MediaSynthesizer, SynthesisArtifact};
pub use crate::vision::{GeminiClient, VisionClient};
