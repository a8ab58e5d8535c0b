//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

use crate::config::Config;
use crate::guides::GuideStore;
use crate::pipeline::GuidePipeline;
use crate::storage::UploadStore;
use crate::synthesis::MediaSynthesizer;
use crate::vision::{GeminiClient, VisionClient};

use super::handlers;
use super::models::{
    GenerateGuideRequest, SaveGuideRequest, ScreenshotsRequest, VisionAnalyzeRequest,
    VisionUploadRequest,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub uploads: UploadStore,
    pub synthesizer: MediaSynthesizer,
    pub pipeline: Arc<GuidePipeline>,
    pub vision: Arc<dyn VisionClient>,
    pub guides: GuideStore,
}

impl AppState {
    /// Wire all components from configuration
    pub fn from_config(config: Config) -> Result<Self> {
        let synthesizer = MediaSynthesizer::new(config.synthesis.clone());
        let vision: Arc<dyn VisionClient> = Arc::new(GeminiClient::new(config.vision.clone())?);

        Ok(Self {
            uploads: UploadStore::new(config.storage.clone()),
            synthesizer: synthesizer.clone(),
            pipeline: Arc::new(GuidePipeline::new(synthesizer)),
            vision,
            guides: GuideStore::new(config.guides.clone()),
            config: Arc::new(config),
        })
    }
}

/// Configure and start the HTTP server
pub async fn start_http_server(state: AppState, port: u16) -> Result<()> {
    info!("🚀 Starting HTTP server on port {}", port);

    // A configured limit of 0 means uploads are unbounded.
    let body_limit = match state.config.storage.max_file_size {
        0 => DefaultBodyLimit::disable(),
        max => DefaultBodyLimit::max(max as usize),
    };
    let enable_cors = state.config.server.enable_cors;
    let screenshots_dir = state.config.synthesis.screenshots_dir.clone();
    let gifs_dir = state.config.synthesis.gifs_dir.clone();
    let uploads_dir = state.config.storage.uploads_dir.clone();

    // Build the application with routes
    let mut app = Router::new()
        .route("/api/health", get(health_handler))
        // Upload and synthesis endpoints
        .route("/api/upload", post(upload_handler))
        .route("/api/gemini/upload", post(vision_upload_handler))
        .route("/api/gemini/analyze", post(vision_analyze_handler))
        .route("/api/gemini/screenshots", post(screenshots_handler))
        .route("/api/analyze", post(generate_guide_handler))
        // Guide persistence endpoints
        .route("/api/guides/save", post(save_guide_handler))
        .route("/api/guides/list", get(list_guides_handler))
        .route("/api/guides/:filename", get(get_guide_handler))
        // Synthesized artifacts and raw uploads for the renderer
        .nest_service("/screenshots", ServeDir::new(screenshots_dir))
        .nest_service("/gifs", ServeDir::new(gifs_dir))
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(body_limit),
        );

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
        app = app.layer(cors);
    }

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("🌐 API server listening on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler
async fn health_handler() -> impl IntoResponse {
    match handlers::health_check().await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Multipart video upload handler
async fn upload_handler(State(state): State<AppState>, mut multipart: Multipart) -> impl IntoResponse {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("video") {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload.mp4").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.into()),
        };

        return match state.uploads.store(&original_name, &mime_type, &data).await {
            Ok(stored) => (
                StatusCode::OK,
                Json(serde_json::json!({
                    "success": true,
                    "file": {
                        "filename": stored.filename,
                        "originalName": stored.original_name,
                        "size": stored.size,
                        "path": stored.path
                    }
                })),
            )
                .into_response(),
            Err(e) => error_response(StatusCode::BAD_REQUEST, e.into()),
        };
    }

    error_response(
        StatusCode::BAD_REQUEST,
        anyhow::anyhow!("No video file uploaded"),
    )
}

/// Vision service upload handler
async fn vision_upload_handler(
    State(state): State<AppState>,
    Json(payload): Json<VisionUploadRequest>,
) -> impl IntoResponse {
    match handlers::vision_upload(
        state.vision.as_ref(),
        &state.uploads,
        &payload.video_filename,
        &payload.mime_type,
    )
    .await
    {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Vision service analysis handler
async fn vision_analyze_handler(
    State(state): State<AppState>,
    Json(payload): Json<VisionAnalyzeRequest>,
) -> impl IntoResponse {
    match handlers::vision_analyze(state.vision.as_ref(), &payload.uri, &payload.prompt).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Batch screenshot synthesis handler
async fn screenshots_handler(
    State(state): State<AppState>,
    Json(payload): Json<ScreenshotsRequest>,
) -> impl IntoResponse {
    match handlers::batch_screenshots(
        &state.synthesizer,
        &state.uploads,
        &payload.video_filename,
        &payload.timestamps,
    )
    .await
    {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Full guide generation handler
async fn generate_guide_handler(
    State(state): State<AppState>,
    Json(payload): Json<GenerateGuideRequest>,
) -> impl IntoResponse {
    match handlers::generate_guide(
        state.pipeline.as_ref(),
        state.vision.as_ref(),
        &state.uploads,
        &payload,
    )
    .await
    {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Save guide handler
async fn save_guide_handler(
    State(state): State<AppState>,
    Json(payload): Json<SaveGuideRequest>,
) -> impl IntoResponse {
    match handlers::save_guide(&state.guides, &payload).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e),
    }
}

/// List guides handler
async fn list_guides_handler(State(state): State<AppState>) -> impl IntoResponse {
    match handlers::list_guides(&state.guides).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Get guide handler
async fn get_guide_handler(
    State(state): State<AppState>,
    axum::extract::Path(filename): axum::extract::Path<String>,
) -> impl IntoResponse {
    match handlers::get_guide(&state.guides, &filename).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(StatusCode::NOT_FOUND, e),
    }
}

fn error_response(status: StatusCode, error: anyhow::Error) -> axum::response::Response {
    (
        status,
        Json(serde_json::json!({ "error": error.to_string() })),
    )
        .into_response()
}
