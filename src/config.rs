use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the video guide generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Upload storage settings
    pub storage: StorageConfig,

    /// Media synthesis settings
    pub synthesis: SynthesisConfig,

    /// Vision-language service settings
    pub vision: VisionConfig,

    /// Guide persistence settings
    pub guides: GuidesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to bind the HTTP server to
    pub port: u16,

    /// Enable permissive CORS for browser clients
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for uploaded source videos
    pub uploads_dir: PathBuf,

    /// Maximum upload size in bytes (0 = no limit)
    pub max_file_size: u64,

    /// Accepted video file extensions
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Directory for extracted still frames
    pub screenshots_dir: PathBuf,

    /// Directory for extracted animated clips
    pub gifs_dir: PathBuf,

    /// Maximum number of concurrent ffmpeg invocations
    pub max_workers: usize,

    /// Timeout per extraction in seconds
    pub timeout_seconds: u64,

    /// Frame rate for animated clips
    pub gif_fps: u32,

    /// Output width in pixels for animated clips
    pub gif_width: u32,

    /// Extraction tool binary
    pub ffmpeg_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Base URL of the vision-language webhook service
    pub base_url: String,

    /// Bearer token for the service
    pub bearer_token: Option<String>,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidesConfig {
    /// Directory for persisted guides
    pub guides_dir: PathBuf,
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        // Try to load from various locations
        let config_paths = [
            "video-guide.toml",
            "config/video-guide.toml",
            "~/.config/video-guide/config.toml",
            "/etc/video-guide/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        config.apply_env_overrides();
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        // Fall back to defaults with environment overrides
        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("VIDEO_GUIDE_PORT") {
            self.server.port = port.parse().unwrap_or(self.server.port);
        }

        if let Ok(workers) = std::env::var("VIDEO_GUIDE_WORKERS") {
            self.synthesis.max_workers = workers.parse().unwrap_or(self.synthesis.max_workers);
        }

        if let Ok(token) = std::env::var("API_BEARER_TOKEN") {
            self.vision.bearer_token = Some(token);
        }

        if let Ok(base_url) = std::env::var("VIDEO_GUIDE_VISION_URL") {
            self.vision.base_url = base_url;
        }

        if let Ok(uploads_dir) = std::env::var("VIDEO_GUIDE_UPLOADS_DIR") {
            self.storage.uploads_dir = PathBuf::from(uploads_dir);
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration and create the working directories
    pub fn validate(&self) -> Result<()> {
        if self.synthesis.max_workers == 0 {
            return Err(anyhow!("max_workers must be greater than 0"));
        }

        if self.synthesis.gif_fps == 0 || self.synthesis.gif_width == 0 {
            return Err(anyhow!("gif_fps and gif_width must be greater than 0"));
        }

        if self.synthesis.ffmpeg_path.is_empty() {
            return Err(anyhow!("ffmpeg_path must not be empty"));
        }

        if self.storage.allowed_extensions.is_empty() {
            return Err(anyhow!("allowed_extensions must not be empty"));
        }

        for dir in [
            &self.storage.uploads_dir,
            &self.synthesis.screenshots_dir,
            &self.synthesis.gifs_dir,
            &self.guides.guides_dir,
        ] {
            if !dir.exists() {
                if let Err(e) = std::fs::create_dir_all(dir) {
                    return Err(anyhow!("Cannot create directory {}: {}", dir.display(), e));
                }
            }
        }

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Video Guide Configuration:\n\
            - Port: {}\n\
            - Synthesis Workers: {}\n\
            - Uploads Directory: {}\n\
            - Guides Directory: {}\n\
            - Vision Service: {}\n\
            - Allowed Extensions: {}",
            self.server.port,
            self.synthesis.max_workers,
            self.storage.uploads_dir.display(),
            self.guides.guides_dir.display(),
            self.vision.base_url,
            self.storage.allowed_extensions.join(", ")
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 5000,
                enable_cors: true,
            },
            storage: StorageConfig {
                uploads_dir: PathBuf::from("uploads"),
                max_file_size: 500 * 1024 * 1024, // 500MB max
                allowed_extensions: vec![
                    "mp4".to_string(),
                    "avi".to_string(),
                    "mov".to_string(),
                    "mkv".to_string(),
                    "webm".to_string(),
                ],
            },
            synthesis: SynthesisConfig {
                screenshots_dir: PathBuf::from("uploads/screenshots"),
                gifs_dir: PathBuf::from("uploads/gifs"),
                max_workers: num_cpus::get().min(4),
                timeout_seconds: 120,
                gif_fps: 10,
                gif_width: 480,
                ffmpeg_path: "ffmpeg".to_string(),
            },
            vision: VisionConfig {
                base_url: "https://n8n.tools.intelligenceindustrielle.com/webhook".to_string(),
                bearer_token: None,
                timeout_seconds: 300,
            },
            guides: GuidesConfig {
                guides_dir: PathBuf::from("uploads/guides"),
            },
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.synthesis.max_workers = workers;
        self
    }

    pub fn with_uploads_dir(mut self, dir: PathBuf) -> Self {
        self.config.storage.uploads_dir = dir;
        self
    }

    pub fn with_guides_dir(mut self, dir: PathBuf) -> Self {
        self.config.guides.guides_dir = dir;
        self
    }

    pub fn with_vision_base_url(mut self, base_url: String) -> Self {
        self.config.vision.base_url = base_url;
        self
    }

    pub fn with_bearer_token(mut self, token: String) -> Self {
        self.config.vision.bearer_token = Some(token);
        self
    }

    /// Root all storage directories under one data directory
    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        self.config.storage.uploads_dir = dir.join("uploads");
        self.config.synthesis.screenshots_dir = dir.join("uploads/screenshots");
        self.config.synthesis.gifs_dir = dir.join("uploads/gifs");
        self.config.guides.guides_dir = dir.join("uploads/guides");
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.storage.max_file_size, 500 * 1024 * 1024);
        assert!(config.synthesis.max_workers >= 1);
        assert_eq!(config.synthesis.gif_fps, 10);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_port(8080)
            .with_workers(2)
            .with_vision_base_url("http://localhost:9999".to_string())
            .build();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.synthesis.max_workers, 2);
        assert_eq!(config.vision.base_url, "http://localhost:9999");
    }

    #[test]
    fn test_data_dir_roots_all_directories() {
        let config = ConfigBuilder::new()
            .with_data_dir(PathBuf::from("/tmp/vg-test"))
            .build();

        assert_eq!(config.storage.uploads_dir, PathBuf::from("/tmp/vg-test/uploads"));
        assert_eq!(
            config.synthesis.gifs_dir,
            PathBuf::from("/tmp/vg-test/uploads/gifs")
        );
        assert_eq!(
            config.guides.guides_dir,
            PathBuf::from("/tmp/vg-test/uploads/guides")
        );
    }

    #[test]
    fn test_validation_rejects_zero_workers() {
        let mut config = Config::default();
        config.synthesis.max_workers = 0;
        assert!(config.validate().is_err());
    }
}
