use anyhow::Result;
use clap::{Arg, Command};
use tracing::{info, warn};

use video_guide_rust::api::server::{start_http_server, AppState};
use video_guide_rust::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("video_guide_rust=info,warn")
        .init();

    let matches = Command::new("Video Guide Generator (Rust)")
        .version("0.1.0")
        .author("Intelligence Industrielle")
        .about("Converts videos into work-instruction guides with synthesized visuals")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Port to bind the HTTP server to"),
        )
        .arg(
            Arg::new("workers")
                .short('w')
                .long("workers")
                .value_name("NUM")
                .help("Number of concurrent extraction workers"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    // Load configuration
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    if let Some(port) = matches.get_one::<String>("port") {
        config.server.port = port.parse()?;
    }
    if let Some(workers) = matches.get_one::<String>("workers") {
        config.synthesis.max_workers = workers.parse()?;
    }
    if matches.get_flag("verbose") {
        info!("Verbose logging enabled");
    }

    config.validate()?;

    info!("🚀 Video Guide Generator (Rust) starting...");
    info!("📁 Uploads directory: {}", config.storage.uploads_dir.display());
    info!("📂 Guides directory: {}", config.guides.guides_dir.display());
    info!("🔧 Extraction workers: {}", config.synthesis.max_workers);

    let port = config.server.port;
    let state = AppState::from_config(config)?;

    start_http_server(state, port).await
}
