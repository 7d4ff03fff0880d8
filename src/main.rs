use anyhow::Result;
use clap::{Arg, Command};
use std::sync::Arc;
use tracing::{info, warn};

use subclip::api;
use subclip::config::Config;
use subclip::progress::ProgressTracker;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("subclip-server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Splits an audio/video pair into subtitled clips over HTTP")
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("ADDR")
                .help("Bind address (overrides config)"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Listen port (overrides config)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");

    // Initialize logging
    let default_filter = if verbose {
        "subclip=debug,tower_http=debug,info"
    } else {
        "subclip=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string()),
        )
        .init();

    // Load configuration
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::from_env()
    });

    if let Some(host) = matches.get_one::<String>("host") {
        config.server.host = host.clone();
    }
    if let Some(port) = matches.get_one::<String>("port") {
        config.server.port = port.parse()?;
    }

    info!("🚀 subclip server starting...");
    info!("🔧 Whisper model: {}", config.transcription.model);
    info!(
        "🔧 Media tools: {} / {}",
        config.media.ffmpeg_bin, config.media.ffprobe_bin
    );

    let progress = Arc::new(ProgressTracker::new());
    api::start_http_server(Arc::new(config), progress).await?;

    Ok(())
}
