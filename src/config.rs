use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the clip generation service
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// External media tool settings
    #[serde(default)]
    pub media: MediaConfig,

    /// Transcription backend settings
    #[serde(default)]
    pub transcription: TranscriptionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted multipart body size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// ffmpeg binary name or path
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_bin: String,

    /// ffprobe binary name or path
    #[serde(default = "default_ffprobe")]
    pub ffprobe_bin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Whisper model name (tiny, base, small, medium, large)
    #[serde(default = "default_model")]
    pub model: String,

    /// Beam size passed to backends that accept it
    #[serde(default = "default_beam_size")]
    pub beam_size: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    // Media uploads run well past axum's 2 MB default
    512 * 1024 * 1024
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_model() -> String {
    "medium".to_string()
}

fn default_beam_size() -> u32 {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: default_ffmpeg(),
            ffprobe_bin: default_ffprobe(),
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            beam_size: default_beam_size(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_paths = [
            "subclip.toml",
            "config/subclip.toml",
            "/etc/subclip/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config.with_env_overrides());
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Err(anyhow!("No configuration file found"))
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment variable overrides on top of the current values
    fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var("SUBCLIP_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("SUBCLIP_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Ok(max_bytes) = std::env::var("SUBCLIP_MAX_UPLOAD_BYTES") {
            if let Ok(max_bytes) = max_bytes.parse() {
                self.server.max_upload_bytes = max_bytes;
            }
        }

        if let Ok(model) = std::env::var("SUBCLIP_WHISPER_MODEL") {
            self.transcription.model = model;
        }

        if let Ok(ffmpeg) = std::env::var("SUBCLIP_FFMPEG_BIN") {
            self.media.ffmpeg_bin = ffmpeg;
        }

        if let Ok(ffprobe) = std::env::var("SUBCLIP_FFPROBE_BIN") {
            self.media.ffprobe_bin = ffprobe;
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.media.ffmpeg_bin, "ffmpeg");
        assert_eq!(config.transcription.model, "medium");
        assert_eq!(config.transcription.beam_size, 5);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.media.ffprobe_bin, "ffprobe");
    }
}
