use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub stream: StreamConfig,
}

/// Gateway listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Model weight locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Word-vocabulary classifier weights (safetensors)
    pub word_weights: PathBuf,
    /// Character-vocabulary classifier weights (safetensors)
    pub char_weights: PathBuf,
    /// Hand landmark detector weights (safetensors)
    pub hand_weights: PathBuf,
}

/// Streaming pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamConfig {
    /// Window size in frames for word/sentence analysis
    pub word_window_frames: usize,
    /// Window size in frames for character analysis
    pub char_window_frames: usize,
    /// Heartbeat interval per session, in milliseconds
    pub heartbeat_interval_ms: u64,
    /// Delay after a failed heartbeat tick before the next attempt
    pub heartbeat_error_backoff_ms: u64,
    /// Upper bound on one classification call, in milliseconds
    pub inference_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::DEFAULT_HOST.to_string(),
            port: defaults::DEFAULT_PORT,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            word_weights: PathBuf::from("models/word_model.safetensors"),
            char_weights: PathBuf::from("models/char_model.safetensors"),
            hand_weights: PathBuf::from("models/hand_landmarks.safetensors"),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            word_window_frames: defaults::WORD_WINDOW_FRAMES,
            char_window_frames: defaults::CHAR_WINDOW_FRAMES,
            heartbeat_interval_ms: defaults::HEARTBEAT_INTERVAL_MS,
            heartbeat_error_backoff_ms: defaults::HEARTBEAT_ERROR_BACKOFF_MS,
            inference_timeout_ms: defaults::INFERENCE_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SIGNSTREAM_HOST → server.host
    /// - SIGNSTREAM_PORT → server.port
    /// - SIGNSTREAM_WORD_MODEL → model.word_weights
    /// - SIGNSTREAM_CHAR_MODEL → model.char_weights
    /// - SIGNSTREAM_HAND_MODEL → model.hand_weights
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var("SIGNSTREAM_HOST")
            && !host.is_empty()
        {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("SIGNSTREAM_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
        }

        if let Ok(path) = std::env::var("SIGNSTREAM_WORD_MODEL")
            && !path.is_empty()
        {
            self.model.word_weights = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("SIGNSTREAM_CHAR_MODEL")
            && !path.is_empty()
        {
            self.model.char_weights = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("SIGNSTREAM_HAND_MODEL")
            && !path.is_empty()
        {
            self.model.hand_weights = PathBuf::from(path);
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/signstream/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("signstream")
            .join("config.toml")
    }
}
