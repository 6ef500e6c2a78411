//! Runtime configuration.
//!
//! Loaded from `VISUALIZER_CONFIG_PATH`, else `visualizer/config/visualizer.toml`
//! found by walking up from the working directory. Missing or invalid files
//! fall back to built-in defaults. Environment variables override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cursor::ResetPosition;
use crate::evaluator::DEFAULT_EVALUATOR_URL;

pub const DEFAULT_CONFIG_PATH: &str = "visualizer/config/visualizer.toml";
pub const MIN_AUTOPLAY_INTERVAL_MS: u64 = 50;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub evaluator: EvaluatorSettings,
    pub playback: PlaybackSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EvaluatorSettings {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_EVALUATOR_URL.to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl EvaluatorSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    pub autoplay_interval_ms: u64,
    pub reset_position: ResetPosition,
    /// Node highlighted before any DFA graph start is known
    pub fallback_state: String,
    pub default_threshold: i64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            autoplay_interval_ms: 1000,
            reset_position: ResetPosition::Unstarted,
            fallback_state: "s4".to_string(),
            default_threshold: 1,
        }
    }
}

impl PlaybackSettings {
    pub fn autoplay_interval(&self) -> Duration {
        Duration::from_millis(self.autoplay_interval_ms.max(MIN_AUTOPLAY_INTERVAL_MS))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8090".to_string(),
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

impl VisualizerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `VISUALIZER_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = env_value("VISUALIZER_EVALUATOR_URL") {
            self.evaluator.base_url = url;
        }
        if let Some(addr) = env_value("VISUALIZER_BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(raw) = env_value("VISUALIZER_AUTOPLAY_MS") {
            match raw.parse::<u64>() {
                Ok(ms) => self.playback.autoplay_interval_ms = ms,
                Err(err) => tracing::warn!(
                    value = %raw,
                    error = %err,
                    "Ignoring invalid VISUALIZER_AUTOPLAY_MS"
                ),
            }
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn load_config() -> VisualizerConfig {
    let path = env_value("VISUALIZER_CONFIG_PATH")
        .map(PathBuf::from)
        .or_else(|| find_default_config_path(DEFAULT_CONFIG_PATH));

    let mut config = match path {
        Some(path) => VisualizerConfig::from_file(&path).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Failed to load visualizer config; using defaults");
            VisualizerConfig::default()
        }),
        None => {
            tracing::info!("No visualizer config file found; using defaults");
            VisualizerConfig::default()
        }
    };
    config.apply_env_overrides();
    config
}

fn find_default_config_path(relative_path: &str) -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;
    loop {
        let candidate = current.join(relative_path);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            break;
        }
    }
    None
}
