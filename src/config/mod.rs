//! Configuration Management
//!
//! Loads stage configuration from TOML files.
//! Configuration includes:
//! - Scenario catalog location
//! - Player behavior (auto-play interval, starting scenario)
//! - Scroll sampling (frame interval)
//! - Log filter

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::errors::{Result, StageError};
use crate::player::clamp_interval;

/// File looked up in the working directory when no path is given
pub const LOCAL_CONFIG_FILE: &str = "a2a-stage.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Scenario catalog file; the built-in catalog is used when absent
    #[serde(default)]
    pub catalog: Option<PathBuf>,

    #[serde(default)]
    pub player: PlayerConfig,

    #[serde(default)]
    pub scroll: ScrollConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Auto-play tick interval in milliseconds (raised to 200 if lower)
    #[serde(default = "default_autoplay_interval_ms")]
    pub autoplay_interval_ms: u64,
    /// Scenario selected at startup
    #[serde(default)]
    pub start_index: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            autoplay_interval_ms: default_autoplay_interval_ms(),
            start_index: 0,
        }
    }
}

fn default_autoplay_interval_ms() -> u64 {
    1500
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Minimum spacing between scroll samples, one animation frame by default
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

fn default_frame_interval_ms() -> u64 {
    16
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist and parse. Without one, `a2a-stage.toml`
    /// in the working directory is tried, then the per-user config file, and
    /// finally the defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config = match path {
            Some(p) => Self::from_file(Path::new(p))?,
            None => {
                let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
                if let Some(user) = Self::user_config_path() {
                    candidates.push(user);
                }

                let mut loaded = None;
                for candidate in &candidates {
                    if candidate.is_file() {
                        loaded = Some(Self::from_file(candidate)?);
                        break;
                    }
                }
                loaded.unwrap_or_else(|| {
                    debug!("No config file found, using defaults");
                    Self::default()
                })
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/a2a-stage/config.toml`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("a2a-stage").join("config.toml"))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StageError::Config(format!("Failed to read config from {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| StageError::Config(format!("{} ({})", e, path.display())))
    }

    /// Parse a TOML document (missing fields take their defaults).
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| StageError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.scroll.frame_interval_ms == 0 {
            return Err(StageError::Config(
                "scroll.frame_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Auto-play interval after the 200 ms floor is applied
    pub fn effective_interval(&self) -> Duration {
        clamp_interval(Duration::from_millis(self.player.autoplay_interval_ms))
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.scroll.frame_interval_ms)
    }
}
