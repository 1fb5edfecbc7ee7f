//! Configuration system for Jukebox.
//!
//! Resolution order: command line → environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $JUKEBOX_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/jukebox/config.toml
//!   3. ~/.config/jukebox/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JukeboxConfig {
    pub network: NetworkConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address to bind. 0.0.0.0 = all interfaces.
    pub host: String,
    /// TCP listening port. Kept signed until checked by `validate_port`.
    pub port: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Line-oriented catalog, one `<Artist> - <Song>.mp3` per line.
    pub catalog_path: PathBuf,
    /// Directory holding the media files named in the catalog.
    pub media_dir: PathBuf,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

pub const DEFAULT_PORT: i64 = 3000;

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("record.txt"),
            media_dir: PathBuf::from("songDatabase"),
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("jukebox")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("port {0} is negative")]
    NegativePort(i64),
    #[error("port {0} is out of range (0-65535)")]
    PortOutOfRange(i64),
    #[error("port {0:?} is not an integer")]
    InvalidPort(String),
}

// ── Port validation ───────────────────────────────────────────────────────────

/// Validate a port taken from any configuration source.
pub fn validate_port(port: i64) -> Result<u16, ConfigError> {
    if port < 0 {
        return Err(ConfigError::NegativePort(port));
    }
    u16::try_from(port).map_err(|_| ConfigError::PortOutOfRange(port))
}

/// Parse a port given as text, e.g. on the command line.
/// Range is checked separately by `validate_port`.
pub fn parse_port(text: &str) -> Result<i64, ConfigError> {
    text.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidPort(text.to_string()))
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl JukeboxConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            JukeboxConfig::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("JUKEBOX_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&JukeboxConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply JUKEBOX_* env var overrides.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup. A port override that is not an
    /// integer is an error rather than silently ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("JUKEBOX_NETWORK__HOST") {
            self.network.host = v;
        }
        if let Some(v) = lookup("JUKEBOX_NETWORK__PORT") {
            self.network.port = parse_port(&v)?;
        }
        if let Some(v) = lookup("JUKEBOX_STORAGE__CATALOG_PATH") {
            self.storage.catalog_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("JUKEBOX_STORAGE__MEDIA_DIR") {
            self.storage.media_dir = PathBuf::from(v);
        }
        Ok(())
    }
}
