//! Codec configuration (`codec.toml`)
//!
//! Mixer levels and session behavior, stored as TOML. Every field has a
//! default so partial files are valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration file failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Codec configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CodecConfig {
    /// Decoder mixer settings
    #[serde(default)]
    pub mixer: MixerConfig,
    /// Playback session settings
    #[serde(default)]
    pub session: SessionConfig,
}

/// What `play` does when another handle is already playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlayPolicy {
    /// Stop the playing handle and start the new one
    #[default]
    Supersede,
    /// Refuse with `CodecError::PlayerBusy`
    Reject,
}

/// Decoder mixer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerConfig {
    /// Master output volume (default: 96, range: 0-128)
    #[serde(default = "default_volume")]
    pub volume: u8,
    /// Music volume (default: 128, range: 0-128)
    #[serde(default = "default_full")]
    pub music_volume: u8,
    /// Stereo separation (default: 128, 0 = mono)
    #[serde(default = "default_full")]
    pub pan_separation: u8,
    /// Interpolated (high quality) mixing (default: true)
    #[serde(default = "default_true")]
    pub interpolation: bool,
}

/// Playback session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Voice limit passed to the loader (default: 64)
    #[serde(default = "default_max_voices")]
    pub max_voices: u16,
    /// Arbitration for the single player slot (default: supersede)
    #[serde(default)]
    pub play_policy: PlayPolicy,
}

fn default_volume() -> u8 {
    96
}
fn default_full() -> u8 {
    128
}
fn default_true() -> bool {
    true
}
fn default_max_voices() -> u16 {
    mod_engine::DEFAULT_MAX_VOICES
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            music_volume: default_full(),
            pan_separation: default_full(),
            interpolation: default_true(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_voices: default_max_voices(),
            play_policy: PlayPolicy::default(),
        }
    }
}

impl CodecConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
