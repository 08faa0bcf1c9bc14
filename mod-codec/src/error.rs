//! Codec error types

use mod_engine::ReaderError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::format::AudioFormat;
use crate::session::ModuleHandle;

/// Errors reported by the codec
#[derive(Debug, Error)]
pub enum CodecError {
    /// Engine failed to register drivers/loaders or to initialize
    #[error("Could not initialize decoder: {0}")]
    Initialization(String),
    /// Requested sample encoding cannot be produced
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(AudioFormat),
    #[error("Too many output channels: {requested} (max {max})")]
    TooManyChannels { requested: u8, max: u8 },
    #[error("Output format has no channels")]
    NoChannels,
    /// Module could not be loaded; carries the decoder diagnostic
    #[error("Could not load module: {0}")]
    Load(String),
    #[error("Stream seek failed: {0}")]
    Seek(#[source] ReaderError),
    #[error("Unknown module handle: {0}")]
    UnknownHandle(ModuleHandle),
    /// Another handle holds the player and the policy is `Reject`
    #[error("Player is busy with module {active}")]
    PlayerBusy { active: ModuleHandle },
    #[error(transparent)]
    Config(#[from] ConfigError),
}
