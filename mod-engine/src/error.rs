//! Engine error types

use thiserror::Error;

use crate::reader::ReaderError;

/// Errors reported by the decoder engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// No registered loader recognized the data
    #[error("Unrecognized module format")]
    UnrecognizedFormat,
    /// `load` called before any loader was registered
    #[error("No module loaders registered")]
    NoLoaders,
    /// `init` called before any driver was registered
    #[error("No output driver registered")]
    NoDriver,
    /// Operation requires a successful `init`
    #[error("Engine is not initialized")]
    NotInitialized,
    /// Mixing frequency of zero
    #[error("Invalid mixing frequency: {0} Hz")]
    InvalidFrequency(u32),
    /// Loader does not understand this format revision
    #[error("Unsupported module version: 0x{0:04X}")]
    UnsupportedVersion(u16),
    /// Module header is inconsistent
    #[error("Invalid module header: {0}")]
    InvalidHeader(&'static str),
    /// Module needs more voices than the caller allows
    #[error("Module uses {channels} channels (limit {limit})")]
    TooManyChannels { channels: u16, limit: u16 },
    /// Pattern could not be decoded
    #[error("Invalid pattern data at index {0}")]
    InvalidPattern(u16),
    /// Instrument or sample header could not be decoded
    #[error("Invalid instrument at index {0}")]
    InvalidInstrument(u16),
    /// Sample data is missing or out of range
    #[error("Invalid sample data at index {0}")]
    InvalidSample(u16),
    /// Reader failure while loading
    #[error(transparent)]
    Reader(#[from] ReaderError),
}
