//! Mod-Engine: tracker module decoder engine
//!
//! This crate loads tracker modules (FastTracker II XM and ProTracker MOD)
//! through an abstract [`ModuleReader`] and renders them with a software
//! mixer into raw PCM byte buffers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │  XM File (.xm)   │     │ MOD File (.mod)  │
//! └────────┬─────────┘     └────────┬─────────┘
//!          │    ModuleReader        │
//!          ▼                        ▼
//!     ┌────────────────────────────────────────┐
//!     │             Song (unified)             │
//!     │  - orders / patterns / instruments     │
//!     │  - PlaybackFlags                       │
//!     └────────────────────────────────────────┘
//!                      │  Engine::start
//!                      ▼
//!          Player (single active slot)
//!                      │  Engine::write_bytes
//!                      ▼
//!       u8 / native-endian i16, mono or stereo
//! ```
//!
//! The engine owns exactly one player slot. Starting a song replaces
//! whatever was playing before.
//!
//! # Usage
//!
//! ```ignore
//! use mod_engine::{Engine, MixerMode, MixerSettings, SliceReader};
//!
//! let mut engine = Engine::new();
//! engine.register_driver(mod_engine::Driver::NoSound);
//! engine.register_all_loaders();
//! engine.init(MixerSettings {
//!     mode: MixerMode::SIXTEEN_BITS | MixerMode::STEREO,
//!     ..Default::default()
//! })?;
//!
//! let data = std::fs::read("song.xm")?;
//! let song = std::sync::Arc::new(engine.load(&mut SliceReader::new(&data), 64)?);
//! engine.start(&song);
//!
//! let mut block = vec![0u8; 4096];
//! engine.write_bytes(&mut block);
//! ```

mod engine;
mod error;
mod loader;
mod pitch;
mod player;
mod reader;
mod settings;
mod song;

pub use engine::{Driver, Engine};
pub use error::EngineError;
pub use loader::{Loader, ProTrackerLoader, XmLoader, all_loaders};
pub use pitch::{note_to_period, pan_gains, period_to_frequency, samples_per_tick};
pub use reader::{
    ModuleReader, ReaderError, SliceReader, Whence, read_string, read_u8, read_u16_be,
    read_u16_le, read_u32_le, skip,
};
pub use settings::{MixerMode, MixerSettings};
pub use song::{
    Cell, Instrument, LoopKind, NOTE_MAX, NOTE_OFF, Pattern, PlaybackFlags, Sample, Song,
    SongFormat,
};

// =============================================================================
// Constants
// =============================================================================

/// Default voice limit passed to [`Engine::load`] by hosts
pub const DEFAULT_MAX_VOICES: u16 = 64;

/// Default tempo (BPM)
pub const DEFAULT_TEMPO: u16 = 125;

/// Default speed (ticks per row)
pub const DEFAULT_SPEED: u16 = 6;

/// Rows in a pattern that is referenced by the order table but missing
pub const EMPTY_PATTERN_ROWS: u16 = 64;

/// Playback rate of a sample at C-4 with no finetune (Amiga PAL rate)
pub const C4_RATE: f32 = 8363.0;

/// XM/MOD effect commands handled by the player
pub mod effects {
    /// 8xx - Set panning
    pub const SET_PANNING: u8 = 0x08;
    /// 9xx - Sample offset
    pub const SAMPLE_OFFSET: u8 = 0x09;
    /// Axy - Volume slide
    pub const VOLUME_SLIDE: u8 = 0x0A;
    /// Bxx - Position jump
    pub const POSITION_JUMP: u8 = 0x0B;
    /// Cxx - Set volume
    pub const SET_VOLUME: u8 = 0x0C;
    /// Dxx - Pattern break
    pub const PATTERN_BREAK: u8 = 0x0D;
    /// Fxx - Set speed/tempo
    pub const SET_SPEED_TEMPO: u8 = 0x0F;
    /// Kxx - Key off
    pub const KEY_OFF: u8 = 0x14;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_MAX_VOICES, 64);
        assert_eq!(DEFAULT_SPEED, 6);
        assert_eq!(DEFAULT_TEMPO, 125);
        assert_eq!(NOTE_OFF, NOTE_MAX + 1);
    }
}
