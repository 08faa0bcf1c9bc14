//! Mod-Codec: surround-capable tracker module codec
//!
//! Adapts the stereo [`mod_engine`] decoder to a host mixer that asks for
//! up to six interleaved channels in one of several sample encodings.
//!
//! # Block pipeline
//!
//! ```text
//! host buffer (L bytes)
//! ┌──────────────────────────────────────────────┐
//! │ decode stereo into the first narrow_len bytes│  Engine::write_bytes
//! ├──────────────────────────────────────────────┤
//! │ widen in place, back to front                │  expand::expand_in_place
//! ├──────────────────────────────────────────────┤
//! │ sign flip (S8) or byte swap (foreign 16-bit) │  post::apply
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use mod_codec::{AudioFormat, CodecConfig, ModCodec, OutputFormatSpec};
//!
//! let spec = OutputFormatSpec {
//!     format: AudioFormat::S16Lsb,
//!     channels: 6,
//!     frequency: 48_000,
//! };
//! let mut codec = ModCodec::new(&spec, &CodecConfig::default())?;
//!
//! let song = codec.open_owned(std::fs::File::open("song.xm")?)?;
//! codec.set_volume(song, 128)?;
//! codec.play(song)?;
//!
//! let mut block = vec![0u8; 4096];
//! while codec.is_playing(song) {
//!     codec.render_block(song, &mut block)?;
//! }
//! ```

mod codec;
mod config;
mod decoder;
mod error;
pub mod expand;
mod format;
pub mod post;
mod session;
mod stream;

pub use codec::{AudioCodec, CodecCapabilities};
pub use config::{CodecConfig, ConfigError, MixerConfig, PlayPolicy, SessionConfig};
pub use decoder::DecoderEngine;
pub use error::CodecError;
pub use format::{AudioFormat, DecoderConfig, OutputFormatSpec, SampleWidth, negotiate};
pub use session::{ModCodec, ModuleHandle, PlaybackState};
pub use stream::{StreamAdapter, StreamSource};

/// Most interleaved channels the codec can produce
pub const MAX_OUTPUT_CHANNELS: usize = 6;
