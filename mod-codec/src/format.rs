//! Output format negotiation
//!
//! The decoder only produces unsigned 8-bit or host-order signed 16-bit
//! PCM in one or two channels. [`negotiate`] maps the host's requested
//! format onto that and records which corrections each block needs.

use std::fmt;

use mod_engine::{MixerMode, MixerSettings};

use crate::MAX_OUTPUT_CHANNELS;
use crate::config::MixerConfig;
use crate::error::CodecError;

/// Host sample encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    U8,
    S8,
    U16Lsb,
    U16Msb,
    S16Lsb,
    S16Msb,
    S32Lsb,
    S32Msb,
    F32Lsb,
    F32Msb,
}

impl AudioFormat {
    /// Signed 16-bit in host byte order
    #[cfg(target_endian = "little")]
    pub const S16_SYS: Self = Self::S16Lsb;
    #[cfg(target_endian = "big")]
    pub const S16_SYS: Self = Self::S16Msb;

    pub fn bits(&self) -> u8 {
        match self {
            Self::U8 | Self::S8 => 8,
            Self::U16Lsb | Self::U16Msb | Self::S16Lsb | Self::S16Msb => 16,
            Self::S32Lsb | Self::S32Msb | Self::F32Lsb | Self::F32Msb => 32,
        }
    }

    pub fn is_big_endian(&self) -> bool {
        matches!(
            self,
            Self::U16Msb | Self::S16Msb | Self::S32Msb | Self::F32Msb
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::U8 => "U8",
            Self::S8 => "S8",
            Self::U16Lsb => "U16LSB",
            Self::U16Msb => "U16MSB",
            Self::S16Lsb => "S16LSB",
            Self::S16Msb => "S16MSB",
            Self::S32Lsb => "S32LSB",
            Self::S32Msb => "S32MSB",
            Self::F32Lsb => "F32LSB",
            Self::F32Msb => "F32MSB",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output format requested by the host mixer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormatSpec {
    pub format: AudioFormat,
    /// Interleaved channels (1-6)
    pub channels: u8,
    /// Mixing frequency in Hz
    pub frequency: u32,
}

impl Default for OutputFormatSpec {
    fn default() -> Self {
        Self {
            format: AudioFormat::S16_SYS,
            channels: 2,
            frequency: 44_100,
        }
    }
}

/// Decoder sample width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleWidth {
    Eight,
    Sixteen,
}

impl SampleWidth {
    pub fn bytes(&self) -> usize {
        match self {
            SampleWidth::Eight => 1,
            SampleWidth::Sixteen => 2,
        }
    }

    /// Byte value of silence in the decoder's native encoding
    pub fn native_silence(&self) -> u8 {
        match self {
            SampleWidth::Eight => 0x80,
            SampleWidth::Sixteen => 0x00,
        }
    }
}

/// Decoder configuration derived once per session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    pub width: SampleWidth,
    /// Decode two channels (otherwise mono)
    pub stereo: bool,
    /// Flip the sign bit of every byte (unsigned -> signed 8-bit)
    pub swap8: bool,
    /// Swap the bytes of every 16-bit sample
    pub swap16: bool,
    /// Channels in the host buffer
    pub channels: u8,
    pub frequency: u32,
}

impl DecoderConfig {
    /// Stereo decode must be widened to more than two channels
    pub fn expands(&self) -> bool {
        self.channels > 2
    }

    /// Bytes per interleaved frame in the host buffer
    pub fn output_frame_bytes(&self) -> usize {
        self.channels as usize * self.width.bytes()
    }

    /// Engine settings for this configuration
    pub fn mixer_settings(&self, mixer: &MixerConfig) -> MixerSettings {
        let mut mode = MixerMode::empty();
        if self.width == SampleWidth::Sixteen {
            mode |= MixerMode::SIXTEEN_BITS;
        }
        if self.stereo {
            mode |= MixerMode::STEREO;
        }
        if mixer.interpolation {
            mode |= MixerMode::INTERPOLATE;
        }

        MixerSettings {
            mode,
            frequency: self.frequency,
            volume: mixer.volume.min(128),
            music_volume: mixer.music_volume.min(128),
            pan_separation: mixer.pan_separation.min(128),
        }
    }
}

/// Derive the decoder configuration for a requested output format
pub fn negotiate(spec: &OutputFormatSpec) -> Result<DecoderConfig, CodecError> {
    if spec.channels == 0 {
        return Err(CodecError::NoChannels);
    }
    if spec.channels as usize > MAX_OUTPUT_CHANNELS {
        return Err(CodecError::TooManyChannels {
            requested: spec.channels,
            max: MAX_OUTPUT_CHANNELS as u8,
        });
    }

    let (width, swap8, swap16) = match spec.format {
        AudioFormat::U8 => (SampleWidth::Eight, false, false),
        AudioFormat::S8 => (SampleWidth::Eight, true, false),
        AudioFormat::S16Lsb | AudioFormat::S16Msb => {
            let native_big = cfg!(target_endian = "big");
            (
                SampleWidth::Sixteen,
                false,
                spec.format.is_big_endian() != native_big,
            )
        }
        other => return Err(CodecError::UnsupportedFormat(other)),
    };

    Ok(DecoderConfig {
        width,
        stereo: spec.channels >= 2,
        swap8,
        swap16,
        channels: spec.channels,
        frequency: spec.frequency,
    })
}
