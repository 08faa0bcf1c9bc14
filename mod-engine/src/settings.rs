//! Mixer settings

bitflags::bitflags! {
    /// Mixer mode bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MixerMode: u16 {
        /// Emit signed 16-bit samples in host byte order (otherwise unsigned 8-bit)
        const SIXTEEN_BITS = 0x0001;
        /// Emit interleaved stereo frames (otherwise mono)
        const STEREO = 0x0002;
        /// Linear interpolation between sample points (otherwise nearest sample)
        const INTERPOLATE = 0x0004;
    }
}

/// Output settings applied by [`crate::Engine::init`]
#[derive(Debug, Clone, PartialEq)]
pub struct MixerSettings {
    pub mode: MixerMode,
    /// Mixing frequency in Hz
    pub frequency: u32,
    /// Master output volume (0-128)
    pub volume: u8,
    /// Music volume (0-128)
    pub music_volume: u8,
    /// Stereo separation (0 = mono, 128 = full)
    pub pan_separation: u8,
}

impl Default for MixerSettings {
    fn default() -> Self {
        Self {
            mode: MixerMode::SIXTEEN_BITS | MixerMode::STEREO | MixerMode::INTERPOLATE,
            frequency: 44_100,
            volume: 128,
            music_volume: 128,
            pan_separation: 128,
        }
    }
}

impl MixerSettings {
    pub fn is_16bit(&self) -> bool {
        self.mode.contains(MixerMode::SIXTEEN_BITS)
    }

    pub fn is_stereo(&self) -> bool {
        self.mode.contains(MixerMode::STEREO)
    }

    /// Bytes per output sample
    pub fn sample_bytes(&self) -> usize {
        if self.is_16bit() { 2 } else { 1 }
    }

    /// Bytes per interleaved output frame
    pub fn frame_bytes(&self) -> usize {
        self.sample_bytes() * if self.is_stereo() { 2 } else { 1 }
    }

    /// Byte value of silence in the output encoding
    pub fn silence(&self) -> u8 {
        if self.is_16bit() { 0x00 } else { 0x80 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_bits() {
        let mode = MixerMode::SIXTEEN_BITS | MixerMode::STEREO;
        assert!(mode.contains(MixerMode::STEREO));
        assert!(!mode.contains(MixerMode::INTERPOLATE));
        assert_eq!(mode.bits(), 0x0003);
        assert_eq!(MixerMode::empty().union(MixerMode::STEREO), MixerMode::STEREO);
    }

    #[test]
    fn test_frame_bytes() {
        let mut settings = MixerSettings::default();
        assert_eq!(settings.frame_bytes(), 4);
        assert_eq!(settings.silence(), 0);

        settings.mode = MixerMode::STEREO;
        assert_eq!(settings.frame_bytes(), 2);
        assert_eq!(settings.silence(), 0x80);

        settings.mode = MixerMode::empty();
        assert_eq!(settings.frame_bytes(), 1);
    }
}
