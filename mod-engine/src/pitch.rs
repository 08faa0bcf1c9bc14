//! Pitch, timing and panning helpers

use crate::C4_RATE;

/// 17-point quarter-sine lookup table (cos values for left channel).
/// Values are cos(i * PI/32) for i = 0..16, scaled to 0-255.
const PAN_COS_LUT: [u8; 17] = [
    255, 254, 251, 245, 237, 226, 213, 198, 181, 162, 142, 121, 98, 75, 51, 26, 0,
];

/// Convert a note to a linear period
///
/// XM linear period: 10*12*16*4 - (note-1)*16*4 - finetune/2.
/// `note` is 1-based (1 = C-0) and already includes the sample's relative note.
pub fn note_to_period(note: i16, finetune: i8) -> f32 {
    let period =
        10.0 * 12.0 * 16.0 * 4.0 - ((note - 1) as f32 * 16.0 * 4.0) - (finetune as f32 / 2.0);
    period.max(1.0)
}

/// Convert a linear period to a playback frequency in Hz
///
/// Frequency = 8363 * 2^((4608 - Period) / 768), so C-4 plays at the Amiga rate.
#[inline]
pub fn period_to_frequency(period: f32) -> f32 {
    if period <= 0.0 {
        return 0.0;
    }
    C4_RATE * ((4608.0 - period) / 768.0).exp2()
}

/// Output frames per tick: frequency * 2.5 / tempo
pub fn samples_per_tick(tempo: u16, frequency: u32) -> u32 {
    if tempo == 0 {
        return frequency;
    }
    let frames = frequency as u64 * 5 / 2 / tempo as u64;
    u32::try_from(frames).unwrap_or(u32::MAX).max(1)
}

/// Equal-power gains for a pan position (-1.0 = left, 1.0 = right)
#[inline]
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let pos = (pan.clamp(-1.0, 1.0) + 1.0) * 8.0;
    let idx = (pos as usize).min(15);
    let frac = pos - idx as f32;

    let cos_val = PAN_COS_LUT[idx] as f32 * (1.0 - frac) + PAN_COS_LUT[idx + 1] as f32 * frac;
    let sin_val = PAN_COS_LUT[16 - idx] as f32 * (1.0 - frac) + PAN_COS_LUT[15 - idx] as f32 * frac;

    (cos_val / 255.0, sin_val / 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_to_period() {
        // C-4 (note 49) gives 7680 - 48*64 = 4608
        assert!((note_to_period(49, 0) - 4608.0).abs() < f32::EPSILON);
        assert!(note_to_period(61, 0) < note_to_period(49, 0));
        assert!(note_to_period(49, 64) < note_to_period(49, 0));
    }

    #[test]
    fn test_period_to_frequency() {
        let c4 = period_to_frequency(note_to_period(49, 0));
        assert!((c4 - 8363.0).abs() < 0.5, "Expected ~8363 Hz, got {}", c4);

        let c5 = period_to_frequency(note_to_period(61, 0));
        assert!((c5 / c4 - 2.0).abs() < 0.001, "C-5 should be ~2x C-4");

        assert_eq!(period_to_frequency(0.0), 0.0);
    }

    #[test]
    fn test_samples_per_tick() {
        // 44100 * 2.5 / 125 = 882
        assert_eq!(samples_per_tick(125, 44_100), 882);
        assert_eq!(samples_per_tick(150, 44_100), 735);
        assert_eq!(samples_per_tick(0, 22_050), 22_050);
        assert_eq!(samples_per_tick(125, u32::MAX), 85_899_345);
        assert_eq!(samples_per_tick(1, u32::MAX), u32::MAX);
    }

    #[test]
    fn test_pan_gains() {
        let (l, r) = pan_gains(-1.0);
        assert!((l - 1.0).abs() < 0.01 && r.abs() < 0.01);

        let (l, r) = pan_gains(1.0);
        assert!(l.abs() < 0.01 && (r - 1.0).abs() < 0.01);

        let (l, r) = pan_gains(0.0);
        assert!((l - r).abs() < 0.01);
        assert!((l - 0.71).abs() < 0.02, "center should be about -3dB");
    }
}
