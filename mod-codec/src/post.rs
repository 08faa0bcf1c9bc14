//! Sample encoding correction applied to every rendered block

use crate::format::DecoderConfig;

/// Toggle the sign bit of every byte (unsigned <-> signed 8-bit)
pub fn flip_sign_8(buf: &mut [u8]) {
    for byte in buf {
        *byte ^= 0x80;
    }
}

/// Swap the two bytes of every complete 16-bit sample
pub fn swap_bytes_16(buf: &mut [u8]) {
    for sample in buf.chunks_exact_mut(2) {
        sample.swap(0, 1);
    }
}

/// Apply the corrections `config` calls for over the whole block
pub fn apply(config: &DecoderConfig, buf: &mut [u8]) {
    if config.swap8 {
        flip_sign_8(buf);
    } else if config.swap16 {
        swap_bytes_16(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{AudioFormat, OutputFormatSpec, negotiate};

    #[test]
    fn test_flip_sign_8() {
        let mut buf = [0x00, 0x80, 0xFF, 0x7F];
        flip_sign_8(&mut buf);
        assert_eq!(buf, [0x80, 0x00, 0x7F, 0xFF]);
        flip_sign_8(&mut buf);
        assert_eq!(buf, [0x00, 0x80, 0xFF, 0x7F]);
    }

    #[test]
    fn test_swap_bytes_16() {
        let mut buf = [0x12, 0x34, 0x56, 0x78, 0x9A];
        swap_bytes_16(&mut buf);
        assert_eq!(buf, [0x34, 0x12, 0x78, 0x56, 0x9A]);
        swap_bytes_16(&mut buf);
        assert_eq!(buf, [0x12, 0x34, 0x56, 0x78, 0x9A]);
    }

    #[test]
    fn test_apply_follows_config() {
        let signed = negotiate(&OutputFormatSpec {
            format: AudioFormat::S8,
            ..Default::default()
        })
        .unwrap();
        let mut buf = [0x80u8; 4];
        apply(&signed, &mut buf);
        assert_eq!(buf, [0; 4]);

        let native = negotiate(&OutputFormatSpec::default()).unwrap();
        let mut buf = [1u8, 2, 3, 4];
        apply(&native, &mut buf);
        assert_eq!(buf, [1, 2, 3, 4]);
    }
}
