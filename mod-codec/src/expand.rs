//! In-place stereo to N-channel widening
//!
//! The decoder renders stereo frames at the start of the host buffer.
//! [`expand_in_place`] then spreads them over the whole buffer, walking
//! frames from last to first so that every source frame is read before
//! any output frame can cover it. Output channel `k` carries source
//! channel `k % 2`.

use crate::format::SampleWidth;

/// Stereo bytes to decode so that the widened frames fill `buf_len`
///
/// Only whole output frames are counted.
pub fn narrow_len(buf_len: usize, channels: u8, width: SampleWidth) -> usize {
    let bytes = width.bytes();
    let frames = buf_len / (channels.max(1) as usize * bytes);
    frames * 2 * bytes
}

/// Widen `narrow_len` bytes of stereo frames at the start of `buf` to
/// `channels` interleaved channels.
///
/// Bytes past the last whole output frame are set to the decoder's
/// native silence. Returns the length covered by whole output frames.
/// For one or two channels the buffer is left as decoded.
pub fn expand_in_place(
    buf: &mut [u8],
    narrow_len: usize,
    channels: u8,
    width: SampleWidth,
) -> usize {
    if channels <= 2 {
        return narrow_len.min(buf.len());
    }

    let sample = width.bytes();
    let channels = channels as usize;
    let pair = 2 * sample;
    let wide_frame = channels * sample;
    let frames = (narrow_len / pair).min(buf.len() / wide_frame);

    for frame in (0..frames).rev() {
        let src = frame * pair;
        let dst = frame * wide_frame;
        // Highest channel first: channels 0 and 1 overwrite the source pair last
        for ch in (0..channels).rev() {
            let from = src + (ch % 2) * sample;
            buf.copy_within(from..from + sample, dst + ch * sample);
        }
    }

    let wide_len = frames * wide_frame;
    buf[wide_len..].fill(width.native_silence());
    wide_len
}
