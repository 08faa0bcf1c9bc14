//! Shared fixtures: in-memory XM modules and test logging

#![allow(dead_code)]

use tracing_subscriber::EnvFilter;

/// Output frames the two-second fixture plays at 44.1 kHz
/// (tempo 150 -> 735 frames/tick, 6 ticks/row, 20 rows)
pub const FIXTURE_FRAMES: u64 = 88_200;

pub const FIXTURE_TITLE: &str = "Surround Fixture";

/// Install a subscriber honoring `RUST_LOG` (repeat calls are harmless)
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn push_str(out: &mut Vec<u8>, s: &str, width: usize) {
    let mut field = s.as_bytes().to_vec();
    field.resize(width, 0);
    out.extend_from_slice(&field);
}

/// 16-bit square wave, delta encoded, one period of `period` points
fn square_wave(period: usize, amplitude: i16) -> Vec<u8> {
    let mut raw = Vec::with_capacity(period * 2);
    let mut previous = 0i16;
    for i in 0..period {
        let value = if i < period / 2 { amplitude } else { -amplitude };
        raw.extend_from_slice(&value.wrapping_sub(previous).to_le_bytes());
        previous = value;
    }
    raw
}

fn push_instrument(out: &mut Vec<u8>, name: &str, panning: u8, period: usize) {
    let start = out.len();
    out.extend_from_slice(&263u32.to_le_bytes());
    push_str(out, name, 22);
    out.push(0);
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&[0u8; 96]);
    out.resize(start + 263, 0);

    let data = square_wave(period, 12_000);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // loop start
    out.extend_from_slice(&(data.len() as u32).to_le_bytes()); // loop length
    out.push(64); // volume
    out.push(0); // finetune
    out.push(0x10 | 0x01); // 16-bit, forward loop
    out.push(panning);
    out.push(0); // relative note
    out.push(0);
    push_str(out, name, 22);
    out.extend_from_slice(&data);
}

/// Two-second stereo XM: two looping 16-bit square voices panned hard
/// left and right, 20 rows at speed 6 / tempo 150
pub fn two_second_xm() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"Extended Module: ");
    push_str(&mut out, FIXTURE_TITLE, 20);
    out.push(0x1A);
    push_str(&mut out, "fixture", 20);
    out.extend_from_slice(&0x0104u16.to_le_bytes());

    out.extend_from_slice(&276u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // song length
    out.extend_from_slice(&0u16.to_le_bytes()); // restart
    out.extend_from_slice(&2u16.to_le_bytes()); // channels
    out.extend_from_slice(&1u16.to_le_bytes()); // patterns
    out.extend_from_slice(&2u16.to_le_bytes()); // instruments
    out.extend_from_slice(&1u16.to_le_bytes()); // linear frequencies
    out.extend_from_slice(&6u16.to_le_bytes()); // speed
    out.extend_from_slice(&150u16.to_le_bytes()); // tempo
    out.extend_from_slice(&[0u8; 256]);

    // Row 0 starts both voices, rows 1-19 are empty
    let mut packed = vec![49, 1, 0, 0, 0, 61, 2, 0, 0, 0];
    packed.extend(std::iter::repeat_n(0x80, 19 * 2));
    out.extend_from_slice(&9u32.to_le_bytes());
    out.push(0);
    out.extend_from_slice(&20u16.to_le_bytes());
    out.extend_from_slice(&(packed.len() as u16).to_le_bytes());
    out.extend_from_slice(&packed);

    push_instrument(&mut out, "left", 0, 64);
    push_instrument(&mut out, "right", 255, 48);
    out
}
