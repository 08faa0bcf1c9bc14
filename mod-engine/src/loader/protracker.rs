//! ProTracker MOD loader (31 samples, `M.K.` family signatures)

use tracing::debug;

use super::Loader;
use crate::error::EngineError;
use crate::reader::{ModuleReader, Whence, read_string, read_u8, read_u16_be};
use crate::song::{Cell, Instrument, LoopKind, Pattern, PlaybackFlags, Sample, Song, SongFormat};
use crate::{DEFAULT_SPEED, DEFAULT_TEMPO};

/// Offset of the four-byte format signature
const SIGNATURE_OFFSET: i64 = 1080;

const NUM_SAMPLES: usize = 31;
const ROWS_PER_PATTERN: u16 = 64;

/// XM note number of the first period table entry (C-1 in ProTracker terms)
const FIRST_NOTE: u8 = 37;

/// ProTracker periods for finetune 0, C-1 through B-3
const PERIOD_TABLE: [u16; 36] = [
    856, 808, 762, 720, 678, 640, 604, 570, 538, 508, 480, 453, //
    428, 404, 381, 360, 339, 320, 302, 285, 269, 254, 240, 226, //
    214, 202, 190, 180, 170, 160, 151, 143, 135, 127, 120, 113,
];

/// Amiga hard panning (left/right/right/left)
const PAN_LEFT: u8 = 64;
const PAN_RIGHT: u8 = 192;

/// Loader for `.mod` modules
#[derive(Debug, Clone, Copy, Default)]
pub struct ProTrackerLoader;

/// Channel count for a known signature
fn channels_for_signature(signature: &[u8; 4]) -> Option<u8> {
    match signature {
        b"M.K." | b"M!K!" | b"FLT4" | b"4CHN" => Some(4),
        b"6CHN" => Some(6),
        b"8CHN" | b"FLT8" | b"OCTA" => Some(8),
        _ => None,
    }
}

/// Map an Amiga period to the nearest XM note number
fn period_to_note(period: u16) -> u8 {
    if period == 0 {
        return 0;
    }
    let (index, _) = PERIOD_TABLE
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| (**p as i32 - period as i32).abs())
        .unwrap_or((0, &0));
    FIRST_NOTE + index as u8
}

struct SampleHeader {
    name: String,
    length: u32,
    finetune: i8,
    volume: u8,
    loop_start: u32,
    loop_length: u32,
}

impl Loader for ProTrackerLoader {
    fn name(&self) -> &'static str {
        "ProTracker (MOD)"
    }

    fn test(&self, reader: &mut dyn ModuleReader) -> bool {
        let mut signature = [0u8; 4];
        reader.seek(SIGNATURE_OFFSET, Whence::Set).is_ok()
            && reader.read(&mut signature).is_ok()
            && channels_for_signature(&signature).is_some()
    }

    fn load(&self, reader: &mut dyn ModuleReader) -> Result<Song, EngineError> {
        let title = read_string(reader, 20)?;

        let mut headers = Vec::with_capacity(NUM_SAMPLES);
        for _ in 0..NUM_SAMPLES {
            let name = read_string(reader, 22)?;
            let length = read_u16_be(reader)? as u32 * 2;
            let nibble = read_u8(reader)? & 0x0F;
            let finetune = if nibble > 7 { nibble as i8 - 16 } else { nibble as i8 };
            let volume = read_u8(reader)?.min(64);
            let loop_start = read_u16_be(reader)? as u32 * 2;
            let loop_length = read_u16_be(reader)? as u32 * 2;
            headers.push(SampleHeader {
                name,
                length,
                finetune,
                volume,
                loop_start,
                loop_length,
            });
        }

        let song_length = read_u8(reader)?;
        if song_length == 0 || song_length > 128 {
            return Err(EngineError::InvalidHeader("order count out of range"));
        }
        let restart = read_u8(reader)?;

        let mut orders = vec![0u8; 128];
        reader.read(&mut orders)?;

        let mut signature = [0u8; 4];
        reader.read(&mut signature)?;
        let num_channels = channels_for_signature(&signature)
            .ok_or(EngineError::InvalidHeader("unknown MOD signature"))?;

        // Pattern count comes from the whole table, not just the played part
        let num_patterns = orders.iter().copied().max().unwrap_or(0) as u16 + 1;
        orders.truncate(song_length as usize);

        let mut patterns = Vec::with_capacity(num_patterns as usize);
        let mut raw = vec![0u8; ROWS_PER_PATTERN as usize * num_channels as usize * 4];
        for pattern_idx in 0..num_patterns {
            reader
                .read(&mut raw)
                .map_err(|_| EngineError::InvalidPattern(pattern_idx))?;
            patterns.push(decode_pattern(&raw, num_channels));
        }

        let mut instruments = Vec::with_capacity(NUM_SAMPLES);
        for (index, header) in headers.into_iter().enumerate() {
            let mut body = vec![0u8; header.length as usize];
            reader
                .read(&mut body)
                .map_err(|_| EngineError::InvalidSample(index as u16))?;

            let data: Vec<i16> = body.iter().map(|&b| (b as i8 as i16) << 8).collect();
            let len = data.len() as u32;
            let loop_start = header.loop_start.min(len);
            let loop_end = (loop_start + header.loop_length).min(len);
            // A loop length of one word means "no loop"
            let loop_kind = if header.loop_length > 2 && loop_end > loop_start {
                LoopKind::Forward
            } else {
                LoopKind::None
            };

            instruments.push(Instrument {
                name: header.name.clone(),
                sample_map: [0; 96],
                samples: vec![Sample {
                    name: header.name,
                    data,
                    loop_start,
                    loop_end,
                    loop_kind,
                    volume: header.volume,
                    finetune: header.finetune.saturating_mul(16),
                    relative_note: 0,
                    panning: 128,
                }],
            });
        }

        let channel_panning = (0..num_channels)
            .map(|ch| if matches!(ch % 4, 0 | 3) { PAN_LEFT } else { PAN_RIGHT })
            .collect();

        debug!(
            "Loaded MOD '{}': {} channels, {} patterns",
            title, num_channels, num_patterns
        );

        Ok(Song {
            title,
            format: SongFormat::ProTracker,
            num_channels,
            initial_speed: DEFAULT_SPEED as u8,
            initial_tempo: DEFAULT_TEMPO as u8,
            global_volume: 64,
            restart_position: if (restart as usize) < orders.len() {
                restart as u16
            } else {
                0
            },
            orders,
            patterns,
            instruments,
            channel_panning,
            flags: PlaybackFlags::default(),
        })
    }
}

/// Decode one 64-row pattern of 4-byte cells
fn decode_pattern(raw: &[u8], num_channels: u8) -> Pattern {
    let rows = raw
        .chunks_exact(num_channels as usize * 4)
        .map(|row| {
            row.chunks_exact(4)
                .map(|c| Cell {
                    note: period_to_note((((c[0] & 0x0F) as u16) << 8) | c[1] as u16),
                    instrument: (c[0] & 0xF0) | (c[2] >> 4),
                    volume: 0,
                    effect: c[2] & 0x0F,
                    param: c[3],
                })
                .collect()
        })
        .collect();

    Pattern {
        num_rows: ROWS_PER_PATTERN,
        rows,
    }
}
