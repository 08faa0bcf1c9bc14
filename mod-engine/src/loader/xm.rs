//! FastTracker II XM loader
//!
//! Reference: XM format specification v0104
//! <https://github.com/milkytracker/MilkyTracker/blob/master/resources/reference/xm-form.txt>

use tracing::debug;

use super::{Loader, decode_delta_8, decode_delta_16};
use crate::error::EngineError;
use crate::reader::{
    ModuleReader, Whence, read_string, read_u8, read_u16_le, read_u32_le, skip,
};
use crate::song::{Cell, Instrument, LoopKind, Pattern, PlaybackFlags, Sample, Song, SongFormat};

/// XM format magic string
pub const XM_MAGIC: &[u8; 17] = b"Extended Module: ";

/// Oldest XM version with the layout this loader reads
const XM_VERSION: u16 = 0x0104;

const MAX_CHANNELS: u16 = 32;
const MAX_PATTERNS: u16 = 256;
const MAX_PATTERN_ROWS: u16 = 256;
const MAX_INSTRUMENTS: u16 = 128;
const MAX_SAMPLES_PER_INSTRUMENT: u16 = 16;

/// Largest sample body accepted (bytes)
const MAX_SAMPLE_BYTES: u32 = 64 * 1024 * 1024;

/// Sample header fields we consume (length..name)
const SAMPLE_HEADER_SIZE: u32 = 40;

/// Loader for `.xm` modules
#[derive(Debug, Clone, Copy, Default)]
pub struct XmLoader;

impl Loader for XmLoader {
    fn name(&self) -> &'static str {
        "FastTracker II (XM)"
    }

    fn test(&self, reader: &mut dyn ModuleReader) -> bool {
        let mut magic = [0u8; 17];
        reader.read(&mut magic).is_ok() && &magic == XM_MAGIC
    }

    fn load(&self, reader: &mut dyn ModuleReader) -> Result<Song, EngineError> {
        let mut magic = [0u8; 17];
        reader.read(&mut magic)?;
        if &magic != XM_MAGIC {
            return Err(EngineError::InvalidHeader("missing XM signature"));
        }

        let title = read_string(reader, 20)?;

        // 0x1A marker and tracker name
        skip(reader, 1 + 20)?;

        let version = read_u16_le(reader)?;
        if version < XM_VERSION {
            return Err(EngineError::UnsupportedVersion(version));
        }

        // Header size is measured from the position of the size field itself
        let header_start = reader.tell()?;
        let header_size = read_u32_le(reader)?;

        let song_length = read_u16_le(reader)?;
        let restart_position = read_u16_le(reader)?;

        let num_channels = read_u16_le(reader)?;
        if num_channels == 0 {
            return Err(EngineError::InvalidHeader("module has no channels"));
        }
        if num_channels > MAX_CHANNELS {
            return Err(EngineError::TooManyChannels {
                channels: num_channels,
                limit: MAX_CHANNELS,
            });
        }

        let num_patterns = read_u16_le(reader)?;
        if num_patterns > MAX_PATTERNS {
            return Err(EngineError::InvalidHeader("too many patterns"));
        }

        let num_instruments = read_u16_le(reader)?;
        if num_instruments > MAX_INSTRUMENTS {
            return Err(EngineError::InvalidHeader("too many instruments"));
        }

        // Bit 0 selects the linear frequency table; periods are always linear here
        let _flags = read_u16_le(reader)?;
        let default_speed = read_u16_le(reader)?;
        let default_tempo = read_u16_le(reader)?;

        let mut orders = vec![0u8; 256];
        reader.read(&mut orders)?;
        orders.truncate((song_length as usize).min(256));
        if orders.is_empty() {
            return Err(EngineError::InvalidHeader("empty order table"));
        }

        reader.seek((header_start + header_size as u64) as i64, Whence::Set)?;

        let mut patterns = Vec::with_capacity(num_patterns as usize);
        for pattern_idx in 0..num_patterns {
            let pattern = parse_pattern(reader, num_channels as u8)
                .map_err(|_| EngineError::InvalidPattern(pattern_idx))?;
            patterns.push(pattern);
        }

        let mut instruments = Vec::with_capacity(num_instruments as usize);
        for instr_idx in 0..num_instruments {
            let instrument = parse_instrument(reader, instr_idx)?;
            instruments.push(instrument);
        }

        debug!(
            "Loaded XM '{}': {} channels, {} patterns, {} instruments",
            title, num_channels, num_patterns, num_instruments
        );

        Ok(Song {
            title,
            format: SongFormat::Xm,
            num_channels: num_channels as u8,
            initial_speed: default_speed.clamp(1, 31) as u8,
            initial_tempo: default_tempo.clamp(32, 255) as u8,
            global_volume: 64,
            restart_position: if (restart_position as usize) < orders.len() {
                restart_position
            } else {
                0
            },
            orders,
            patterns,
            instruments,
            channel_panning: vec![128; num_channels as usize],
            flags: PlaybackFlags::default(),
        })
    }
}

/// Parse a single pattern (header plus packed cell data)
fn parse_pattern(reader: &mut dyn ModuleReader, num_channels: u8) -> Result<Pattern, EngineError> {
    // Header length includes the 4-byte length field
    let header_start = reader.tell()?;
    let header_length = read_u32_le(reader)?;

    let _packing_type = read_u8(reader)?;

    let num_rows = read_u16_le(reader)?;
    if num_rows == 0 || num_rows > MAX_PATTERN_ROWS {
        return Err(EngineError::InvalidHeader("pattern row count out of range"));
    }

    let packed_size = read_u16_le(reader)?;

    reader.seek((header_start + header_length as u64) as i64, Whence::Set)?;

    if packed_size == 0 {
        return Ok(Pattern::empty(num_rows, num_channels));
    }

    let mut packed = vec![0u8; packed_size as usize];
    reader.read(&mut packed)?;

    let mut bytes = packed.iter().copied();
    let mut rows = Vec::with_capacity(num_rows as usize);
    for _ in 0..num_rows {
        let mut row = Vec::with_capacity(num_channels as usize);
        for _ in 0..num_channels {
            row.push(unpack_cell(&mut bytes)?);
        }
        rows.push(row);
    }

    Ok(Pattern { num_rows, rows })
}

/// Unpack a single cell from packed pattern data
fn unpack_cell(bytes: &mut impl Iterator<Item = u8>) -> Result<Cell, EngineError> {
    let mut next = || {
        bytes
            .next()
            .ok_or(EngineError::InvalidHeader("truncated pattern data"))
    };

    let first = next()?;
    if first & 0x80 == 0 {
        // Unpacked: five bytes in sequence
        return Ok(Cell {
            note: first,
            instrument: next()?,
            volume: next()?,
            effect: next()?,
            param: next()?,
        });
    }

    let mut cell = Cell::default();
    if first & 0x01 != 0 {
        cell.note = next()?;
    }
    if first & 0x02 != 0 {
        cell.instrument = next()?;
    }
    if first & 0x04 != 0 {
        cell.volume = next()?;
    }
    if first & 0x08 != 0 {
        cell.effect = next()?;
    }
    if first & 0x10 != 0 {
        cell.param = next()?;
    }
    Ok(cell)
}

struct SampleHeader {
    length: u32,
    loop_start: u32,
    loop_length: u32,
    volume: u8,
    finetune: i8,
    kind: u8,
    panning: u8,
    relative_note: i8,
    name: String,
}

/// Parse an instrument with its sample headers and sample data
fn parse_instrument(reader: &mut dyn ModuleReader, index: u16) -> Result<Instrument, EngineError> {
    let invalid = |_| EngineError::InvalidInstrument(index);

    let header_start = reader.tell()?;
    let header_size = read_u32_le(reader).map_err(invalid)?;

    let name = read_string(reader, 22).map_err(invalid)?;
    let _instrument_type = read_u8(reader).map_err(invalid)?;
    let num_samples = read_u16_le(reader).map_err(invalid)?;
    if num_samples > MAX_SAMPLES_PER_INSTRUMENT {
        return Err(EngineError::InvalidInstrument(index));
    }

    let mut instrument = Instrument {
        name,
        ..Default::default()
    };

    if num_samples == 0 {
        reader.seek((header_start + header_size as u64) as i64, Whence::Set)?;
        return Ok(instrument);
    }

    let sample_header_size = read_u32_le(reader).map_err(invalid)?;
    reader.read(&mut instrument.sample_map).map_err(invalid)?;

    // Envelopes, vibrato and fadeout are not used by the player
    reader.seek((header_start + header_size as u64) as i64, Whence::Set)?;

    let mut headers = Vec::with_capacity(num_samples as usize);
    for _ in 0..num_samples {
        let header = SampleHeader {
            length: read_u32_le(reader).map_err(invalid)?,
            loop_start: read_u32_le(reader).map_err(invalid)?,
            loop_length: read_u32_le(reader).map_err(invalid)?,
            volume: read_u8(reader).map_err(invalid)?.min(64),
            finetune: read_u8(reader).map_err(invalid)? as i8,
            kind: read_u8(reader).map_err(invalid)?,
            panning: read_u8(reader).map_err(invalid)?,
            relative_note: read_u8(reader).map_err(invalid)? as i8,
            name: {
                skip(reader, 1).map_err(invalid)?;
                read_string(reader, 22).map_err(invalid)?
            },
        };
        if sample_header_size > SAMPLE_HEADER_SIZE {
            skip(reader, (sample_header_size - SAMPLE_HEADER_SIZE) as u64)?;
        }
        headers.push(header);
    }

    for header in headers {
        if header.length > MAX_SAMPLE_BYTES {
            return Err(EngineError::InvalidSample(index));
        }
        let mut raw = vec![0u8; header.length as usize];
        reader
            .read(&mut raw)
            .map_err(|_| EngineError::InvalidSample(index))?;

        let sixteen_bit = header.kind & 0x10 != 0;
        let (data, unit) = if sixteen_bit {
            (decode_delta_16(&raw), 2)
        } else {
            (decode_delta_8(&raw), 1)
        };

        let len = data.len() as u32;
        let loop_start = (header.loop_start / unit).min(len);
        let loop_end = loop_start
            .saturating_add(header.loop_length / unit)
            .min(len);
        let loop_kind = match header.kind & 0x03 {
            _ if loop_end <= loop_start => LoopKind::None,
            1 => LoopKind::Forward,
            2 | 3 => LoopKind::PingPong,
            _ => LoopKind::None,
        };

        instrument.samples.push(Sample {
            name: header.name,
            data,
            loop_start,
            loop_end,
            loop_kind,
            volume: header.volume,
            finetune: header.finetune,
            relative_note: header.relative_note,
            panning: header.panning,
        });
    }

    Ok(instrument)
}
