//! Unified song model shared by all loaders

use crate::EMPTY_PATTERN_ROWS;

/// Highest playable note (B-7)
pub const NOTE_MAX: u8 = 96;

/// Note value for "key off"
pub const NOTE_OFF: u8 = 97;

/// Format the song was loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongFormat {
    /// FastTracker II extended module
    Xm,
    /// ProTracker and compatible 4/6/8 channel modules
    ProTracker,
}

impl SongFormat {
    pub fn name(&self) -> &'static str {
        match self {
            SongFormat::Xm => "FastTracker II",
            SongFormat::ProTracker => "ProTracker",
        }
    }
}

/// Playback behavior switches that hosts may override after loading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackFlags {
    /// Honor Fxx values >= 0x20 as tempo changes
    pub external_speed: bool,
    /// Honor panning commands in patterns
    pub panning: bool,
    /// Wrap to the restart position at song end instead of stopping
    pub wrap: bool,
    /// Passes through the song before stopping when `wrap` is off (0 acts as 1)
    pub repeat_count: u8,
}

impl Default for PlaybackFlags {
    fn default() -> Self {
        Self {
            external_speed: true,
            panning: true,
            wrap: true,
            repeat_count: 0,
        }
    }
}

/// A loaded tracker module
#[derive(Debug, Clone)]
pub struct Song {
    /// Song name (may be empty)
    pub title: String,
    pub format: SongFormat,
    /// Pattern channels (1-32)
    pub num_channels: u8,
    /// Initial speed (ticks per row)
    pub initial_speed: u8,
    /// Initial tempo (BPM)
    pub initial_tempo: u8,
    /// Global volume (0-64)
    pub global_volume: u8,
    /// Order index playback wraps to
    pub restart_position: u16,
    /// Pattern order table
    pub orders: Vec<u8>,
    pub patterns: Vec<Pattern>,
    /// Instruments, addressed 1-based by pattern cells
    pub instruments: Vec<Instrument>,
    /// Initial panning per channel (0-255)
    pub channel_panning: Vec<u8>,
    pub flags: PlaybackFlags,
}

impl Song {
    /// Pattern played at the given order position
    pub fn pattern_at(&self, order: u16) -> Option<&Pattern> {
        let index = *self.orders.get(order as usize)? as usize;
        self.patterns.get(index)
    }

    /// Rows at the given order position (missing patterns count as empty)
    pub fn rows_at(&self, order: u16) -> u16 {
        self.pattern_at(order)
            .map(|p| p.num_rows)
            .unwrap_or(EMPTY_PATTERN_ROWS)
    }

    /// Look up the sample an instrument plays for a note
    pub fn sample_for(&self, instrument: u8, note: u8) -> Option<(usize, usize)> {
        let instr_idx = instrument.checked_sub(1)? as usize;
        let instr = self.instruments.get(instr_idx)?;
        let sample_idx = *instr
            .sample_map
            .get(note.checked_sub(1)? as usize)
            .unwrap_or(&0) as usize;
        instr.samples.get(sample_idx)?;
        Some((instr_idx, sample_idx))
    }

    pub fn sample(&self, (instr_idx, sample_idx): (usize, usize)) -> Option<&Sample> {
        self.instruments.get(instr_idx)?.samples.get(sample_idx)
    }
}

/// Pattern of rows × channels
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Number of rows (1-256)
    pub num_rows: u16,
    /// Cell data: [row][channel]
    pub rows: Vec<Vec<Cell>>,
}

impl Pattern {
    pub fn empty(num_rows: u16, num_channels: u8) -> Self {
        Self {
            num_rows,
            rows: vec![vec![Cell::default(); num_channels as usize]; num_rows as usize],
        }
    }

    pub fn cell(&self, row: u16, channel: usize) -> Option<&Cell> {
        self.rows.get(row as usize)?.get(channel)
    }
}

/// One pattern cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    /// 0 = none, 1-96 = C-0..B-7, 97 = key off
    pub note: u8,
    /// Instrument number (1-based, 0 = none)
    pub instrument: u8,
    /// Raw XM volume-column byte (0 = none)
    pub volume: u8,
    pub effect: u8,
    pub param: u8,
}

impl Cell {
    pub fn has_note(&self) -> bool {
        (1..=NOTE_MAX).contains(&self.note)
    }

    pub fn is_key_off(&self) -> bool {
        self.note == NOTE_OFF
    }
}

/// Instrument: a keyboard map over one or more samples
#[derive(Debug, Clone)]
pub struct Instrument {
    pub name: String,
    /// Sample index for each of the 96 notes
    pub sample_map: [u8; 96],
    pub samples: Vec<Sample>,
}

impl Default for Instrument {
    fn default() -> Self {
        Self {
            name: String::new(),
            sample_map: [0; 96],
            samples: Vec::new(),
        }
    }
}

/// Sample loop type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopKind {
    #[default]
    None,
    Forward,
    PingPong,
}

/// PCM sample, normalized to signed 16-bit
#[derive(Debug, Clone, Default)]
pub struct Sample {
    pub name: String,
    pub data: Vec<i16>,
    /// Loop start in sample points
    pub loop_start: u32,
    /// Loop end (exclusive) in sample points
    pub loop_end: u32,
    pub loop_kind: LoopKind,
    /// Default volume (0-64)
    pub volume: u8,
    /// Finetune in 1/128 semitone
    pub finetune: i8,
    /// Transpose in semitones
    pub relative_note: i8,
    /// Default panning (0-255)
    pub panning: u8,
}

impl Sample {
    pub fn has_loop(&self) -> bool {
        self.loop_kind != LoopKind::None && self.loop_end > self.loop_start
    }
}
