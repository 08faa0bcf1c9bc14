//! Song player: row/tick sequencing and voice mixing
//!
//! The player walks the order table one tick at a time. Tick 0 of each row
//! reads the pattern cells (`row.rs`); the remaining ticks only run
//! continuous effects. Between ticks, every playing voice is mixed into
//! floating-point stereo frames.

mod row;
mod voice;


use std::sync::Arc;

use tracing::debug;

use crate::pitch::{pan_gains, samples_per_tick};
use crate::song::Song;
use voice::Voice;

/// Playback state for one started song
#[derive(Debug, Clone)]
pub(crate) struct Player {
    song: Arc<Song>,
    mix_rate: u32,
    interpolate: bool,
    pan_separation: f32,

    // Position
    order: u16,
    row: u16,
    tick: u16,
    /// Output frames remaining in the current tick
    frames_left: u32,

    // Timing
    speed: u16,
    tempo: u16,

    voices: Vec<Voice>,
    global_volume: u8,

    // Flow control requested by the current row
    pending_jump: Option<u16>,
    pending_break: Option<u16>,

    loops_done: u8,
    finished: bool,
}

impl Player {
    pub fn new(song: Arc<Song>, mix_rate: u32, interpolate: bool, pan_separation: u8) -> Self {
        let mut player = Self {
            voices: Vec::new(),
            speed: song.initial_speed as u16,
            tempo: song.initial_tempo as u16,
            global_volume: song.global_volume,
            song,
            mix_rate,
            interpolate,
            pan_separation: pan_separation.min(128) as f32 / 128.0,
            order: 0,
            row: 0,
            tick: 0,
            frames_left: 0,
            pending_jump: None,
            pending_break: None,
            loops_done: 0,
            finished: false,
        };
        player.restart();
        player
    }

    /// Rewind to the first order and reset all channel state
    pub fn restart(&mut self) {
        self.speed = (self.song.initial_speed as u16).max(1);
        self.tempo = (self.song.initial_tempo as u16).max(1);
        self.global_volume = self.song.global_volume;
        self.loops_done = 0;
        self.finished = false;
        self.jump_to(0);
    }

    /// Continue playback at the start of an order position
    ///
    /// Orders past the end of the table clamp to the last entry.
    pub fn jump_to(&mut self, order: u16) {
        let last = self.song.orders.len().saturating_sub(1) as u16;
        self.order = order.min(last);
        self.row = 0;
        self.tick = 0;
        self.pending_jump = None;
        self.pending_break = None;
        self.finished = false;
        self.voices = self
            .song
            .channel_panning
            .iter()
            .map(|&pan| Voice::new(pan))
            .collect();
        self.voices
            .resize_with(self.song.num_channels as usize, || Voice::new(128));

        self.process_row();
        self.frames_left = samples_per_tick(self.tempo, self.mix_rate);
    }

    pub fn song(&self) -> &Arc<Song> {
        &self.song
    }

    /// Current (order, row)
    pub fn position(&self) -> (u16, u16) {
        (self.order, self.row)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Mix frames into `out` until it is full or the song ends.
    /// Returns the number of frames written.
    pub fn mix(&mut self, out: &mut [[f32; 2]]) -> usize {
        let mut done = 0;
        while done < out.len() && !self.finished {
            if self.frames_left == 0 {
                self.next_tick();
                continue;
            }

            let count = (self.frames_left as usize).min(out.len() - done);
            for frame in &mut out[done..done + count] {
                *frame = self.mix_frame();
            }
            self.frames_left -= count as u32;
            done += count;
        }
        done
    }

    /// Advance playback by `frames` output frames without mixing
    pub fn skip_frames(&mut self, frames: u64) {
        let mut remaining = frames;
        while remaining > 0 && !self.finished {
            if self.frames_left == 0 {
                self.next_tick();
                continue;
            }

            let count = (self.frames_left as u64).min(remaining) as u32;
            let song = &self.song;
            for voice in self.voices.iter_mut().filter(|v| v.playing) {
                match voice.sample.and_then(|idx| song.sample(idx)) {
                    Some(sample) => voice.advance(sample, count),
                    None => voice.cut(),
                }
            }
            self.frames_left -= count;
            remaining -= count as u64;
        }
    }

    // =========================================================================
    // Sequencing
    // =========================================================================

    fn next_tick(&mut self) {
        self.tick += 1;
        if self.tick >= self.speed {
            self.tick = 0;
            self.advance_row();
            if self.finished {
                return;
            }
            self.process_row();
        } else {
            self.process_tick();
        }
        self.frames_left = samples_per_tick(self.tempo, self.mix_rate);
    }

    /// Move to the next row, applying jumps, breaks and the song-end rule
    fn advance_row(&mut self) {
        let rows = self.song.rows_at(self.order);
        let mut looped = false;

        let (mut order, mut row) = match (self.pending_jump.take(), self.pending_break.take()) {
            (Some(target), brk) => {
                // Jumping back (or onto the current order) replays the song
                looped = target <= self.order;
                (target, brk.unwrap_or(0))
            }
            (None, Some(brk)) => (self.order + 1, brk),
            (None, None) if self.row + 1 < rows => (self.order, self.row + 1),
            (None, None) => (self.order + 1, 0),
        };

        if order as usize >= self.song.orders.len() {
            looped = true;
            order = self.song.restart_position;
            row = 0;
        }

        if looped {
            self.loops_done = self.loops_done.saturating_add(1);
            let flags = self.song.flags;
            if !flags.wrap && self.loops_done >= flags.repeat_count.max(1) {
                debug!(
                    "Song '{}' finished after {} pass(es)",
                    self.song.title, self.loops_done
                );
                self.finished = true;
                self.voices.iter_mut().for_each(Voice::cut);
                return;
            }
        }

        if row >= self.song.rows_at(order) {
            row = 0;
        }
        self.order = order;
        self.row = row;
    }

    // =========================================================================
    // Mixing
    // =========================================================================

    fn mix_frame(&mut self) -> [f32; 2] {
        let song = &self.song;
        let global = self.global_volume as f32 / 64.0;
        let mut left = 0.0;
        let mut right = 0.0;

        for voice in self.voices.iter_mut().filter(|v| v.playing) {
            let Some(sample) = voice.sample.and_then(|idx| song.sample(idx)) else {
                voice.cut();
                continue;
            };

            let value = voice.value(sample, self.interpolate) * (voice.volume as f32 / 64.0);
            let pan = (voice.panning as f32 - 128.0) / 128.0 * self.pan_separation;
            let (gain_l, gain_r) = pan_gains(pan);
            left += value * gain_l;
            right += value * gain_r;

            voice.advance(sample, 1);
        }

        [left * global, right * global]
    }
}
