//! Row (tick 0) and per-tick effect processing

use std::sync::Arc;

use super::Player;
use crate::effects;
use crate::pitch::{note_to_period, period_to_frequency};
use crate::song::{Cell, Song, SongFormat};

/// Highest note reachable after applying a sample's relative note
const MAX_EFFECTIVE_NOTE: i16 = 119;

impl Player {
    /// Read every cell of the current row (tick 0)
    pub(super) fn process_row(&mut self) {
        let song = Arc::clone(&self.song);

        for voice in &mut self.voices {
            voice.effect = 0;
            voice.param = 0;
        }

        // Missing patterns play as empty rows
        let Some(pattern) = song.pattern_at(self.order) else {
            return;
        };

        for ch in 0..self.voices.len() {
            if let Some(&cell) = pattern.cell(self.row, ch) {
                self.process_cell(&song, ch, cell);
            }
        }
    }

    fn process_cell(&mut self, song: &Song, ch: usize, cell: Cell) {
        let mix_rate = self.mix_rate;
        let voice = &mut self.voices[ch];
        voice.effect = cell.effect;
        voice.param = cell.param;

        if cell.instrument != 0 {
            voice.instrument = cell.instrument;
        }

        let target = if cell.has_note() {
            song.sample_for(voice.instrument, cell.note)
        } else {
            voice.sample
        };

        // Instrument column restores the sample defaults
        if cell.instrument != 0
            && let Some(sample) = target.and_then(|idx| song.sample(idx))
        {
            voice.volume = sample.volume;
            if song.format == SongFormat::Xm {
                voice.panning = sample.panning;
            }
        }

        let key_off_now = cell.effect == effects::KEY_OFF && cell.param == 0;
        if cell.is_key_off() || key_off_now {
            voice.cut();
        } else if cell.has_note() {
            match target.and_then(|idx| Some((idx, song.sample(idx)?))) {
                Some((idx, sample)) => {
                    let note = cell.note as i16 + sample.relative_note as i16;
                    if (1..=MAX_EFFECTIVE_NOTE).contains(&note) {
                        let frequency = period_to_frequency(note_to_period(note, sample.finetune));
                        let offset = if cell.effect == effects::SAMPLE_OFFSET {
                            cell.param as u32 * 256
                        } else {
                            0
                        };
                        if (offset as usize) < sample.data.len() {
                            voice.trigger(idx, offset, frequency, mix_rate);
                        } else {
                            voice.cut();
                        }
                    }
                }
                None => voice.cut(),
            }
        }

        // Volume column (XM)
        match cell.volume {
            0x10..=0x50 => voice.volume = cell.volume - 0x10,
            0xC0..=0xCF if song.flags.panning => voice.panning = (cell.volume & 0x0F) * 17,
            _ => {}
        }

        self.process_effect_tick0(song, ch, cell);
    }

    fn process_effect_tick0(&mut self, song: &Song, ch: usize, cell: Cell) {
        let param = cell.param;
        match cell.effect {
            effects::SET_VOLUME => self.voices[ch].volume = param.min(64),
            effects::SET_PANNING if song.flags.panning => self.voices[ch].panning = param,
            effects::VOLUME_SLIDE if param != 0 => self.voices[ch].volume_slide = param,
            effects::POSITION_JUMP => self.pending_jump = Some(param as u16),
            effects::PATTERN_BREAK => {
                // Parameter is two decimal digits
                let row = (param >> 4) as u16 * 10 + (param & 0x0F) as u16;
                self.pending_break = Some(row);
            }
            effects::SET_SPEED_TEMPO if param != 0 => {
                if param < 0x20 {
                    self.speed = param as u16;
                } else if song.flags.external_speed {
                    self.tempo = param as u16;
                }
            }
            _ => {}
        }
    }

    /// Continuous effects on ticks after the first
    pub(super) fn process_tick(&mut self) {
        let tick = self.tick;
        for voice in &mut self.voices {
            match voice.effect {
                effects::VOLUME_SLIDE => {
                    let up = voice.volume_slide >> 4;
                    let down = voice.volume_slide & 0x0F;
                    voice.volume = if up > 0 {
                        (voice.volume + up).min(64)
                    } else {
                        voice.volume.saturating_sub(down)
                    };
                }
                effects::KEY_OFF if voice.param as u16 == tick => voice.cut(),
                _ => {}
            }
        }
    }
}
