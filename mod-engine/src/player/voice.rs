//! Per-channel voice state and sample stepping

use crate::song::{LoopKind, Sample};

/// Playback state of one pattern channel
#[derive(Debug, Clone)]
pub(crate) struct Voice {
    /// Last instrument set on this channel (1-based, 0 = none)
    pub instrument: u8,
    /// (instrument index, sample index) being played
    pub sample: Option<(usize, usize)>,
    /// Position in sample points
    pub position: f64,
    /// Sample points advanced per output frame
    pub increment: f64,
    /// Ping-pong direction
    pub forward: bool,
    /// Volume (0-64)
    pub volume: u8,
    /// Panning (0-255, 128 = center)
    pub panning: u8,
    pub playing: bool,
    /// Effect command and parameter of the current row
    pub effect: u8,
    pub param: u8,
    /// Axy memory
    pub volume_slide: u8,
}

impl Voice {
    pub fn new(panning: u8) -> Self {
        Self {
            instrument: 0,
            sample: None,
            position: 0.0,
            increment: 0.0,
            forward: true,
            volume: 64,
            panning,
            playing: false,
            effect: 0,
            param: 0,
            volume_slide: 0,
        }
    }

    /// Start a sample from `offset` at the given frequency
    pub fn trigger(&mut self, sample: (usize, usize), offset: u32, frequency: f32, mix_rate: u32) {
        self.sample = Some(sample);
        self.position = offset as f64;
        self.increment = frequency as f64 / mix_rate as f64;
        self.forward = true;
        self.playing = true;
    }

    pub fn cut(&mut self) {
        self.playing = false;
    }

    /// Read the sample value at the current position (-1.0..1.0)
    pub fn value(&self, sample: &Sample, interpolate: bool) -> f32 {
        let data = &sample.data;
        let idx = self.position as usize;
        let Some(&s1) = data.get(idx) else {
            return 0.0;
        };
        let s1 = s1 as f32 / 32768.0;
        if !interpolate {
            return s1;
        }

        let next = if sample.loop_kind == LoopKind::Forward && idx + 1 >= sample.loop_end as usize {
            sample.loop_start as usize
        } else {
            idx + 1
        };
        let s2 = data.get(next).map(|&s| s as f32 / 32768.0).unwrap_or(s1);
        let frac = (self.position - idx as f64) as f32;
        s1 + (s2 - s1) * frac
    }

    /// Advance by `frames` output frames, resolving loops and sample end
    pub fn advance(&mut self, sample: &Sample, frames: u32) {
        let distance = self.increment * frames as f64;

        if !sample.has_loop() {
            self.position += distance;
            if self.position >= sample.data.len() as f64 {
                self.playing = false;
            }
            return;
        }

        let loop_start = sample.loop_start as f64;
        let loop_end = sample.loop_end as f64;
        let span = loop_end - loop_start;

        match sample.loop_kind {
            LoopKind::Forward | LoopKind::None => {
                self.position += distance;
                if self.position >= loop_end {
                    self.position = loop_start + (self.position - loop_start) % span;
                }
            }
            LoopKind::PingPong => {
                // Unfold the bounce into a 2*span cycle starting at loop_start
                let phase = if self.forward {
                    self.position - loop_start
                } else {
                    2.0 * span - (self.position - loop_start)
                } + distance;

                if phase < span && self.forward {
                    self.position += distance;
                    return;
                }

                let phase = phase % (2.0 * span);
                if phase < span {
                    self.forward = true;
                    self.position = loop_start + phase;
                } else {
                    self.forward = false;
                    self.position = loop_start + (2.0 * span - phase);
                }
            }
        }
    }
}
