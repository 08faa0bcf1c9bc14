//! Engine: driver/loader registry, module loading and the player slot

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::loader::{Loader, all_loaders};
use crate::player::Player;
use crate::reader::{ModuleReader, Whence};
use crate::settings::{MixerMode, MixerSettings};
use crate::song::Song;

/// Output drivers the engine can mix for
///
/// Only the silent software driver exists; the host pulls mixed bytes
/// through [`Engine::write_bytes`] instead of the engine opening a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    NoSound,
}

impl Driver {
    pub fn name(&self) -> &'static str {
        match self {
            Driver::NoSound => "Nosound Driver",
        }
    }
}

/// Tracker decoder engine
///
/// Holds the registered drivers and loaders, the mixer settings applied by
/// [`init`](Self::init) and a single player slot.
pub struct Engine {
    settings: MixerSettings,
    drivers: Vec<Driver>,
    loaders: Vec<Box<dyn Loader>>,
    initialized: bool,
    player: Option<Player>,
    /// Player volume (0-128)
    volume: u8,
    last_error: Option<String>,
    /// Float frames reused across `write_bytes` calls
    scratch: Vec<[f32; 2]>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            settings: MixerSettings::default(),
            drivers: Vec::new(),
            loaders: Vec::new(),
            initialized: false,
            player: None,
            volume: 128,
            last_error: None,
            scratch: Vec::new(),
        }
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Names of the registered drivers, one per line (`None` if empty)
    pub fn driver_info(&self) -> Option<String> {
        if self.drivers.is_empty() {
            return None;
        }
        let names: Vec<_> = self.drivers.iter().map(Driver::name).collect();
        Some(names.join("\n"))
    }

    pub fn register_driver(&mut self, driver: Driver) {
        if !self.drivers.contains(&driver) {
            debug!("Registered driver: {}", driver.name());
            self.drivers.push(driver);
        }
    }

    /// Names of the registered loaders, one per line (`None` if empty)
    pub fn loader_info(&self) -> Option<String> {
        if self.loaders.is_empty() {
            return None;
        }
        let names: Vec<_> = self.loaders.iter().map(|l| l.name()).collect();
        Some(names.join("\n"))
    }

    pub fn register_loader(&mut self, loader: Box<dyn Loader>) {
        if self.loaders.iter().any(|l| l.name() == loader.name()) {
            return;
        }
        debug!("Registered loader: {}", loader.name());
        self.loaders.push(loader);
    }

    pub fn register_all_loaders(&mut self) {
        for loader in all_loaders() {
            self.register_loader(loader);
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Apply mixer settings and make the engine ready to load and play
    pub fn init(&mut self, settings: MixerSettings) -> Result<(), EngineError> {
        let result = if self.drivers.is_empty() {
            Err(EngineError::NoDriver)
        } else if settings.frequency == 0 {
            Err(EngineError::InvalidFrequency(settings.frequency))
        } else {
            Ok(())
        };

        match result {
            Ok(()) => {
                info!(
                    "Engine initialized: {} Hz, {}-bit, {}",
                    settings.frequency,
                    settings.sample_bytes() * 8,
                    if settings.is_stereo() { "stereo" } else { "mono" }
                );
                self.settings = settings;
                self.initialized = true;
                Ok(())
            }
            Err(e) => Err(self.record(e)),
        }
    }

    /// Stop playback and release the mixer
    pub fn exit(&mut self) {
        if self.initialized {
            debug!("Engine shut down");
        }
        self.player = None;
        self.initialized = false;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn settings(&self) -> &MixerSettings {
        &self.settings
    }

    /// Message of the most recent failure
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn record(&mut self, error: EngineError) -> EngineError {
        warn!("Engine error: {}", error);
        self.last_error = Some(error.to_string());
        error
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Probe the registered loaders and load the module the reader holds
    ///
    /// Modules with more channels than `max_voices` are rejected.
    pub fn load(
        &mut self,
        reader: &mut dyn ModuleReader,
        max_voices: u16,
    ) -> Result<Song, EngineError> {
        self.load_song(reader, max_voices)
            .map_err(|e| self.record(e))
    }

    fn load_song(
        &self,
        reader: &mut dyn ModuleReader,
        max_voices: u16,
    ) -> Result<Song, EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        if self.loaders.is_empty() {
            return Err(EngineError::NoLoaders);
        }

        for loader in &self.loaders {
            reader.seek(0, Whence::Set)?;
            if !loader.test(reader) {
                continue;
            }

            reader.seek(0, Whence::Set)?;
            let song = loader.load(reader)?;
            if song.num_channels as u16 > max_voices {
                return Err(EngineError::TooManyChannels {
                    channels: song.num_channels as u16,
                    limit: max_voices,
                });
            }
            return Ok(song);
        }

        Err(EngineError::UnrecognizedFormat)
    }

    /// Release a module, stopping the player first if it is playing it
    pub fn free(&mut self, song: Arc<Song>) {
        if self.is_playing_song(&song) {
            self.stop();
        }
        debug!("Freed module '{}'", song.title);
    }

    // =========================================================================
    // Playback
    // =========================================================================

    /// Start playing a song, replacing whatever the player slot held
    pub fn start(&mut self, song: &Arc<Song>) {
        info!("Starting '{}' ({})", song.title, song.format.name());
        self.player = Some(Player::new(
            Arc::clone(song),
            self.settings.frequency,
            self.settings.mode.contains(MixerMode::INTERPOLATE),
            self.settings.pan_separation,
        ));
    }

    pub fn stop(&mut self) {
        self.player = None;
    }

    /// True while a song is started and has not reached its end
    pub fn active(&self) -> bool {
        self.player.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// True when the player slot holds this song
    pub fn is_playing_song(&self, song: &Arc<Song>) -> bool {
        self.player
            .as_ref()
            .is_some_and(|p| Arc::ptr_eq(p.song(), song))
    }

    /// Set the player volume (0-128, larger values clamp)
    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(128);
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Continue at the start of an order position
    pub fn set_position(&mut self, order: u16) {
        if let Some(player) = &mut self.player {
            player.jump_to(order);
        }
    }

    /// Restart the song and advance `frames` output frames without mixing
    pub fn seek_frames(&mut self, frames: u64) {
        if let Some(player) = &mut self.player {
            player.restart();
            player.skip_frames(frames);
        }
    }

    /// Current (order, row) of the player
    pub fn position(&self) -> Option<(u16, u16)> {
        self.player.as_ref().map(Player::position)
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// Mix into `buf` in the configured output encoding
    ///
    /// Only whole frames are mixed; a trailing partial frame and any part
    /// of the buffer past the end of the song are filled with silence.
    /// Returns the number of bytes covered by whole frames.
    pub fn write_bytes(&mut self, buf: &mut [u8]) -> usize {
        let frame_bytes = self.settings.frame_bytes();
        let frames = buf.len() / frame_bytes;
        let used = frames * frame_bytes;
        buf[used..].fill(self.settings.silence());

        let Some(player) = self.player.as_mut().filter(|_| self.initialized) else {
            buf[..used].fill(self.settings.silence());
            return used;
        };

        self.scratch.clear();
        self.scratch.resize(frames, [0.0; 2]);
        player.mix(&mut self.scratch);

        let gain = (self.settings.volume.min(128) as f32 / 128.0)
            * (self.settings.music_volume.min(128) as f32 / 128.0)
            * (self.volume as f32 / 128.0);
        let stereo = self.settings.is_stereo();
        let sixteen = self.settings.is_16bit();

        let mut out = buf[..used].chunks_exact_mut(self.settings.sample_bytes());
        for &[left, right] in &self.scratch {
            let pair = [left, right];
            let mono = [(left + right) * 0.5];
            let channels: &[f32] = if stereo { &pair } else { &mono };
            for &value in channels {
                let Some(slot) = out.next() else { break };
                let value = (value * gain).clamp(-1.0, 1.0);
                if sixteen {
                    slot.copy_from_slice(&((value * 32767.0) as i16).to_ne_bytes());
                } else {
                    slot[0] = ((value * 127.0).round() as i16 + 128) as u8;
                }
            }
        }

        used
    }
}
