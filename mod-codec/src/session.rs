//! Playback sessions: module handles and the single player slot
//!
//! A [`ModCodec`] owns one decoder engine. Any number of modules may be
//! loaded, but the engine mixes only one at a time. The session tracks
//! which handle holds the player and resolves conflicts with the
//! configured [`PlayPolicy`].

use std::fmt;

use hashbrown::HashMap;
use mod_engine::{Engine, PlaybackFlags};
use tracing::{debug, info, warn};

use crate::config::{CodecConfig, PlayPolicy, SessionConfig};
use crate::decoder::DecoderEngine;
use crate::error::CodecError;
use crate::expand::{expand_in_place, narrow_len};
use crate::format::{DecoderConfig, OutputFormatSpec, negotiate};
use crate::post;
use crate::stream::{StreamAdapter, StreamSource};

/// Opaque handle to a loaded module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleHandle(u32);

impl ModuleHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Playback state of a loaded module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Loaded, never started
    Loaded,
    /// Holds the player slot
    Playing,
    /// Stopped, superseded or played to the end
    Stopped,
}

/// Flags every opened module plays with: the host owns looping and fades
const HOST_FLAGS: PlaybackFlags = PlaybackFlags {
    external_speed: true,
    panning: true,
    wrap: false,
    repeat_count: 1,
};

struct LoadedModule<M> {
    module: M,
    state: PlaybackState,
}

/// Tracker module codec session
pub struct ModCodec<E: DecoderEngine = Engine> {
    engine: E,
    config: DecoderConfig,
    session: SessionConfig,
    modules: HashMap<ModuleHandle, LoadedModule<E::Module>>,
    next_handle: u32,
    /// Handle occupying the engine's player slot
    active: Option<ModuleHandle>,
    last_error: Option<String>,
    shut_down: bool,
}

impl ModCodec<Engine> {
    /// Session over a fresh [`Engine`]
    pub fn new(spec: &OutputFormatSpec, config: &CodecConfig) -> Result<Self, CodecError> {
        Self::init(Engine::new(), spec, config)
    }
}

impl<E: DecoderEngine> ModCodec<E> {
    /// Negotiate the output format and initialize the engine
    ///
    /// The silent driver and the built-in loaders are registered only when
    /// the engine has none yet.
    pub fn init(
        mut engine: E,
        spec: &OutputFormatSpec,
        config: &CodecConfig,
    ) -> Result<Self, CodecError> {
        let decoder = negotiate(spec).inspect_err(|e| warn!("Format negotiation failed: {}", e))?;

        if engine.driver_info().is_none() {
            engine.register_silent_driver();
        }
        if engine.loader_info().is_none() {
            engine.register_all_loaders();
        }

        engine
            .init(decoder.mixer_settings(&config.mixer))
            .map_err(|e| {
                let err = CodecError::Initialization(e.to_string());
                warn!("{}", err);
                err
            })?;

        info!(
            "Codec ready: {} x{} @ {} Hz (expand: {}, swap8: {}, swap16: {})",
            spec.format,
            spec.channels,
            spec.frequency,
            decoder.expands(),
            decoder.swap8,
            decoder.swap16
        );

        Ok(Self {
            engine,
            config: decoder,
            session: config.session.clone(),
            modules: HashMap::new(),
            next_handle: 1,
            active: None,
            last_error: None,
            shut_down: false,
        })
    }

    /// Close every module and release the engine
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        let handles: Vec<_> = self.modules.keys().copied().collect();
        for handle in handles {
            let _ = self.close(handle);
        }
        self.engine.exit();
        self.shut_down = true;
        debug!("Codec shut down");
    }

    pub fn decoder_config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn play_policy(&self) -> PlayPolicy {
        self.session.play_policy
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Number of modules currently loaded
    pub fn loaded_count(&self) -> usize {
        self.modules.len()
    }

    /// Message of the most recent codec failure
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn fail(&mut self, error: CodecError) -> CodecError {
        warn!("{}", error);
        self.last_error = Some(error.to_string());
        error
    }

    fn check(&mut self, handle: ModuleHandle) -> Result<(), CodecError> {
        if self.modules.contains_key(&handle) {
            Ok(())
        } else {
            Err(self.fail(CodecError::UnknownHandle(handle)))
        }
    }

    /// Next unused handle id; 0 is never issued
    fn allocate_handle(&mut self) -> ModuleHandle {
        while self.modules.contains_key(&ModuleHandle(self.next_handle)) {
            self.next_handle = self.next_handle.wrapping_add(1).max(1);
        }
        let handle = ModuleHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1).max(1);
        handle
    }

    /// Release the player slot if its song played to the end
    fn sync_active(&mut self) {
        if let Some(handle) = self.active
            && !self.engine.active()
        {
            debug!("Module {} reached its end", handle);
            self.active = None;
            if let Some(entry) = self.modules.get_mut(&handle) {
                entry.state = PlaybackState::Stopped;
            }
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load a module from a borrowed source positioned at the module data
    pub fn open(&mut self, source: &mut dyn StreamSource) -> Result<ModuleHandle, CodecError> {
        let mut adapter = StreamAdapter::new(source).map_err(|e| self.fail(CodecError::Seek(e)))?;

        let mut module = self
            .engine
            .load(&mut adapter, self.session.max_voices)
            .map_err(|e| {
                // Prefer the engine's own diagnostic over the bare error
                let message = self.engine.last_error().unwrap_or_else(|| e.to_string());
                self.fail(CodecError::Load(message))
            })?;
        self.engine.set_flags(&mut module, HOST_FLAGS);

        let handle = self.allocate_handle();
        info!(
            "Opened module {} '{}'",
            handle,
            self.engine.title(&module)
        );
        self.modules.insert(
            handle,
            LoadedModule {
                module,
                state: PlaybackState::Loaded,
            },
        );
        Ok(handle)
    }

    /// Load a module from a source the codec takes over; the source is
    /// dropped once loading finishes
    pub fn open_owned<S: StreamSource>(&mut self, mut source: S) -> Result<ModuleHandle, CodecError> {
        self.open(&mut source)
    }

    /// Release a module in any state
    pub fn close(&mut self, handle: ModuleHandle) -> Result<(), CodecError> {
        let Some(entry) = self.modules.remove(&handle) else {
            return Err(self.fail(CodecError::UnknownHandle(handle)));
        };
        if self.active == Some(handle) {
            self.engine.stop();
            self.active = None;
        }
        self.engine.free(entry.module);
        debug!("Closed module {}", handle);
        Ok(())
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Start a module, arbitrating the player slot per the play policy
    pub fn play(&mut self, handle: ModuleHandle) -> Result<(), CodecError> {
        self.check(handle)?;
        self.sync_active();

        if let Some(current) = self.active
            && current != handle
        {
            match self.session.play_policy {
                PlayPolicy::Reject => {
                    return Err(self.fail(CodecError::PlayerBusy { active: current }));
                }
                PlayPolicy::Supersede => {
                    debug!("Module {} supersedes {}", handle, current);
                    if let Some(entry) = self.modules.get_mut(&current) {
                        entry.state = PlaybackState::Stopped;
                    }
                }
            }
        }

        if let Some(entry) = self.modules.get_mut(&handle) {
            self.engine.start(&entry.module);
            entry.state = PlaybackState::Playing;
            self.active = Some(handle);
        }
        Ok(())
    }

    /// Stop a module; the player only halts if this handle holds it
    pub fn stop(&mut self, handle: ModuleHandle) -> Result<(), CodecError> {
        self.check(handle)?;
        if self.active == Some(handle) {
            self.engine.stop();
            self.active = None;
            if let Some(entry) = self.modules.get_mut(&handle) {
                entry.state = PlaybackState::Stopped;
            }
        }
        Ok(())
    }

    /// True when this handle holds the player and its song has not ended
    pub fn is_playing(&self, handle: ModuleHandle) -> bool {
        self.active == Some(handle) && self.engine.active()
    }

    /// Whether the engine's player is mixing anything, whichever handle
    pub fn player_active(&self) -> bool {
        self.engine.active()
    }

    pub fn state(&mut self, handle: ModuleHandle) -> Option<PlaybackState> {
        self.sync_active();
        self.modules.get(&handle).map(|entry| entry.state)
    }

    /// Seek the playing module to `seconds` from the start
    ///
    /// Converted to `floor(seconds * frequency)` output frames. Negative or
    /// non-finite values seek to the start. Handles not holding the player
    /// have no position and are left alone.
    pub fn seek_to_time(&mut self, handle: ModuleHandle, seconds: f64) -> Result<(), CodecError> {
        self.check(handle)?;
        let frames = if seconds.is_finite() && seconds > 0.0 {
            (seconds * self.config.frequency as f64).floor() as u64
        } else {
            0
        };
        if self.active == Some(handle) {
            debug!("Seek {} to {:.3}s ({} frames)", handle, seconds, frames);
            self.engine.seek_frames(frames);
        }
        Ok(())
    }

    /// Continue the playing module at an order position
    pub fn jump_to_order(&mut self, handle: ModuleHandle, order: u16) -> Result<(), CodecError> {
        self.check(handle)?;
        if self.active == Some(handle) {
            self.engine.set_position(order);
        }
        Ok(())
    }

    /// Player volume (0-128, larger values clamp)
    pub fn set_volume(&mut self, handle: ModuleHandle, volume: u8) -> Result<(), CodecError> {
        self.check(handle)?;
        self.engine.set_volume(volume.min(128));
        Ok(())
    }

    pub fn title(&mut self, handle: ModuleHandle) -> Result<String, CodecError> {
        self.check(handle)?;
        Ok(self
            .modules
            .get(&handle)
            .map(|entry| self.engine.title(&entry.module))
            .unwrap_or_default())
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Fill `buf` with the next block of audio in the host format
    ///
    /// Handles not holding the player render silence.
    pub fn render_block(&mut self, handle: ModuleHandle, buf: &mut [u8]) -> Result<usize, CodecError> {
        self.check(handle)?;
        let config = self.config;

        if self.active == Some(handle) {
            if config.expands() {
                let narrow = narrow_len(buf.len(), config.channels, config.width);
                self.engine.write_bytes(&mut buf[..narrow]);
                expand_in_place(buf, narrow, config.channels, config.width);
            } else {
                self.engine.write_bytes(buf);
            }
        } else {
            buf.fill(config.width.native_silence());
        }

        post::apply(&config, buf);
        self.sync_active();
        Ok(buf.len())
    }
}

impl<E: DecoderEngine> Drop for ModCodec<E> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
