//! Decoder engine contract consumed by the codec

use std::error::Error;
use std::sync::Arc;

use mod_engine::{Driver, Engine, EngineError, MixerSettings, ModuleReader, PlaybackFlags, Song};

/// Tracker decoder driven by a [`ModCodec`](crate::ModCodec)
///
/// The engine owns a single player slot; the codec decides which loaded
/// module occupies it.
pub trait DecoderEngine {
    /// A loaded module
    type Module;
    type Error: Error + 'static;

    /// Registered output drivers (`None` if none)
    fn driver_info(&self) -> Option<String>;
    /// Register the silent software driver
    fn register_silent_driver(&mut self);
    /// Registered loaders (`None` if none)
    fn loader_info(&self) -> Option<String>;
    fn register_all_loaders(&mut self);

    fn init(&mut self, settings: MixerSettings) -> Result<(), Self::Error>;
    fn exit(&mut self);

    fn load(
        &mut self,
        reader: &mut dyn ModuleReader,
        max_voices: u16,
    ) -> Result<Self::Module, Self::Error>;
    /// Override the module's playback flags
    fn set_flags(&mut self, module: &mut Self::Module, flags: PlaybackFlags);
    fn free(&mut self, module: Self::Module);
    fn title(&self, module: &Self::Module) -> String;

    fn start(&mut self, module: &Self::Module);
    fn stop(&mut self);
    /// True while the player slot holds a song that has not ended
    fn active(&self) -> bool;
    fn set_volume(&mut self, volume: u8);
    /// Continue at the start of an order position
    fn set_position(&mut self, order: u16);
    /// Restart and advance `frames` output frames
    fn seek_frames(&mut self, frames: u64);
    /// Mix into `buf`; returns the bytes covered by whole frames
    fn write_bytes(&mut self, buf: &mut [u8]) -> usize;

    fn last_error(&self) -> Option<String>;
}

impl DecoderEngine for Engine {
    type Module = Arc<Song>;
    type Error = EngineError;

    fn driver_info(&self) -> Option<String> {
        Engine::driver_info(self)
    }

    fn register_silent_driver(&mut self) {
        self.register_driver(Driver::NoSound);
    }

    fn loader_info(&self) -> Option<String> {
        Engine::loader_info(self)
    }

    fn register_all_loaders(&mut self) {
        Engine::register_all_loaders(self)
    }

    fn init(&mut self, settings: MixerSettings) -> Result<(), EngineError> {
        Engine::init(self, settings)
    }

    fn exit(&mut self) {
        Engine::exit(self)
    }

    fn load(
        &mut self,
        reader: &mut dyn ModuleReader,
        max_voices: u16,
    ) -> Result<Arc<Song>, EngineError> {
        Engine::load(self, reader, max_voices).map(Arc::new)
    }

    fn set_flags(&mut self, module: &mut Arc<Song>, flags: PlaybackFlags) {
        Arc::make_mut(module).flags = flags;
    }

    fn free(&mut self, module: Arc<Song>) {
        Engine::free(self, module)
    }

    fn title(&self, module: &Arc<Song>) -> String {
        module.title.clone()
    }

    fn start(&mut self, module: &Arc<Song>) {
        Engine::start(self, module)
    }

    fn stop(&mut self) {
        Engine::stop(self)
    }

    fn active(&self) -> bool {
        Engine::active(self)
    }

    fn set_volume(&mut self, volume: u8) {
        Engine::set_volume(self, volume)
    }

    fn set_position(&mut self, order: u16) {
        Engine::set_position(self, order)
    }

    fn seek_frames(&mut self, frames: u64) {
        Engine::seek_frames(self, frames)
    }

    fn write_bytes(&mut self, buf: &mut [u8]) -> usize {
        Engine::write_bytes(self, buf)
    }

    fn last_error(&self) -> Option<String> {
        Engine::last_error(self).map(str::to_owned)
    }
}
