//! Host-facing codec contract

use crate::decoder::DecoderEngine;
use crate::error::CodecError;
use crate::session::{ModCodec, ModuleHandle};
use crate::stream::StreamSource;

bitflags::bitflags! {
    /// Capability bits a codec advertises to the host mixer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CodecCapabilities: u32 {
        /// Host must set the volume after `open`, before the first block
        const NEED_VOLUME_INIT_POST = 0x0001;
        /// Only one stream can play at a time
        const SINGLETON = 0x0002;
    }
}

/// Operations a host mixer drives a music codec through
pub trait AudioCodec {
    fn capabilities(&self) -> CodecCapabilities;

    fn open(&mut self, source: &mut dyn StreamSource) -> Result<ModuleHandle, CodecError>;
    fn close(&mut self, handle: ModuleHandle) -> Result<(), CodecError>;

    fn play(&mut self, handle: ModuleHandle) -> Result<(), CodecError>;
    fn stop(&mut self, handle: ModuleHandle) -> Result<(), CodecError>;
    fn is_playing(&self, handle: ModuleHandle) -> bool;
    fn seek_to_time(&mut self, handle: ModuleHandle, seconds: f64) -> Result<(), CodecError>;
    fn pause(&mut self, handle: ModuleHandle) -> Result<(), CodecError>;
    fn resume(&mut self, handle: ModuleHandle) -> Result<(), CodecError>;
    fn is_paused(&self, handle: ModuleHandle) -> bool;
    fn set_loops(&mut self, handle: ModuleHandle, loops: i32) -> Result<(), CodecError>;
    /// Playback position in seconds, if the codec can report one
    fn current_time(&self, handle: ModuleHandle) -> Option<f64>;
    fn set_volume(&mut self, handle: ModuleHandle, volume: u8) -> Result<(), CodecError>;

    fn render_block(&mut self, handle: ModuleHandle, buf: &mut [u8]) -> Result<usize, CodecError>;

    fn title(&mut self, handle: ModuleHandle) -> Result<String, CodecError>;
    fn artist(&mut self, handle: ModuleHandle) -> Result<String, CodecError>;
    fn album(&mut self, handle: ModuleHandle) -> Result<String, CodecError>;
    fn copyright(&mut self, handle: ModuleHandle) -> Result<String, CodecError>;

    fn last_error(&self) -> Option<&str>;
}

impl<E: DecoderEngine> AudioCodec for ModCodec<E> {
    fn capabilities(&self) -> CodecCapabilities {
        CodecCapabilities::NEED_VOLUME_INIT_POST | CodecCapabilities::SINGLETON
    }

    fn open(&mut self, source: &mut dyn StreamSource) -> Result<ModuleHandle, CodecError> {
        ModCodec::open(self, source)
    }

    fn close(&mut self, handle: ModuleHandle) -> Result<(), CodecError> {
        ModCodec::close(self, handle)
    }

    fn play(&mut self, handle: ModuleHandle) -> Result<(), CodecError> {
        ModCodec::play(self, handle)
    }

    fn stop(&mut self, handle: ModuleHandle) -> Result<(), CodecError> {
        ModCodec::stop(self, handle)
    }

    fn is_playing(&self, handle: ModuleHandle) -> bool {
        ModCodec::is_playing(self, handle)
    }

    fn seek_to_time(&mut self, handle: ModuleHandle, seconds: f64) -> Result<(), CodecError> {
        ModCodec::seek_to_time(self, handle, seconds)
    }

    // Module playback has no pause; the host stops pulling blocks instead
    fn pause(&mut self, _handle: ModuleHandle) -> Result<(), CodecError> {
        Ok(())
    }

    fn resume(&mut self, _handle: ModuleHandle) -> Result<(), CodecError> {
        Ok(())
    }

    fn is_paused(&self, _handle: ModuleHandle) -> bool {
        false
    }

    fn set_loops(&mut self, _handle: ModuleHandle, _loops: i32) -> Result<(), CodecError> {
        Ok(())
    }

    fn current_time(&self, _handle: ModuleHandle) -> Option<f64> {
        None
    }

    fn set_volume(&mut self, handle: ModuleHandle, volume: u8) -> Result<(), CodecError> {
        ModCodec::set_volume(self, handle, volume)
    }

    fn render_block(&mut self, handle: ModuleHandle, buf: &mut [u8]) -> Result<usize, CodecError> {
        ModCodec::render_block(self, handle, buf)
    }

    fn title(&mut self, handle: ModuleHandle) -> Result<String, CodecError> {
        ModCodec::title(self, handle)
    }

    fn artist(&mut self, _handle: ModuleHandle) -> Result<String, CodecError> {
        Ok(String::new())
    }

    fn album(&mut self, _handle: ModuleHandle) -> Result<String, CodecError> {
        Ok(String::new())
    }

    fn copyright(&mut self, _handle: ModuleHandle) -> Result<String, CodecError> {
        Ok(String::new())
    }

    fn last_error(&self) -> Option<&str> {
        ModCodec::last_error(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_bits() {
        let caps = CodecCapabilities::NEED_VOLUME_INIT_POST | CodecCapabilities::SINGLETON;
        assert!(caps.contains(CodecCapabilities::SINGLETON));
        assert_eq!(caps.bits(), 0x0003);
        assert!(!CodecCapabilities::empty().contains(CodecCapabilities::SINGLETON));
        assert_eq!(
            CodecCapabilities::empty().union(CodecCapabilities::SINGLETON),
            CodecCapabilities::SINGLETON
        );
        assert_eq!(CodecCapabilities::from_bits(0x0004), None);
        assert_eq!(CodecCapabilities::all().bits(), 0x0003);
    }
}
