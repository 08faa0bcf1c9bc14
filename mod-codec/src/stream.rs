//! Seekable stream adapter
//!
//! Presents a host byte source to the decoder as a [`ModuleReader`] whose
//! positions start at 0 where the module data begins, even when the
//! source is an archive or container already positioned part way in.

use std::io::{self, Read, Seek, SeekFrom};

use mod_engine::{ModuleReader, ReaderError, Whence};

/// Any seekable byte source
pub trait StreamSource: Read + Seek {}

impl<T: Read + Seek + ?Sized> StreamSource for T {}

/// [`ModuleReader`] over a borrowed [`StreamSource`]
///
/// `origin` is the source position at construction and `end` the source
/// length at that time. Neither changes afterwards.
pub struct StreamAdapter<'a> {
    source: &'a mut dyn StreamSource,
    origin: u64,
    end: u64,
}

impl<'a> StreamAdapter<'a> {
    pub fn new(source: &'a mut dyn StreamSource) -> Result<Self, ReaderError> {
        let origin = source.stream_position()?;
        let end = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(origin))?;
        Ok(Self {
            source,
            origin,
            end,
        })
    }

    /// Absolute source offset of the first module byte
    pub fn origin(&self) -> u64 {
        self.origin
    }

    /// Bytes between origin and the captured end
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.origin)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ModuleReader for StreamAdapter<'_> {
    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, ReaderError> {
        let base = match whence {
            Whence::Set => self.origin,
            Whence::Current => self.source.stream_position()?,
            Whence::End => self.end,
        };

        // Reject before touching the source
        let target = base as i128 + offset as i128;
        if target < self.origin as i128 || target > u64::MAX as i128 {
            return Err(ReaderError::SeekBeforeOrigin { offset, whence });
        }

        let target = target as u64;
        self.source.seek(SeekFrom::Start(target))?;
        Ok(target - self.origin)
    }

    fn tell(&mut self) -> Result<u64, ReaderError> {
        Ok(self
            .source
            .stream_position()?
            .saturating_sub(self.origin))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), ReaderError> {
        self.source.read_exact(buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => ReaderError::UnexpectedEof,
            _ => ReaderError::Io(e),
        })
    }

    fn get(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.source.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }

    fn eof(&mut self) -> bool {
        match self.tell() {
            Ok(pos) => pos >= self.len(),
            Err(_) => true,
        }
    }
}
