//! Module reader contract
//!
//! Loaders never touch files directly. They pull bytes through a
//! [`ModuleReader`], which reports every position relative to the first
//! byte of the module data. Hosts bridge their own byte sources to this
//! trait; [`SliceReader`] covers in-memory modules.

use std::io;

use thiserror::Error;

/// Reference point for [`ModuleReader::seek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// From the start of the module data
    Set,
    /// From the current position
    Current,
    /// From the end of the module data
    End,
}

/// Reader failures
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Seek target lies before the first byte of the module data
    #[error("Seek to {offset} ({whence:?}) lands before the start of the stream")]
    SeekBeforeOrigin { offset: i64, whence: Whence },
    /// Read ran past the end of the data
    #[error("Unexpected end of module data")]
    UnexpectedEof,
    /// Underlying source failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Positioned byte access used by the loaders
pub trait ModuleReader {
    /// Move the read position. Returns the new position relative to the
    /// start of the module data.
    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, ReaderError>;

    /// Current position relative to the start of the module data
    fn tell(&mut self) -> Result<u64, ReaderError>;

    /// Fill `buf` completely or fail
    fn read(&mut self, buf: &mut [u8]) -> Result<(), ReaderError>;

    /// Read one byte; `None` marks end of stream
    fn get(&mut self) -> Option<u8>;

    /// True once the position reached the end of the module data
    fn eof(&mut self) -> bool;
}

/// [`ModuleReader`] over an in-memory byte slice
#[derive(Debug, Clone)]
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl ModuleReader for SliceReader<'_> {
    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, ReaderError> {
        let base = match whence {
            Whence::Set => 0i64,
            Whence::Current => self.pos as i64,
            Whence::End => self.data.len() as i64,
        };
        let target = base
            .checked_add(offset)
            .filter(|t| *t >= 0)
            .ok_or(ReaderError::SeekBeforeOrigin { offset, whence })?;
        self.pos = target as usize;
        Ok(target as u64)
    }

    fn tell(&mut self) -> Result<u64, ReaderError> {
        Ok(self.pos as u64)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), ReaderError> {
        let end = self
            .pos
            .checked_add(buf.len())
            .filter(|end| *end <= self.data.len())
            .ok_or(ReaderError::UnexpectedEof)?;
        buf.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(())
    }

    fn get(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    fn eof(&mut self) -> bool {
        self.pos >= self.data.len()
    }
}

// =============================================================================
// Helper functions for reading data
// =============================================================================

pub fn read_u8<R: ModuleReader + ?Sized>(reader: &mut R) -> Result<u8, ReaderError> {
    reader.get().ok_or(ReaderError::UnexpectedEof)
}

pub fn read_u16_le<R: ModuleReader + ?Sized>(reader: &mut R) -> Result<u16, ReaderError> {
    let mut buf = [0u8; 2];
    reader.read(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

pub fn read_u16_be<R: ModuleReader + ?Sized>(reader: &mut R) -> Result<u16, ReaderError> {
    let mut buf = [0u8; 2];
    reader.read(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

pub fn read_u32_le<R: ModuleReader + ?Sized>(reader: &mut R) -> Result<u32, ReaderError> {
    let mut buf = [0u8; 4];
    reader.read(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a fixed-width, NUL-padded text field
pub fn read_string<R: ModuleReader + ?Sized>(
    reader: &mut R,
    width: usize,
) -> Result<String, ReaderError> {
    let mut bytes = vec![0u8; width];
    reader.read(&mut bytes)?;
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Ok(String::from_utf8_lossy(&bytes[..len]).trim_end().to_string())
}

/// Skip `count` bytes forward
pub fn skip<R: ModuleReader + ?Sized>(reader: &mut R, count: u64) -> Result<(), ReaderError> {
    reader.seek(count as i64, Whence::Current)?;
    Ok(())
}
