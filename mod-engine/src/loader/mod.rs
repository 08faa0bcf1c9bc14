//! Module loaders
//!
//! Each loader recognizes one family of formats and converts it into the
//! unified [`Song`] model:
//!
//! - `xm` - FastTracker II extended modules
//! - `protracker` - ProTracker `M.K.` style modules (4/6/8 channels)

mod protracker;
mod xm;


pub use protracker::ProTrackerLoader;
pub use xm::XmLoader;

use crate::error::EngineError;
use crate::reader::ModuleReader;
use crate::song::Song;

/// A module format loader
pub trait Loader {
    /// Human-readable format name
    fn name(&self) -> &'static str;

    /// Check whether the data at the reader looks like this format.
    /// The reader is positioned at the start of the module data.
    fn test(&self, reader: &mut dyn ModuleReader) -> bool;

    /// Load the module. The reader is positioned at the start of the module data.
    fn load(&self, reader: &mut dyn ModuleReader) -> Result<Song, EngineError>;
}

/// Every loader this crate provides, in probing order
pub fn all_loaders() -> Vec<Box<dyn Loader>> {
    vec![Box::new(XmLoader), Box::new(ProTrackerLoader)]
}

/// Delta-decode 8-bit sample data into 16-bit sample points
pub(crate) fn decode_delta_8(raw: &[u8]) -> Vec<i16> {
    let mut acc = 0i8;
    raw.iter()
        .map(|&b| {
            acc = acc.wrapping_add(b as i8);
            (acc as i16) << 8
        })
        .collect()
}

/// Delta-decode little-endian 16-bit sample data
pub(crate) fn decode_delta_16(raw: &[u8]) -> Vec<i16> {
    let mut acc = 0i16;
    raw.chunks_exact(2)
        .map(|pair| {
            acc = acc.wrapping_add(i16::from_le_bytes([pair[0], pair[1]]));
            acc
        })
        .collect()
}
