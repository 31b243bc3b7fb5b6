pub mod frames;
pub mod header;
pub mod id3v1;
pub mod specs;
pub mod tags;
pub mod unsynch;
pub mod writer;

use std::path::Path;

use crate::common::error::Result;
use crate::config::LoadOptions;

pub use frames::{Frame, FrameKind, FrameRegistry, HashKey, Shape};
pub use header::{ID3Header, Version};
pub use specs::{Encoding, FieldValue, ID3TimeStamp, PictureType};
pub use tags::{ID3Tags, SkippedFrame};
pub use writer::{delete, delete_from_file};

/// Load the ID3 tag of the file at `path` with default options.
pub fn load<P: AsRef<Path>>(path: P) -> Result<ID3Tags> {
    ID3Tags::load(path, LoadOptions::new())
}
