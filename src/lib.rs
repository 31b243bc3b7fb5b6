//! Read, edit and write ID3v2 tags, with ID3v1 as a fallback.
//!
//! Tags are read into an [`ID3Tags`], a collection of typed frames keyed by
//! [`HashKey`]. Versions 2.2, 2.3 and 2.4 are read; 2.3 and 2.4 are written.
//! Loading translates the frames to ID3v2.4 unless told otherwise, and saving
//! patches the tag region in place, shifting the rest of the file only when
//! the tag outgrows its padding.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mutagen_id3::config::{LoadOptions, SaveOptions, V1Mode};
//! use mutagen_id3::id3::frames::TextFrame;
//! use mutagen_id3::ID3Tags;
//!
//! # fn main() -> mutagen_id3::Result<()> {
//! let mut tags = ID3Tags::load("song.mp3", LoadOptions::new())?;
//! println!("{}", tags.pprint());
//!
//! tags.add(TextFrame::new("TIT2", vec![String::from("New title")]));
//! tags.save(SaveOptions::new().v1(V1Mode::Always))?;
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod config;
pub mod id3;

pub use common::error::{MutagenError, Result};
pub use id3::frames::{Frame, HashKey};
pub use id3::tags::ID3Tags;
