//! The 128-byte ID3v1 tag found at the end of MP3 files.
//!
//! ID3v1 data is only ever surfaced as ID3v2 frames: [`parse_id3v1`] turns
//! a tag into `TIT2`, `TPE1`, `TALB`, `TDRC`, `COMM`, `TRCK` and `TCON`
//! frames, and [`make_id3v1`] goes the other way when saving.

use std::io::{Read, Seek, SeekFrom};

use memchr::memmem;

use crate::common::error::Result;
use crate::id3::frames::{CommentFrame, Frame, TextFrame};
use crate::id3::specs::{encode_latin1, Encoding, FieldValue, GENRES};
use crate::id3::tags::ID3Tags;

pub const ID3V1_SIZE: usize = 128;

/// Description of the `COMM` frame holding an ID3v1 comment.
pub const V1_COMMENT_DESC: &str = "ID3v1 Comment";

/// An APEv2 footer ends in "APETAGEX", whose "TAG" is not an ID3v1 tag.
const APE_EXTRA: usize = 5;

/// Parse the ID3v1 tag starting at the first "TAG" in `data`.
///
/// Tags shorter than 128 bytes have a truncated year field. Returns `None`
/// when there is no "TAG" or the data after it is not 124 to 128 bytes long.
pub fn parse_id3v1(data: &[u8]) -> Option<Vec<Frame>> {
    let start = memmem::find(data, b"TAG")?;
    let data = &data[start..];
    if !(124..=ID3V1_SIZE).contains(&data.len()) {
        return None;
    }
    let year_len = data.len() - 124;
    let (title, rest) = data[3..].split_at(30);
    let (artist, rest) = rest.split_at(30);
    let (album, rest) = rest.split_at(30);
    let (year, rest) = rest.split_at(year_len);
    let (comment, rest) = rest.split_at(29);
    let (track, genre) = (rest[0], rest[1]);

    let mut frames = Vec::with_capacity(7);
    let mut text = |id: &str, value: String| {
        if !value.is_empty() {
            frames.push(Frame::Text(TextFrame {
                encoding: Encoding::Latin1,
                ..TextFrame::new(id, vec![value])
            }));
        }
    };
    text("TIT2", fix(title));
    text("TPE1", fix(artist));
    text("TALB", fix(album));

    let year = fix(year);
    if !year.is_empty() {
        if let Ok(frame) = Frame::new("TDRC", vec![FieldValue::Int(0), FieldValue::Text(year)]) {
            frames.push(frame);
        }
    }

    let comment = fix(comment);
    if !comment.is_empty() {
        frames.push(Frame::Comment(CommentFrame {
            encoding: Encoding::Latin1,
            ..CommentFrame::new("eng", V1_COMMENT_DESC, vec![comment])
        }));
    }

    // A space in the track byte is more likely comment padding than track 32.
    if track != 0 && (track != 32 || data[data.len() - 3] == 0) {
        frames.push(latin1_text("TRCK", track.to_string()));
    }
    if genre != 255 {
        frames.push(latin1_text("TCON", genre.to_string()));
    }
    Some(frames)
}

fn latin1_text(id: &str, text: String) -> Frame {
    Frame::Text(TextFrame {
        encoding: Encoding::Latin1,
        ..TextFrame::new(id, vec![text])
    })
}

/// Up to the first null, trimmed, as Latin-1.
fn fix(field: &[u8]) -> String {
    let end = memchr::memchr(0, field).unwrap_or(field.len());
    field[..end]
        .iter()
        .map(|&b| b as char)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Look for an ID3v1 tag in the last 128 bytes of `reader`.
///
/// Returns the frames and the absolute offset of the tag. The reader's
/// position is left unchanged.
pub fn find_id3v1<R: Read + Seek>(reader: &mut R) -> Result<Option<(Vec<Frame>, u64)>> {
    let old_pos = reader.stream_position()?;
    let len = reader.seek(SeekFrom::End(0))?;
    let start = len.saturating_sub((ID3V1_SIZE + APE_EXTRA) as u64);
    reader.seek(SeekFrom::Start(start))?;
    let mut data = Vec::with_capacity(ID3V1_SIZE + APE_EXTRA);
    reader.by_ref().take(len - start).read_to_end(&mut data)?;
    reader.seek(SeekFrom::Start(old_pos))?;

    let Some(idx) = memmem::find(&data, b"TAG") else {
        return Ok(None);
    };
    if memmem::find(&data, b"APETAGEX").is_some_and(|ape| idx == ape + APE_EXTRA) {
        return Ok(None);
    }
    Ok(parse_id3v1(&data[idx..]).map(|frames| (frames, start + idx as u64)))
}

/// The frames of a trailing ID3v1 tag, if there is one.
pub fn read_id3v1<R: Read + Seek>(reader: &mut R) -> Result<Option<Vec<Frame>>> {
    Ok(find_id3v1(reader)?.map(|(frames, _)| frames))
}

/// Render the ID3v1 equivalent of `tags`.
///
/// Text is converted to Latin-1 and cut to the field widths. The comment is
/// taken from the first `COMM` frame and limited to 28 bytes, leaving room
/// for the ID3v1.1 track number.
pub fn make_id3v1(tags: &ID3Tags) -> [u8; ID3V1_SIZE] {
    let mut out = [0u8; ID3V1_SIZE];
    out[..3].copy_from_slice(b"TAG");

    let first_text = |key: &str| -> Vec<u8> {
        tags.get_all(key)
            .first()
            .and_then(|f| f.text())
            .and_then(|t| t.first())
            .map(|t| encode_latin1(t))
            .unwrap_or_default()
    };
    let mut put = |offset: usize, width: usize, bytes: &[u8]| {
        let n = bytes.len().min(width);
        out[offset..offset + n].copy_from_slice(&bytes[..n]);
    };

    put(3, 30, &first_text("TIT2"));
    put(33, 30, &first_text("TPE1"));
    put(63, 30, &first_text("TALB"));

    let year = ["TDRC", "TYER"]
        .iter()
        .find_map(|key| tags.get(key))
        .map(|f| encode_latin1(&f.to_string()))
        .unwrap_or_default();
    put(93, 4, &year);

    put(97, 28, &first_text("COMM"));

    let track = match tags.get("TRCK") {
        Some(Frame::Text(trck)) => trck.number().and_then(|n| u8::try_from(n).ok()).unwrap_or(0),
        _ => 0,
    };
    out[126] = track;

    let genre = match tags.get("TCON") {
        Some(Frame::Text(tcon)) => tcon
            .genres()
            .first()
            .and_then(|g| GENRES.iter().position(|known| *known == g.as_str()))
            .and_then(|i| u8::try_from(i).ok())
            .unwrap_or(255),
        _ => 255,
    };
    out[127] = genre;
    out
}
