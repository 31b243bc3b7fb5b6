use std::io::{Read, SeekFrom};
use std::path::Path;

use memchr::memmem;

use crate::common::error::{MutagenError, Result};
use crate::common::util::{self, FileLike};
use crate::config::{DeleteOptions, SaveOptions, V1Mode, V2Minor};
use crate::id3::header::BitPaddedInt;
use crate::id3::id3v1::{make_id3v1, ID3V1_SIZE};
use crate::id3::tags::ID3Tags;

/// Region sizes are rounded up to this when a tag has to grow.
const PADDING_BLOCK: usize = 1024;

/// A tag header for `framesize` bytes of frames, given the first bytes of
/// the file being written to.
///
/// Returns the header, the size of the region after it (frames plus
/// padding) and the size of the existing region, or `None` if there is no
/// ID3v2 tag yet. An existing region is reused when the frames fit.
fn prepare_header(
    existing: &[u8],
    framesize: usize,
    version: V2Minor,
) -> Result<([u8; 10], usize, Option<usize>)> {
    let insize = match existing {
        [b'I', b'D', b'3', major, _, flags, size @ ..] if size.len() >= 4 => {
            let mut insize = BitPaddedInt::syncsafe(&size[..4]) as usize;
            if *major == 4 && flags & 0x10 != 0 {
                insize += 10;
            }
            Some(insize)
        }
        _ => None,
    };

    let outsize = match insize {
        Some(insize) if insize >= framesize => insize,
        _ => (framesize + PADDING_BLOCK - 1) & !(PADDING_BLOCK - 1),
    };
    let outsize_u32 = u32::try_from(outsize).map_err(|_| MutagenError::ValueTooWide(4))?;

    let mut header = [0u8; 10];
    header[..3].copy_from_slice(b"ID3");
    header[3] = version.version().major();
    header[6..].copy_from_slice(&BitPaddedInt::to_syncsafe(outsize_u32)?);
    Ok((header, outsize, insize))
}

impl ID3Tags {
    /// The complete tag: header, frames and padding.
    ///
    /// This is what [`ID3Tags::save`] writes to a file with no ID3v2 tag.
    pub fn render(&self, options: SaveOptions) -> Result<Vec<u8>> {
        let frames = self.render_frames(options.v2_version, options.v23_sep, options.pedantic)?;
        let (header, outsize, _) = prepare_header(&[], frames.len(), options.v2_version)?;
        let mut out = Vec::with_capacity(10 + outsize);
        out.extend_from_slice(&header);
        out.extend_from_slice(&frames);
        out.resize(10 + outsize, 0);
        Ok(out)
    }

    /// Save to the file the tag was loaded from.
    pub fn save(&self, options: SaveOptions) -> Result<()> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| MutagenError::ValueError("no file to save to".into()))?;
        self.save_to(path, options)
    }

    /// Save to `path`, creating the file if needed.
    ///
    /// A tag with no frames to write deletes the tags from the file instead.
    pub fn save_to<P: AsRef<Path>>(&self, path: P, options: SaveOptions) -> Result<()> {
        let path = path.as_ref();
        let frames = self.render_frames(options.v2_version, options.v23_sep, options.pedantic)?;
        if frames.is_empty() {
            return match delete(path, DeleteOptions::new()) {
                Err(MutagenError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            };
        }
        let mut file = util::open_rw_create(path)?;
        self.write_frames(&mut file, &frames, options)
    }

    /// Save into an open file or in-memory buffer.
    pub fn save_to_file<F: FileLike>(&self, file: &mut F, options: SaveOptions) -> Result<()> {
        let frames = self.render_frames(options.v2_version, options.v23_sep, options.pedantic)?;
        if frames.is_empty() {
            return delete_from_file(file, DeleteOptions::new());
        }
        self.write_frames(file, &frames, options)
    }

    fn write_frames<F: FileLike>(
        &self,
        file: &mut F,
        frames: &[u8],
        options: SaveOptions,
    ) -> Result<()> {
        file.seek(SeekFrom::Start(0))?;
        let mut existing = Vec::with_capacity(10);
        (&mut *file).take(10).read_to_end(&mut existing)?;

        let (header, outsize, insize) =
            prepare_header(&existing, frames.len(), options.v2_version)?;
        let old_region = insize.map_or(0, |n| n + 10) as u64;
        let new_region = (outsize + 10) as u64;
        if old_region < new_region {
            util::insert_bytes(file, new_region - old_region, old_region)?;
        }
        log::debug!(
            "writing ID3v{} tag: {} bytes of frames in a {} byte region",
            options.v2_version.version(),
            frames.len(),
            new_region
        );

        let mut data = Vec::with_capacity(new_region as usize);
        data.extend_from_slice(&header);
        data.extend_from_slice(frames);
        data.resize(new_region as usize, 0);
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&data)?;

        self.write_v1(file, options.v1, new_region)
    }

    /// Remove, rewrite or add the trailing ID3v1 tag. The tag is never
    /// looked for before `tag_end`.
    fn write_v1<F: FileLike>(&self, file: &mut F, mode: V1Mode, tag_end: u64) -> Result<()> {
        let len = file.seek(SeekFrom::End(0))?;
        let start = len.saturating_sub(ID3V1_SIZE as u64).max(tag_end.min(len));
        file.seek(SeekFrom::Start(start))?;
        let mut tail = Vec::with_capacity(ID3V1_SIZE);
        (&mut *file).take(len - start).read_to_end(&mut tail)?;

        let (offset, has_v1) = match memmem::find(&tail, b"TAG") {
            Some(idx) => (start + idx as u64, true),
            None => (len, false),
        };
        file.seek(SeekFrom::Start(offset))?;
        if (mode == V1Mode::Update && has_v1) || mode == V1Mode::Always {
            log::trace!("writing ID3v1 tag at {}", offset);
            file.write_all(&make_id3v1(self))?;
            let end = file.stream_position()?;
            file.set_len(end)?;
        } else {
            file.set_len(offset)?;
        }
        Ok(())
    }

    /// Remove the tags from the file the tag was loaded from and clear it.
    pub fn delete_tags(&mut self, options: DeleteOptions) -> Result<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| MutagenError::ValueError("no file to delete tags from".into()))?;
        self.delete_tags_from(path, options)
    }

    pub fn delete_tags_from<P: AsRef<Path>>(
        &mut self,
        path: P,
        options: DeleteOptions,
    ) -> Result<()> {
        delete(path, options)?;
        self.clear();
        Ok(())
    }
}

/// Remove ID3 tags from the file at `path`.
pub fn delete<P: AsRef<Path>>(path: P, options: DeleteOptions) -> Result<()> {
    let mut file = util::open_rw(path)?;
    delete_from_file(&mut file, options)
}

/// Remove a trailing ID3v1 tag and a leading ID3v2 tag, as selected by
/// `options`.
pub fn delete_from_file<F: FileLike>(file: &mut F, options: DeleteOptions) -> Result<()> {
    if options.delete_v1 {
        let len = file.seek(SeekFrom::End(0))?;
        if len >= ID3V1_SIZE as u64 {
            file.seek(SeekFrom::Start(len - ID3V1_SIZE as u64))?;
            let mut magic = [0u8; 3];
            file.read_exact(&mut magic)?;
            if &magic == b"TAG" {
                log::debug!("removing ID3v1 tag");
                file.set_len(len - ID3V1_SIZE as u64)?;
            }
        }
    }

    if options.delete_v2 {
        file.seek(SeekFrom::Start(0))?;
        let mut existing = Vec::with_capacity(10);
        (&mut *file).take(10).read_to_end(&mut existing)?;
        if existing.len() == 10 && existing.starts_with(b"ID3") {
            let mut size = u64::from(BitPaddedInt::syncsafe(&existing[6..10])) + 10;
            if existing[3] == 4 && existing[5] & 0x10 != 0 {
                size += 10;
            }
            let len = file.seek(SeekFrom::End(0))?;
            log::debug!("removing {} byte ID3v2 tag", size);
            util::delete_bytes(file, size.min(len), 0)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id3::frames::TextFrame;
    use std::io::Cursor;

    fn audio(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn tagged() -> ID3Tags {
        let mut tags = ID3Tags::new();
        tags.add(TextFrame::new("TIT2", vec!["Title".into()]));
        tags
    }

    #[test_log::test]
    fn header_grows_in_blocks() {
        let (header, outsize, insize) = prepare_header(b"", 1, V2Minor::V4).unwrap();
        assert_eq!(&header[..6], b"ID3\x04\x00\x00");
        assert_eq!(outsize, 1024);
        assert_eq!(insize, None);
        assert_eq!(BitPaddedInt::syncsafe(&header[6..]), 1024);

        let (_, outsize, _) = prepare_header(b"", 1024, V2Minor::V3).unwrap();
        assert_eq!(outsize, 1024);
        let (_, outsize, _) = prepare_header(b"", 1025, V2Minor::V3).unwrap();
        assert_eq!(outsize, 2048);
    }

    #[test_log::test]
    fn header_reuses_existing_region() {
        let existing = b"ID3\x03\x00\x00\x00\x00\x10\x00";
        let (header, outsize, insize) = prepare_header(existing, 100, V2Minor::V4).unwrap();
        assert_eq!(insize, Some(2048));
        assert_eq!(outsize, 2048);
        assert_eq!(header[3], 4);

        let (_, outsize, _) = prepare_header(existing, 3000, V2Minor::V4).unwrap();
        assert_eq!(outsize, 3072);

        // The footer of a v2.4 tag is part of the region.
        let footer = b"ID3\x04\x00\x10\x00\x00\x00\x10";
        let (_, outsize, insize) = prepare_header(footer, 20, V2Minor::V4).unwrap();
        assert_eq!((outsize, insize), (26, Some(26)));
    }

    #[test_log::test]
    fn render_pads_to_block() {
        let data = tagged().render(SaveOptions::new()).unwrap();
        assert_eq!(data.len(), 10 + 1024);
        assert_eq!(&data[10..14], b"TIT2");
        assert_eq!(
            ID3Tags::load_from(&mut Cursor::new(data), Default::default(), None)
                .unwrap()
                .pprint(),
            "TIT2=Title"
        );
    }

    #[test_log::test]
    fn save_into_untagged_buffer() {
        let original = audio(500);
        let mut file = Cursor::new(original.clone());
        tagged().save_to_file(&mut file, SaveOptions::new()).unwrap();

        let data = file.into_inner();
        assert_eq!(data.len(), 10 + 1024 + 500);
        assert_eq!(&data[1034..], &original[..]);
    }

    #[test_log::test]
    fn save_reuses_region_and_keeps_audio() {
        let original = audio(300);
        let mut file = Cursor::new(original.clone());
        tagged().save_to_file(&mut file, SaveOptions::new()).unwrap();
        let first_len = file.get_ref().len();

        let mut smaller = ID3Tags::new();
        smaller.add(TextFrame::new("TPE1", vec!["A".into()]));
        smaller.save_to_file(&mut file, SaveOptions::new()).unwrap();
        assert_eq!(file.get_ref().len(), first_len);
        assert!(file.get_ref().ends_with(&original));

        file.set_position(0);
        let tags = ID3Tags::load_from(&mut file, Default::default(), None).unwrap();
        assert_eq!(tags.pprint(), "TPE1=A");
    }

    #[test_log::test]
    fn v1_modes() {
        let mut file = Cursor::new(audio(200));
        let options = SaveOptions::new().v1(V1Mode::Update);
        tagged().save_to_file(&mut file, options).unwrap();
        assert!(!file.get_ref()[file.get_ref().len() - 128..].starts_with(b"TAG"));

        tagged().save_to_file(&mut file, options.v1(V1Mode::Always)).unwrap();
        let len = file.get_ref().len();
        assert_eq!(&file.get_ref()[len - 128..len - 123], b"TAGTi");

        tagged().save_to_file(&mut file, options).unwrap();
        assert_eq!(file.get_ref().len(), len);

        tagged().save_to_file(&mut file, options.v1(V1Mode::Remove)).unwrap();
        assert_eq!(file.get_ref().len(), len - 128);
    }

    #[test_log::test]
    fn delete_removes_both_tags() {
        let original = audio(400);
        let mut file = Cursor::new(original.clone());
        tagged()
            .save_to_file(&mut file, SaveOptions::new().v1(V1Mode::Always))
            .unwrap();

        delete_from_file(&mut file, DeleteOptions::new().delete_v2(false)).unwrap();
        assert_eq!(file.get_ref().len(), 10 + 1024 + 400);

        delete_from_file(&mut file, DeleteOptions::new()).unwrap();
        assert_eq!(file.get_ref(), &original);
    }

    #[test_log::test]
    fn empty_tag_deletes() {
        let original = audio(50);
        let mut file = Cursor::new(original.clone());
        tagged().save_to_file(&mut file, SaveOptions::new()).unwrap();
        ID3Tags::new().save_to_file(&mut file, SaveOptions::new()).unwrap();
        assert_eq!(file.into_inner(), original);
    }
}
