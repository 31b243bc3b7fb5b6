use std::borrow::Cow;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder};

use crate::common::error::{MutagenError, Result};
use crate::config::{DuplicatePolicy, LoadOptions, V2Minor};
use crate::id3::frames::{
    Frame, FrameRegistry, HashKey, PairedTextFrame, PictureFrame, TextFrame,
};
use crate::id3::header::{determine_bpi, BitPaddedInt, ID3Header, Version, Width};
use crate::id3::id3v1;
use crate::id3::specs::{Encoding, FieldValue, ID3TimeStamp};
use crate::id3::unsynch;

const FLAG24_COMPRESS: u16 = 0x0008;
const FLAG24_ENCRYPT: u16 = 0x0004;
const FLAG24_UNSYNCH: u16 = 0x0002;
const FLAG24_DATALEN: u16 = 0x0001;
const FLAG23_COMPRESS: u16 = 0x0080;
const FLAG23_ENCRYPT: u16 = 0x0040;

/// Frames written first, in this order. Everything else follows by key.
const IMPORTANCE: [&str; 7] = ["TIT2", "TPE1", "TRCK", "TALB", "TPOS", "TDRC", "TCON"];

/// Frames with no v2.4 equivalent.
const DROPPED_ON_UPGRADE: [&str; 7] = ["RVAD", "EQUA", "TRDA", "TSIZ", "TDAT", "TIME", "CRM"];

/// Frames introduced in v2.4.
const V24_ONLY: [&str; 18] = [
    "ASPI", "EQU2", "RVA2", "SEEK", "SIGN", "TDEN", "TDOR", "TDRC", "TDRL", "TDTG", "TIPL",
    "TMCL", "TMOO", "TPRO", "TSOA", "TSOP", "TSOT", "TSST",
];

/// A frame dropped while decoding a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFrame {
    pub id: String,
    pub reason: String,
}

/// An ID3v2 tag: a collection of frames keyed by [`HashKey`].
///
/// Frames are kept in insertion order. Frames whose ID is not in the
/// registry the tag was read with are kept as raw blobs (header included) and
/// written back only when saving to the version they were read from.
#[derive(Debug, Clone)]
pub struct ID3Tags {
    frames: Vec<(HashKey, Frame)>,
    version: Version,
    header: Option<ID3Header>,
    unknown_frames: Vec<Vec<u8>>,
    unknown_version: Option<Version>,
    skipped: Vec<SkippedFrame>,
    duplicates: DuplicatePolicy,
    from_v1: bool,
    pub(crate) path: Option<PathBuf>,
}

impl Default for ID3Tags {
    fn default() -> Self {
        Self::new()
    }
}

impl ID3Tags {
    pub fn new() -> Self {
        ID3Tags {
            frames: Vec::with_capacity(16),
            version: Version::V24,
            header: None,
            unknown_frames: Vec::new(),
            unknown_version: None,
            skipped: Vec::new(),
            duplicates: DuplicatePolicy::Replace,
            from_v1: false,
            path: None,
        }
    }

    /// An empty tag that inserts frames according to `duplicates`.
    pub fn with_policy(duplicates: DuplicatePolicy) -> Self {
        ID3Tags {
            duplicates,
            ..Self::new()
        }
    }

    /// Load the tag of the file at `path`, falling back to a trailing ID3v1
    /// tag when the file has no usable ID3v2 header.
    pub fn load<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Self> {
        Self::load_with(path, options, None)
    }

    /// Like [`ID3Tags::load`], decoding frames with `registry` instead of the
    /// built-in frame types.
    pub fn load_with<P: AsRef<Path>>(
        path: P,
        options: LoadOptions,
        registry: Option<&FrameRegistry>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;

        let mut tags = match Self::read_v2(&mut file, options, registry) {
            Ok(tags) => tags,
            Err(err) if err.is_missing_tag() => {
                let Some(frames) = id3v1::read_id3v1(&mut file)? else {
                    return Err(err);
                };
                log::debug!("no ID3v2 tag in {}, using ID3v1", path.display());
                let mut tags = Self::with_policy(options.duplicates);
                tags.from_v1 = true;
                for frame in frames {
                    tags.add(frame);
                }
                tags
            }
            Err(err) => return Err(err),
        };
        tags.path = Some(path.to_path_buf());

        if options.translate {
            tags.translate(options.v2_version);
        }
        Ok(tags)
    }

    /// Parse a tag from a reader positioned at its header.
    ///
    /// There is no ID3v1 fallback. Frames are translated when
    /// `options` asks for it.
    pub fn load_from<R: Read + Seek>(
        reader: &mut R,
        options: LoadOptions,
        registry: Option<&FrameRegistry>,
    ) -> Result<Self> {
        let mut tags = Self::read_v2(reader, options, registry)?;
        if options.translate {
            tags.translate(options.v2_version);
        }
        Ok(tags)
    }

    fn read_v2<R: Read + Seek>(
        reader: &mut R,
        options: LoadOptions,
        registry: Option<&FrameRegistry>,
    ) -> Result<Self> {
        let v24 = FrameRegistry::builtin(Version::V24);
        let header = ID3Header::read(reader, options.pedantic, |id| v24.contains(id))?;
        let registry = registry.unwrap_or_else(|| FrameRegistry::builtin(header.version));

        let size = header.frames_size() as usize;
        let mut data = Vec::with_capacity(size);
        reader.by_ref().take(size as u64).read_to_end(&mut data)?;
        if data.len() < size {
            if options.pedantic {
                return Err(MutagenError::ID3InvalidHeader(format!(
                    "tag claims {} bytes but only {} are present",
                    size,
                    data.len()
                )));
            }
            log::warn!("truncated tag: expected {} bytes, found {}", size, data.len());
        }

        let mut tags = Self::with_policy(options.duplicates);
        tags.version = header.version;
        tags.read_frames(&data, &header, registry, options.pedantic)?;
        tags.unknown_version = Some(header.version);
        tags.header = Some(header);
        Ok(tags)
    }

    fn read_frames(
        &mut self,
        data: &[u8],
        header: &ID3Header,
        registry: &FrameRegistry,
        pedantic: bool,
    ) -> Result<()> {
        let version = header.version;
        let mut data = Cow::Borrowed(data);
        if version < Version::V24 && header.flags.unsynchronisation {
            match unsynch::decode(&data) {
                Ok(decoded) => data = Cow::Owned(decoded),
                Err(e) => log::warn!("ignoring bad unsynchronised tag data: {}", e),
            }
        }

        let (header_len, id_len) = match version {
            Version::V22 => (6, 3),
            _ => (10, 4),
        };
        let bpi = match version {
            Version::V24 => determine_bpi(&data, |id| registry.contains(id)),
            _ => 8,
        };

        let mut rest: &[u8] = &data;
        while rest.len() >= header_len {
            let (frame_header, body) = rest.split_at(header_len);
            let id_bytes = &frame_header[..id_len];
            if id_bytes.iter().all(|&b| b == 0) {
                break;
            }
            let (size, flags) = match version {
                Version::V22 => (BigEndian::read_u24(&frame_header[3..6]) as usize, 0),
                _ => (
                    BitPaddedInt::decode(&frame_header[4..8], bpi) as usize,
                    BigEndian::read_u16(&frame_header[8..10]),
                ),
            };
            let end = size.min(body.len());
            let (frame_data, remaining) = body.split_at(end);
            rest = remaining;

            let id = String::from_utf8_lossy(id_bytes);
            if size == 0 {
                log::trace!("dropping empty {} frame", id);
                continue;
            }

            let Some(kind) = registry.get(&id) else {
                if is_valid_frame_id(id_bytes) {
                    log::trace!("keeping unknown frame {} ({} bytes)", id, frame_data.len());
                    self.unknown_frames.push([frame_header, frame_data].concat());
                }
                continue;
            };

            let body = match decode_frame_body(
                &id,
                version,
                flags,
                header.flags.unsynchronisation,
                pedantic,
                frame_data,
            ) {
                Ok(body) => body,
                Err(MutagenError::ID3JunkFrame(reason)) => {
                    log::warn!("dropping junk frame {}: {}", id, reason);
                    self.skipped.push(SkippedFrame {
                        id: id.into_owned(),
                        reason,
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };
            match Frame::from_data(kind, &body) {
                Ok(frame) => {
                    log::trace!("read {} ({} bytes)", id, body.len());
                    self.add(frame);
                }
                Err(e) => {
                    log::warn!("dropping junk frame {}: {}", id, e);
                    self.skipped.push(SkippedFrame {
                        id: id.into_owned(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// The header the tag was read with, if it was read from an ID3v2 tag.
    pub fn header(&self) -> Option<&ID3Header> {
        self.header.as_ref()
    }

    /// Whether the frames were synthesized from an ID3v1 tag.
    pub fn is_from_v1(&self) -> bool {
        self.from_v1
    }

    /// Bytes the tag occupied in the file it was read from, header included.
    pub fn size(&self) -> u64 {
        self.header.as_ref().map_or(0, |h| u64::from(h.full_size()))
    }

    /// Raw frames (header and body) whose ID was not recognized.
    pub fn unknown_frames(&self) -> &[Vec<u8>] {
        &self.unknown_frames
    }

    /// Frames dropped while decoding, with the reason.
    pub fn skipped_frames(&self) -> &[SkippedFrame] {
        &self.skipped
    }

    // ---- Collection API ----

    fn position(&self, key: &str) -> Option<usize> {
        self.frames.iter().position(|(k, _)| k.as_str() == key)
    }

    /// Add a frame under its hash key.
    ///
    /// v2.2 frames are upgraded first. An existing frame with the same key
    /// is handled by the tag's [`DuplicatePolicy`].
    pub fn add<F: Into<Frame>>(&mut self, frame: F) {
        let frame = frame.into().upgraded();
        let key = frame.hash_key();
        let Some(i) = self.position(key.as_str()) else {
            self.frames.push((key, frame));
            return;
        };
        match self.duplicates {
            DuplicatePolicy::Replace => self.frames[i].1 = frame,
            DuplicatePolicy::KeepExisting => {}
            DuplicatePolicy::Merge(merge) => {
                let (_, existing) = self.frames.remove(i);
                let merged = merge(existing, frame);
                self.frames.insert(i, (merged.hash_key(), merged));
            }
        }
    }

    /// Store `frame` under `key` exactly, replacing whatever was there.
    pub fn insert<K: Into<HashKey>>(&mut self, key: K, frame: Frame) -> Option<Frame> {
        let key = key.into();
        match self.position(key.as_str()) {
            Some(i) => Some(std::mem::replace(&mut self.frames[i].1, frame)),
            None => {
                self.frames.push((key, frame));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Frame> {
        self.position(key).map(|i| &self.frames[i].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Frame> {
        self.position(key).map(|i| &mut self.frames[i].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<Frame> {
        self.position(key).map(|i| self.frames.remove(i).1)
    }

    /// All frames stored under `key`, or under keys starting with `key:`.
    ///
    /// `get_all("COMM")` returns every comment, `get_all("TXXX:QuodLibet")`
    /// the user text frames with that description.
    pub fn get_all(&self, key: &str) -> Vec<&Frame> {
        if let Some(frame) = self.get(key) {
            return vec![frame];
        }
        let prefix = format!("{}:", key);
        self.frames
            .iter()
            .filter(|(k, _)| k.as_str().starts_with(&prefix))
            .map(|(_, f)| f)
            .collect()
    }

    /// Remove the frames [`ID3Tags::get_all`] would return.
    pub fn delete_all(&mut self, key: &str) {
        if self.remove(key).is_some() {
            return;
        }
        let prefix = format!("{}:", key);
        self.frames.retain(|(k, _)| !k.as_str().starts_with(&prefix));
    }

    /// Replace the frames matching `key` with `frames`.
    pub fn set_all(&mut self, key: &str, frames: Vec<Frame>) {
        self.delete_all(key);
        for frame in frames {
            let key = frame.hash_key();
            self.insert(key, frame);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &HashKey> {
        self.frames.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter().map(|(_, f)| f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HashKey, &Frame)> {
        self.frames.iter().map(|(k, f)| (k, f))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Sorted `ID=value` lines, one per frame.
    pub fn pprint(&self) -> String {
        let mut lines: Vec<String> = self.values().map(Frame::pprint).collect();
        lines.sort();
        lines.join("\n")
    }

    // ---- Version migration ----

    pub fn translate(&mut self, target: V2Minor) {
        match target {
            V2Minor::V3 => self.update_to_v23(),
            V2Minor::V4 => self.update_to_v24(),
        }
    }

    /// Text of a text-like frame, values joined with nulls, if it has any.
    fn text_of(&self, key: &str) -> Option<String> {
        let joined = match self.get(key)? {
            Frame::TimeStampText(f) => f
                .text
                .iter()
                .map(ID3TimeStamp::text)
                .collect::<Vec<_>>()
                .join("\u{0}"),
            frame => frame.text()?.join("\u{0}"),
        };
        (!joined.trim_matches('\u{0}').is_empty()).then_some(joined)
    }

    fn update_common(&mut self) {
        if let Some(Frame::Text(tcon)) = self.get_mut("TCON") {
            let genres = tcon.genres();
            tcon.set_genres(genres);
        }

        if self.version < Version::V23 {
            let pics: Vec<Frame> = self.get_all("APIC").into_iter().cloned().collect();
            self.delete_all("APIC");
            for pic in pics {
                let Frame::Picture(pic) = pic else { continue };
                let mime = match pic.mime.as_str() {
                    "PNG" => "image/png".to_string(),
                    "JPG" => "image/jpeg".to_string(),
                    _ => pic.mime.clone(),
                };
                self.add(PictureFrame { mime, ..pic });
            }
            // v2.2 links point at 3-character frame ids.
            self.delete_all("LINK");
        }
    }

    /// Convert older frames to their ID3v2.4 forms.
    ///
    /// `TYER`, `TDAT` and `TIME` become `TDRC`, `TORY` becomes `TDOR` and
    /// `IPLS` becomes `TIPL`. Frames with no v2.4 equivalent are dropped.
    pub fn update_to_v24(&mut self) {
        self.update_common();

        if self.unknown_version == Some(Version::V23) {
            self.unknown_frames = std::mem::take(&mut self.unknown_frames)
                .into_iter()
                .filter_map(|raw| match convert_unknown_v23(&raw) {
                    Ok(converted) => Some(converted),
                    Err(e) => {
                        log::warn!("dropping undecodable unknown frame: {}", e);
                        None
                    }
                })
                .collect();
            self.unknown_version = Some(Version::V24);
        }

        if let Some(mut date) = self.text_of("TYER") {
            self.remove("TYER");
            if let Some(dat) = self.text_of("TDAT") {
                self.remove("TDAT");
                date = format!(
                    "{}-{}-{}",
                    date,
                    dat.get(2..).unwrap_or(""),
                    dat.get(..2).unwrap_or("")
                );
                if let Some(time) = self.text_of("TIME") {
                    self.remove("TIME");
                    date.push_str(&format!(
                        "T{}:{}:00",
                        time.get(..2).unwrap_or(""),
                        time.get(2..).unwrap_or("")
                    ));
                }
            }
            if !self.contains_key("TDRC") {
                self.add_built("TDRC", date);
            }
        }

        if let Some(tory) = self.remove("TORY") {
            if !self.contains_key("TDOR") {
                let text = tory.text().map(|t| t.join("\u{0}")).unwrap_or_default();
                self.add_built("TDOR", text);
            }
        }

        if let Some(Frame::PairedText(ipls)) = self.remove("IPLS") {
            if !self.contains_key("TIPL") {
                self.add(PairedTextFrame {
                    id: "TIPL".to_string(),
                    ..ipls
                });
            }
        }

        for key in DROPPED_ON_UPGRADE {
            self.delete_all(key);
        }
        self.version = Version::V24;
    }

    /// Convert frames to their ID3v2.3 forms.
    ///
    /// Frames introduced in v2.4 are dropped; remove any you want to keep
    /// beforehand and add them back afterwards.
    pub fn update_to_v23(&mut self) {
        self.update_common();

        let tipl = self.remove("TIPL");
        let tmcl = self.remove("TMCL");
        let paired: Vec<PairedTextFrame> = [tipl, tmcl]
            .into_iter()
            .flatten()
            .filter_map(|f| match f {
                Frame::PairedText(p) => Some(p),
                _ => None,
            })
            .collect();
        if let Some(last) = paired.last() {
            if !self.contains_key("IPLS") {
                let encoding = last.encoding;
                let people = paired.iter().flat_map(|p| p.people.iter().cloned()).collect();
                self.add(PairedTextFrame {
                    id: "IPLS".to_string(),
                    encoding,
                    people,
                });
            }
        }

        if let Some(Frame::TimeStampText(tdor)) = self.remove("TDOR") {
            if let Some(year) = tdor.text.first().and_then(|d| d.year).filter(|&y| y != 0) {
                if !self.contains_key("TORY") {
                    self.add(text_frame("TORY", tdor.encoding, format!("{:04}", year)));
                }
            }
        }

        if let Some(Frame::TimeStampText(tdrc)) = self.remove("TDRC") {
            if let Some(d) = tdrc.text.first() {
                let enc = tdrc.encoding;
                if let Some(year) = d.year.filter(|&y| y != 0) {
                    if !self.contains_key("TYER") {
                        self.add(text_frame("TYER", enc, format!("{:04}", year)));
                    }
                }
                if let (Some(month), Some(day)) = (d.month, d.day) {
                    if month != 0 && day != 0 && !self.contains_key("TDAT") {
                        self.add(text_frame("TDAT", enc, format!("{:02}{:02}", day, month)));
                    }
                }
                if let (Some(hour), Some(minute)) = (d.hour, d.minute) {
                    if !self.contains_key("TIME") {
                        self.add(text_frame("TIME", enc, format!("{:02}{:02}", hour, minute)));
                    }
                }
            }
        }

        for key in V24_ONLY {
            self.delete_all(key);
        }
        self.version = Version::V23;
    }

    /// Add a Latin-1 frame built from `text`, ignoring text its specs reject.
    fn add_built(&mut self, id: &str, text: String) {
        match Frame::new(id, vec![FieldValue::Int(0), FieldValue::Text(text)]) {
            Ok(frame) => self.add(frame),
            Err(e) => log::warn!("could not build {}: {}", id, e),
        }
    }

    // ---- Serialization ----

    /// Frame data for a tag of `version`, without the tag header or padding.
    pub fn render_frames(
        &self,
        version: V2Minor,
        v23_sep: Option<&str>,
        pedantic: bool,
    ) -> Result<Vec<u8>> {
        let target = version.version();
        let mut ordered: Vec<&(HashKey, Frame)> = self.frames.iter().collect();
        ordered.sort_by_key(|(key, _)| {
            let prefix = key.as_str().get(..4).unwrap_or(key.as_str());
            let rank = IMPORTANCE.iter().position(|&id| id == prefix).unwrap_or(IMPORTANCE.len());
            (rank, key.clone())
        });

        let mut out = Vec::with_capacity(4096);
        for (_, frame) in ordered {
            out.extend(save_frame(frame, target, v23_sep, pedantic)?);
        }

        if self.unknown_version == Some(target) {
            for raw in self.unknown_frames.iter().filter(|raw| raw.len() > 10) {
                out.extend_from_slice(raw);
            }
        }
        Ok(out)
    }
}

impl<'a> IntoIterator for &'a ID3Tags {
    type Item = (&'a HashKey, &'a Frame);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

fn text_frame(id: &str, encoding: Encoding, text: String) -> TextFrame {
    TextFrame {
        encoding,
        ..TextFrame::new(id, vec![text])
    }
}

/// Frame IDs are uppercase letters and digits.
fn is_valid_frame_id(id: &[u8]) -> bool {
    id.iter().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        && id.iter().any(u8::is_ascii_uppercase)
}

/// Undo per-frame compression and unsynchronisation.
fn decode_frame_body<'d>(
    id: &str,
    version: Version,
    flags: u16,
    tag_unsynch: bool,
    pedantic: bool,
    data: &'d [u8],
) -> Result<Cow<'d, [u8]>> {
    match version {
        Version::V24 => {
            let (datalen, data) = if flags & (FLAG24_COMPRESS | FLAG24_DATALEN) != 0 {
                if data.len() < 4 {
                    return Err(MutagenError::ID3JunkFrame(format!("{}: missing data length", id)));
                }
                data.split_at(4)
            } else {
                (&data[..0], data)
            };
            let mut data = Cow::Borrowed(data);
            if flags & FLAG24_UNSYNCH != 0 || tag_unsynch {
                match unsynch::decode(&data) {
                    Ok(decoded) => data = Cow::Owned(decoded),
                    Err(e) if pedantic => {
                        return Err(MutagenError::ID3BadUnsynchData(format!("{}: {}", id, e)))
                    }
                    Err(e) => log::warn!("{}: keeping bad unsynchronised data: {}", id, e),
                }
            }
            if flags & FLAG24_ENCRYPT != 0 {
                return Err(MutagenError::ID3EncryptionUnsupported(id.to_string()));
            }
            if flags & FLAG24_COMPRESS != 0 {
                match decompress(&data) {
                    Ok(inflated) => data = Cow::Owned(inflated),
                    Err(_) => {
                        // Some writers left out the data length; it is part of the stream.
                        let with_len = [datalen, &data[..]].concat();
                        match decompress(&with_len) {
                            Ok(inflated) => data = Cow::Owned(inflated),
                            Err(e) if pedantic => {
                                return Err(MutagenError::ID3BadCompressedData(format!(
                                    "{}: {}",
                                    id, e
                                )))
                            }
                            Err(e) => {
                                log::warn!("{}: keeping undecompressable data: {}", id, e);
                                data = Cow::Owned(with_len);
                            }
                        }
                    }
                }
            }
            Ok(data)
        }
        Version::V23 => {
            let mut data = data;
            if flags & FLAG23_COMPRESS != 0 {
                if data.len() < 4 {
                    return Err(MutagenError::ID3JunkFrame(format!("{}: missing data length", id)));
                }
                data = &data[4..];
            }
            if flags & FLAG23_ENCRYPT != 0 {
                return Err(MutagenError::ID3EncryptionUnsupported(id.to_string()));
            }
            if flags & FLAG23_COMPRESS != 0 {
                let inflated = decompress(data)
                    .map_err(|e| MutagenError::ID3BadCompressedData(format!("{}: {}", id, e)))?;
                return Ok(Cow::Owned(inflated));
            }
            Ok(Cow::Borrowed(data))
        }
        Version::V22 => Ok(Cow::Borrowed(data)),
    }
}

fn decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = flate2::read::ZlibDecoder::new(data);
    let mut result = Vec::new();
    decoder.read_to_end(&mut result)?;
    Ok(result)
}

/// Re-encode a raw v2.3 frame with a v2.4 header.
fn convert_unknown_v23(raw: &[u8]) -> Result<Vec<u8>> {
    if raw.len() < 10 {
        return Err(MutagenError::ID3JunkFrame("short frame header".into()));
    }
    let (header, body) = raw.split_at(10);
    let id = String::from_utf8_lossy(&header[..4]);
    let flags = BigEndian::read_u16(&header[8..10]);
    let body = decode_frame_body(&id, Version::V23, flags, false, true, body)?;
    frame_bytes(&header[..4], &body, Version::V24)
}

fn frame_bytes(id: &[u8], body: &[u8], version: Version) -> Result<Vec<u8>> {
    let size = BitPaddedInt::encode(
        body.len() as u64,
        version.frame_size_bits(),
        true,
        Width::Fixed(4),
    )?;
    let mut out = Vec::with_capacity(10 + body.len());
    out.extend_from_slice(id);
    out.extend_from_slice(&size);
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(body);
    Ok(out)
}

fn save_frame(frame: &Frame, version: Version, v23_sep: Option<&str>, pedantic: bool) -> Result<Vec<u8>> {
    if pedantic && is_empty_text(frame) {
        log::trace!("skipping empty {}", frame.frame_id());
        return Ok(Vec::new());
    }
    if frame.frame_id().len() != 4 {
        log::warn!("{} has no ID3v{} form, not writing it", frame.frame_id(), version);
        return Ok(Vec::new());
    }
    let body = match version {
        Version::V23 => frame.downgrade_v23(v23_sep)?.write_data()?,
        _ => frame.write_data()?,
    };
    frame_bytes(frame.frame_id().as_bytes(), &body, version)
}

fn is_empty_text(frame: &Frame) -> bool {
    match frame {
        Frame::Text(f) => f.text.iter().all(String::is_empty),
        Frame::UserText(f) => f.text.iter().all(String::is_empty),
        Frame::TimeStampText(f) => f.text.iter().all(|t| t.text().is_empty()),
        _ => false,
    }
}
