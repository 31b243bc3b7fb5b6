use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use crate::common::error::{MutagenError, Result};
use crate::id3::header::Version;
use crate::id3::specs::{
    self, Encoding, FieldSpec, FieldValue, ID3TimeStamp, PictureType, SpecKind,
};

/// Represents the hash key for a frame, used for dictionary-like access.
/// Most frames use their 4-char ID, but some include extra info
/// (e.g., TXXX:description, COMM:description:language).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashKey(pub String);

impl HashKey {
    pub fn new(s: &str) -> Self {
        HashKey(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HashKey {
    fn from(s: &str) -> Self {
        HashKey::new(s)
    }
}

// ---- Field tables ----

const ENCODING: FieldSpec = FieldSpec::new("encoding", SpecKind::Encoding);
const LANG: FieldSpec = FieldSpec::new("lang", SpecKind::FixedString(3));
const DESC: FieldSpec = FieldSpec::new("desc", SpecKind::EncodedText);
const TEXT_LIST: FieldSpec = FieldSpec::new(
    "text",
    SpecKind::Multi {
        items: &[SpecKind::EncodedText],
        sep: Some("\u{0}"),
    },
);

const fn latin1(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, SpecKind::Latin1Text)
}

const fn byte(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, SpecKind::Byte)
}

const fn sized(name: &'static str, size: usize) -> FieldSpec {
    FieldSpec::new(name, SpecKind::SizedInteger(size))
}

const fn binary(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, SpecKind::Binary)
}

const NONE: &[FieldSpec] = &[];
const TEXT: &[FieldSpec] = &[ENCODING, TEXT_LIST];
const TIMESTAMP_TEXT: &[FieldSpec] = &[
    ENCODING,
    FieldSpec::new(
        "text",
        SpecKind::Multi {
            items: &[SpecKind::TimeStamp],
            sep: Some(","),
        },
    ),
];
const USER_TEXT: &[FieldSpec] = &[ENCODING, DESC, TEXT_LIST];
const URL: &[FieldSpec] = &[latin1("url")];
const USER_URL: &[FieldSpec] = &[ENCODING, DESC, latin1("url")];
const PAIRED_TEXT: &[FieldSpec] = &[
    ENCODING,
    FieldSpec::new(
        "people",
        SpecKind::Multi {
            items: &[SpecKind::EncodedText, SpecKind::EncodedText],
            sep: None,
        },
    ),
];
const BINARY: &[FieldSpec] = &[binary("data")];
const ETCO: &[FieldSpec] = &[byte("format"), FieldSpec::new("events", SpecKind::KeyEvents)];
const MLLT: &[FieldSpec] = &[
    sized("frames", 2),
    sized("bytes", 3),
    sized("milliseconds", 3),
    byte("bits_for_bytes"),
    byte("bits_for_milliseconds"),
    binary("data"),
];
const SYTC: &[FieldSpec] = &[byte("format"), binary("data")];
const USLT: &[FieldSpec] = &[
    ENCODING,
    LANG,
    DESC,
    FieldSpec::new("text", SpecKind::EncodedText),
];
const SYLT: &[FieldSpec] = &[
    ENCODING,
    LANG,
    byte("format"),
    byte("type"),
    DESC,
    FieldSpec::new("text", SpecKind::SynchronizedText),
];
const COMM: &[FieldSpec] = &[ENCODING, LANG, DESC, TEXT_LIST];
const RVA2: &[FieldSpec] = &[
    latin1("desc"),
    byte("channel"),
    FieldSpec::new("gain", SpecKind::VolumeAdjustment),
    FieldSpec::new("peak", SpecKind::VolumePeak),
];
const EQU2: &[FieldSpec] = &[
    byte("method"),
    latin1("desc"),
    FieldSpec::new("adjustments", SpecKind::VolumeAdjustments),
];
const RVRB: &[FieldSpec] = &[
    sized("left", 2),
    sized("right", 2),
    byte("bounce_left"),
    byte("bounce_right"),
    byte("feedback_ltl"),
    byte("feedback_ltr"),
    byte("feedback_rtr"),
    byte("feedback_rtl"),
    byte("premix_ltr"),
    byte("premix_rtl"),
];
const APIC: &[FieldSpec] = &[ENCODING, latin1("mime"), byte("type"), DESC, binary("data")];
const PIC: &[FieldSpec] = &[
    ENCODING,
    FieldSpec::new("mime", SpecKind::FixedString(3)),
    byte("type"),
    DESC,
    binary("data"),
];
const PCNT: &[FieldSpec] = &[FieldSpec::new("count", SpecKind::Integer)];
const POPM: &[FieldSpec] = &[latin1("email"), byte("rating")];
const GEOB: &[FieldSpec] = &[
    ENCODING,
    latin1("mime"),
    FieldSpec::new("filename", SpecKind::EncodedText),
    DESC,
    binary("data"),
];
const RBUF: &[FieldSpec] = &[sized("size", 3)];
const RBUF_OPTIONAL: &[FieldSpec] = &[byte("info"), sized("offset", 4)];
const AENC: &[FieldSpec] = &[latin1("owner"), sized("preview_start", 2), sized("preview_length", 2)];
const LINK: &[FieldSpec] = &[FieldSpec::new("frameid", SpecKind::FixedString(4)), latin1("url")];
const LNK: &[FieldSpec] = &[FieldSpec::new("frameid", SpecKind::FixedString(3)), latin1("url")];
const POSS: &[FieldSpec] = &[byte("format"), FieldSpec::new("position", SpecKind::Integer)];
const UFID: &[FieldSpec] = &[latin1("owner"), binary("data")];
const USER: &[FieldSpec] = &[ENCODING, LANG, FieldSpec::new("text", SpecKind::EncodedText)];
const OWNE: &[FieldSpec] = &[
    ENCODING,
    latin1("price"),
    FieldSpec::new("date", SpecKind::FixedString(8)),
    FieldSpec::new("seller", SpecKind::EncodedText),
];
const COMR: &[FieldSpec] = &[
    ENCODING,
    latin1("price"),
    FieldSpec::new("valid_until", SpecKind::FixedString(8)),
    latin1("contact"),
    byte("format"),
    FieldSpec::new("seller", SpecKind::EncodedText),
    DESC,
];
const COMR_OPTIONAL: &[FieldSpec] = &[latin1("mime"), binary("logo")];
const ENCR: &[FieldSpec] = &[latin1("owner"), byte("method"), binary("data")];
const GRID: &[FieldSpec] = &[latin1("owner"), byte("group")];
const PRIV: &[FieldSpec] = &[latin1("owner"), binary("data")];
const SIGN: &[FieldSpec] = &[byte("group"), binary("sig")];
const SEEK: &[FieldSpec] = &[FieldSpec::new("offset", SpecKind::Integer)];
const ASPI: &[FieldSpec] = &[
    sized("S", 4),
    sized("L", 4),
    sized("N", 2),
    byte("b"),
    FieldSpec::new("Fi", SpecKind::AspiIndex),
];
const CRM: &[FieldSpec] = &[latin1("owner"), latin1("desc"), binary("data")];
const DATA_OPTIONAL: &[FieldSpec] = &[binary("data")];
const COUNT_OPTIONAL: &[FieldSpec] = &[FieldSpec::new("count", SpecKind::Integer)];

// ---- Field access ----

/// Decoded field values consumed in spec order while building a frame.
struct Fields {
    values: std::vec::IntoIter<FieldValue>,
}

impl Fields {
    fn new(values: Vec<FieldValue>) -> Self {
        Fields {
            values: values.into_iter(),
        }
    }

    fn next(&mut self, what: &str) -> Result<FieldValue> {
        self.values
            .next()
            .ok_or_else(|| MutagenError::ValueError(format!("missing {} field", what)))
    }

    fn mismatch(what: &str, value: FieldValue) -> MutagenError {
        MutagenError::ValueError(format!("expected {}, found {:?}", what, value))
    }

    fn encoding(&mut self) -> Result<Encoding> {
        match self.next("encoding")? {
            FieldValue::Encoding(e) => Ok(e),
            other => Err(Self::mismatch("an encoding", other)),
        }
    }

    fn text(&mut self) -> Result<String> {
        match self.next("text")? {
            FieldValue::Text(s) => Ok(s),
            other => Err(Self::mismatch("text", other)),
        }
    }

    fn int<T: TryFrom<u64>>(&mut self) -> Result<T> {
        match self.next("integer")? {
            FieldValue::Int(v) => T::try_from(v)
                .map_err(|_| MutagenError::ValueError(format!("{} out of range", v))),
            other => Err(Self::mismatch("an integer", other)),
        }
    }

    fn float(&mut self) -> Result<f64> {
        match self.next("number")? {
            FieldValue::Float(v) => Ok(v),
            other => Err(Self::mismatch("a number", other)),
        }
    }

    fn binary(&mut self) -> Result<Vec<u8>> {
        match self.next("binary")? {
            FieldValue::Binary(b) => Ok(b),
            other => Err(Self::mismatch("binary data", other)),
        }
    }

    fn list(&mut self) -> Result<Vec<FieldValue>> {
        match self.next("list")? {
            FieldValue::List(items) => Ok(items),
            other => Err(Self::mismatch("a list", other)),
        }
    }

    fn texts(&mut self) -> Result<Vec<String>> {
        self.list()?
            .into_iter()
            .map(|item| match item {
                FieldValue::Text(s) => Ok(s),
                other => Err(Self::mismatch("text", other)),
            })
            .collect()
    }

    fn stamps(&mut self) -> Result<Vec<ID3TimeStamp>> {
        self.list()?
            .into_iter()
            .map(|item| match item {
                FieldValue::TimeStamp(t) => Ok(t),
                other => Err(Self::mismatch("a time stamp", other)),
            })
            .collect()
    }

    fn pairs(&mut self) -> Result<Vec<(String, String)>> {
        self.list()?
            .into_iter()
            .map(|item| match item {
                FieldValue::Tuple(pair) => match <[FieldValue; 2]>::try_from(pair) {
                    Ok([FieldValue::Text(a), FieldValue::Text(b)]) => Ok((a, b)),
                    Ok(other) => Err(Self::mismatch("a text pair", FieldValue::Tuple(other.into()))),
                    Err(other) => Err(Self::mismatch("a text pair", FieldValue::Tuple(other))),
                },
                other => Err(Self::mismatch("a text pair", other)),
            })
            .collect()
    }

    fn optional_int<T: TryFrom<u64>>(&mut self) -> Result<Option<T>> {
        if self.values.len() == 0 {
            return Ok(None);
        }
        self.int().map(Some)
    }

    fn optional_text(&mut self) -> Result<Option<String>> {
        if self.values.len() == 0 {
            return Ok(None);
        }
        self.text().map(Some)
    }

    fn optional_binary(&mut self) -> Result<Option<Vec<u8>>> {
        if self.values.len() == 0 {
            return Ok(None);
        }
        self.binary().map(Some)
    }
}

fn text_list(texts: &[String]) -> FieldValue {
    FieldValue::List(texts.iter().cloned().map(FieldValue::Text).collect())
}

fn escaped(data: &[u8]) -> String {
    data.escape_ascii().to_string()
}

/// Common behaviour of every frame body.
pub trait FrameBody: fmt::Debug {
    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    /// Field values in spec order; absent optional fields are left off.
    fn to_values(&self) -> Vec<FieldValue>;

    /// Text appended to the frame id to form the hash key.
    fn key_suffix(&self) -> Option<String> {
        None
    }

    /// Human-readable value, without the frame id.
    fn describe(&self) -> String;
}

macro_rules! id_accessors {
    () => {
        fn id(&self) -> &str {
            &self.id
        }

        fn set_id(&mut self, id: String) {
            self.id = id;
        }
    };
}

macro_rules! frame_shapes {
    ($($shape:ident => $ty:ident($specs:ident, $optional:ident)),+ $(,)?) => {
        /// A parsed ID3v2 frame.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Frame {
            $($shape($ty)),+
        }

        /// Layout family of a frame type. Each shape has one struct and one
        /// canonical field table.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Shape {
            $($shape),+
        }

        impl Shape {
            /// Required and optional fields as written to a v2.3/v2.4 tag.
            pub const fn specs(self) -> (&'static [FieldSpec], &'static [FieldSpec]) {
                match self {
                    $(Shape::$shape => ($specs, $optional)),+
                }
            }

            fn build(self, id: &str, fields: &mut Fields) -> Result<Frame> {
                match self {
                    $(Shape::$shape => $ty::from_fields(id, fields).map(Frame::$shape)),+
                }
            }
        }

        impl Frame {
            pub fn shape(&self) -> Shape {
                match self {
                    $(Frame::$shape(_) => Shape::$shape),+
                }
            }

            fn body(&self) -> &dyn FrameBody {
                match self {
                    $(Frame::$shape(f) => f),+
                }
            }

            fn body_mut(&mut self) -> &mut dyn FrameBody {
                match self {
                    $(Frame::$shape(f) => f),+
                }
            }
        }

        $(
            impl From<$ty> for Frame {
                fn from(f: $ty) -> Self {
                    Frame::$shape(f)
                }
            }
        )+
    };
}

frame_shapes! {
    Text => TextFrame(TEXT, NONE),
    TimeStampText => TimeStampTextFrame(TIMESTAMP_TEXT, NONE),
    UserText => UserTextFrame(USER_TEXT, NONE),
    Url => UrlFrame(URL, NONE),
    UserUrl => UserUrlFrame(USER_URL, NONE),
    PairedText => PairedTextFrame(PAIRED_TEXT, NONE),
    Binary => BinaryFrame(BINARY, NONE),
    EventTiming => EventTimingFrame(ETCO, NONE),
    MpegLookup => MpegLookupFrame(MLLT, NONE),
    SyncTempo => SyncTempoFrame(SYTC, NONE),
    Lyrics => LyricsFrame(USLT, NONE),
    SyncLyrics => SyncLyricsFrame(SYLT, NONE),
    Comment => CommentFrame(COMM, NONE),
    RelativeVolume => RelativeVolumeFrame(RVA2, NONE),
    Equalisation => EqualisationFrame(EQU2, NONE),
    Reverb => ReverbFrame(RVRB, NONE),
    Picture => PictureFrame(APIC, NONE),
    PlayCounter => PlayCounterFrame(PCNT, NONE),
    Popularimeter => PopularimeterFrame(POPM, COUNT_OPTIONAL),
    GeneralObject => GeneralObjectFrame(GEOB, NONE),
    RecommendedBuffer => RecommendedBufferFrame(RBUF, RBUF_OPTIONAL),
    AudioEncryption => AudioEncryptionFrame(AENC, DATA_OPTIONAL),
    Link => LinkFrame(LINK, DATA_OPTIONAL),
    Position => PositionFrame(POSS, NONE),
    UniqueFileId => UniqueFileIdFrame(UFID, NONE),
    TermsOfUse => TermsOfUseFrame(USER, NONE),
    Ownership => OwnershipFrame(OWNE, NONE),
    Commercial => CommercialFrame(COMR, COMR_OPTIONAL),
    EncryptionMethod => EncryptionMethodFrame(ENCR, NONE),
    GroupId => GroupIdFrame(GRID, DATA_OPTIONAL),
    Private => PrivateFrame(PRIV, NONE),
    Signature => SignatureFrame(SIGN, NONE),
    Seek => SeekFrame(SEEK, NONE),
    AudioSeekIndex => AudioSeekIndexFrame(ASPI, NONE),
    EncryptedMeta => EncryptedMetaFrame(CRM, NONE),
}

impl Frame {
    /// Build a frame from values in field order, validating each one.
    ///
    /// `id` must name a built-in frame type.
    pub fn new(id: &str, values: Vec<FieldValue>) -> Result<Frame> {
        let kind = FrameKind::builtin(id)
            .ok_or_else(|| MutagenError::ValueError(format!("unknown frame id {}", id)))?;
        kind.build(values)
    }

    /// Decode a frame body (after any unsynchronisation or compression has
    /// been undone).
    pub fn from_data(kind: &FrameKind, data: &[u8]) -> Result<Frame> {
        let values = specs::read_fields(kind.id, kind.specs, kind.optional, data)?;
        kind.shape.build(kind.id, &mut Fields::new(values))
    }

    /// Get the frame ID (4-char string like "TIT2").
    pub fn frame_id(&self) -> &str {
        self.body().id()
    }

    /// Get the hash key for dictionary storage.
    pub fn hash_key(&self) -> HashKey {
        let body = self.body();
        match body.key_suffix() {
            Some(suffix) => HashKey(format!("{}:{}", body.id(), suffix)),
            None => HashKey::new(body.id()),
        }
    }

    /// `ID=value`, as shown by a tag listing.
    pub fn pprint(&self) -> String {
        format!("{}={}", self.frame_id(), self.body().describe())
    }

    pub fn to_values(&self) -> Vec<FieldValue> {
        self.body().to_values()
    }

    /// A copy with every field checked and normalized by its spec.
    pub fn validate(&self) -> Result<Frame> {
        let (required, optional) = self.shape().specs();
        let values = required
            .iter()
            .chain(optional)
            .zip(self.to_values())
            .map(|(spec, value)| {
                spec.kind.validate(value).map_err(|e| {
                    MutagenError::ValueError(format!("{}.{}: {}", self.frame_id(), spec.name, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.shape().build(self.frame_id(), &mut Fields::new(values))
    }

    /// A copy that can be written to a v2.3 tag. `sep` joins multi-valued
    /// text; with `None` the values stay null separated.
    pub fn downgrade_v23(&self, sep: Option<&str>) -> Result<Frame> {
        let (required, optional) = self.shape().specs();
        let values = required
            .iter()
            .chain(optional)
            .zip(self.to_values())
            .map(|(spec, value)| spec.kind.downgrade_v23(value, sep))
            .collect::<Result<Vec<_>>>()?;
        self.shape().build(self.frame_id(), &mut Fields::new(values))
    }

    /// Serialize frame data back to bytes (without frame header).
    pub fn write_data(&self) -> Result<Vec<u8>> {
        let (required, optional) = self.shape().specs();
        let all: Vec<FieldSpec> = required.iter().chain(optional).copied().collect();
        specs::write_fields(&all, &self.to_values())
    }

    /// Convert a v2.2 frame to its v2.3/v2.4 counterpart. Frames without
    /// one are returned unchanged.
    pub fn upgraded(mut self) -> Frame {
        let Some(target) = FrameKind::builtin(self.frame_id()).and_then(|k| k.upgrade) else {
            return self;
        };
        if let Frame::Link(link) = &mut self {
            if link.frameid.len() == 3 {
                link.frameid = match FrameKind::builtin(&link.frameid).and_then(|k| k.upgrade) {
                    Some(upgraded) => upgraded.to_string(),
                    None => format!("{:<4}", link.frameid),
                };
            }
        }
        self.body_mut().set_id(target.to_string());
        self
    }

    /// Text value(s) for frames that carry a plain text list.
    pub fn text(&self) -> Option<&[String]> {
        match self {
            Frame::Text(f) => Some(&f.text),
            Frame::UserText(f) => Some(&f.text),
            Frame::Comment(f) => Some(&f.text),
            _ => None,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body().describe())
    }
}

// ---- Frame bodies ----

/// Standard text frame (TIT2, TPE1, TALB, TRCK, TCON, etc.)
///
/// Numeric frames (TBPM, TLEN, ...) and part frames (TRCK, TPOS) share this
/// layout; see [`TextFrame::number`] and [`TextFrame::part`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextFrame {
    pub id: String,
    pub encoding: Encoding,
    pub text: Vec<String>,
}

impl TextFrame {
    pub fn new(id: &str, text: Vec<String>) -> Self {
        TextFrame {
            id: id.to_string(),
            encoding: Encoding::Utf8,
            text,
        }
    }

    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(TextFrame {
            id: id.to_string(),
            encoding: fields.encoding()?,
            text: fields.texts()?,
        })
    }

    /// Leading integer of the first value, for numeric frames.
    pub fn number(&self) -> Option<u64> {
        self.text.first().and_then(|t| leading_number(t))
    }

    /// `X` and optional `Y` of an `X/Y` value (TRCK, TPOS).
    pub fn part(&self) -> Option<(u64, Option<u64>)> {
        let first = self.text.first()?;
        let mut parts = first.splitn(2, '/');
        let x = leading_number(parts.next()?)?;
        Some((x, parts.next().and_then(leading_number)))
    }

    /// Genre names of a TCON frame.
    pub fn genres(&self) -> Vec<String> {
        specs::parse_genres(&self.text)
    }

    pub fn set_genres(&mut self, genres: Vec<String>) {
        self.text = genres;
    }
}

fn leading_number(s: &str) -> Option<u64> {
    let s = s.trim_start();
    let end = s.bytes().position(|b| !b.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok()
}

impl FrameBody for TextFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![FieldValue::Encoding(self.encoding), text_list(&self.text)]
    }

    fn describe(&self) -> String {
        if self.id == "TCON" {
            self.genres().join(" / ")
        } else {
            self.text.join(" / ")
        }
    }
}

/// A list of time stamps (TDRC, TDOR, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct TimeStampTextFrame {
    pub id: String,
    pub encoding: Encoding,
    pub text: Vec<ID3TimeStamp>,
}

impl TimeStampTextFrame {
    pub fn new(id: &str, text: Vec<ID3TimeStamp>) -> Self {
        TimeStampTextFrame {
            id: id.to_string(),
            encoding: Encoding::Utf8,
            text,
        }
    }

    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(TimeStampTextFrame {
            id: id.to_string(),
            encoding: fields.encoding()?,
            text: fields.stamps()?,
        })
    }
}

impl FrameBody for TimeStampTextFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Encoding(self.encoding),
            FieldValue::List(self.text.iter().cloned().map(FieldValue::TimeStamp).collect()),
        ]
    }

    fn describe(&self) -> String {
        self.text.iter().map(ID3TimeStamp::text).collect::<Vec<_>>().join(" / ")
    }
}

/// User-defined text frame (TXXX)
#[derive(Debug, Clone, PartialEq)]
pub struct UserTextFrame {
    pub id: String,
    pub encoding: Encoding,
    pub desc: String,
    pub text: Vec<String>,
}

impl UserTextFrame {
    pub fn new(desc: &str, text: Vec<String>) -> Self {
        UserTextFrame {
            id: "TXXX".to_string(),
            encoding: Encoding::Utf8,
            desc: desc.to_string(),
            text,
        }
    }

    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(UserTextFrame {
            id: id.to_string(),
            encoding: fields.encoding()?,
            desc: fields.text()?,
            text: fields.texts()?,
        })
    }
}

impl FrameBody for UserTextFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Encoding(self.encoding),
            FieldValue::Text(self.desc.clone()),
            text_list(&self.text),
        ]
    }

    fn key_suffix(&self) -> Option<String> {
        Some(self.desc.clone())
    }

    fn describe(&self) -> String {
        format!("{}={}", self.desc, self.text.join(" / "))
    }
}

/// URL link frame (W***, WXXX excluded)
#[derive(Debug, Clone, PartialEq)]
pub struct UrlFrame {
    pub id: String,
    pub url: String,
}

impl UrlFrame {
    pub fn new(id: &str, url: &str) -> Self {
        UrlFrame {
            id: id.to_string(),
            url: url.to_string(),
        }
    }

    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(UrlFrame {
            id: id.to_string(),
            url: fields.text()?,
        })
    }
}

impl FrameBody for UrlFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![FieldValue::Text(self.url.clone())]
    }

    fn key_suffix(&self) -> Option<String> {
        // Commercial and artist pages may legally repeat.
        matches!(self.id.as_str(), "WCOM" | "WOAR").then(|| self.url.clone())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// User-defined URL frame (WXXX)
#[derive(Debug, Clone, PartialEq)]
pub struct UserUrlFrame {
    pub id: String,
    pub encoding: Encoding,
    pub desc: String,
    pub url: String,
}

impl UserUrlFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(UserUrlFrame {
            id: id.to_string(),
            encoding: fields.encoding()?,
            desc: fields.text()?,
            url: fields.text()?,
        })
    }
}

impl FrameBody for UserUrlFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Encoding(self.encoding),
            FieldValue::Text(self.desc.clone()),
            FieldValue::Text(self.url.clone()),
        ]
    }

    fn key_suffix(&self) -> Option<String> {
        Some(self.desc.clone())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Involvement/person pairs (TIPL, TMCL, IPLS)
#[derive(Debug, Clone, PartialEq)]
pub struct PairedTextFrame {
    pub id: String,
    pub encoding: Encoding,
    pub people: Vec<(String, String)>,
}

impl PairedTextFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(PairedTextFrame {
            id: id.to_string(),
            encoding: fields.encoding()?,
            people: fields.pairs()?,
        })
    }
}

impl FrameBody for PairedTextFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        let people = self
            .people
            .iter()
            .map(|(a, b)| FieldValue::Tuple(vec![FieldValue::Text(a.clone()), FieldValue::Text(b.clone())]))
            .collect();
        vec![FieldValue::Encoding(self.encoding), FieldValue::List(people)]
    }

    fn describe(&self) -> String {
        self.people
            .iter()
            .map(|(a, b)| format!("{}={}", a, b))
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

/// Raw binary payload (MCDI)
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryFrame {
    pub id: String,
    pub data: Vec<u8>,
}

impl BinaryFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(BinaryFrame {
            id: id.to_string(),
            data: fields.binary()?,
        })
    }
}

impl FrameBody for BinaryFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![FieldValue::Binary(self.data.clone())]
    }

    fn describe(&self) -> String {
        format!("[{} bytes]", self.data.len())
    }
}

/// Event timing codes (ETCO)
#[derive(Debug, Clone, PartialEq)]
pub struct EventTimingFrame {
    pub id: String,
    pub format: u8,
    pub events: Vec<(u8, u32)>,
}

impl EventTimingFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        let format = fields.int()?;
        let events = match fields.next("events")? {
            FieldValue::KeyEvents(events) => events,
            other => return Err(Fields::mismatch("key events", other)),
        };
        Ok(EventTimingFrame {
            id: id.to_string(),
            format,
            events,
        })
    }
}

impl FrameBody for EventTimingFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Int(u64::from(self.format)),
            FieldValue::KeyEvents(self.events.clone()),
        ]
    }

    fn describe(&self) -> String {
        self.events
            .iter()
            .map(|(kind, time)| format!("{}@{}", kind, time))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// MPEG location lookup table (MLLT)
#[derive(Debug, Clone, PartialEq)]
pub struct MpegLookupFrame {
    pub id: String,
    pub frames: u16,
    pub bytes: u32,
    pub milliseconds: u32,
    pub bits_for_bytes: u8,
    pub bits_for_milliseconds: u8,
    pub data: Vec<u8>,
}

impl MpegLookupFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(MpegLookupFrame {
            id: id.to_string(),
            frames: fields.int()?,
            bytes: fields.int()?,
            milliseconds: fields.int()?,
            bits_for_bytes: fields.int()?,
            bits_for_milliseconds: fields.int()?,
            data: fields.binary()?,
        })
    }
}

impl FrameBody for MpegLookupFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Int(u64::from(self.frames)),
            FieldValue::Int(u64::from(self.bytes)),
            FieldValue::Int(u64::from(self.milliseconds)),
            FieldValue::Int(u64::from(self.bits_for_bytes)),
            FieldValue::Int(u64::from(self.bits_for_milliseconds)),
            FieldValue::Binary(self.data.clone()),
        ]
    }

    fn describe(&self) -> String {
        format!("[{} bytes]", self.data.len())
    }
}

/// Synchronised tempo codes (SYTC)
#[derive(Debug, Clone, PartialEq)]
pub struct SyncTempoFrame {
    pub id: String,
    pub format: u8,
    pub data: Vec<u8>,
}

impl SyncTempoFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(SyncTempoFrame {
            id: id.to_string(),
            format: fields.int()?,
            data: fields.binary()?,
        })
    }
}

impl FrameBody for SyncTempoFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Int(u64::from(self.format)),
            FieldValue::Binary(self.data.clone()),
        ]
    }

    fn describe(&self) -> String {
        format!("[{} bytes]", self.data.len())
    }
}

/// Unsynchronised lyrics (USLT)
#[derive(Debug, Clone, PartialEq)]
pub struct LyricsFrame {
    pub id: String,
    pub encoding: Encoding,
    pub lang: String,
    pub desc: String,
    pub text: String,
}

impl LyricsFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(LyricsFrame {
            id: id.to_string(),
            encoding: fields.encoding()?,
            lang: fields.text()?,
            desc: fields.text()?,
            text: fields.text()?,
        })
    }
}

impl FrameBody for LyricsFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Encoding(self.encoding),
            FieldValue::Text(self.lang.clone()),
            FieldValue::Text(self.desc.clone()),
            FieldValue::Text(self.text.clone()),
        ]
    }

    fn key_suffix(&self) -> Option<String> {
        Some(format!("{}:{}", self.desc, self.lang))
    }

    fn describe(&self) -> String {
        self.text.clone()
    }
}

/// Synchronised lyrics (SYLT)
#[derive(Debug, Clone, PartialEq)]
pub struct SyncLyricsFrame {
    pub id: String,
    pub encoding: Encoding,
    pub lang: String,
    pub format: u8,
    pub content_type: u8,
    pub desc: String,
    pub text: Vec<(String, u32)>,
}

impl SyncLyricsFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        let encoding = fields.encoding()?;
        let lang = fields.text()?;
        let format = fields.int()?;
        let content_type = fields.int()?;
        let desc = fields.text()?;
        let text = match fields.next("text")? {
            FieldValue::SyncedText(text) => text,
            other => return Err(Fields::mismatch("synchronized text", other)),
        };
        Ok(SyncLyricsFrame {
            id: id.to_string(),
            encoding,
            lang,
            format,
            content_type,
            desc,
            text,
        })
    }
}

impl FrameBody for SyncLyricsFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Encoding(self.encoding),
            FieldValue::Text(self.lang.clone()),
            FieldValue::Int(u64::from(self.format)),
            FieldValue::Int(u64::from(self.content_type)),
            FieldValue::Text(self.desc.clone()),
            FieldValue::SyncedText(self.text.clone()),
        ]
    }

    fn key_suffix(&self) -> Option<String> {
        Some(format!("{}:{}", self.desc, self.lang))
    }

    fn describe(&self) -> String {
        self.text.iter().map(|(t, _)| t.as_str()).collect()
    }
}

/// Comment frame (COMM)
#[derive(Debug, Clone, PartialEq)]
pub struct CommentFrame {
    pub id: String,
    pub encoding: Encoding,
    pub lang: String,
    pub desc: String,
    pub text: Vec<String>,
}

impl CommentFrame {
    pub fn new(lang: &str, desc: &str, text: Vec<String>) -> Self {
        CommentFrame {
            id: "COMM".to_string(),
            encoding: Encoding::Utf8,
            lang: lang.to_string(),
            desc: desc.to_string(),
            text,
        }
    }

    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(CommentFrame {
            id: id.to_string(),
            encoding: fields.encoding()?,
            lang: fields.text()?,
            desc: fields.text()?,
            text: fields.texts()?,
        })
    }
}

impl FrameBody for CommentFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Encoding(self.encoding),
            FieldValue::Text(self.lang.clone()),
            FieldValue::Text(self.desc.clone()),
            text_list(&self.text),
        ]
    }

    fn key_suffix(&self) -> Option<String> {
        Some(format!("{}:{}", self.desc, self.lang))
    }

    fn describe(&self) -> String {
        format!("{}={}={}", self.desc, self.lang, self.text.join(" / "))
    }
}

/// Relative volume adjustment (RVA2), first channel only.
#[derive(Debug, Clone, PartialEq)]
pub struct RelativeVolumeFrame {
    pub id: String,
    pub desc: String,
    pub channel: u8,
    /// dB
    pub gain: f64,
    pub peak: f64,
}

impl RelativeVolumeFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(RelativeVolumeFrame {
            id: id.to_string(),
            desc: fields.text()?,
            channel: fields.int()?,
            gain: fields.float()?,
            peak: fields.float()?,
        })
    }

    pub fn channel_name(&self) -> &'static str {
        specs::CHANNELS
            .get(usize::from(self.channel))
            .copied()
            .unwrap_or("Unknown")
    }
}

impl FrameBody for RelativeVolumeFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Text(self.desc.clone()),
            FieldValue::Int(u64::from(self.channel)),
            FieldValue::Float(self.gain),
            FieldValue::Float(self.peak),
        ]
    }

    fn key_suffix(&self) -> Option<String> {
        Some(self.desc.clone())
    }

    fn describe(&self) -> String {
        format!("{}: {:+.4} dB/{:.4}", self.channel_name(), self.gain, self.peak)
    }
}

/// Equalisation (EQU2)
#[derive(Debug, Clone, PartialEq)]
pub struct EqualisationFrame {
    pub id: String,
    pub method: u8,
    pub desc: String,
    /// (frequency in Hz, adjustment in dB)
    pub adjustments: Vec<(f64, f64)>,
}

impl EqualisationFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        let method = fields.int()?;
        let desc = fields.text()?;
        let adjustments = match fields.next("adjustments")? {
            FieldValue::Adjustments(values) => values,
            other => return Err(Fields::mismatch("adjustments", other)),
        };
        Ok(EqualisationFrame {
            id: id.to_string(),
            method,
            desc,
            adjustments,
        })
    }
}

impl FrameBody for EqualisationFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Int(u64::from(self.method)),
            FieldValue::Text(self.desc.clone()),
            FieldValue::Adjustments(self.adjustments.clone()),
        ]
    }

    fn key_suffix(&self) -> Option<String> {
        Some(self.desc.clone())
    }

    fn describe(&self) -> String {
        format!("{} ({} points)", self.desc, self.adjustments.len())
    }
}

/// Reverb (RVRB)
#[derive(Debug, Clone, PartialEq)]
pub struct ReverbFrame {
    pub id: String,
    pub left: u16,
    pub right: u16,
    pub bounce_left: u8,
    pub bounce_right: u8,
    pub feedback_ltl: u8,
    pub feedback_ltr: u8,
    pub feedback_rtr: u8,
    pub feedback_rtl: u8,
    pub premix_ltr: u8,
    pub premix_rtl: u8,
}

impl ReverbFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(ReverbFrame {
            id: id.to_string(),
            left: fields.int()?,
            right: fields.int()?,
            bounce_left: fields.int()?,
            bounce_right: fields.int()?,
            feedback_ltl: fields.int()?,
            feedback_ltr: fields.int()?,
            feedback_rtr: fields.int()?,
            feedback_rtl: fields.int()?,
            premix_ltr: fields.int()?,
            premix_rtl: fields.int()?,
        })
    }
}

impl FrameBody for ReverbFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        [
            u64::from(self.left),
            u64::from(self.right),
            u64::from(self.bounce_left),
            u64::from(self.bounce_right),
            u64::from(self.feedback_ltl),
            u64::from(self.feedback_ltr),
            u64::from(self.feedback_rtr),
            u64::from(self.feedback_rtl),
            u64::from(self.premix_ltr),
            u64::from(self.premix_rtl),
        ]
        .into_iter()
        .map(FieldValue::Int)
        .collect()
    }

    fn describe(&self) -> String {
        format!("{}/{}", self.left, self.right)
    }
}

/// Attached picture (APIC, PIC in v2.2)
#[derive(Debug, Clone, PartialEq)]
pub struct PictureFrame {
    pub id: String,
    pub encoding: Encoding,
    pub mime: String,
    pub pic_type: u8,
    pub desc: String,
    pub data: Vec<u8>,
}

impl PictureFrame {
    pub fn new(mime: &str, pic_type: PictureType, desc: &str, data: Vec<u8>) -> Self {
        PictureFrame {
            id: "APIC".to_string(),
            encoding: Encoding::Utf8,
            mime: mime.to_string(),
            pic_type: pic_type as u8,
            desc: desc.to_string(),
            data,
        }
    }

    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(PictureFrame {
            id: id.to_string(),
            encoding: fields.encoding()?,
            mime: fields.text()?,
            pic_type: fields.int()?,
            desc: fields.text()?,
            data: fields.binary()?,
        })
    }

    pub fn picture_type(&self) -> Option<PictureType> {
        PictureType::from_byte(self.pic_type)
    }
}

impl FrameBody for PictureFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Encoding(self.encoding),
            FieldValue::Text(self.mime.clone()),
            FieldValue::Int(u64::from(self.pic_type)),
            FieldValue::Text(self.desc.clone()),
            FieldValue::Binary(self.data.clone()),
        ]
    }

    fn key_suffix(&self) -> Option<String> {
        Some(self.desc.clone())
    }

    fn describe(&self) -> String {
        format!("{} ({}, {} bytes)", self.desc, self.mime, self.data.len())
    }
}

/// Play counter (PCNT)
#[derive(Debug, Clone, PartialEq)]
pub struct PlayCounterFrame {
    pub id: String,
    pub count: u64,
}

impl PlayCounterFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(PlayCounterFrame {
            id: id.to_string(),
            count: fields.int()?,
        })
    }
}

impl FrameBody for PlayCounterFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![FieldValue::Int(self.count)]
    }

    fn describe(&self) -> String {
        self.count.to_string()
    }
}

/// Popularimeter (POPM)
#[derive(Debug, Clone, PartialEq)]
pub struct PopularimeterFrame {
    pub id: String,
    pub email: String,
    pub rating: u8,
    pub count: Option<u64>,
}

impl PopularimeterFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(PopularimeterFrame {
            id: id.to_string(),
            email: fields.text()?,
            rating: fields.int()?,
            count: fields.optional_int()?,
        })
    }
}

impl FrameBody for PopularimeterFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        let mut values = vec![
            FieldValue::Text(self.email.clone()),
            FieldValue::Int(u64::from(self.rating)),
        ];
        values.extend(self.count.map(FieldValue::Int));
        values
    }

    fn key_suffix(&self) -> Option<String> {
        Some(self.email.clone())
    }

    fn describe(&self) -> String {
        match self.count {
            Some(count) => format!("{}={} {}/255", self.email, count, self.rating),
            None => format!("{}={}/255", self.email, self.rating),
        }
    }
}

/// General encapsulated object (GEOB)
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralObjectFrame {
    pub id: String,
    pub encoding: Encoding,
    pub mime: String,
    pub filename: String,
    pub desc: String,
    pub data: Vec<u8>,
}

impl GeneralObjectFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(GeneralObjectFrame {
            id: id.to_string(),
            encoding: fields.encoding()?,
            mime: fields.text()?,
            filename: fields.text()?,
            desc: fields.text()?,
            data: fields.binary()?,
        })
    }
}

impl FrameBody for GeneralObjectFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Encoding(self.encoding),
            FieldValue::Text(self.mime.clone()),
            FieldValue::Text(self.filename.clone()),
            FieldValue::Text(self.desc.clone()),
            FieldValue::Binary(self.data.clone()),
        ]
    }

    fn key_suffix(&self) -> Option<String> {
        Some(self.desc.clone())
    }

    fn describe(&self) -> String {
        format!("{} ({}, {} bytes)", self.filename, self.mime, self.data.len())
    }
}

/// Recommended buffer size (RBUF)
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendedBufferFrame {
    pub id: String,
    pub size: u32,
    pub info: Option<u8>,
    pub offset: Option<u32>,
}

impl RecommendedBufferFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(RecommendedBufferFrame {
            id: id.to_string(),
            size: fields.int()?,
            info: fields.optional_int()?,
            offset: fields.optional_int()?,
        })
    }
}

impl FrameBody for RecommendedBufferFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        let mut values = vec![FieldValue::Int(u64::from(self.size))];
        if let Some(info) = self.info {
            values.push(FieldValue::Int(u64::from(info)));
            values.extend(self.offset.map(|o| FieldValue::Int(u64::from(o))));
        }
        values
    }

    fn describe(&self) -> String {
        self.size.to_string()
    }
}

/// Audio encryption (AENC)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioEncryptionFrame {
    pub id: String,
    pub owner: String,
    pub preview_start: u16,
    pub preview_length: u16,
    pub data: Option<Vec<u8>>,
}

impl AudioEncryptionFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(AudioEncryptionFrame {
            id: id.to_string(),
            owner: fields.text()?,
            preview_start: fields.int()?,
            preview_length: fields.int()?,
            data: fields.optional_binary()?,
        })
    }
}

impl FrameBody for AudioEncryptionFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        let mut values = vec![
            FieldValue::Text(self.owner.clone()),
            FieldValue::Int(u64::from(self.preview_start)),
            FieldValue::Int(u64::from(self.preview_length)),
        ];
        values.extend(self.data.clone().map(FieldValue::Binary));
        values
    }

    fn key_suffix(&self) -> Option<String> {
        Some(self.owner.clone())
    }

    fn describe(&self) -> String {
        format!("{} ({}+{})", self.owner, self.preview_start, self.preview_length)
    }
}

/// Linked information (LINK, LNK in v2.2)
#[derive(Debug, Clone, PartialEq)]
pub struct LinkFrame {
    pub id: String,
    pub frameid: String,
    pub url: String,
    pub data: Option<Vec<u8>>,
}

impl LinkFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(LinkFrame {
            id: id.to_string(),
            frameid: fields.text()?,
            url: fields.text()?,
            data: fields.optional_binary()?,
        })
    }
}

impl FrameBody for LinkFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        let mut values = vec![
            FieldValue::Text(self.frameid.clone()),
            FieldValue::Text(self.url.clone()),
        ];
        values.extend(self.data.clone().map(FieldValue::Binary));
        values
    }

    fn key_suffix(&self) -> Option<String> {
        Some(match &self.data {
            Some(data) => format!("{}:{}:{}", self.frameid, self.url, escaped(data)),
            None => format!("{}:{}", self.frameid, self.url),
        })
    }

    fn describe(&self) -> String {
        format!("{}={}", self.frameid, self.url)
    }
}

/// Position synchronisation (POSS)
#[derive(Debug, Clone, PartialEq)]
pub struct PositionFrame {
    pub id: String,
    pub format: u8,
    pub position: u64,
}

impl PositionFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(PositionFrame {
            id: id.to_string(),
            format: fields.int()?,
            position: fields.int()?,
        })
    }
}

impl FrameBody for PositionFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Int(u64::from(self.format)),
            FieldValue::Int(self.position),
        ]
    }

    fn describe(&self) -> String {
        self.position.to_string()
    }
}

/// Unique file identifier (UFID)
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueFileIdFrame {
    pub id: String,
    pub owner: String,
    pub data: Vec<u8>,
}

impl UniqueFileIdFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(UniqueFileIdFrame {
            id: id.to_string(),
            owner: fields.text()?,
            data: fields.binary()?,
        })
    }
}

impl FrameBody for UniqueFileIdFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Text(self.owner.clone()),
            FieldValue::Binary(self.data.clone()),
        ]
    }

    fn key_suffix(&self) -> Option<String> {
        Some(self.owner.clone())
    }

    fn describe(&self) -> String {
        if self.data.is_ascii() {
            format!("{}={}", self.owner, String::from_utf8_lossy(&self.data))
        } else {
            format!("{} ({} bytes)", self.owner, self.data.len())
        }
    }
}

/// Terms of use (USER)
#[derive(Debug, Clone, PartialEq)]
pub struct TermsOfUseFrame {
    pub id: String,
    pub encoding: Encoding,
    pub lang: String,
    pub text: String,
}

impl TermsOfUseFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(TermsOfUseFrame {
            id: id.to_string(),
            encoding: fields.encoding()?,
            lang: fields.text()?,
            text: fields.text()?,
        })
    }
}

impl FrameBody for TermsOfUseFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Encoding(self.encoding),
            FieldValue::Text(self.lang.clone()),
            FieldValue::Text(self.text.clone()),
        ]
    }

    fn key_suffix(&self) -> Option<String> {
        Some(self.lang.clone())
    }

    fn describe(&self) -> String {
        format!("{}={}", self.lang, self.text)
    }
}

/// Ownership (OWNE)
#[derive(Debug, Clone, PartialEq)]
pub struct OwnershipFrame {
    pub id: String,
    pub encoding: Encoding,
    pub price: String,
    /// YYYYMMDD
    pub date: String,
    pub seller: String,
}

impl OwnershipFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(OwnershipFrame {
            id: id.to_string(),
            encoding: fields.encoding()?,
            price: fields.text()?,
            date: fields.text()?,
            seller: fields.text()?,
        })
    }
}

impl FrameBody for OwnershipFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Encoding(self.encoding),
            FieldValue::Text(self.price.clone()),
            FieldValue::Text(self.date.clone()),
            FieldValue::Text(self.seller.clone()),
        ]
    }

    fn describe(&self) -> String {
        self.seller.clone()
    }
}

/// Commercial information (COMR)
#[derive(Debug, Clone, PartialEq)]
pub struct CommercialFrame {
    pub id: String,
    pub encoding: Encoding,
    pub price: String,
    pub valid_until: String,
    pub contact: String,
    pub format: u8,
    pub seller: String,
    pub desc: String,
    pub mime: Option<String>,
    pub logo: Option<Vec<u8>>,
}

impl CommercialFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(CommercialFrame {
            id: id.to_string(),
            encoding: fields.encoding()?,
            price: fields.text()?,
            valid_until: fields.text()?,
            contact: fields.text()?,
            format: fields.int()?,
            seller: fields.text()?,
            desc: fields.text()?,
            mime: fields.optional_text()?,
            logo: fields.optional_binary()?,
        })
    }
}

impl FrameBody for CommercialFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        let mut values = vec![
            FieldValue::Encoding(self.encoding),
            FieldValue::Text(self.price.clone()),
            FieldValue::Text(self.valid_until.clone()),
            FieldValue::Text(self.contact.clone()),
            FieldValue::Int(u64::from(self.format)),
            FieldValue::Text(self.seller.clone()),
            FieldValue::Text(self.desc.clone()),
        ];
        if let Some(mime) = &self.mime {
            values.push(FieldValue::Text(mime.clone()));
            values.extend(self.logo.clone().map(FieldValue::Binary));
        }
        values
    }

    /// The whole body identifies the offer.
    fn key_suffix(&self) -> Option<String> {
        let all: Vec<FieldSpec> = COMR.iter().chain(COMR_OPTIONAL).copied().collect();
        let body = specs::write_fields(&all, &self.to_values()).unwrap_or_default();
        Some(escaped(&body))
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.desc, self.price)
    }
}

/// Encryption method registration (ENCR)
#[derive(Debug, Clone, PartialEq)]
pub struct EncryptionMethodFrame {
    pub id: String,
    pub owner: String,
    pub method: u8,
    pub data: Vec<u8>,
}

impl EncryptionMethodFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(EncryptionMethodFrame {
            id: id.to_string(),
            owner: fields.text()?,
            method: fields.int()?,
            data: fields.binary()?,
        })
    }
}

impl FrameBody for EncryptionMethodFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Text(self.owner.clone()),
            FieldValue::Int(u64::from(self.method)),
            FieldValue::Binary(self.data.clone()),
        ]
    }

    fn key_suffix(&self) -> Option<String> {
        Some(self.owner.clone())
    }

    fn describe(&self) -> String {
        format!("{}={}", self.owner, self.method)
    }
}

/// Group identification registration (GRID)
#[derive(Debug, Clone, PartialEq)]
pub struct GroupIdFrame {
    pub id: String,
    pub owner: String,
    pub group: u8,
    pub data: Option<Vec<u8>>,
}

impl GroupIdFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(GroupIdFrame {
            id: id.to_string(),
            owner: fields.text()?,
            group: fields.int()?,
            data: fields.optional_binary()?,
        })
    }
}

impl FrameBody for GroupIdFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        let mut values = vec![
            FieldValue::Text(self.owner.clone()),
            FieldValue::Int(u64::from(self.group)),
        ];
        values.extend(self.data.clone().map(FieldValue::Binary));
        values
    }

    fn key_suffix(&self) -> Option<String> {
        Some(self.group.to_string())
    }

    fn describe(&self) -> String {
        format!("{}={}", self.owner, self.group)
    }
}

/// Private frame (PRIV)
#[derive(Debug, Clone, PartialEq)]
pub struct PrivateFrame {
    pub id: String,
    pub owner: String,
    pub data: Vec<u8>,
}

impl PrivateFrame {
    pub fn new(owner: &str, data: Vec<u8>) -> Self {
        PrivateFrame {
            id: "PRIV".to_string(),
            owner: owner.to_string(),
            data,
        }
    }

    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(PrivateFrame {
            id: id.to_string(),
            owner: fields.text()?,
            data: fields.binary()?,
        })
    }
}

impl FrameBody for PrivateFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Text(self.owner.clone()),
            FieldValue::Binary(self.data.clone()),
        ]
    }

    fn key_suffix(&self) -> Option<String> {
        Some(format!("{}:{}", self.owner, escaped(&self.data)))
    }

    fn describe(&self) -> String {
        if self.data.is_ascii() {
            format!("{}:{}", self.owner, String::from_utf8_lossy(&self.data))
        } else {
            format!("{} ({} bytes)", self.owner, self.data.len())
        }
    }
}

/// Signature (SIGN)
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureFrame {
    pub id: String,
    pub group: u8,
    pub sig: Vec<u8>,
}

impl SignatureFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(SignatureFrame {
            id: id.to_string(),
            group: fields.int()?,
            sig: fields.binary()?,
        })
    }
}

impl FrameBody for SignatureFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Int(u64::from(self.group)),
            FieldValue::Binary(self.sig.clone()),
        ]
    }

    fn key_suffix(&self) -> Option<String> {
        Some(format!("{}:{}", self.group, escaped(&self.sig)))
    }

    fn describe(&self) -> String {
        format!("{} ({} bytes)", self.group, self.sig.len())
    }
}

/// Seek frame (SEEK)
#[derive(Debug, Clone, PartialEq)]
pub struct SeekFrame {
    pub id: String,
    pub offset: u64,
}

impl SeekFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(SeekFrame {
            id: id.to_string(),
            offset: fields.int()?,
        })
    }
}

impl FrameBody for SeekFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![FieldValue::Int(self.offset)]
    }

    fn describe(&self) -> String {
        self.offset.to_string()
    }
}

/// Audio seek point index (ASPI)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSeekIndexFrame {
    pub id: String,
    /// Indexed data start (S)
    pub start: u32,
    /// Indexed data length (L)
    pub length: u32,
    /// Number of index points (N)
    pub count: u16,
    /// Bits per index point (b)
    pub bits: u8,
    pub indexes: Vec<u16>,
}

impl AudioSeekIndexFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        let start = fields.int()?;
        let length = fields.int()?;
        let count = fields.int()?;
        let bits = fields.int()?;
        let indexes = match fields.next("indexes")? {
            FieldValue::Indexes(indexes) => indexes,
            other => return Err(Fields::mismatch("index points", other)),
        };
        Ok(AudioSeekIndexFrame {
            id: id.to_string(),
            start,
            length,
            count,
            bits,
            indexes,
        })
    }
}

impl FrameBody for AudioSeekIndexFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Int(u64::from(self.start)),
            FieldValue::Int(u64::from(self.length)),
            FieldValue::Int(u64::from(self.count)),
            FieldValue::Int(u64::from(self.bits)),
            FieldValue::Indexes(self.indexes.clone()),
        ]
    }

    fn describe(&self) -> String {
        format!("{} points", self.indexes.len())
    }
}

/// Encrypted meta frame (CRM, v2.2 only)
#[derive(Debug, Clone, PartialEq)]
pub struct EncryptedMetaFrame {
    pub id: String,
    pub owner: String,
    pub desc: String,
    pub data: Vec<u8>,
}

impl EncryptedMetaFrame {
    fn from_fields(id: &str, fields: &mut Fields) -> Result<Self> {
        Ok(EncryptedMetaFrame {
            id: id.to_string(),
            owner: fields.text()?,
            desc: fields.text()?,
            data: fields.binary()?,
        })
    }
}

impl FrameBody for EncryptedMetaFrame {
    id_accessors!();

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Text(self.owner.clone()),
            FieldValue::Text(self.desc.clone()),
            FieldValue::Binary(self.data.clone()),
        ]
    }

    fn describe(&self) -> String {
        format!("{}={} ({} bytes)", self.owner, self.desc, self.data.len())
    }
}

// ---- Registry ----

/// A frame type: its id, field layout and, for v2.2 types, the v2.3/v2.4
/// type it becomes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameKind {
    pub id: &'static str,
    pub shape: Shape,
    pub specs: &'static [FieldSpec],
    pub optional: &'static [FieldSpec],
    pub upgrade: Option<&'static str>,
}

impl FrameKind {
    pub const fn new(id: &'static str, shape: Shape) -> Self {
        let (specs, optional) = shape.specs();
        FrameKind {
            id,
            shape,
            specs,
            optional,
            upgrade: None,
        }
    }

    pub const fn upgrades_to(mut self, id: &'static str) -> Self {
        self.upgrade = Some(id);
        self
    }

    /// Read with a layout other than the shape's canonical one.
    pub const fn reading(mut self, specs: &'static [FieldSpec]) -> Self {
        self.specs = specs;
        self
    }

    /// Look up a built-in frame type, v2.3/v2.4 ids first.
    pub fn builtin(id: &str) -> Option<&'static FrameKind> {
        FrameRegistry::builtin(Version::V24)
            .get(id)
            .or_else(|| FrameRegistry::builtin(Version::V22).get(id))
    }

    /// Build a frame of this type from values in field order, validating
    /// each one.
    pub fn build(&self, values: Vec<FieldValue>) -> Result<Frame> {
        let required = self.specs.len();
        if values.len() < required || values.len() > required + self.optional.len() {
            return Err(MutagenError::ValueError(format!(
                "{} takes {} to {} values, got {}",
                self.id,
                required,
                required + self.optional.len(),
                values.len()
            )));
        }
        let values = self
            .specs
            .iter()
            .chain(self.optional)
            .zip(values)
            .map(|(spec, value)| spec.kind.validate(value))
            .collect::<Result<Vec<_>>>()?;
        self.shape.build(self.id, &mut Fields::new(values))
    }
}

const fn kind(id: &'static str, shape: Shape) -> FrameKind {
    FrameKind::new(id, shape)
}

static FRAMES: &[FrameKind] = &[
    kind("TALB", Shape::Text),
    kind("TBPM", Shape::Text),
    kind("TCOM", Shape::Text),
    kind("TCON", Shape::Text),
    kind("TCOP", Shape::Text),
    kind("TCMP", Shape::Text),
    kind("TDAT", Shape::Text),
    kind("TDEN", Shape::TimeStampText),
    kind("TDES", Shape::Text),
    kind("TDOR", Shape::TimeStampText),
    kind("TDLY", Shape::Text),
    kind("TDRC", Shape::TimeStampText),
    kind("TDRL", Shape::TimeStampText),
    kind("TDTG", Shape::TimeStampText),
    kind("TENC", Shape::Text),
    kind("TEXT", Shape::Text),
    kind("TFLT", Shape::Text),
    kind("TGID", Shape::Text),
    kind("TIME", Shape::Text),
    kind("TIT1", Shape::Text),
    kind("TIT2", Shape::Text),
    kind("TIT3", Shape::Text),
    kind("TKEY", Shape::Text),
    kind("TLAN", Shape::Text),
    kind("TLEN", Shape::Text),
    kind("TMED", Shape::Text),
    kind("TMOO", Shape::Text),
    kind("TOAL", Shape::Text),
    kind("TOFN", Shape::Text),
    kind("TOLY", Shape::Text),
    kind("TOPE", Shape::Text),
    kind("TORY", Shape::Text),
    kind("TOWN", Shape::Text),
    kind("TPE1", Shape::Text),
    kind("TPE2", Shape::Text),
    kind("TPE3", Shape::Text),
    kind("TPE4", Shape::Text),
    kind("TPOS", Shape::Text),
    kind("TPRO", Shape::Text),
    kind("TPUB", Shape::Text),
    kind("TRCK", Shape::Text),
    kind("TRDA", Shape::Text),
    kind("TRSN", Shape::Text),
    kind("TRSO", Shape::Text),
    kind("TSIZ", Shape::Text),
    kind("TSO2", Shape::Text),
    kind("TSOA", Shape::Text),
    kind("TSOC", Shape::Text),
    kind("TSOP", Shape::Text),
    kind("TSOT", Shape::Text),
    kind("TSRC", Shape::Text),
    kind("TSSE", Shape::Text),
    kind("TSST", Shape::Text),
    kind("TYER", Shape::Text),
    kind("TXXX", Shape::UserText),
    kind("WCOM", Shape::Url),
    kind("WCOP", Shape::Url),
    kind("WFED", Shape::Url),
    kind("WOAF", Shape::Url),
    kind("WOAR", Shape::Url),
    kind("WOAS", Shape::Url),
    kind("WORS", Shape::Url),
    kind("WPAY", Shape::Url),
    kind("WPUB", Shape::Url),
    kind("WXXX", Shape::UserUrl),
    kind("TIPL", Shape::PairedText),
    kind("TMCL", Shape::PairedText),
    kind("IPLS", Shape::PairedText),
    kind("MCDI", Shape::Binary),
    kind("ETCO", Shape::EventTiming),
    kind("MLLT", Shape::MpegLookup),
    kind("SYTC", Shape::SyncTempo),
    kind("USLT", Shape::Lyrics),
    kind("SYLT", Shape::SyncLyrics),
    kind("COMM", Shape::Comment),
    kind("RVA2", Shape::RelativeVolume),
    kind("EQU2", Shape::Equalisation),
    kind("RVRB", Shape::Reverb),
    kind("APIC", Shape::Picture),
    kind("PCNT", Shape::PlayCounter),
    kind("POPM", Shape::Popularimeter),
    kind("GEOB", Shape::GeneralObject),
    kind("RBUF", Shape::RecommendedBuffer),
    kind("AENC", Shape::AudioEncryption),
    kind("LINK", Shape::Link),
    kind("POSS", Shape::Position),
    kind("UFID", Shape::UniqueFileId),
    kind("USER", Shape::TermsOfUse),
    kind("OWNE", Shape::Ownership),
    kind("COMR", Shape::Commercial),
    kind("ENCR", Shape::EncryptionMethod),
    kind("GRID", Shape::GroupId),
    kind("PRIV", Shape::Private),
    kind("SIGN", Shape::Signature),
    kind("SEEK", Shape::Seek),
    kind("ASPI", Shape::AudioSeekIndex),
];

static FRAMES_2_2: &[FrameKind] = &[
    kind("UFI", Shape::UniqueFileId).upgrades_to("UFID"),
    kind("TT1", Shape::Text).upgrades_to("TIT1"),
    kind("TT2", Shape::Text).upgrades_to("TIT2"),
    kind("TT3", Shape::Text).upgrades_to("TIT3"),
    kind("TP1", Shape::Text).upgrades_to("TPE1"),
    kind("TP2", Shape::Text).upgrades_to("TPE2"),
    kind("TP3", Shape::Text).upgrades_to("TPE3"),
    kind("TP4", Shape::Text).upgrades_to("TPE4"),
    kind("TCM", Shape::Text).upgrades_to("TCOM"),
    kind("TXT", Shape::Text).upgrades_to("TEXT"),
    kind("TLA", Shape::Text).upgrades_to("TLAN"),
    kind("TCO", Shape::Text).upgrades_to("TCON"),
    kind("TAL", Shape::Text).upgrades_to("TALB"),
    kind("TPA", Shape::Text).upgrades_to("TPOS"),
    kind("TRK", Shape::Text).upgrades_to("TRCK"),
    kind("TRC", Shape::Text).upgrades_to("TSRC"),
    kind("TYE", Shape::Text).upgrades_to("TYER"),
    kind("TDA", Shape::Text).upgrades_to("TDAT"),
    kind("TIM", Shape::Text).upgrades_to("TIME"),
    kind("TRD", Shape::Text).upgrades_to("TRDA"),
    kind("TMT", Shape::Text).upgrades_to("TMED"),
    kind("TFT", Shape::Text).upgrades_to("TFLT"),
    kind("TBP", Shape::Text).upgrades_to("TBPM"),
    kind("TCP", Shape::Text).upgrades_to("TCMP"),
    kind("TCR", Shape::Text).upgrades_to("TCOP"),
    kind("TPB", Shape::Text).upgrades_to("TPUB"),
    kind("TEN", Shape::Text).upgrades_to("TENC"),
    kind("TSS", Shape::Text).upgrades_to("TSSE"),
    kind("TOF", Shape::Text).upgrades_to("TOFN"),
    kind("TLE", Shape::Text).upgrades_to("TLEN"),
    kind("TSI", Shape::Text).upgrades_to("TSIZ"),
    kind("TDY", Shape::Text).upgrades_to("TDLY"),
    kind("TKE", Shape::Text).upgrades_to("TKEY"),
    kind("TOT", Shape::Text).upgrades_to("TOAL"),
    kind("TOA", Shape::Text).upgrades_to("TOPE"),
    kind("TOL", Shape::Text).upgrades_to("TOLY"),
    kind("TOR", Shape::Text).upgrades_to("TORY"),
    kind("TXX", Shape::UserText).upgrades_to("TXXX"),
    kind("WAF", Shape::Url).upgrades_to("WOAF"),
    kind("WAR", Shape::Url).upgrades_to("WOAR"),
    kind("WAS", Shape::Url).upgrades_to("WOAS"),
    kind("WCM", Shape::Url).upgrades_to("WCOM"),
    kind("WCP", Shape::Url).upgrades_to("WCOP"),
    kind("WPB", Shape::Url).upgrades_to("WPUB"),
    kind("WXX", Shape::UserUrl).upgrades_to("WXXX"),
    kind("IPL", Shape::PairedText).upgrades_to("IPLS"),
    kind("MCI", Shape::Binary).upgrades_to("MCDI"),
    kind("ETC", Shape::EventTiming).upgrades_to("ETCO"),
    kind("MLL", Shape::MpegLookup).upgrades_to("MLLT"),
    kind("STC", Shape::SyncTempo).upgrades_to("SYTC"),
    kind("ULT", Shape::Lyrics).upgrades_to("USLT"),
    kind("SLT", Shape::SyncLyrics).upgrades_to("SYLT"),
    kind("COM", Shape::Comment).upgrades_to("COMM"),
    kind("REV", Shape::Reverb).upgrades_to("RVRB"),
    kind("PIC", Shape::Picture).reading(PIC).upgrades_to("APIC"),
    kind("GEO", Shape::GeneralObject).upgrades_to("GEOB"),
    kind("CNT", Shape::PlayCounter).upgrades_to("PCNT"),
    kind("POP", Shape::Popularimeter).upgrades_to("POPM"),
    kind("BUF", Shape::RecommendedBuffer).upgrades_to("RBUF"),
    kind("CRM", Shape::EncryptedMeta),
    kind("CRA", Shape::AudioEncryption).upgrades_to("AENC"),
    kind("LNK", Shape::Link).reading(LNK).upgrades_to("LINK"),
];

/// The set of frame types a tag is decoded with.
///
/// Frames whose id is not in the registry are kept as opaque blobs.
#[derive(Debug, Clone, Default)]
pub struct FrameRegistry {
    kinds: HashMap<&'static str, FrameKind>,
}

impl FrameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in frame types for a tag version: 3-character ids for
    /// v2.2, 4-character ids otherwise.
    pub fn builtin(version: Version) -> &'static FrameRegistry {
        static V22: OnceLock<FrameRegistry> = OnceLock::new();
        static V24: OnceLock<FrameRegistry> = OnceLock::new();

        let (cell, table) = match version {
            Version::V22 => (&V22, FRAMES_2_2),
            Version::V23 | Version::V24 => (&V24, FRAMES),
        };
        cell.get_or_init(|| table.iter().copied().fold(FrameRegistry::new(), FrameRegistry::with))
    }

    pub fn with(mut self, kind: FrameKind) -> Self {
        self.kinds.insert(kind.id, kind);
        self
    }

    pub fn without(mut self, id: &str) -> Self {
        self.kinds.remove(id);
        self
    }

    pub fn get(&self, id: &str) -> Option<&FrameKind> {
        self.kinds.get(id)
    }

    /// Whether `id` (raw header bytes) names a known frame type.
    pub fn contains(&self, id: &[u8]) -> bool {
        std::str::from_utf8(id).is_ok_and(|id| self.kinds.contains_key(id))
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(id: &str, data: &[u8]) -> Result<Frame> {
        let kind = FrameKind::builtin(id).expect("known frame");
        Frame::from_data(kind, data)
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test_log::test]
    fn text_frame() {
        let frame = decode("TPE1", b"\x00Artist A\x00Artist B").unwrap();
        let Frame::Text(text) = &frame else { panic!("expected a text frame") };
        assert_eq!(text.encoding, Encoding::Latin1);
        assert_eq!(text.text, strings(&["Artist A", "Artist B"]));
        assert_eq!(frame.hash_key(), HashKey::new("TPE1"));
        assert_eq!(frame.pprint(), "TPE1=Artist A / Artist B");
        assert_eq!(frame.write_data().unwrap(), b"\x00Artist A\x00Artist B\x00");
    }

    #[test_log::test]
    fn utf16_text_frame() {
        let frame = decode("TIT2", b"\x01\xff\xfeT\x00i\x00\x00\x00").unwrap();
        assert_eq!(frame.text().unwrap(), strings(&["Ti"]));
    }

    #[test_log::test]
    fn numeric_frames() {
        let frame = TextFrame::new("TRCK", strings(&["4/15"]));
        assert_eq!(frame.number(), Some(4));
        assert_eq!(frame.part(), Some((4, Some(15))));
        let frame = TextFrame::new("TLEN", strings(&["12345"]));
        assert_eq!(frame.number(), Some(12345));
        assert_eq!(frame.part(), Some((12345, None)));
        assert_eq!(TextFrame::new("TBPM", vec![]).number(), None);
    }

    #[test_log::test]
    fn genre_frame_pprint() {
        let frame = Frame::from(TextFrame::new("TCON", strings(&["(17)Grunge-ish"])));
        assert_eq!(frame.pprint(), "TCON=Rock / Grunge-ish");
    }

    #[test_log::test]
    fn timestamp_frame() {
        let frame = decode("TDRC", b"\x002004-12-27T12:00\x002005").unwrap();
        let Frame::TimeStampText(stamps) = &frame else { panic!("expected time stamps") };
        assert_eq!(stamps.text.len(), 2);
        assert_eq!(stamps.text[0].text(), "2004-12-27 12:00");
        assert_eq!(frame.pprint(), "TDRC=2004-12-27 12:00 / 2005");
    }

    fn check_key(id: &str, data: &[u8], key: &str) {
        let frame = decode(id, data).unwrap_or_else(|e| panic!("{}: {}", id, e));
        assert_eq!(frame.hash_key().as_str(), key, "hash key of {}", id);
    }

    #[test_log::test]
    fn hash_keys() {
        check_key("TXXX", b"\x00desc\x00value", "TXXX:desc");
        check_key("WXXX", b"\x00desc\x00http://x", "WXXX:desc");
        check_key("WCOM", b"http://buy", "WCOM:http://buy");
        check_key("WOAR", b"http://artist", "WOAR:http://artist");
        check_key("WOAF", b"http://file", "WOAF");
        check_key("COMM", b"\x00engdesc\x00text", "COMM:desc:eng");
        check_key("USLT", b"\x00engdesc\x00words", "USLT:desc:eng");
        check_key("SYLT", b"\x00eng\x01\x01desc\x00la\x00\x00\x00\x00\x01", "SYLT:desc:eng");
        check_key("RVA2", b"track\x00\x01\x02\x00\x10\x40\x00", "RVA2:track");
        check_key("EQU2", b"\x00flat\x00", "EQU2:flat");
        check_key("APIC", b"\x00image/png\x00\x03cover\x00data", "APIC:cover");
        check_key("POPM", b"me@example.com\x00\xff", "POPM:me@example.com");
        check_key("GEOB", b"\x00text/plain\x00a.txt\x00obj\x00xyz", "GEOB:obj");
        check_key("AENC", b"owner\x00\x00\x01\x00\x02", "AENC:owner");
        check_key("LINK", b"TIT2http://x\x00", "LINK:TIT2:http://x");
        check_key("UFID", b"owner\x00id", "UFID:owner");
        check_key("USER", b"\x00engterms", "USER:eng");
        check_key("ENCR", b"owner\x00\x01data", "ENCR:owner");
        check_key("GRID", b"owner\x00\x05", "GRID:5");
        check_key("PRIV", b"owner\x00\x01\x02", "PRIV:owner:\\x01\\x02");
        check_key("SIGN", b"\x07\xffsig", "SIGN:7:\\xffsig");
        check_key("PCNT", b"\x00\x00\x00\x05", "PCNT");
    }

    #[test_log::test]
    fn comr_key_covers_whole_body() {
        let data = b"\x00$1\x0020250101http://buy\x00\x01seller\x00offer\x00";
        let frame = decode("COMR", data).unwrap();
        let Frame::Commercial(comr) = &frame else { panic!("expected COMR") };
        assert_eq!(comr.mime, None);
        assert_eq!(comr.valid_until, "20250101");
        assert_eq!(frame.write_data().unwrap(), data);
        assert_eq!(
            frame.hash_key().as_str(),
            format!("COMR:{}", data.escape_ascii())
        );
    }

    #[test_log::test]
    fn optional_fields() {
        let frame = decode("POPM", b"a@b\x00\x80").unwrap();
        let Frame::Popularimeter(popm) = &frame else { panic!("expected POPM") };
        assert_eq!(popm.rating, 128);
        assert_eq!(popm.count, None);
        assert_eq!(frame.write_data().unwrap(), b"a@b\x00\x80");
        assert_eq!(frame.pprint(), "POPM=a@b=128/255");

        let frame = decode("POPM", b"a@b\x00\x80\x00\x00\x00\x02").unwrap();
        let Frame::Popularimeter(popm) = &frame else { panic!("expected POPM") };
        assert_eq!(popm.count, Some(2));

        let frame = decode("RBUF", b"\x00\x10\x00\x01").unwrap();
        let Frame::RecommendedBuffer(rbuf) = &frame else { panic!("expected RBUF") };
        assert_eq!((rbuf.size, rbuf.info, rbuf.offset), (4096, Some(1), None));
        assert_eq!(frame.write_data().unwrap(), b"\x00\x10\x00\x01");
    }

    #[test_log::test]
    fn missing_required_field_is_junk() {
        assert!(matches!(decode("COMM", b"\x00en"), Err(MutagenError::ID3JunkFrame(_))));
        assert!(matches!(decode("POPM", b"a@b\x00"), Err(MutagenError::ID3JunkFrame(_))));
        // Trailing binary fields may be empty.
        let frame = decode("PRIV", b"owner\x00").unwrap();
        assert_eq!(frame.hash_key().as_str(), "PRIV:owner:");
    }

    #[test_log::test]
    fn relative_volume() {
        let frame = decode("RVA2", b"track\x00\x01\x02\x00\x10\x40\x00").unwrap();
        let Frame::RelativeVolume(rva2) = &frame else { panic!("expected RVA2") };
        assert_eq!(rva2.gain, 1.0);
        assert_eq!(rva2.channel_name(), "Master volume");
        assert_eq!(frame.pprint(), "RVA2=Master volume: +1.0000 dB/0.5000");
        assert_eq!(frame.write_data().unwrap(), b"track\x00\x01\x02\x00\x10\x40\x00");
    }

    #[test_log::test]
    fn aspi_uses_earlier_fields() {
        let data = b"\x00\x00\x00\x00\x00\x00\x10\x00\x00\x02\x10\x00\x01\x00\x02";
        let frame = decode("ASPI", data).unwrap();
        let Frame::AudioSeekIndex(aspi) = &frame else { panic!("expected ASPI") };
        assert_eq!(aspi.indexes, vec![1, 2]);
        assert_eq!(frame.write_data().unwrap(), data);
    }

    #[test_log::test]
    fn upgrade_v22_frames() {
        let frame = decode("TT2", b"\x00Title").unwrap().upgraded();
        assert_eq!(frame.frame_id(), "TIT2");

        let frame = decode("PIC", b"\x00PNG\x03desc\x00imgdata").unwrap();
        let Frame::Picture(pic) = &frame else { panic!("expected a picture") };
        assert_eq!(pic.mime, "PNG");
        assert_eq!(pic.picture_type(), Some(PictureType::CoverFront));
        assert_eq!(frame.upgraded().hash_key().as_str(), "APIC:desc");

        let frame = decode("LNK", b"TT2http://x\x00").unwrap().upgraded();
        let Frame::Link(link) = &frame else { panic!("expected a link") };
        assert_eq!(link.id, "LINK");
        assert_eq!(link.frameid, "TIT2");

        let frame = decode("LNK", b"XYZhttp://x\x00").unwrap().upgraded();
        let Frame::Link(link) = &frame else { panic!("expected a link") };
        assert_eq!(link.frameid, "XYZ ");

        // No v2.3/v2.4 counterpart.
        let frame = decode("CRM", b"owner\x00desc\x00data").unwrap().upgraded();
        assert_eq!(frame.frame_id(), "CRM");
        assert_eq!(frame.hash_key().as_str(), "CRM");
    }

    #[test_log::test]
    fn new_validates_values() {
        let frame = Frame::new(
            "COMM",
            vec![
                FieldValue::Int(3),
                FieldValue::Text("eng".into()),
                FieldValue::Text("".into()),
                FieldValue::Text("a\u{0}b".into()),
            ],
        )
        .unwrap();
        assert_eq!(frame.text().unwrap(), strings(&["a", "b"]));
        assert_eq!(frame.hash_key().as_str(), "COMM::eng");

        let bad_lang = Frame::new(
            "COMM",
            vec![
                FieldValue::Int(3),
                FieldValue::Text("english".into()),
                FieldValue::Text("".into()),
                FieldValue::Text("x".into()),
            ],
        );
        assert!(bad_lang.is_err());
        assert!(Frame::new("TIT2", vec![FieldValue::Int(9), FieldValue::Text("x".into())]).is_err());
        assert!(Frame::new("ZZZZ", vec![]).is_err());
        assert!(Frame::new("TIT2", vec![FieldValue::Int(0)]).is_err());
    }

    #[test_log::test]
    fn validate_rejects_out_of_range_values() {
        let mut frame = decode("RVA2", b"track\x00\x01\x02\x00\x10\x40\x00").unwrap();
        assert!(frame.validate().is_ok());
        if let Frame::RelativeVolume(rva2) = &mut frame {
            rva2.peak = 2.0;
        }
        assert!(frame.validate().is_err());
    }

    #[test_log::test]
    fn downgrade_joins_text() {
        let frame = Frame::from(TextFrame::new("TPE1", strings(&["a", "b"])));
        let down = frame.downgrade_v23(Some("/")).unwrap();
        let Frame::Text(text) = &down else { panic!("expected text") };
        assert_eq!(text.encoding, Encoding::Utf16);
        assert_eq!(text.text, strings(&["a/b"]));

        let down = frame.downgrade_v23(None).unwrap();
        assert_eq!(down.text().unwrap(), strings(&["a", "b"]));

        let paired = decode("TIPL", b"\x03bass\x00Paul\x00").unwrap();
        let down = paired.downgrade_v23(Some("/")).unwrap();
        let Frame::PairedText(people) = &down else { panic!("expected pairs") };
        assert_eq!(people.people, vec![("bass".to_string(), "Paul".to_string())]);
        assert_eq!(people.encoding, Encoding::Utf16);
    }

    #[test_log::test]
    fn registry() {
        let v24 = FrameRegistry::builtin(Version::V24);
        assert!(v24.contains(b"TIT2"));
        assert!(!v24.contains(b"TT2"));
        assert!(!v24.contains(b"\xff\xfe\x00\x00"));
        let v22 = FrameRegistry::builtin(Version::V22);
        assert!(v22.contains(b"TT2"));
        assert_eq!(v22.get("PIC").unwrap().specs[1].kind, SpecKind::FixedString(3));

        let custom = FrameRegistry::new()
            .with(FrameKind::new("XTST", Shape::Text))
            .with(*v24.get("TIT2").unwrap())
            .without("TIT2");
        assert_eq!(custom.len(), 1);
        assert!(custom.contains(b"XTST"));
    }
}
