use std::cmp::Ordering;
use std::fmt;

use byteorder::{BigEndian, ByteOrder};

use crate::common::error::{MutagenError, Result};
use crate::id3::header::{BitPaddedInt, Version, Width};

/// Text encoding types used in ID3v2 frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Encoding {
    Latin1 = 0,
    Utf16 = 1,
    Utf16Be = 2,
    Utf8 = 3,
}

impl Encoding {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(Encoding::Latin1),
            1 => Ok(Encoding::Utf16),
            2 => Ok(Encoding::Utf16Be),
            3 => Ok(Encoding::Utf8),
            _ => Err(MutagenError::ValueError(format!("Invalid Encoding: {}", b))),
        }
    }

    /// Default encoding for a given ID3 version.
    pub fn default_for_version(version: Version) -> Self {
        if version >= Version::V24 {
            Encoding::Utf8
        } else {
            Encoding::Utf16
        }
    }

    /// v2.3 only knows Latin-1 and UTF-16.
    pub fn downgrade_v23(self) -> Self {
        self.min(Encoding::Utf16)
    }

    pub fn terminator(self) -> &'static [u8] {
        match self {
            Encoding::Latin1 | Encoding::Utf8 => b"\x00",
            Encoding::Utf16 | Encoding::Utf16Be => b"\x00\x00",
        }
    }
}

/// Decode text from bytes using the specified encoding.
pub fn decode_text(data: &[u8], encoding: Encoding) -> String {
    match encoding {
        Encoding::Latin1 => data.iter().map(|&b| b as char).collect(),
        Encoding::Utf16 => {
            if data.len() < 2 {
                return String::new();
            }
            let (decoder, start) = if data[0] == 0xFF && data[1] == 0xFE {
                (encoding_rs::UTF_16LE, 2)
            } else if data[0] == 0xFE && data[1] == 0xFF {
                (encoding_rs::UTF_16BE, 2)
            } else {
                // Default to LE if no BOM
                (encoding_rs::UTF_16LE, 0)
            };
            let (result, _) = decoder.decode_without_bom_handling(&data[start..]);
            result.into_owned()
        }
        Encoding::Utf16Be => {
            let (result, _) = encoding_rs::UTF_16BE.decode_without_bom_handling(data);
            result.into_owned()
        }
        Encoding::Utf8 => String::from_utf8_lossy(data).into_owned(),
    }
}

/// Encode text to bytes using the specified encoding.
pub fn encode_text(text: &str, encoding: Encoding) -> Vec<u8> {
    match encoding {
        Encoding::Latin1 => encode_latin1(text),
        Encoding::Utf16 => {
            let mut result = vec![0xFF, 0xFE]; // BOM (LE)
            for c in text.encode_utf16() {
                result.extend_from_slice(&c.to_le_bytes());
            }
            result
        }
        Encoding::Utf16Be => {
            let mut result = Vec::with_capacity(text.len() * 2);
            for c in text.encode_utf16() {
                result.extend_from_slice(&c.to_be_bytes());
            }
            result
        }
        Encoding::Utf8 => text.as_bytes().to_vec(),
    }
}

pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if c as u32 <= 0xFF { c as u8 } else { b'?' })
        .collect()
}

/// Position of the terminator for `encoding`, even-aligned for 16-bit encodings.
pub fn find_null_terminator(data: &[u8], encoding: Encoding) -> Option<usize> {
    match encoding {
        Encoding::Latin1 | Encoding::Utf8 => memchr::memchr(0, data),
        Encoding::Utf16 | Encoding::Utf16Be => data
            .chunks_exact(2)
            .position(|pair| pair == [0, 0])
            .map(|i| i * 2),
    }
}

/// Read one terminated string. Without a terminator the rest of the data is
/// the string. Data shorter than a terminator decodes to an empty string.
pub fn read_encoded_text(data: &[u8], encoding: Encoding) -> (String, &[u8]) {
    let term = encoding.terminator().len();
    let (text, rest) = match find_null_terminator(data, encoding) {
        Some(pos) => (&data[..pos], &data[pos + term..]),
        None => (data, &data[data.len()..]),
    };
    if text.len() < term {
        return (String::new(), rest);
    }
    (decode_text(text, encoding), rest)
}

/// A time stamp in the restricted ISO 8601 form `YYYY-MM-DD HH:MM:SS`, or any
/// prefix of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ID3TimeStamp {
    pub year: Option<u32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
}

impl ID3TimeStamp {
    pub fn parse(text: &str) -> Self {
        let mut parts = text
            .split(|c: char| matches!(c, '-' | 'T' | ':' | '/' | '.') || c.is_whitespace())
            .map(|p| {
                if !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) {
                    p.parse().ok()
                } else {
                    None
                }
            });
        let mut next = || parts.next().flatten();
        ID3TimeStamp {
            year: next(),
            month: next(),
            day: next(),
            hour: next(),
            minute: next(),
            second: next(),
        }
    }

    fn components(&self) -> [Option<u32>; 6] {
        [
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        ]
    }

    /// Canonical text, stopping at the first missing component.
    pub fn text(&self) -> String {
        const SEPS: [&str; 6] = ["-", "-", " ", ":", ":", ""];
        let mut out = String::new();
        for (i, part) in self.components().iter().enumerate() {
            let Some(value) = part else { break };
            if i == 0 {
                out.push_str(&format!("{:04}", value));
            } else {
                out.push_str(&format!("{:02}", value));
            }
            out.push_str(SEPS[i]);
        }
        if out.ends_with(['-', ' ', ':']) {
            out.pop();
        }
        out
    }

    /// The form written to a frame, with `T` between date and time.
    pub fn wire_text(&self) -> String {
        self.text().replacen(' ', "T", 1)
    }
}

impl PartialOrd for ID3TimeStamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ID3TimeStamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components().cmp(&other.components())
    }
}

impl fmt::Display for ID3TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// The wire layout of one frame field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpecKind {
    /// Text encoding selector byte.
    Encoding,
    Byte,
    /// Big-endian integer of a fixed number of bytes.
    SizedInteger(usize),
    /// Big-endian integer filling the rest of the frame, at least 4 bytes.
    Integer,
    /// Fixed-length Latin-1 string, null padded.
    FixedString(usize),
    /// The rest of the frame.
    Binary,
    /// Terminated text in the frame's encoding.
    EncodedText,
    /// Terminated Latin-1 text.
    Latin1Text,
    /// An [`ID3TimeStamp`] stored as encoded text.
    TimeStamp,
    /// The inner specs, repeated until the data runs out. A single inner spec
    /// yields plain values, several yield tuples. `sep` splits a plain string
    /// on validation.
    Multi {
        items: &'static [SpecKind],
        sep: Option<&'static str>,
    },
    /// Signed 16-bit gain in 1/512 dB.
    VolumeAdjustment,
    /// Peak with a leading bit count.
    VolumePeak,
    /// Encoded text and 32-bit time stamp pairs.
    SynchronizedText,
    /// Event type and 32-bit time stamp pairs.
    KeyEvents,
    /// Frequency and adjustment pairs.
    VolumeAdjustments,
    /// Audio seek point indexes, sized by the `N` and `b` fields.
    AspiIndex,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: SpecKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: SpecKind) -> Self {
        FieldSpec { name, kind }
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Encoding(Encoding),
    Int(u64),
    Float(f64),
    Text(String),
    Binary(Vec<u8>),
    TimeStamp(ID3TimeStamp),
    List(Vec<FieldValue>),
    Tuple(Vec<FieldValue>),
    SyncedText(Vec<(String, u32)>),
    KeyEvents(Vec<(u8, u32)>),
    Adjustments(Vec<(f64, f64)>),
    Indexes(Vec<u16>),
}

/// The fields of the frame being read or written, for specs whose layout
/// depends on an earlier field.
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    specs: &'a [FieldSpec],
    values: &'a [FieldValue],
}

impl<'a> FieldContext<'a> {
    pub fn new(specs: &'a [FieldSpec], values: &'a [FieldValue]) -> Self {
        FieldContext { specs, values }
    }

    pub fn encoding(&self) -> Encoding {
        self.specs
            .iter()
            .zip(self.values)
            .find_map(|(spec, value)| match (spec.kind, value) {
                (SpecKind::Encoding, FieldValue::Encoding(e)) => Some(*e),
                _ => None,
            })
            .unwrap_or(Encoding::Latin1)
    }

    pub fn int(&self, name: &str) -> Option<u64> {
        self.specs
            .iter()
            .zip(self.values)
            .find_map(|(spec, value)| match value {
                FieldValue::Int(v) if spec.name == name => Some(*v),
                _ => None,
            })
    }
}

fn junk(what: &str) -> MutagenError {
    MutagenError::ID3JunkFrame(what.to_string())
}

fn wrong_type(kind: &SpecKind, value: &FieldValue) -> MutagenError {
    MutagenError::ValueError(format!("{:?} cannot hold {:?}", kind, value))
}

impl SpecKind {
    /// Specs that consume the rest of the frame also accept nothing at all.
    pub fn reads_empty(&self) -> bool {
        matches!(
            self,
            SpecKind::Binary
                | SpecKind::Multi { .. }
                | SpecKind::SynchronizedText
                | SpecKind::KeyEvents
                | SpecKind::VolumeAdjustments
                | SpecKind::AspiIndex
        )
    }

    /// Read one value, returning it with the unread remainder.
    pub fn read<'d>(
        &self,
        data: &'d [u8],
        ctx: &FieldContext<'_>,
    ) -> Result<(FieldValue, &'d [u8])> {
        match *self {
            SpecKind::Encoding => {
                let (&b, rest) = data.split_first().ok_or_else(|| junk("missing encoding"))?;
                if b < 16 {
                    let enc = Encoding::from_byte(b)
                        .map_err(|_| junk(&format!("invalid encoding {}", b)))?;
                    Ok((FieldValue::Encoding(enc), rest))
                } else {
                    // Not an encoding byte at all; leave it for the next field.
                    Ok((FieldValue::Encoding(Encoding::Latin1), data))
                }
            }
            SpecKind::Byte => {
                let (&b, rest) = data.split_first().ok_or_else(|| junk("missing byte"))?;
                Ok((FieldValue::Int(u64::from(b)), rest))
            }
            SpecKind::SizedInteger(size) => {
                let n = size.min(data.len());
                Ok((FieldValue::Int(BitPaddedInt::decode(&data[..n], 8)), &data[n..]))
            }
            SpecKind::Integer => Ok((
                FieldValue::Int(BitPaddedInt::decode(data, 8)),
                &data[data.len()..],
            )),
            SpecKind::FixedString(len) => {
                if data.len() < len {
                    return Err(junk("fixed string too short"));
                }
                let text = decode_text(&data[..len], Encoding::Latin1);
                Ok((FieldValue::Text(text), &data[len..]))
            }
            SpecKind::Binary => Ok((FieldValue::Binary(data.to_vec()), &data[data.len()..])),
            SpecKind::EncodedText => {
                let (text, rest) = read_encoded_text(data, ctx.encoding());
                Ok((FieldValue::Text(text), rest))
            }
            SpecKind::Latin1Text => {
                let (text, rest) = match memchr::memchr(0, data) {
                    Some(pos) => (&data[..pos], &data[pos + 1..]),
                    None => (data, &data[data.len()..]),
                };
                Ok((FieldValue::Text(decode_text(text, Encoding::Latin1)), rest))
            }
            SpecKind::TimeStamp => {
                let (text, rest) = read_encoded_text(data, ctx.encoding());
                Ok((FieldValue::TimeStamp(ID3TimeStamp::parse(&text)), rest))
            }
            SpecKind::Multi { items, .. } => {
                let mut values = Vec::new();
                let mut data = data;
                while !data.is_empty() {
                    let mut record = Vec::with_capacity(items.len());
                    for item in items {
                        let (value, rest) = item.read(data, ctx)?;
                        record.push(value);
                        data = rest;
                    }
                    if items.len() == 1 {
                        values.extend(record);
                    } else {
                        values.push(FieldValue::Tuple(record));
                    }
                }
                Ok((FieldValue::List(values), data))
            }
            SpecKind::VolumeAdjustment => {
                if data.len() < 2 {
                    return Err(junk("volume adjustment too short"));
                }
                let value = f64::from(BigEndian::read_i16(data)) / 512.0;
                Ok((FieldValue::Float(value), &data[2..]))
            }
            SpecKind::VolumePeak => {
                let (&bits, _) = data.split_first().ok_or_else(|| junk("missing peak"))?;
                let bytes = 4usize.min((usize::from(bits) + 7) >> 3);
                if bytes + 1 > data.len() {
                    return Err(junk("not enough frame data for peak"));
                }
                let shift = ((8 - (u32::from(bits) & 7)) & 7) + (4 - bytes as u32) * 8;
                let peak = data[1..=bytes]
                    .iter()
                    .fold(0u64, |acc, &b| acc * 256 + u64::from(b))
                    << shift;
                let value = peak as f64 / f64::from((1u32 << 31) - 1);
                Ok((FieldValue::Float(value), &data[1 + bytes..]))
            }
            SpecKind::SynchronizedText => {
                let encoding = ctx.encoding();
                let term = encoding.terminator().len();
                let mut texts = Vec::new();
                let mut data = data;
                while !data.is_empty() {
                    let idx = find_null_terminator(data, encoding)
                        .ok_or_else(|| junk("unterminated synchronized text"))?;
                    if data.len() < idx + term + 4 {
                        return Err(junk("synchronized text missing time stamp"));
                    }
                    let text = decode_text(&data[..idx], encoding);
                    let time = BigEndian::read_u32(&data[idx + term..]);
                    texts.push((text, time));
                    data = &data[idx + term + 4..];
                }
                Ok((FieldValue::SyncedText(texts), data))
            }
            SpecKind::KeyEvents => {
                let mut events = Vec::new();
                let mut data = data;
                while data.len() >= 5 {
                    events.push((data[0], BigEndian::read_u32(&data[1..5])));
                    data = &data[5..];
                }
                Ok((FieldValue::KeyEvents(events), data))
            }
            SpecKind::VolumeAdjustments => {
                let mut adjustments: Vec<(f64, f64)> = Vec::new();
                let mut data = data;
                while data.len() >= 4 {
                    let freq = f64::from(BigEndian::read_u16(data)) / 2.0;
                    let adj = f64::from(BigEndian::read_i16(&data[2..])) / 512.0;
                    match adjustments.iter_mut().find(|(f, _)| *f == freq) {
                        Some(existing) => existing.1 = adj,
                        None => adjustments.push((freq, adj)),
                    }
                    data = &data[4..];
                }
                sort_adjustments(&mut adjustments);
                Ok((FieldValue::Adjustments(adjustments), data))
            }
            SpecKind::AspiIndex => {
                let count = ctx.int("N").unwrap_or(0) as usize;
                let (size, wide) = match ctx.int("b") {
                    Some(16) => (2, true),
                    Some(8) => (1, false),
                    other => {
                        log::warn!("invalid bit count in ASPI ({:?})", other);
                        return Ok((FieldValue::Indexes(Vec::new()), data));
                    }
                };
                let n = count.min(data.len() / size);
                let indexes = data[..n * size]
                    .chunks_exact(size)
                    .map(|c| if wide { BigEndian::read_u16(c) } else { u16::from(c[0]) })
                    .collect();
                Ok((FieldValue::Indexes(indexes), &data[n * size..]))
            }
        }
    }

    pub fn write(&self, value: &FieldValue, ctx: &FieldContext<'_>) -> Result<Vec<u8>> {
        match (*self, value) {
            (SpecKind::Encoding, FieldValue::Encoding(e)) => Ok(vec![*e as u8]),
            (SpecKind::Byte, FieldValue::Int(v)) => u8::try_from(*v)
                .map(|b| vec![b])
                .map_err(|_| MutagenError::ValueError(format!("{} does not fit in a byte", v))),
            (SpecKind::SizedInteger(size), FieldValue::Int(v)) => {
                BitPaddedInt::encode(*v, 8, true, Width::Fixed(size))
            }
            (SpecKind::Integer, FieldValue::Int(v)) => {
                BitPaddedInt::encode(*v, 8, true, Width::Growing { min: 4 })
            }
            (SpecKind::FixedString(len), FieldValue::Text(s)) => {
                let mut bytes = encode_latin1(s);
                bytes.resize(len, 0);
                Ok(bytes)
            }
            (SpecKind::Binary, FieldValue::Binary(b)) => Ok(b.clone()),
            (SpecKind::EncodedText, FieldValue::Text(s)) => Ok(terminated(s, ctx.encoding())),
            (SpecKind::Latin1Text, FieldValue::Text(s)) => Ok(terminated(s, Encoding::Latin1)),
            (SpecKind::TimeStamp, FieldValue::TimeStamp(stamp)) => {
                Ok(terminated(&stamp.wire_text(), ctx.encoding()))
            }
            (SpecKind::Multi { items, .. }, FieldValue::List(values)) => {
                let mut out = Vec::new();
                for value in values {
                    match (items, value) {
                        ([item], value) => out.extend(item.write(value, ctx)?),
                        (items, FieldValue::Tuple(record)) if record.len() == items.len() => {
                            for (item, v) in items.iter().zip(record) {
                                out.extend(item.write(v, ctx)?);
                            }
                        }
                        _ => return Err(wrong_type(self, value)),
                    }
                }
                Ok(out)
            }
            (SpecKind::VolumeAdjustment, FieldValue::Float(v)) => {
                let number = (v * 512.0).round();
                if !(-32768.0..=32767.0).contains(&number) {
                    return Err(MutagenError::ValueError("Short out of range".into()));
                }
                Ok((number as i16).to_be_bytes().to_vec())
            }
            (SpecKind::VolumePeak, FieldValue::Float(v)) => {
                let number = (v * 32768.0).round();
                if !(0.0..=65535.0).contains(&number) {
                    return Err(MutagenError::ValueError(
                        "Unsigned Short out of range".into(),
                    ));
                }
                // Always written as 16 bits.
                let mut out = vec![0x10];
                out.extend_from_slice(&(number as u16).to_be_bytes());
                Ok(out)
            }
            (SpecKind::SynchronizedText, FieldValue::SyncedText(texts)) => {
                let encoding = ctx.encoding();
                let mut out = Vec::new();
                for (text, time) in texts {
                    out.extend(terminated(text, encoding));
                    out.extend_from_slice(&time.to_be_bytes());
                }
                Ok(out)
            }
            (SpecKind::KeyEvents, FieldValue::KeyEvents(events)) => {
                let mut out = Vec::with_capacity(events.len() * 5);
                for (kind, time) in events {
                    out.push(*kind);
                    out.extend_from_slice(&time.to_be_bytes());
                }
                Ok(out)
            }
            (SpecKind::VolumeAdjustments, FieldValue::Adjustments(values)) => {
                let mut values = values.clone();
                sort_adjustments(&mut values);
                let mut out = Vec::with_capacity(values.len() * 4);
                for (freq, adj) in values {
                    let freq = (freq * 2.0).trunc();
                    if !(0.0..=65535.0).contains(&freq) {
                        return Err(MutagenError::ValueError(format!(
                            "Frequency {} out of range",
                            freq / 2.0
                        )));
                    }
                    let adj = (adj * 512.0).trunc();
                    if !(-32768.0..=32767.0).contains(&adj) {
                        return Err(MutagenError::ValueError("Short out of range".into()));
                    }
                    out.extend_from_slice(&(freq as u16).to_be_bytes());
                    out.extend_from_slice(&(adj as i16).to_be_bytes());
                }
                Ok(out)
            }
            (SpecKind::AspiIndex, FieldValue::Indexes(indexes)) => match ctx.int("b") {
                Some(16) => Ok(indexes.iter().flat_map(|i| i.to_be_bytes()).collect()),
                Some(8) => indexes
                    .iter()
                    .map(|&i| {
                        u8::try_from(i).map_err(|_| {
                            MutagenError::ValueError(format!("ASPI index {} exceeds 8 bits", i))
                        })
                    })
                    .collect(),
                other => Err(MutagenError::ValueError(format!(
                    "frame.b must be 8 or 16, not {:?}",
                    other
                ))),
            },
            _ => Err(wrong_type(self, value)),
        }
    }

    /// Check `value` against this spec, returning its normalized form.
    pub fn validate(&self, value: FieldValue) -> Result<FieldValue> {
        let empty = FieldContext::new(&[], &[]);
        match (*self, value) {
            (SpecKind::Encoding, FieldValue::Int(v)) => {
                let b = u8::try_from(v)
                    .map_err(|_| MutagenError::ValueError(format!("Invalid Encoding: {}", v)))?;
                Ok(FieldValue::Encoding(Encoding::from_byte(b)?))
            }
            (SpecKind::Encoding, v @ FieldValue::Encoding(_)) => Ok(v),
            (
                kind @ (SpecKind::Byte | SpecKind::SizedInteger(_) | SpecKind::Integer),
                v @ FieldValue::Int(_),
            ) => {
                kind.write(&v, &empty)?;
                Ok(v)
            }
            (SpecKind::FixedString(len), FieldValue::Text(s)) => {
                if s.chars().count() == len && s.chars().all(|c| (c as u32) <= 0xFF) {
                    Ok(FieldValue::Text(s))
                } else {
                    Err(MutagenError::ValueError(format!(
                        "Invalid StringSpec[{}] data: {:?}",
                        len, s
                    )))
                }
            }
            (SpecKind::Binary, v @ FieldValue::Binary(_)) => Ok(v),
            (SpecKind::Binary, FieldValue::Text(s)) => Ok(FieldValue::Binary(s.into_bytes())),
            (SpecKind::EncodedText | SpecKind::Latin1Text, v @ FieldValue::Text(_)) => Ok(v),
            (SpecKind::TimeStamp, FieldValue::Text(s)) => {
                Ok(FieldValue::TimeStamp(ID3TimeStamp::parse(&s)))
            }
            (SpecKind::TimeStamp, v @ FieldValue::TimeStamp(_)) => Ok(v),
            (SpecKind::Multi { sep: Some(sep), .. }, FieldValue::Text(s)) => self.validate(
                FieldValue::List(s.split(sep).map(|p| FieldValue::Text(p.to_string())).collect()),
            ),
            (SpecKind::Multi { items, .. }, FieldValue::List(values)) => {
                let mut out = Vec::with_capacity(values.len());
                for value in values {
                    out.push(match (items, value) {
                        ([item], value) => item.validate(value)?,
                        (items, FieldValue::Tuple(record)) if record.len() == items.len() => {
                            FieldValue::Tuple(
                                items
                                    .iter()
                                    .zip(record)
                                    .map(|(item, v)| item.validate(v))
                                    .collect::<Result<_>>()?,
                            )
                        }
                        (_, value) => return Err(wrong_type(self, &value)),
                    });
                }
                Ok(FieldValue::List(out))
            }
            (kind @ (SpecKind::VolumeAdjustment | SpecKind::VolumePeak), v @ FieldValue::Float(_)) => {
                kind.write(&v, &empty)?;
                Ok(v)
            }
            (SpecKind::SynchronizedText, v @ FieldValue::SyncedText(_))
            | (SpecKind::KeyEvents, v @ FieldValue::KeyEvents(_))
            | (SpecKind::AspiIndex, v @ FieldValue::Indexes(_)) => Ok(v),
            (SpecKind::VolumeAdjustments, FieldValue::Adjustments(mut values)) => {
                sort_adjustments(&mut values);
                let v = FieldValue::Adjustments(values);
                self.write(&v, &empty)?;
                Ok(v)
            }
            (kind, value) => Err(wrong_type(&kind, &value)),
        }
    }

    /// Turn a validated value into one that can be written to a v2.3 tag.
    ///
    /// `sep` joins multi-valued text into a single string; without it the
    /// values are kept and written null separated.
    pub fn downgrade_v23(&self, value: FieldValue, sep: Option<&str>) -> Result<FieldValue> {
        match (*self, value) {
            (SpecKind::Encoding, FieldValue::Encoding(e)) => {
                Ok(FieldValue::Encoding(e.downgrade_v23()))
            }
            (SpecKind::Multi { items: [item], .. }, FieldValue::List(values))
                if *item == SpecKind::EncodedText =>
            {
                let values = values
                    .into_iter()
                    .map(|v| item.downgrade_v23(v, sep))
                    .collect::<Result<Vec<_>>>()?;
                match sep {
                    Some(sep) => {
                        let joined = values
                            .iter()
                            .filter_map(|v| match v {
                                FieldValue::Text(s) => Some(s.as_str()),
                                _ => None,
                            })
                            .collect::<Vec<_>>()
                            .join(sep);
                        item.validate(FieldValue::Text(joined))
                            .map(|v| FieldValue::List(vec![v]))
                    }
                    None => Ok(FieldValue::List(values)),
                }
            }
            (SpecKind::Multi { items, .. }, FieldValue::List(values)) if items.len() > 1 => values
                .into_iter()
                .map(|record| match record {
                    FieldValue::Tuple(fields) => items
                        .iter()
                        .zip(fields)
                        .map(|(item, v)| item.downgrade_v23(v, sep))
                        .collect::<Result<_>>()
                        .map(FieldValue::Tuple),
                    other => Ok(other),
                })
                .collect::<Result<_>>()
                .map(FieldValue::List),
            (_, value) => Ok(value),
        }
    }
}

fn terminated(text: &str, encoding: Encoding) -> Vec<u8> {
    let mut out = encode_text(text, encoding);
    out.extend_from_slice(encoding.terminator());
    out
}

fn sort_adjustments(values: &mut [(f64, f64)]) {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
}

/// Read every field of `specs`, then `optional` fields while data remains.
///
/// A required field with no data left makes the frame junk, unless it is one
/// that takes the rest of the frame. Non-null bytes
/// left after the last field are logged and dropped.
pub fn read_fields(
    id: &str,
    specs: &'static [FieldSpec],
    optional: &'static [FieldSpec],
    data: &[u8],
) -> Result<Vec<FieldValue>> {
    let all: Vec<FieldSpec> = specs.iter().chain(optional).copied().collect();
    let mut values = Vec::with_capacity(all.len());
    let mut rest = data;

    for (i, spec) in all.iter().enumerate() {
        if rest.is_empty() {
            if i >= specs.len() {
                break;
            }
            if !spec.kind.reads_empty() {
                return Err(MutagenError::ID3JunkFrame(format!(
                    "{}: no data for {}",
                    id, spec.name
                )));
            }
        }
        let ctx = FieldContext::new(&all, &values);
        let (value, remaining) = spec
            .kind
            .read(rest, &ctx)
            .map_err(|e| MutagenError::ID3JunkFrame(format!("{}: {}: {}", id, spec.name, e)))?;
        values.push(value);
        rest = remaining;
    }

    if rest.iter().any(|&b| b != 0) {
        log::warn!("Leftover data: {}: {} bytes", id, rest.len());
    }
    Ok(values)
}

/// Serialize `values` (required fields first, then any optional ones present).
pub fn write_fields(specs: &[FieldSpec], values: &[FieldValue]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for (spec, value) in specs.iter().zip(values) {
        let ctx = FieldContext::new(specs, values);
        out.extend(spec.kind.write(value, &ctx)?);
    }
    Ok(out)
}

/// Picture types of an APIC frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PictureType {
    Other = 0,
    FileIcon = 1,
    OtherFileIcon = 2,
    CoverFront = 3,
    CoverBack = 4,
    LeafletPage = 5,
    Media = 6,
    LeadArtist = 7,
    Artist = 8,
    Conductor = 9,
    Band = 10,
    Composer = 11,
    Lyricist = 12,
    RecordingLocation = 13,
    DuringRecording = 14,
    DuringPerformance = 15,
    MovieCapture = 16,
    AFishEvenBrighter = 17,
    Illustration = 18,
    BandLogo = 19,
    PublisherLogo = 20,
}

impl PictureType {
    pub fn from_byte(b: u8) -> Option<Self> {
        const ALL: [PictureType; 21] = [
            PictureType::Other,
            PictureType::FileIcon,
            PictureType::OtherFileIcon,
            PictureType::CoverFront,
            PictureType::CoverBack,
            PictureType::LeafletPage,
            PictureType::Media,
            PictureType::LeadArtist,
            PictureType::Artist,
            PictureType::Conductor,
            PictureType::Band,
            PictureType::Composer,
            PictureType::Lyricist,
            PictureType::RecordingLocation,
            PictureType::DuringRecording,
            PictureType::DuringPerformance,
            PictureType::MovieCapture,
            PictureType::AFishEvenBrighter,
            PictureType::Illustration,
            PictureType::BandLogo,
            PictureType::PublisherLogo,
        ];
        ALL.get(usize::from(b)).copied()
    }
}

/// Channel names used by relative volume frames.
pub const CHANNELS: [&str; 9] = [
    "Other",
    "Master volume",
    "Front right",
    "Front left",
    "Back right",
    "Back left",
    "Front centre",
    "Back centre",
    "Subwoofer",
];

/// ID3v1 genre list (index -> genre name).
pub const GENRES: &[&str] = &[
    "Blues", "Classic Rock", "Country", "Dance", "Disco", "Funk", "Grunge",
    "Hip-Hop", "Jazz", "Metal", "New Age", "Oldies", "Other", "Pop", "R&B",
    "Rap", "Reggae", "Rock", "Techno", "Industrial", "Alternative", "Ska",
    "Death Metal", "Pranks", "Soundtrack", "Euro-Techno", "Ambient",
    "Trip-Hop", "Vocal", "Jazz+Funk", "Fusion", "Trance", "Classical",
    "Instrumental", "Acid", "House", "Game", "Sound Clip", "Gospel", "Noise",
    "AlternRock", "Bass", "Soul", "Punk", "Space", "Meditative",
    "Instrumental Pop", "Instrumental Rock", "Ethnic", "Gothic", "Darkwave",
    "Techno-Industrial", "Electronic", "Pop-Folk", "Eurodance", "Dream",
    "Southern Rock", "Comedy", "Cult", "Gangsta", "Top 40", "Christian Rap",
    "Pop/Funk", "Jungle", "Native American", "Cabaret", "New Wave",
    "Psychedelic", "Rave", "Showtunes", "Trailer", "Lo-Fi", "Tribal",
    "Acid Punk", "Acid Jazz", "Polka", "Retro", "Musical", "Rock & Roll",
    "Hard Rock", "Folk", "Folk-Rock", "National Folk", "Swing", "Fast Fusion",
    "Bebop", "Latin", "Revival", "Celtic", "Bluegrass", "Avantgarde",
    "Gothic Rock", "Progressive Rock", "Psychedelic Rock", "Symphonic Rock",
    "Slow Rock", "Big Band", "Chorus", "Easy Listening", "Acoustic", "Humour",
    "Speech", "Chanson", "Opera", "Chamber Music", "Sonata", "Symphony",
    "Booty Bass", "Primus", "Porn Groove", "Satire", "Slow Jam", "Club",
    "Tango", "Samba", "Folklore", "Ballad", "Power Ballad", "Rhythmic Soul",
    "Freestyle", "Duet", "Punk Rock", "Drum Solo", "A capella", "Euro-House",
    "Dance Hall", "Goa", "Drum & Bass", "Club-House", "Hardcore Techno",
    "Terror", "Indie", "BritPop", "Negerpunk", "Polsk Punk", "Beat",
    "Christian Gangsta Rap", "Heavy Metal", "Black Metal", "Crossover",
    "Contemporary Christian", "Christian Rock", "Merengue", "Salsa",
    "Thrash Metal", "Anime", "Jpop", "Synthpop", "Abstract", "Art Rock",
    "Baroque", "Bhangra", "Big Beat", "Breakbeat", "Chillout", "Downtempo",
    "Dub", "EBM", "Eclectic", "Electro", "Electroclash", "Emo", "Experimental",
    "Garage", "Global", "IDM", "Illbient", "Industro-Goth", "Jam Band",
    "Krautrock", "Leftfield", "Lounge", "Math Rock", "New Romantic",
    "Nu-Breakz", "Post-Punk", "Post-Rock", "Psytrance", "Shoegaze",
    "Space Rock", "Trop Rock", "World Music", "Neoclassical", "Audiobook",
    "Audio Theatre", "Neue Deutsche Welle", "Podcast", "Indie Rock",
    "G-Funk", "Dubstep", "Garage Rock", "Psybient",
];

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn genre_name(id: &str) -> String {
    match id {
        "CR" => "Cover".to_string(),
        "RX" => "Remix".to_string(),
        _ => id
            .parse::<usize>()
            .ok()
            .and_then(|n| GENRES.get(n))
            .map_or_else(|| "Unknown".to_string(), |g| (*g).to_string()),
    }
}

/// Split leading `(n)`, `(RX)` and `(CR)` references off a TCON value.
fn split_genre_refs(value: &str) -> (Vec<&str>, &str) {
    let mut refs = Vec::new();
    let mut rest = value;
    while let Some(inner) = rest.strip_prefix('(') {
        let Some(close) = inner.find(')') else { break };
        let id = &inner[..close];
        if !(is_digits(id) || id == "RX" || id == "CR") {
            break;
        }
        refs.push(id);
        rest = &inner[close + 1..];
    }
    (refs, rest)
}

/// Interpret TCON text values as a list of genre names.
///
/// Handles bare ID3v1 numbers, `CR`/`RX`, and the v2.3 `(n)Name` style
/// where a literal leading parenthesis is escaped as `((`.
pub fn parse_genres<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    let mut genres = Vec::new();
    for value in values {
        let value = value.as_ref();
        if is_digits(value) && value.parse::<u64>().is_ok_and(|n| n < 256) {
            genres.push(genre_name(value));
        } else if value == "CR" || value == "RX" {
            genres.push(genre_name(value));
        } else if !value.is_empty() {
            let (refs, name) = split_genre_refs(value);
            let mut found: Vec<String> = refs.into_iter().map(genre_name).collect();
            if !name.is_empty() {
                let name = if name.starts_with("((") { &name[1..] } else { name };
                if !found.iter().any(|g| g == name) {
                    found.push(name.to_string());
                }
            }
            genres.extend(found);
        }
    }
    genres
}
