use std::fmt;
use std::io::{Read, Seek, SeekFrom};

use crate::common::error::{MutagenError, Result};

/// Width of an encoded [`BitPaddedInt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// Exactly this many bytes; wider values are rejected.
    Fixed(usize),
    /// As many bytes as the value needs, but at least `min`.
    Growing { min: usize },
}

/// Integers stored with only the low `bits` bits of every byte in use.
///
/// ID3v2 uses 7 bits per byte ("synchsafe") for sizes so that the encoded
/// value can never contain an MPEG sync pattern. With 8 bits this is a
/// plain big-endian integer.
pub struct BitPaddedInt;

impl BitPaddedInt {
    /// Decode a big-endian integer with `bits` significant bits per byte.
    pub fn decode(data: &[u8], bits: u8) -> u64 {
        Self::decode_with(data, bits, true)
    }

    pub fn decode_with(data: &[u8], bits: u8, big_endian: bool) -> u64 {
        let mask = (1u64 << bits) - 1;
        let fold = |acc: u64, b: &u8| (acc << bits) | (u64::from(*b) & mask);
        if big_endian {
            data.iter().fold(0, fold)
        } else {
            data.iter().rev().fold(0, fold)
        }
    }

    /// Decode standard syncsafe (7 bits per byte).
    pub fn syncsafe(data: &[u8]) -> u32 {
        Self::decode(data, 7) as u32
    }

    /// Decode as normal integer (8 bits per byte).
    pub fn normal(data: &[u8]) -> u32 {
        Self::decode(data, 8) as u32
    }

    /// Encode `value` using `bits` bits per byte.
    ///
    /// A [`Width::Fixed`] that cannot hold the value fails with
    /// [`MutagenError::ValueTooWide`].
    pub fn encode(value: u64, bits: u8, big_endian: bool, width: Width) -> Result<Vec<u8>> {
        let mask = (1u64 << bits) - 1;
        let mut value = value;
        let mut bytes = Vec::with_capacity(8);

        match width {
            Width::Fixed(width) => {
                bytes.resize(width, 0);
                let mut index = 0;
                while value > 0 {
                    if index >= width {
                        return Err(MutagenError::ValueTooWide(width));
                    }
                    bytes[index] = (value & mask) as u8;
                    value >>= bits;
                    index += 1;
                }
            }
            Width::Growing { min } => {
                while value > 0 {
                    bytes.push((value & mask) as u8);
                    value >>= bits;
                }
                if bytes.len() < min {
                    bytes.resize(min, 0);
                }
            }
        }

        if big_endian {
            bytes.reverse();
        }
        Ok(bytes)
    }

    /// The 4-byte synchsafe form used by tag and v2.4 frame headers.
    pub fn to_syncsafe(value: u32) -> Result<[u8; 4]> {
        Self::to_fixed(value, 7)
    }

    /// A 4-byte big-endian integer with `bits` significant bits per byte.
    pub fn to_fixed(value: u32, bits: u8) -> Result<[u8; 4]> {
        let bytes = Self::encode(u64::from(value), bits, true, Width::Fixed(4))?;
        let mut out = [0u8; 4];
        out.copy_from_slice(&bytes);
        Ok(out)
    }

    /// True if no byte has a bit set above the low `bits` bits.
    pub fn has_valid_padding(data: &[u8], bits: u8) -> bool {
        let mask = Self::padding_mask(bits);
        data.iter().all(|&b| b & mask == 0)
    }

    /// [`Self::has_valid_padding`] over the bytes of an integer.
    pub fn has_valid_padding_int(mut value: u64, bits: u8) -> bool {
        let mask = Self::padding_mask(bits);
        while value > 0 {
            if (value as u8) & mask != 0 {
                return false;
            }
            value >>= 8;
        }
        true
    }

    fn padding_mask(bits: u8) -> u8 {
        (((1u16 << (8 - bits)) - 1) << bits) as u8
    }
}

/// ID3v2 minor version, ordered oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Version {
    V22,
    V23,
    V24,
}

impl Version {
    pub fn from_major(major: u8) -> Option<Self> {
        match major {
            2 => Some(Version::V22),
            3 => Some(Version::V23),
            4 => Some(Version::V24),
            _ => None,
        }
    }

    pub fn major(self) -> u8 {
        match self {
            Version::V22 => 2,
            Version::V23 => 3,
            Version::V24 => 4,
        }
    }

    /// Bits per byte of a frame size field in this version.
    pub fn frame_size_bits(self) -> u8 {
        match self {
            Version::V24 => 7,
            _ => 8,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "2.{}", self.major())
    }
}

/// ID3v2 header flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ID3Flags {
    pub unsynchronisation: bool,
    pub extended: bool,
    pub experimental: bool,
    pub footer: bool,
}

impl ID3Flags {
    pub fn from_byte(flags: u8, version: Version) -> Self {
        ID3Flags {
            unsynchronisation: flags & 0x80 != 0,
            extended: flags & 0x40 != 0,
            experimental: flags & 0x20 != 0,
            footer: version == Version::V24 && flags & 0x10 != 0,
        }
    }

    pub fn to_byte(self) -> u8 {
        (u8::from(self.unsynchronisation) << 7)
            | (u8::from(self.extended) << 6)
            | (u8::from(self.experimental) << 5)
            | (u8::from(self.footer) << 4)
    }
}

/// Raw contents of an extended header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtendedHeader {
    /// Size of `data`, as derived from the declared extended header size.
    pub size: u32,
    pub data: Vec<u8>,
}

impl ExtendedHeader {
    /// Bytes the extended header occupies in the tag, including its size field.
    pub fn on_disk_size(&self) -> u32 {
        4 + self.size
    }
}

/// Parsed ID3v2 header (10 bytes).
#[derive(Debug, Clone)]
pub struct ID3Header {
    pub version: Version,
    pub revision: u8,
    pub flags: ID3Flags,
    /// Tag size excluding the 10-byte header
    pub size: u32,
    /// Offset of the ID3 header in the file
    pub offset: u64,
    pub extended: Option<ExtendedHeader>,
}

impl ID3Header {
    /// Parse the fixed 10-byte header.
    ///
    /// In pedantic mode a size that is not synchsafe or reserved flag bits
    /// being set is an error.
    pub fn parse(data: &[u8], offset: u64, pedantic: bool) -> Result<Self> {
        if data.len() < 10 || &data[0..3] != b"ID3" {
            return Err(MutagenError::ID3NoHeader);
        }

        let major = data[3];
        let revision = data[4];
        let version = Version::from_major(major).ok_or_else(|| {
            MutagenError::ID3UnsupportedVersion(format!("ID3v2.{}.{}", major, revision))
        })?;

        let flag_byte = data[5];
        let size_bytes = &data[6..10];

        if pedantic {
            if !BitPaddedInt::has_valid_padding(size_bytes, 7) {
                return Err(MutagenError::ID3InvalidHeader(
                    "Header size not synchsafe".into(),
                ));
            }
            let reserved = match version {
                Version::V24 => flag_byte & 0x0f,
                Version::V23 => flag_byte & 0x1f,
                Version::V22 => 0,
            };
            if reserved != 0 {
                return Err(MutagenError::ID3InvalidHeader(format!(
                    "has invalid flags {:#04x}",
                    flag_byte
                )));
            }
        }

        let header = ID3Header {
            version,
            revision,
            flags: ID3Flags::from_byte(flag_byte, version),
            size: BitPaddedInt::syncsafe(size_bytes),
            offset,
            extended: None,
        };
        log::debug!(
            "ID3v{} header at {}: {} bytes, flags {:#04x}",
            header.version,
            offset,
            header.size,
            flag_byte
        );
        Ok(header)
    }

    /// Read the header and any extended header from the current position.
    ///
    /// `is_known_frame` is used to spot taggers that set the extended header
    /// flag without writing one: when the would-be size field spells a frame
    /// ID the flag is cleared and the stream is rewound.
    pub fn read<R, F>(reader: &mut R, pedantic: bool, is_known_frame: F) -> Result<Self>
    where
        R: Read + Seek,
        F: Fn(&[u8]) -> bool,
    {
        let offset = reader.stream_position()?;
        let mut buf = [0u8; 10];
        read_or_no_header(reader, &mut buf)?;
        let mut header = Self::parse(&buf, offset, pedantic)?;

        if header.flags.extended {
            let mut size_bytes = [0u8; 4];
            read_or_no_header(reader, &mut size_bytes)?;

            if is_known_frame(&size_bytes) {
                log::warn!("extended header flag set but frame data follows directly");
                header.flags.extended = false;
                reader.seek(SeekFrom::Current(-4))?;
                return Ok(header);
            }

            let size = if header.version == Version::V24 {
                if pedantic && !BitPaddedInt::has_valid_padding(&size_bytes, 7) {
                    return Err(MutagenError::ID3InvalidHeader(
                        "Extended header size not synchsafe".into(),
                    ));
                }
                BitPaddedInt::syncsafe(&size_bytes).saturating_sub(4)
            } else {
                u32::from_be_bytes(size_bytes)
            };

            let mut data = Vec::new();
            reader.by_ref().take(u64::from(size)).read_to_end(&mut data)?;
            if data.len() < size as usize {
                return Err(MutagenError::ID3NoHeader);
            }
            header.extended = Some(ExtendedHeader { size, data });
        }

        Ok(header)
    }

    /// Number of frame bytes following the (extended) header.
    pub fn frames_size(&self) -> u32 {
        let ext = self.extended.as_ref().map_or(0, ExtendedHeader::on_disk_size);
        self.size.saturating_sub(ext)
    }

    /// Full tag size including 10-byte header (and optional 10-byte footer).
    pub fn full_size(&self) -> u32 {
        let mut s = self.size + 10;
        if self.flags.footer {
            s += 10;
        }
        s
    }
}

fn read_or_no_header<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => MutagenError::ID3NoHeader,
        _ => MutagenError::Io(e),
    })
}

/// Determine BPI (bits per integer) for frame sizes in ID3v2.4.
///
/// Some encoders (notably iTunes) write plain integers instead of synchsafe
/// ones. Walk the frame stream under both interpretations, count how many
/// recognised frame IDs each one lands on, and how far past the end of the
/// buffer (or before the padding) it finishes. Returns 8 for plain integers
/// and 7 for synchsafe.
pub fn determine_bpi<F>(data: &[u8], is_known_frame: F) -> u8
where
    F: Fn(&[u8]) -> bool,
{
    let (asbpi, bpioff) = walk_frames(data, 7, &is_known_frame);
    let (asint, intoff) = walk_frames(data, 8, &is_known_frame);

    let bpi = if asint > asbpi || (asint == asbpi && bpioff >= 1 && intoff <= 1) {
        8
    } else {
        7
    };
    log::debug!(
        "frame sizes: {} known as synchsafe (off {}), {} as int (off {}), using {} bits",
        asbpi,
        bpioff,
        asint,
        intoff,
        bpi
    );
    bpi
}

fn walk_frames<F>(data: &[u8], bits: u8, is_known_frame: &F) -> (u32, i64)
where
    F: Fn(&[u8]) -> bool,
{
    const EMPTY: [u8; 10] = [0; 10];

    let len = data.len();
    let mut o = 0usize;
    let mut found = 0u32;
    while o + 10 < len {
        let part = &data[o..o + 10];
        if part == EMPTY {
            return (found, -(((len - o) % 10) as i64));
        }
        let size = BitPaddedInt::decode(&part[4..8], bits) as usize;
        o = o.saturating_add(10).saturating_add(size);
        if is_known_frame(&part[..4]) {
            found += 1;
        }
    }
    (found, o as i64 - len as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn known(id: &[u8]) -> bool {
        matches!(id, b"TIT1" | b"TIT2" | b"TPE1" | b"TALB" | b"APIC")
    }

    #[test_log::test]
    fn decode_synchsafe() {
        assert_eq!(BitPaddedInt::decode(b"\x00\x00\x01\x01", 7), 129);
        assert_eq!(BitPaddedInt::decode(b"\x00\x00\x01\x81", 7), 129);
        assert_eq!(BitPaddedInt::decode(b"\x00\x00\x01\x01", 6), 0x41);
        assert_eq!(BitPaddedInt::decode(b"\x00\x00\x01\x01", 8), 0x101);
        assert_eq!(BitPaddedInt::decode_with(b"\x01\x01\x00\x00", 7, false), 129);
    }

    #[test_log::test]
    fn encode_fixed_width() {
        let bytes = BitPaddedInt::encode(129, 7, true, Width::Fixed(2)).unwrap();
        assert_eq!(bytes, b"\x01\x01");
        let bytes = BitPaddedInt::encode(129, 7, false, Width::Fixed(2)).unwrap();
        assert_eq!(bytes, b"\x01\x01");
        let bytes = BitPaddedInt::encode(0x1234, 8, false, Width::Fixed(4)).unwrap();
        assert_eq!(bytes, b"\x34\x12\x00\x00");
        assert!(matches!(
            BitPaddedInt::encode(129, 7, true, Width::Fixed(1)),
            Err(MutagenError::ValueTooWide(1))
        ));
    }

    #[test_log::test]
    fn encode_growing_width() {
        let bytes = BitPaddedInt::encode(1 << 32, 7, true, Width::Growing { min: 4 }).unwrap();
        assert_eq!(bytes.len(), 5);
        let bytes = BitPaddedInt::encode(1 << 32, 7, true, Width::Growing { min: 6 }).unwrap();
        assert_eq!(bytes.len(), 6);
        let bytes = BitPaddedInt::encode(0, 8, true, Width::Growing { min: 4 }).unwrap();
        assert_eq!(bytes, vec![0; 4]);
    }

    #[test_log::test]
    fn synchsafe_round_trip() {
        for value in [0u32, 1, 127, 128, 129, 16_383, 1 << 20, (1 << 28) - 1] {
            let bytes = BitPaddedInt::to_syncsafe(value).unwrap();
            assert!(BitPaddedInt::has_valid_padding(&bytes, 7));
            assert_eq!(BitPaddedInt::syncsafe(&bytes), value);
        }
        assert!(BitPaddedInt::to_syncsafe(1 << 28).is_err());
    }

    #[test_log::test]
    fn padding_checks() {
        assert!(BitPaddedInt::has_valid_padding(b"\xff\xff", 8));
        assert!(!BitPaddedInt::has_valid_padding(b"\xff", 7));
        assert!(!BitPaddedInt::has_valid_padding(b"\x00\xff", 7));
        assert!(BitPaddedInt::has_valid_padding(b"\x7f\x7f", 7));
        assert!(!BitPaddedInt::has_valid_padding(b"\x7f", 6));
        assert!(BitPaddedInt::has_valid_padding(b"\x3f", 6));
        assert!(BitPaddedInt::has_valid_padding_int(0xff, 8));
        assert!(!BitPaddedInt::has_valid_padding_int(0xff, 7));
        assert!(!BitPaddedInt::has_valid_padding_int(0x9f << 32, 6));
        assert!(BitPaddedInt::has_valid_padding_int(0x3f << 16, 6));
    }

    #[test_log::test]
    fn version_order() {
        assert!(Version::V22 < Version::V23);
        assert!(Version::V23 < Version::V24);
        assert_eq!(Version::from_major(1), None);
        assert_eq!(Version::V23.to_string(), "2.3");
    }

    #[test_log::test]
    fn parse_header() {
        let header = ID3Header::parse(b"ID3\x04\x00\x00\x00\x00\x02\x01", 0, true).unwrap();
        assert_eq!(header.version, Version::V24);
        assert_eq!(header.size, 257);
        assert_eq!(header.full_size(), 267);
        assert!(header.extended.is_none());
    }

    #[test_log::test]
    fn parse_header_errors() {
        assert!(matches!(
            ID3Header::parse(b"XYZ\x04\x00\x00\x00\x00\x00\x00", 0, true),
            Err(MutagenError::ID3NoHeader)
        ));
        assert!(matches!(
            ID3Header::parse(b"ID3\x01\x00\x00\x00\x00\x00\x00", 0, true),
            Err(MutagenError::ID3UnsupportedVersion(_))
        ));
        assert!(matches!(
            ID3Header::parse(b"ID3\x04\x00\x1f\x00\x00\x00\x00", 0, true),
            Err(MutagenError::ID3InvalidHeader(_))
        ));
        assert!(matches!(
            ID3Header::parse(b"ID3\x03\x00\x0f\x00\x00\x00\x00", 0, true),
            Err(MutagenError::ID3InvalidHeader(_))
        ));
        assert!(matches!(
            ID3Header::parse(b"ID3\x04\x00\x00\x00\x00\x00\x80", 0, true),
            Err(MutagenError::ID3InvalidHeader(_))
        ));
        // Lenient mode lets the same headers through.
        assert!(ID3Header::parse(b"ID3\x04\x00\x1f\x00\x00\x00\x00", 0, false).is_ok());
        assert!(ID3Header::parse(b"ID3\x04\x00\x00\x00\x00\x00\x80", 0, false).is_ok());
    }

    #[test_log::test]
    fn footer_flag_is_allowed() {
        let header = ID3Header::parse(b"ID3\x04\x00\x10\x00\x00\x00\x00", 0, true).unwrap();
        assert!(header.flags.footer);
        assert_eq!(header.full_size(), 20);
    }

    #[test_log::test]
    fn extended_header_v24() {
        let mut r = Cursor::new(b"ID3\x04\x00\x40\x00\x00\x00\x00\x00\x00\x00\x05\x5a".to_vec());
        let header = ID3Header::read(&mut r, true, known).unwrap();
        let ext = header.extended.unwrap();
        assert_eq!(ext.size, 1);
        assert_eq!(ext.data, b"\x5a");
    }

    #[test_log::test]
    fn extended_header_v23() {
        let mut r = Cursor::new(
            b"ID3\x03\x00\x40\x00\x00\x00\x10\x00\x00\x00\x06\x00\x00\x56\x78\x9a\xbc".to_vec(),
        );
        let header = ID3Header::read(&mut r, true, known).unwrap();
        let ext = header.extended.clone().unwrap();
        assert_eq!(ext.size, 6);
        assert_eq!(ext.data, b"\x00\x00\x56\x78\x9a\xbc");
        assert_eq!(header.frames_size(), 16 - 10);
    }

    #[test_log::test]
    fn oversized_extended_header_is_no_header() {
        let mut r = Cursor::new(
            b"ID3\x03\x00\x40\x00\x00\x00\x10\xff\xff\xff\xf0\x00\x00\x56\x78".to_vec(),
        );
        assert!(matches!(
            ID3Header::read(&mut r, false, known),
            Err(MutagenError::ID3NoHeader)
        ));
    }

    #[test_log::test]
    fn extended_flag_without_extended_header() {
        let mut r = Cursor::new(b"ID3\x04\x00\x40\x00\x00\x00\x0fTIT1\x00\x00\x00\x01\x00\x00\x00".to_vec());
        let header = ID3Header::read(&mut r, true, known).unwrap();
        assert!(!header.flags.extended);
        assert!(header.extended.is_none());
        assert_eq!(r.position(), 10);
    }

    #[test_log::test]
    fn truncated_header_is_no_header() {
        let mut r = Cursor::new(b"ID3\x04".to_vec());
        assert!(matches!(
            ID3Header::read(&mut r, true, known),
            Err(MutagenError::ID3NoHeader)
        ));
    }

    fn frame(id: &[u8; 4], size: [u8; 4], body_len: usize) -> Vec<u8> {
        let mut out = id.to_vec();
        out.extend_from_slice(&size);
        out.extend_from_slice(&[0, 0]);
        out.extend(std::iter::repeat(b'a').take(body_len));
        out
    }

    #[test_log::test]
    fn bpi_prefers_synchsafe_for_conforming_tags() {
        let mut data = frame(b"TIT2", [0, 0, 1, 0], 128);
        data.extend(frame(b"TPE1", [0, 0, 0, 5], 5));
        data.extend([0u8; 20]);
        assert_eq!(determine_bpi(&data, known), 7);
    }

    #[test_log::test]
    fn bpi_detects_plain_integers() {
        let mut data = frame(b"TIT2", [0, 0, 0, 0x80], 128);
        data.extend(frame(b"TPE1", [0, 0, 0, 5], 5));
        data.extend(frame(b"TALB", [0, 0, 0, 5], 5));
        data.extend([0u8; 20]);
        assert_eq!(determine_bpi(&data, known), 8);
    }
}
