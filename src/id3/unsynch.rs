use crate::common::error::{MutagenError, Result};

/// Decode unsynchronised data.
///
/// Drops the 0x00 stuffed after every 0xFF. A 0xFF followed by a byte of
/// 0xE0 or above could never have been produced by the encoder and is an
/// error, as is data ending on a 0xFF.
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(data.len());
    let mut safe = true;
    for &b in data {
        if safe {
            output.push(b);
            safe = b != 0xFF;
        } else if b >= 0xE0 {
            return Err(MutagenError::InvalidSyncSequence);
        } else {
            if b != 0x00 {
                output.push(b);
            }
            safe = true;
        }
    }
    if !safe {
        return Err(MutagenError::TruncatedSyncSequence);
    }
    Ok(output)
}

/// Encode data with unsynchronisation.
///
/// Inserts 0x00 after every 0xFF that is followed by 0x00 or a byte of 0xE0
/// and above, and after a trailing 0xFF.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len() + data.len() / 10);
    let mut safe = true;
    for &b in data {
        if !safe && (b == 0x00 || b >= 0xE0) {
            output.push(0x00);
        }
        output.push(b);
        safe = b != 0xFF;
    }
    if !safe {
        output.push(0x00);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn decode_drops_stuffing() {
        assert_eq!(decode(b"\xff\x00\x61\x62").unwrap(), b"\xffab");
        assert_eq!(decode(b"\xff\x44").unwrap(), b"\xff\x44");
        assert_eq!(decode(b"\x00\xff\x00\x00").unwrap(), b"\x00\xff\x00");
        assert_eq!(decode(b"").unwrap(), b"");
    }

    #[test_log::test]
    fn decode_rejects_invalid_sequences() {
        assert!(matches!(
            decode(b"\xff\xe0"),
            Err(MutagenError::InvalidSyncSequence)
        ));
        assert!(matches!(
            decode(b"\xff\xff\x00"),
            Err(MutagenError::InvalidSyncSequence)
        ));
        assert!(matches!(
            decode(b"ab\xff"),
            Err(MutagenError::TruncatedSyncSequence)
        ));
    }

    #[test_log::test]
    fn encode_inserts_stuffing() {
        assert_eq!(encode(b"\xff\x00"), b"\xff\x00\x00");
        assert_eq!(encode(b"\xff\xe0"), b"\xff\x00\xe0");
        assert_eq!(encode(b"\xff\x44"), b"\xff\x44");
        assert_eq!(encode(b"\xff"), b"\xff\x00");
        assert_eq!(encode(b"\xff\xff"), b"\xff\x00\xff\x00");
    }

    #[test_log::test]
    fn round_trip() {
        let samples: [&[u8]; 6] = [
            b"",
            b"plain text",
            b"\xff\xfb\x90\x00",
            b"\xff\xff\xff",
            b"\x00\xff\x00\xff\xe0\xff",
            &[0xFF; 32],
        ];
        for sample in samples {
            assert_eq!(decode(&encode(sample)).unwrap(), sample);
        }
        let every_byte: Vec<u8> = (0..=255u8).flat_map(|b| [0xFF, b]).collect();
        assert_eq!(decode(&encode(&every_byte)).unwrap(), every_byte);
    }
}
