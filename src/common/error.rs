use thiserror::Error;

#[derive(Error, Debug)]
pub enum MutagenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ID3 no header found")]
    ID3NoHeader,

    #[error("ID3 unsupported version: {0}")]
    ID3UnsupportedVersion(String),

    /// Reserved header flags or a non-synchsafe size, only raised in pedantic mode.
    #[error("ID3 invalid header: {0}")]
    ID3InvalidHeader(String),

    #[error("ID3 bad unsynch data: {0}")]
    ID3BadUnsynchData(String),

    #[error("ID3 bad compressed data: {0}")]
    ID3BadCompressedData(String),

    #[error("ID3 encrypted frame not supported: {0}")]
    ID3EncryptionUnsupported(String),

    /// A single frame could not be decoded. The frame stream decoder drops the
    /// frame and moves on.
    #[error("ID3 junk frame: {0}")]
    ID3JunkFrame(String),

    #[error("invalid sync-safe string")]
    InvalidSyncSequence,

    #[error("string is too short")]
    TruncatedSyncSequence,

    #[error("value too wide for {0} bytes")]
    ValueTooWide(usize),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Value error: {0}")]
    ValueError(String),
}

impl MutagenError {
    /// Whether a load should fall back to a trailing ID3v1 block after this error.
    pub fn is_missing_tag(&self) -> bool {
        matches!(
            self,
            MutagenError::ID3NoHeader | MutagenError::ID3UnsupportedVersion(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MutagenError>;
