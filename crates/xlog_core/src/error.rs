//! Error types for xlog decoding.

use std::fmt;
use std::io;
use thiserror::Error;
use xlog_codec::{CodecError, ValueType};
use xlog_storage::StorageError;

/// Result type for decoding operations.
pub type XlogResult<T> = Result<T, XlogError>;

/// Errors that abort the decode of a file.
///
/// Offsets are absolute byte offsets of the frame being decoded when the
/// error occurred. Errors inside a compressed frame still report the offset
/// of that frame in the file.
#[derive(Debug, Error)]
pub enum XlogError {
    /// The file could not be opened or mapped.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The signature or metadata block is invalid.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A frame preamble or payload is invalid.
    #[error("frame at offset {offset}: {source}")]
    Frame {
        /// Offset of the frame.
        offset: usize,
        /// What went wrong.
        source: FrameError,
    },

    /// A MessagePack value is malformed.
    #[error("frame at offset {offset}: {source}")]
    Value {
        /// Offset of the frame holding the value.
        offset: usize,
        /// What went wrong.
        source: CodecError,
    },

    /// A record header key is unknown or mistyped.
    #[error("frame at offset {offset}: {source}")]
    HeaderKey {
        /// Offset of the frame holding the record.
        offset: usize,
        /// What went wrong.
        source: HeaderKeyError,
    },

    /// A compressed payload could not be inflated.
    #[error("frame at offset {offset}: {source}")]
    Decompression {
        /// Offset of the compressed frame.
        offset: usize,
        /// What went wrong.
        source: DecompressionError,
    },

    /// The input ended without an EOF marker.
    #[error("input ends at offset {offset} without an EOF marker")]
    Unterminated {
        /// Offset where input ran out.
        offset: usize,
    },
}

impl XlogError {
    /// Short name of the stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Storage(_) => "open",
            Self::Io(_) => "output",
            Self::Format(_) => "format",
            Self::Frame { .. } => "frame",
            Self::Value { .. } => "value",
            Self::HeaderKey { .. } => "header",
            Self::Decompression { .. } => "decompress",
            Self::Unterminated { .. } => "eof",
        }
    }

    /// Offset of the failing frame, if the error is tied to one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Frame { offset, .. }
            | Self::Value { offset, .. }
            | Self::HeaderKey { offset, .. }
            | Self::Decompression { offset, .. }
            | Self::Unterminated { offset } => Some(*offset),
            _ => None,
        }
    }

    /// Create a frame error.
    pub fn frame(offset: usize, source: FrameError) -> Self {
        Self::Frame { offset, source }
    }

    /// Create a decompression error.
    pub fn decompression(offset: usize, source: DecompressionError) -> Self {
        Self::Decompression { offset, source }
    }

    /// Attach a frame offset to a record decoding error.
    pub fn record(offset: usize, source: RecordError) -> Self {
        match source {
            RecordError::Value(source) => Self::Value { offset, source },
            RecordError::Key(source) => Self::HeaderKey { offset, source },
        }
    }
}

/// File signature and metadata errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The file is shorter than a signature.
    #[error("file is too small ({size} bytes)")]
    TooSmall {
        /// File size.
        size: usize,
    },

    /// The file does not start with a known signature.
    #[error("unsupported format: signature mismatch")]
    UnsupportedFormat,

    /// No blank line terminates the metadata block.
    #[error("no end of metadata found")]
    MissingMetaBoundary,

    /// Nothing follows the metadata block.
    #[error("no data after metadata")]
    EmptyPayload,
}

/// A fixed-header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameField {
    /// Declared payload length.
    Length,
    /// Checksum of the previous frame.
    PrevChecksum,
    /// Checksum of this frame's payload.
    Checksum,
}

impl fmt::Display for FrameField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Length => "length",
            Self::PrevChecksum => "crc32p",
            Self::Checksum => "crc32c",
        })
    }
}

/// Frame preamble and payload errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Fewer bytes remain than the preamble needs.
    #[error("fixed header is too small: {available} bytes (need {needed})")]
    Truncated {
        /// Bytes remaining.
        available: usize,
        /// Bytes required.
        needed: usize,
    },

    /// The magic is not one of the known frame markers.
    #[error("invalid magic: {magic:#010x}")]
    InvalidMagic {
        /// Magic as read, big-endian.
        magic: u32,
    },

    /// A length or checksum field is not an unsigned 32-bit integer inside
    /// the fixed header.
    #[error("broken {field}")]
    BrokenField {
        /// Which field.
        field: FrameField,
    },

    /// The padding is not one value ending exactly at the header boundary.
    #[error("broken padding")]
    BrokenPadding,

    /// The declared length exceeds the protocol maximum.
    #[error("too large length ({len} while max {max})")]
    FrameTooLarge {
        /// Declared length.
        len: u64,
        /// Maximum allowed.
        max: u64,
    },

    /// The payload runs past the end of the file.
    #[error("payload of {len} bytes runs past end of file ({available} bytes left)")]
    PayloadTruncated {
        /// Declared length.
        len: usize,
        /// Bytes remaining after the preamble.
        available: usize,
    },

    /// The payload does not hash to the declared checksum.
    #[error("checksum mismatch: header {expected:#x}, payload {actual:#x}")]
    ChecksumMismatch {
        /// Checksum from the header.
        expected: u32,
        /// Checksum of the payload.
        actual: u32,
    },

    /// A row frame holds no records.
    #[error("frame holds no records")]
    Empty,
}

/// Record header key errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderKeyError {
    /// The header is not a map.
    #[error("packet header: expected map, found {found}")]
    NotAMap {
        /// Type found.
        found: ValueType,
    },

    /// A header key is not an unsigned integer.
    #[error("packet header: key is {found}, expected MP_UINT")]
    NonIntegerKey {
        /// Type found.
        found: ValueType,
    },

    /// A header key code is not in the header table.
    #[error("packet header: unknown key {key:#x}")]
    UnknownHeaderKey {
        /// The key code.
        key: u64,
    },

    /// A header value has the wrong type for its key.
    #[error("packet header: key {key:#x} holds {found}, expected {expected}")]
    TypeMismatch {
        /// The key code.
        key: u64,
        /// Type the table requires.
        expected: ValueType,
        /// Type found.
        found: ValueType,
    },

    /// Bytes remain after a record that should fill its region.
    #[error("packet header: {remaining} trailing bytes")]
    TrailingData {
        /// Bytes left over.
        remaining: usize,
    },
}

/// Errors from decoding one record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Malformed MessagePack.
    #[error(transparent)]
    Value(#[from] CodecError),

    /// Header key problem.
    #[error(transparent)]
    Key(#[from] HeaderKeyError),
}

/// Decompression errors.
#[derive(Debug, Error)]
pub enum DecompressionError {
    /// The zstd library rejected the stream.
    #[error("zstd: decompression failed: {0}")]
    Stream(#[source] io::Error),

    /// The decompressed data would exceed the configured ceiling.
    #[error("decompressed data exceeds {limit} bytes")]
    OutputTooLarge {
        /// The ceiling.
        limit: usize,
    },

    /// The compressed input ended in the middle of a zstd frame.
    #[error("zstd: compressed input is incomplete")]
    Incomplete,
}

/// Body interpretation errors.
///
/// These abort interpretation of the remaining body only. The record, the
/// entries already emitted and the rest of the file stand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BodyKeyTypeError {
    /// The body is not a map.
    #[error("map expected but got {found}")]
    NotAMap {
        /// Type found.
        found: ValueType,
    },

    /// A body key is not an unsigned integer.
    #[error("MP_UINT expected but got {found}")]
    NonIntegerKey {
        /// Type found.
        found: ValueType,
    },

    /// A known body key holds a value of the wrong type.
    #[error("key {key:#x} holds {found}, expected {expected}")]
    TypeMismatch {
        /// The key code.
        key: u64,
        /// Type the table requires.
        expected: ValueType,
        /// Type found.
        found: ValueType,
    },

    /// A body value could not be decoded.
    #[error("malformed body value: {0}")]
    Malformed(#[from] CodecError),
}
