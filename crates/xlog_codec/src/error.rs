//! Error types for the codec crate.

use crate::value::ValueType;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while decoding or validating MessagePack.
///
/// Every variant means the bytes do not form a well-formed value inside the
/// region the caller handed over. Offsets are relative to the start of that
/// region.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A read would cross the end of the region.
    #[error("unexpected end of input at offset {offset} (need {needed} more bytes)")]
    UnexpectedEof {
        /// Offset where the read started.
        offset: usize,
        /// Bytes missing.
        needed: usize,
    },

    /// The leading byte is not a valid MessagePack tag.
    #[error("invalid tag 0x{tag:02x} at offset {offset}")]
    InvalidTag {
        /// The offending byte.
        tag: u8,
        /// Offset of the tag.
        offset: usize,
    },

    /// Containers are nested deeper than the configured ceiling.
    #[error("nesting depth exceeds maximum of {max}")]
    DepthExceeded {
        /// The configured ceiling.
        max: usize,
    },

    /// A container claims more elements than the remaining bytes can hold.
    #[error("container claims {claimed} elements but only {remaining} bytes remain")]
    SizeLimitExceeded {
        /// Element count found in the header.
        claimed: u64,
        /// Bytes left in the region.
        remaining: usize,
    },

    /// A typed read found a different value type.
    #[error("expected {expected}, found {found} at offset {offset}")]
    TypeMismatch {
        /// The type the caller asked for.
        expected: ValueType,
        /// The type present in the input.
        found: ValueType,
        /// Offset of the value.
        offset: usize,
    },

    /// A typed integer read does not fit the requested width.
    #[error("integer {value} at offset {offset} overflows {target}")]
    IntegerOverflow {
        /// The decoded value.
        value: u64,
        /// Name of the target type.
        target: &'static str,
        /// Offset of the value.
        offset: usize,
    },
}

impl CodecError {
    /// Create an unexpected end of input error.
    pub fn eof(offset: usize, needed: usize) -> Self {
        Self::UnexpectedEof { offset, needed }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(expected: ValueType, found: ValueType, offset: usize) -> Self {
        Self::TypeMismatch {
            expected,
            found,
            offset,
        }
    }
}
