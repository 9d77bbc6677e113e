//! Frame preamble decoding.
//!
//! Every frame starts with a 4-byte magic. Row and compressed-row frames
//! follow it with three MessagePack unsigned integers (payload length,
//! previous checksum, current checksum) and a padding value, filling
//! exactly [`FIXHEADER_SIZE`] bytes. The EOF marker is the magic alone.

use crate::constants::{BODY_LEN_MAX, FIXHEADER_SIZE, MAGIC_SIZE};
use crate::error::{FrameError, FrameField};
use xlog_codec::load::load_u32;
use xlog_codec::{MsgpackDecoder, MsgpackEncoder, DEFAULT_MAX_DEPTH};

/// Frame classification by magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Uncompressed row data.
    Row,
    /// zstd-compressed row data.
    CompressedRow,
    /// End-of-file marker.
    Eof,
}

impl FrameKind {
    /// Magic value as written big-endian on disk.
    pub const fn magic(self) -> u32 {
        match self {
            Self::Row => 0xd5ba_0bab,
            Self::CompressedRow => 0xd5ba_0bba,
            Self::Eof => 0xd510_aded,
        }
    }

    /// On-disk magic bytes.
    pub const fn magic_bytes(self) -> [u8; MAGIC_SIZE] {
        self.magic().to_be_bytes()
    }

    /// Classifies a magic loaded in host byte order.
    fn from_host_magic(raw: u32) -> Option<Self> {
        [Self::Row, Self::CompressedRow, Self::Eof]
            .into_iter()
            .find(|kind| u32::from_ne_bytes(kind.magic_bytes()) == raw)
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Row => "row",
            Self::CompressedRow => "zrow",
            Self::Eof => "eof",
        }
    }
}

/// A decoded frame preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Frame kind.
    pub kind: FrameKind,
    /// Declared payload length. Zero for EOF.
    pub len: u32,
    /// Checksum of the previous frame.
    pub crc32p: u32,
    /// CRC32C of this frame's payload as stored.
    pub crc32c: u32,
}

impl FrameHeader {
    /// Builds a row or compressed-row header.
    pub fn new(kind: FrameKind, len: u32, crc32p: u32, crc32c: u32) -> Self {
        Self {
            kind,
            len,
            crc32p,
            crc32c,
        }
    }

    /// The EOF marker.
    pub fn eof() -> Self {
        Self::new(FrameKind::Eof, 0, 0, 0)
    }

    /// Parses the frame preamble at the start of `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the magic is unknown, the preamble is short, or a
    /// field or the padding is malformed.
    pub fn parse(data: &[u8]) -> Result<Self, FrameError> {
        Self::parse_with_max_depth(data, DEFAULT_MAX_DEPTH)
    }

    /// Like [`parse`](Self::parse), with padding nested no deeper than
    /// `max_depth`.
    ///
    /// # Errors
    ///
    /// See [`FrameHeader::parse`].
    pub fn parse_with_max_depth(data: &[u8], max_depth: usize) -> Result<Self, FrameError> {
        if data.len() < MAGIC_SIZE {
            return Err(FrameError::Truncated {
                available: data.len(),
                needed: MAGIC_SIZE,
            });
        }

        let raw = load_u32(data, 0);
        let kind = FrameKind::from_host_magic(raw).ok_or(FrameError::InvalidMagic {
            magic: u32::from_be_bytes(raw.to_ne_bytes()),
        })?;

        if kind == FrameKind::Eof {
            return Ok(Self::eof());
        }

        if data.len() < FIXHEADER_SIZE {
            return Err(FrameError::Truncated {
                available: data.len(),
                needed: FIXHEADER_SIZE,
            });
        }

        let region = &data[..FIXHEADER_SIZE];
        let mut decoder = MsgpackDecoder::at(region, MAGIC_SIZE).with_max_depth(max_depth);

        let len = read_field(&mut decoder, FrameField::Length)?;
        if len > BODY_LEN_MAX {
            return Err(FrameError::FrameTooLarge {
                len,
                max: BODY_LEN_MAX,
            });
        }
        let len = narrow(len, FrameField::Length)?;
        let crc32p = narrow(read_field(&mut decoder, FrameField::PrevChecksum)?, FrameField::PrevChecksum)?;
        let crc32c = narrow(read_field(&mut decoder, FrameField::Checksum)?, FrameField::Checksum)?;

        if !decoder.is_empty()
            && (decoder.validate().is_err() || decoder.position() != FIXHEADER_SIZE)
        {
            return Err(FrameError::BrokenPadding);
        }

        Ok(Self::new(kind, len, crc32p, crc32c))
    }

    /// Bytes this preamble occupies.
    pub fn header_len(&self) -> usize {
        match self.kind {
            FrameKind::Eof => MAGIC_SIZE,
            _ => FIXHEADER_SIZE,
        }
    }

    /// Total frame size including the payload.
    pub fn frame_len(&self) -> usize {
        self.header_len() + self.len as usize
    }

    /// Slices the payload out of `data`, which starts at this frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::PayloadTruncated`] if the payload runs past the
    /// end of `data`.
    pub fn payload<'a>(&self, data: &'a [u8]) -> Result<&'a [u8], FrameError> {
        let start = self.header_len();
        let len = self.len as usize;
        let available = data.len().saturating_sub(start);
        if len > available {
            return Err(FrameError::PayloadTruncated { len, available });
        }
        Ok(&data[start..start + len])
    }

    /// Checks `payload` against the declared CRC32C.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::ChecksumMismatch`] if they differ.
    pub fn verify_checksum(&self, payload: &[u8]) -> Result<(), FrameError> {
        let actual = payload_checksum(payload);
        if actual != self.crc32c {
            return Err(FrameError::ChecksumMismatch {
                expected: self.crc32c,
                actual,
            });
        }
        Ok(())
    }

    /// Encodes this preamble the way a log writer lays it out: shortest-form
    /// integers, then a string header and zero bytes up to the boundary.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut enc = MsgpackEncoder::with_capacity(FIXHEADER_SIZE);
        enc.write_raw(&self.kind.magic_bytes());
        if self.kind == FrameKind::Eof {
            return enc.into_bytes();
        }

        enc.encode_uint(u64::from(self.len));
        enc.encode_uint(u64::from(self.crc32p));
        enc.encode_uint(u64::from(self.crc32c));

        let padding = FIXHEADER_SIZE - enc.len();
        if padding > 0 {
            enc.encode_str_header(padding - 1);
            enc.write_raw(&vec![0u8; padding - 1]);
        }
        enc.into_bytes()
    }
}

/// CRC32C of a frame payload as log writers store it.
///
/// This is the raw Castagnoli update seeded with zero and without the final
/// inversion, which differs from the usual `crc32c` convention.
pub fn payload_checksum(payload: &[u8]) -> u32 {
    !crc32c::crc32c_append(u32::MAX, payload)
}

/// Parses the frame preamble at the start of `data`.
///
/// # Errors
///
/// See [`FrameHeader::parse`].
pub fn parse_frame(data: &[u8]) -> Result<FrameHeader, FrameError> {
    FrameHeader::parse(data)
}

fn read_field(decoder: &mut MsgpackDecoder<'_>, field: FrameField) -> Result<u64, FrameError> {
    if decoder.is_empty() {
        return Err(FrameError::BrokenField { field });
    }
    decoder
        .decode_uint()
        .map_err(|_| FrameError::BrokenField { field })
}

fn narrow(value: u64, field: FrameField) -> Result<u32, FrameError> {
    u32::try_from(value).map_err(|_| FrameError::BrokenField { field })
}
