//! Whole-file decoding.
//!
//! [`FileDriver`] runs a small state machine over a mapped file:
//!
//! ```text
//! DetectSignature -> LocateMetaBoundary -> ParseMeta -> DecodeFrames* -> Done
//! ```
//!
//! Any error from a frame, value, header key or decompression aborts the
//! whole decode. Body key errors are reported to the sink and counted, and
//! decoding moves on to the next record.

use crate::body::{body_entries, BodyEntry};
use crate::config::DecoderConfig;
use crate::decompress::StreamDecompressor;
use crate::error::{BodyKeyTypeError, FrameError, XlogError, XlogResult};
use crate::frame::{FrameHeader, FrameKind};
use crate::meta::{locate_meta_end, Meta, WalType};
use crate::row::{decode_record, RecordHeader};
use serde::Serialize;
use std::io;
use std::path::Path;
use tracing::{debug, trace, warn};
use xlog_storage::{LogSource, MappedFile};

/// Receives decoded items in file order.
///
/// Every method defaults to doing nothing, so a sink only implements what it
/// renders.
pub trait RecordSink {
    /// The metadata block.
    fn meta(&mut self, _meta: &Meta) -> io::Result<()> {
        Ok(())
    }

    /// A frame preamble, including the EOF marker.
    fn frame(&mut self, _offset: usize, _header: &FrameHeader) -> io::Result<()> {
        Ok(())
    }

    /// A record header.
    fn record(&mut self, _header: &RecordHeader<'_>) -> io::Result<()> {
        Ok(())
    }

    /// One entry of the current record's body.
    fn body_entry(&mut self, _entry: &BodyEntry) -> io::Result<()> {
        Ok(())
    }

    /// The error that stopped interpretation of the current body.
    fn body_error(&mut self, _error: &BodyKeyTypeError) -> io::Result<()> {
        Ok(())
    }

    /// All records of the current frame have been reported.
    fn frame_end(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Counters describing a finished decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodeSummary {
    /// Row and compressed-row frames decoded.
    pub frames: usize,
    /// Of which compressed.
    pub compressed_frames: usize,
    /// Records decoded.
    pub records: usize,
    /// Records carrying a body.
    pub bodies: usize,
    /// Bodies whose interpretation stopped on a key error.
    pub body_errors: usize,
    /// Whether the EOF marker was reached.
    pub saw_eof: bool,
    /// Bytes after the EOF marker, which are ignored.
    pub trailing_bytes: usize,
    /// Total input size.
    pub total_bytes: usize,
}

impl DecodeSummary {
    /// Fails unless the EOF marker was reached.
    ///
    /// # Errors
    ///
    /// Returns [`XlogError::Unterminated`] if the input ran out first.
    pub fn check_terminated(&self) -> XlogResult<()> {
        if self.saw_eof {
            Ok(())
        } else {
            Err(XlogError::Unterminated {
                offset: self.total_bytes,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    DetectSignature,
    LocateMetaBoundary(WalType),
    ParseMeta(WalType, usize),
    DecodeFrames(usize),
    Done,
}

/// Decodes log files.
///
/// A driver may decode several files in turn; the decompression context and
/// scratch buffer are kept between them.
#[derive(Debug)]
pub struct FileDriver {
    config: DecoderConfig,
    decompressor: Option<StreamDecompressor>,
}

impl FileDriver {
    /// Creates a driver.
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            decompressor: None,
        }
    }

    /// The driver's configuration.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decodes a whole file held in `data`, reporting to `sink`.
    ///
    /// Input that ends without an EOF marker fails with
    /// [`XlogError::Unterminated`] when [`DecoderConfig::require_eof`] is
    /// set, after every frame has been reported.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error. Output already given to the sink
    /// stands.
    pub fn decode<S: RecordSink + ?Sized>(
        &mut self,
        data: &[u8],
        sink: &mut S,
    ) -> XlogResult<DecodeSummary> {
        let mut summary = DecodeSummary {
            total_bytes: data.len(),
            ..DecodeSummary::default()
        };
        let mut state = State::DetectSignature;

        while state != State::Done {
            let next = match state {
                State::DetectSignature => State::LocateMetaBoundary(WalType::detect(data)?),
                State::LocateMetaBoundary(wal_type) => {
                    State::ParseMeta(wal_type, locate_meta_end(data)?)
                }
                State::ParseMeta(wal_type, payload_start) => {
                    // The block excludes the blank line that ends it.
                    let meta = Meta::parse(wal_type, &data[..payload_start - 2]);
                    sink.meta(&meta)?;
                    State::DecodeFrames(payload_start)
                }
                State::DecodeFrames(offset) if offset >= data.len() => State::Done,
                State::DecodeFrames(offset) => {
                    match self.decode_frame(data, offset, sink, &mut summary)? {
                        Some(next) => State::DecodeFrames(next),
                        None => State::Done,
                    }
                }
                State::Done => State::Done,
            };
            debug!(from = ?state, to = ?next, "driver transition");
            state = next;
        }

        debug!(?summary, "decode finished");
        if !summary.saw_eof {
            warn!(offset = data.len(), "input ends without an EOF marker");
            if self.config.require_eof {
                summary.check_terminated()?;
            }
        }
        Ok(summary)
    }

    /// Decodes the frame at `offset`. Returns the offset of the next frame,
    /// or `None` after the EOF marker.
    fn decode_frame<S: RecordSink + ?Sized>(
        &mut self,
        data: &[u8],
        offset: usize,
        sink: &mut S,
        summary: &mut DecodeSummary,
    ) -> XlogResult<Option<usize>> {
        let frame = &data[offset..];
        let header = FrameHeader::parse_with_max_depth(frame, self.config.max_depth)
            .map_err(|e| XlogError::frame(offset, e))?;
        trace!(offset, kind = header.kind.name(), len = header.len, "frame");
        sink.frame(offset, &header)?;

        if header.kind == FrameKind::Eof {
            summary.saw_eof = true;
            summary.trailing_bytes = frame.len() - header.header_len();
            if summary.trailing_bytes > 0 {
                warn!(
                    offset,
                    trailing = summary.trailing_bytes,
                    "ignoring bytes after EOF marker"
                );
            }
            return Ok(None);
        }

        let payload = header
            .payload(frame)
            .map_err(|e| XlogError::frame(offset, e))?;
        if self.config.verify_checksums {
            header
                .verify_checksum(payload)
                .map_err(|e| XlogError::frame(offset, e))?;
        }

        let max_depth = self.config.max_depth;
        let rows = if header.kind == FrameKind::CompressedRow {
            summary.compressed_frames += 1;
            let decompressor = match &mut self.decompressor {
                Some(d) => d,
                slot => slot.insert(
                    StreamDecompressor::new(
                        self.config.initial_scratch_len,
                        self.config.max_decompressed_len,
                    )
                    .map_err(|e| XlogError::decompression(offset, e))?,
                ),
            };
            decompressor
                .decompress(payload)
                .map_err(|e| XlogError::decompression(offset, e))?
        } else {
            payload
        };
        summary.frames += 1;

        decode_rows(rows, offset, max_depth, sink, summary)?;
        Ok(Some(offset + header.frame_len()))
    }
}

/// Decodes every record of one frame's row data.
fn decode_rows<S: RecordSink + ?Sized>(
    rows: &[u8],
    offset: usize,
    max_depth: usize,
    sink: &mut S,
    summary: &mut DecodeSummary,
) -> XlogResult<()> {
    if rows.is_empty() {
        return Err(XlogError::frame(offset, FrameError::Empty));
    }

    let mut cursor = 0;
    while cursor < rows.len() {
        let (header, next) =
            decode_record(rows, cursor, false, max_depth).map_err(|e| XlogError::record(offset, e))?;
        summary.records += 1;
        sink.record(&header)?;

        if let Some(body) = header.body {
            summary.bodies += 1;
            for entry in body_entries(body, max_depth) {
                match entry {
                    Ok(entry) => sink.body_entry(&entry)?,
                    Err(err) => {
                        warn!(offset, lsn = header.lsn, error = %err, "body interpretation stopped");
                        summary.body_errors += 1;
                        sink.body_error(&err)?;
                    }
                }
            }
        }
        cursor = next;
    }

    sink.frame_end()?;
    Ok(())
}

/// Decodes `data` with a fresh driver.
///
/// # Errors
///
/// See [`FileDriver::decode`].
pub fn decode_bytes<S: RecordSink + ?Sized>(
    data: &[u8],
    config: &DecoderConfig,
    sink: &mut S,
) -> XlogResult<DecodeSummary> {
    FileDriver::new(config.clone()).decode(data, sink)
}

/// Maps the file at `path` and decodes it.
///
/// # Errors
///
/// Returns [`XlogError::Storage`] if the file cannot be opened or mapped,
/// otherwise see [`FileDriver::decode`].
pub fn decode_file<S: RecordSink + ?Sized>(
    path: &Path,
    config: &DecoderConfig,
    sink: &mut S,
) -> XlogResult<DecodeSummary> {
    let file = MappedFile::open(path)?;
    debug!(path = %path.display(), size = file.len(), "mapped log file");
    decode_bytes(file.bytes(), config, sink)
}
