//! # xlog Core
//!
//! Decoding of Tarantool write-ahead logs, snapshots and vinyl files.
//!
//! This crate provides:
//! - Signature detection and the metadata block
//! - Frame preamble parsing with optional CRC32C verification
//! - zstd decompression of compressed frames into a bounded scratch buffer
//! - Record header decoding against a key/type table
//! - Lenient body interpretation for display
//! - A driver that walks a whole file and reports to a [`RecordSink`]
//!
//! ## Usage
//!
//! ```
//! use xlog_core::{decode_bytes, CollectingSink, DecoderConfig, FrameHeader};
//!
//! let mut file = b"XLOG\n0.13\n\n".to_vec();
//! file.extend_from_slice(&FrameHeader::eof().to_bytes());
//!
//! let mut sink = CollectingSink::new();
//! let summary = decode_bytes(&file, &DecoderConfig::default(), &mut sink).unwrap();
//! assert!(summary.saw_eof);
//! assert_eq!(summary.records, 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod body;
mod config;
pub mod constants;
mod decompress;
mod driver;
mod error;
mod frame;
pub mod keys;
mod meta;
mod render;
mod row;

pub use body::{body_entries, interpret_body, BodyEntries, BodyEntry};
pub use config::DecoderConfig;
pub use constants::{request_type_name, RequestType};
pub use decompress::StreamDecompressor;
pub use driver::{decode_bytes, decode_file, DecodeSummary, FileDriver, RecordSink};
pub use error::{
    BodyKeyTypeError, DecompressionError, FormatError, FrameError, FrameField, HeaderKeyError,
    RecordError, XlogError, XlogResult,
};
pub use frame::{parse_frame, payload_checksum, FrameHeader, FrameKind};
pub use keys::{KeySpec, KeyTypeTable, BODY_KEYS, HEADER_KEYS};
pub use meta::{locate_meta_end, Meta, WalType};
pub use render::{CapturedRecord, CollectingSink, SinkEvent, TextRenderer};
pub use row::{decode_record, RecordHeader};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
