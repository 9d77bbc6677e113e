//! Fuzz harnesses.
//!
//! Each target accepts arbitrary bytes and must either succeed or return an
//! error. A panic is a bug.

use xlog_codec::{decode, validate};
use xlog_core::{
    decode_bytes, decode_record, interpret_body, parse_frame, DecoderConfig, RecordSink,
};

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl RecordSink for NullSink {}

/// Fuzz target for value decoding. Decoding and validation must agree.
pub fn fuzz_value(data: &[u8]) {
    let decoded = decode(data, 0).map(|(_, end)| end);
    let validated = validate(data, 0);
    assert_eq!(decoded, validated, "decode and validate disagree");
}

/// Fuzz target for frame preambles.
pub fn fuzz_frame(data: &[u8]) {
    if let Ok(header) = parse_frame(data) {
        assert!(header.header_len() <= data.len());
    }
}

/// Fuzz target for a single record and its body.
pub fn fuzz_record(data: &[u8]) {
    if let Ok((header, end)) = decode_record(data, 0, false, 32) {
        assert!(end <= data.len());
        if let Some(body) = header.body {
            let _ = interpret_body(body, 32);
        }
    }
}

/// Fuzz target for whole files, checksums on and off.
pub fn fuzz_file(data: &[u8]) {
    let config = DecoderConfig::default().max_decompressed_len(1 << 20);
    let _ = decode_bytes(data, &config, &mut NullSink);
    let _ = decode_bytes(data, &config.verify_checksums(true), &mut NullSink);
}
