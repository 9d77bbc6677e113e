//! End-to-end decoding scenarios.
//!
//! Each builder returns a complete file. The tests below decode them
//! through the public driver and check rendered output and errors.

use crate::fixtures::{LogBuilder, RecordBuilder};
use xlog_codec::Value;
use xlog_core::{RequestType, WalType};

/// The single record shared by the NOP scenarios.
pub fn nop_record() -> RecordBuilder {
    RecordBuilder::new(RequestType::Nop).sync(1).lsn(10)
}

/// An `XLOG` file with one metadata line, one row frame holding a NOP
/// record, and the EOF marker.
pub fn single_nop_file() -> Vec<u8> {
    LogBuilder::with_meta_lines(&["XLOG", "0.13"])
        .rows(&[nop_record()])
        .eof()
        .build()
}

/// The same record bytes inside a compressed frame.
pub fn compressed_nop_file() -> Vec<u8> {
    LogBuilder::with_meta_lines(&["XLOG", "0.13"])
        .zrows(&[nop_record()])
        .eof()
        .build()
}

/// A record whose header holds a map under the `key` code, which must be
/// an array.
pub fn mistyped_header_file() -> Vec<u8> {
    let record = RecordBuilder::new(RequestType::Insert)
        .lsn(1)
        .field(0x20, Value::Map(vec![]))
        .body_map(vec![(0x10, Value::Uint(512))]);
    LogBuilder::new(WalType::Xlog).rows(&[record]).eof().build()
}

/// A small transaction of three statements spread over two frames, one of
/// them compressed.
pub fn transaction_file() -> Vec<u8> {
    let stmt = |lsn: u64, commit: bool, id: u64| {
        RecordBuilder::new(RequestType::Replace)
            .replica_id(1)
            .lsn(lsn)
            .timestamp(1_700_000_000.5)
            .tsn_delta(lsn - 20)
            .commit(commit)
            .body_map(vec![
                (0x10, Value::Uint(512)),
                (0x21, Value::Array(vec![Value::Uint(id), Value::from("row")])),
            ])
    };
    LogBuilder::new(WalType::Xlog)
        .meta_line("Version: 2.11.1")
        .meta_line("Instance: 4c1e2f0a-8a6b-4d7e-9c3b-0f1e2d3c4b5a")
        .meta_line("VClock: {1: 19}")
        .rows(&[stmt(20, false, 1), stmt(21, false, 2)])
        .zrows(&[stmt(22, true, 3)])
        .eof()
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::write_temp_log;
    use crate::fuzz::NullSink;
    use crate::generators::{frame_header_strategy, lsn_delta_strategy, record_strategy};
    use crate::golden::{assert_text_eq, render_records, render_text, render_with};
    use proptest::prelude::*;
    use xlog_core::constants::BODY_LEN_MAX;
    use xlog_core::{
        decode_bytes, decode_file, decode_record, parse_frame, CollectingSink, DecoderConfig,
        FrameError, FrameHeader, FrameKind, HeaderKeyError, SinkEvent, XlogError,
    };

    fn config() -> DecoderConfig {
        DecoderConfig::default()
    }

    const NOP_RECORD_TEXT: &str = "\
xrow header
-------
  type 0xc (NOP) replica_id 0x0 group_id 0x0 sync 1 lsn 10 tm 0 tsn 10 is_commit 1 bodycnt 0 schema_version 0x0
-------
-------
";

    #[test]
    fn single_nop_record() {
        let data = single_nop_file();
        let mut sink = CollectingSink::new();
        let summary = decode_bytes(&data, &config(), &mut sink).unwrap();

        assert!(summary.saw_eof);
        assert_eq!(summary.frames, 1);
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].type_name, "NOP");
        assert_eq!(records[0].sync, 1);
        assert_eq!(records[0].lsn, 10);
        assert_eq!(records[0].bodycnt, 0);
        assert!(records[0].is_commit);

        let text = render_records(&data, &config()).unwrap();
        let expected = format!("meta: 'XLOG'\nmeta: '0.13'\n{NOP_RECORD_TEXT}");
        assert_text_eq("single_nop", &expected, &text);
    }

    #[test]
    fn single_nop_full_text() {
        let data = single_nop_file();
        let text = render_text(&data, &config()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[2], "fixed header");
        assert!(lines[4].starts_with("  magic 0xd5ba0bab crc32p 0x0 crc32c 0x"));
        assert!(lines[4].ends_with(" len 7"));
        // EOF marker preamble.
        assert!(text.contains("  magic 0xd510aded crc32p 0x0 crc32c 0x0 len 0\n"));
    }

    #[test]
    fn compressed_output_matches_uncompressed() {
        let plain = render_records(&single_nop_file(), &config()).unwrap();
        let compressed = render_records(&compressed_nop_file(), &config()).unwrap();
        assert_eq!(plain, compressed);

        let (_, summary) = render_with(&compressed_nop_file(), &config(), false).unwrap();
        assert_eq!(summary.compressed_frames, 1);
    }

    #[test]
    fn mistyped_header_key_rejects_before_body() {
        let data = mistyped_header_file();
        let mut sink = CollectingSink::new();
        let err = decode_bytes(&data, &config(), &mut sink).unwrap_err();
        assert!(matches!(
            err,
            XlogError::HeaderKey {
                source: HeaderKeyError::TypeMismatch { key: 0x20, .. },
                ..
            }
        ));
        assert_eq!(err.stage(), "header");
        assert!(sink.records().is_empty());
        assert!(sink.body_entries().is_empty());
    }

    #[test]
    fn transaction_across_frames() {
        let data = transaction_file();
        let mut sink = CollectingSink::new();
        let summary = decode_bytes(&data, &config(), &mut sink).unwrap();
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.records, 3);
        assert_eq!(summary.bodies, 3);
        assert_eq!(summary.body_errors, 0);

        let records = sink.records();
        assert!(records.iter().all(|r| r.tsn == 20));
        let commits: Vec<_> = records.iter().map(|r| r.is_commit).collect();
        assert_eq!(commits, [false, false, true]);
        assert_eq!(records[2].timestamp, 1_700_000_000.5);

        let tuples: Vec<_> = sink
            .body_entries()
            .iter()
            .filter(|e| e.key == 0x21)
            .map(|e| e.value.to_string())
            .collect();
        assert_eq!(tuples, ["{1, row}", "{2, row}", "{3, row}"]);

        match &sink.events()[0] {
            SinkEvent::Meta(lines) => assert_eq!(lines.len(), 5),
            other => panic!("unexpected first event {other:?}"),
        }
    }

    #[test]
    fn transaction_text() {
        let text = render_records(&transaction_file(), &config()).unwrap();
        assert!(text.contains("meta: 'VClock: {1: 19}'\n"));
        assert!(text.contains(" lsn 22 tm 1700000000.5 tsn 20 is_commit 1 bodycnt 1 "));
        assert!(text.contains("key: 0x10 'space id' value: 512\n"));
        assert!(text.contains("key: 0x21 'tuple' value: {3, row}\n"));
    }

    #[test]
    fn body_type_error_does_not_abort_file() {
        let bad = RecordBuilder::new(RequestType::Insert)
            .lsn(1)
            .body_map(vec![
                (0x10, Value::Uint(1)),
                (0x21, Value::from("not a tuple")),
                (0x11, Value::Uint(0)),
            ]);
        let good = RecordBuilder::new(RequestType::Insert)
            .lsn(2)
            .body_map(vec![(0x10, Value::Uint(2))]);
        let data = LogBuilder::new(WalType::Xlog).rows(&[bad, good]).eof().build();

        let mut sink = CollectingSink::new();
        let summary = decode_bytes(&data, &config(), &mut sink).unwrap();
        assert_eq!(summary.records, 2);
        assert_eq!(summary.body_errors, 1);
        assert_eq!(sink.body_errors().len(), 1);
        let keys: Vec<_> = sink.body_entries().iter().map(|e| e.key).collect();
        assert_eq!(keys, [0x10, 0x10]);

        let text = render_records(&data, &config()).unwrap();
        assert!(text.contains("body error: "));
    }

    #[test]
    fn unknown_header_key_is_fatal() {
        let record = RecordBuilder::new(RequestType::Insert).field(0x2c, Value::Uint(1));
        let data = LogBuilder::new(WalType::Xlog).rows(&[record]).eof().build();
        let err = decode_bytes(&data, &config(), &mut NullSink).unwrap_err();
        assert!(matches!(
            err,
            XlogError::HeaderKey {
                source: HeaderKeyError::UnknownHeaderKey { key: 0x2c },
                ..
            }
        ));
    }

    #[test]
    fn every_signature_decodes() {
        for wal_type in xlog_core::WalType::ALL {
            let data = LogBuilder::new(wal_type).rows(&[nop_record()]).eof().build();
            let mut sink = CollectingSink::new();
            decode_bytes(&data, &config(), &mut sink).unwrap();
            assert_eq!(
                sink.events()[0],
                SinkEvent::Meta(vec![wal_type.signature().to_string(), "0.13".to_string()])
            );
        }
    }

    #[test]
    fn missing_eof() {
        let data = LogBuilder::new(WalType::Xlog).rows(&[nop_record()]).build();
        let err = decode_bytes(&data, &config(), &mut NullSink).unwrap_err();
        assert!(matches!(err, XlogError::Unterminated { .. }));

        let lenient = config().require_eof(false);
        let summary = decode_bytes(&data, &lenient, &mut NullSink).unwrap();
        assert!(!summary.saw_eof);
        assert_eq!(summary.records, 1);
        assert!(matches!(
            summary.check_terminated(),
            Err(XlogError::Unterminated { .. })
        ));
    }

    #[test]
    fn oversize_frame_fails_before_decompression() {
        let header = FrameHeader::new(FrameKind::CompressedRow, 0, 0, 0).to_bytes();
        // Rewrite the length field as a 64-bit uint just over the ceiling.
        let mut frame = header[..4].to_vec();
        frame.push(0xcf);
        frame.extend_from_slice(&(BODY_LEN_MAX + 1).to_be_bytes());
        frame.extend_from_slice(&[0x00, 0x00, 0xa3, 0, 0, 0]);
        assert_eq!(frame.len(), 19);

        let data = LogBuilder::new(WalType::Xlog).raw(&frame).build();
        let mut sink = CollectingSink::new();
        let err = decode_bytes(&data, &config(), &mut sink).unwrap_err();
        assert!(matches!(
            err,
            XlogError::Frame {
                source: FrameError::FrameTooLarge { .. },
                ..
            }
        ));
        assert!(sink.frames().is_empty());
    }

    #[test]
    fn unknown_magic_stops_immediately() {
        let valid_after = LogBuilder::new(WalType::Xlog).rows(&[nop_record()]).eof().build();
        let mut data = b"XLOG\n0.13\n\n".to_vec();
        data.extend_from_slice(&[0xd5, 0xba, 0x0b, 0xac]);
        data.extend_from_slice(&valid_after[11..]);

        let mut sink = CollectingSink::new();
        let err = decode_bytes(&data, &config(), &mut sink).unwrap_err();
        assert!(matches!(
            err,
            XlogError::Frame {
                source: FrameError::InvalidMagic { .. },
                offset: 11,
            }
        ));
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn checksum_verification_rejects_corruption() {
        let mut data = transaction_file();
        let mut sink = CollectingSink::new();
        let strict = config().verify_checksums(true);
        decode_bytes(&data, &strict, &mut sink).unwrap();

        // Flip a byte inside the first frame's tuple string.
        let pos = data
            .windows(3)
            .position(|w| w == b"row")
            .expect("tuple text present");
        data[pos] = b'R';
        assert!(decode_bytes(&data, &config(), &mut NullSink).is_ok());
        let err = decode_bytes(&data, &strict, &mut NullSink).unwrap_err();
        assert!(matches!(
            err,
            XlogError::Frame {
                source: FrameError::ChecksumMismatch { .. },
                ..
            }
        ));
    }

    #[test]
    fn decompressed_ceiling_is_enforced() {
        let big = RecordBuilder::new(RequestType::Insert)
            .lsn(1)
            .body_map(vec![(0x40, Value::Str("x".repeat(8192)))]);
        let data = LogBuilder::new(WalType::Xlog).zrows(&[big]).eof().build();
        let tight = config().initial_scratch_len(1024).max_decompressed_len(4096);
        let err = decode_bytes(&data, &tight, &mut NullSink).unwrap_err();
        assert_eq!(err.stage(), "decompress");

        let roomy = config().initial_scratch_len(1024);
        assert!(decode_bytes(&data, &roomy, &mut NullSink).is_ok());
    }

    #[test]
    fn depth_limit_in_header_is_a_value_error() {
        let mut nested = Value::Nil;
        for _ in 0..8 {
            nested = Value::Array(vec![nested]);
        }
        let record = RecordBuilder::new(RequestType::Insert).field(0x21, nested);
        let data = LogBuilder::new(WalType::Xlog).rows(&[record]).eof().build();
        let err = decode_bytes(&data, &config().max_depth(4), &mut NullSink).unwrap_err();
        assert_eq!(err.stage(), "value");
        assert!(decode_bytes(&data, &config(), &mut NullSink).is_ok());
    }

    #[test]
    fn decodes_from_disk() {
        let (_dir, path) = write_temp_log("00000000000000000000.xlog", &transaction_file());
        let mut sink = CollectingSink::new();
        let summary = decode_file(&path, &config(), &mut sink).unwrap();
        assert_eq!(summary.records, 3);
    }

    proptest! {
        #[test]
        fn frame_preamble_reencodes_exactly(header in frame_header_strategy()) {
            let bytes = header.to_bytes();
            let expected = if header.kind == FrameKind::Eof { 4 } else { 19 };
            prop_assert_eq!(bytes.len(), expected);
            let parsed = parse_frame(&bytes).unwrap();
            prop_assert_eq!(parsed, header);
            prop_assert_eq!(parsed.to_bytes(), bytes);
        }

        #[test]
        fn tsn_is_recovered_from_delta((lsn, delta) in lsn_delta_strategy(), commit in any::<bool>()) {
            let bytes = RecordBuilder::new(RequestType::Insert)
                .lsn(lsn)
                .tsn_delta(delta)
                .commit(commit)
                .encode();
            let (header, _) = decode_record(&bytes, 0, true, 128).unwrap();
            prop_assert_eq!(header.tsn, (lsn - delta) as i64);
            prop_assert_eq!(header.is_commit, commit);
        }

        #[test]
        fn commit_without_tsn(lsn in any::<u32>(), flags in any::<u64>()) {
            let bytes = RecordBuilder::new(RequestType::Update)
                .lsn(u64::from(lsn))
                .flags(flags)
                .encode();
            let (header, _) = decode_record(&bytes, 0, true, 128).unwrap();
            prop_assert!(header.is_commit);
            prop_assert_eq!(header.tsn, i64::from(lsn));
        }

        #[test]
        fn generated_records_decode(
            records in prop::collection::vec(record_strategy(), 1..6),
            compress in any::<bool>(),
        ) {
            let builder = LogBuilder::new(WalType::Xlog);
            let builder = if compress {
                builder.zrows(&records)
            } else {
                builder.rows(&records)
            };
            let data = builder.eof().build();
            let mut sink = CollectingSink::new();
            let summary = decode_bytes(&data, &config().verify_checksums(true), &mut sink).unwrap();
            prop_assert_eq!(summary.records, records.len());
            prop_assert_eq!(summary.body_errors, 0);
            prop_assert!(summary.saw_eof);

            let captured = sink.records();
            for (record, written) in captured.iter().zip(&records) {
                let header_len = written.encode_header().len();
                let body = &written.encode()[header_len..];
                prop_assert_eq!(record.body.as_deref(), Some(body));
            }
        }
    }
}
