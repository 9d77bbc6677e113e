//! Builders for records and log files.

use std::path::PathBuf;
use tempfile::TempDir;
use xlog_codec::{to_msgpack, Value};
use xlog_core::constants::{header_key, FLAG_COMMIT};
use xlog_core::{payload_checksum, FrameHeader, FrameKind, RequestType, WalType};

/// zstd level used for compressed frames.
pub const ZSTD_LEVEL: i32 = 3;

/// Builds one encoded record: a header map and an optional body.
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    fields: Vec<(u64, Value)>,
    body: Option<Value>,
}

impl RecordBuilder {
    /// Starts a record of the given type.
    pub fn new(request_type: RequestType) -> Self {
        Self::with_type_code(request_type.code())
    }

    /// Starts a record with a raw type code.
    pub fn with_type_code(code: u32) -> Self {
        Self::default().field(header_key::REQUEST_TYPE, Value::Uint(u64::from(code)))
    }

    /// Starts a record with no type key.
    pub fn untyped() -> Self {
        Self::default()
    }

    /// Appends a raw header entry.
    pub fn field(mut self, key: u64, value: Value) -> Self {
        self.fields.push((key, value));
        self
    }

    /// Sets the sync number.
    pub fn sync(self, sync: u64) -> Self {
        self.field(header_key::SYNC, Value::Uint(sync))
    }

    /// Sets the replica id.
    pub fn replica_id(self, id: u32) -> Self {
        self.field(header_key::REPLICA_ID, Value::Uint(u64::from(id)))
    }

    /// Sets the group id.
    pub fn group_id(self, id: u32) -> Self {
        self.field(header_key::GROUP_ID, Value::Uint(u64::from(id)))
    }

    /// Sets the LSN.
    pub fn lsn(self, lsn: u64) -> Self {
        self.field(header_key::LSN, Value::Uint(lsn))
    }

    /// Sets the timestamp.
    pub fn timestamp(self, tm: f64) -> Self {
        self.field(header_key::TIMESTAMP, Value::Double(tm))
    }

    /// Sets the schema version.
    pub fn schema_version(self, version: u32) -> Self {
        self.field(header_key::SCHEMA_VERSION, Value::Uint(u64::from(version)))
    }

    /// Sets the transaction id delta from the LSN.
    pub fn tsn_delta(self, delta: u64) -> Self {
        self.field(header_key::TSN, Value::Uint(delta))
    }

    /// Sets the flags word.
    pub fn flags(self, flags: u64) -> Self {
        self.field(header_key::FLAGS, Value::Uint(flags))
    }

    /// Sets or clears the commit flag.
    pub fn commit(self, commit: bool) -> Self {
        self.flags(if commit { FLAG_COMMIT } else { 0 })
    }

    /// Sets the body value.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets a body map from integer keys.
    pub fn body_map(self, entries: Vec<(u64, Value)>) -> Self {
        self.body(Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Value::Uint(k), v))
                .collect(),
        ))
    }

    /// Header map bytes only.
    pub fn encode_header(&self) -> Vec<u8> {
        to_msgpack(&Value::Map(
            self.fields
                .iter()
                .map(|(k, v)| (Value::Uint(*k), v.clone()))
                .collect(),
        ))
    }

    /// Header followed by the body, if any.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.encode_header();
        if let Some(body) = &self.body {
            out.extend(to_msgpack(body));
        }
        out
    }
}

/// Concatenates encoded records into row data.
pub fn encode_rows(records: &[RecordBuilder]) -> Vec<u8> {
    records.iter().flat_map(RecordBuilder::encode).collect()
}

/// Builds a log file: signature, metadata, frames.
#[derive(Debug, Clone)]
pub struct LogBuilder {
    meta: Vec<String>,
    frames: Vec<u8>,
    last_crc: u32,
}

impl LogBuilder {
    /// Starts a file with the given signature and version `0.13`.
    pub fn new(wal_type: WalType) -> Self {
        Self {
            meta: vec![wal_type.signature().to_string(), "0.13".to_string()],
            frames: Vec::new(),
            last_crc: 0,
        }
    }

    /// Starts a file whose metadata is exactly `lines`.
    pub fn with_meta_lines(lines: &[&str]) -> Self {
        Self {
            meta: lines.iter().map(|l| (*l).to_string()).collect(),
            frames: Vec::new(),
            last_crc: 0,
        }
    }

    /// Appends a metadata line.
    pub fn meta_line(mut self, line: impl Into<String>) -> Self {
        self.meta.push(line.into());
        self
    }

    /// Appends a frame with explicit preamble fields.
    pub fn frame(mut self, kind: FrameKind, payload: &[u8], crc32p: u32, crc32c: u32) -> Self {
        let len = u32::try_from(payload.len()).expect("payload fits a frame");
        self.frames
            .extend(FrameHeader::new(kind, len, crc32p, crc32c).to_bytes());
        self.frames.extend_from_slice(payload);
        self.last_crc = crc32c;
        self
    }

    /// Appends a frame with correct checksums.
    pub fn checked_frame(self, kind: FrameKind, payload: &[u8]) -> Self {
        let crc32p = self.last_crc;
        self.frame(kind, payload, crc32p, payload_checksum(payload))
    }

    /// Appends an uncompressed frame holding `rows`.
    pub fn row_frame(self, rows: &[u8]) -> Self {
        self.checked_frame(FrameKind::Row, rows)
    }

    /// Appends a compressed frame holding `rows`.
    pub fn zrow_frame(self, rows: &[u8]) -> Self {
        let payload = zstd::bulk::compress(rows, ZSTD_LEVEL).expect("zstd compression");
        self.checked_frame(FrameKind::CompressedRow, &payload)
    }

    /// Appends an uncompressed frame holding `records`.
    pub fn rows(self, records: &[RecordBuilder]) -> Self {
        self.row_frame(&encode_rows(records))
    }

    /// Appends a compressed frame holding `records`.
    pub fn zrows(self, records: &[RecordBuilder]) -> Self {
        self.zrow_frame(&encode_rows(records))
    }

    /// Appends raw bytes.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.frames.extend_from_slice(bytes);
        self
    }

    /// Appends the EOF marker.
    pub fn eof(self) -> Self {
        self.raw(&FrameHeader::eof().to_bytes())
    }

    /// Length of the metadata block including its blank line.
    pub fn meta_len(&self) -> usize {
        self.meta.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    /// The finished file.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.meta_len() + self.frames.len());
        for line in &self.meta {
            out.extend_from_slice(line.as_bytes());
            out.push(b'\n');
        }
        out.push(b'\n');
        out.extend_from_slice(&self.frames);
        out
    }
}

/// Writes `data` to a file in a fresh temporary directory.
///
/// The directory is removed when the returned guard drops.
pub fn write_temp_log(name: &str, data: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, data).expect("Failed to write log file");
    (dir, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xlog_core::{decode_record, locate_meta_end, parse_frame};

    #[test]
    fn record_round_trips_through_decoder() {
        let bytes = RecordBuilder::new(RequestType::Insert)
            .replica_id(1)
            .lsn(7)
            .body_map(vec![(0x10, Value::Uint(512))])
            .encode();
        let (header, end) = decode_record(&bytes, 0, true, 128).unwrap();
        assert_eq!(end, bytes.len());
        assert_eq!(header.type_name(), "INSERT");
        assert_eq!(header.replica_id, 1);
        assert_eq!(header.bodycnt(), 1);
    }

    #[test]
    fn log_layout() {
        let builder = LogBuilder::new(WalType::Snap)
            .meta_line("Version: 2.10.0")
            .row_frame(&[0x80])
            .eof();
        let data = builder.build();
        assert!(data.starts_with(b"SNAP\n0.13\nVersion: 2.10.0\n\n"));
        assert_eq!(locate_meta_end(&data), Ok(builder.meta_len()));

        let header = parse_frame(&data[builder.meta_len()..]).unwrap();
        assert_eq!(header.kind, FrameKind::Row);
        assert_eq!(header.len, 1);
        assert_eq!(header.crc32c, 0x82f6_3b78);
        assert!(data.ends_with(&FrameKind::Eof.magic_bytes()));
    }

    #[test]
    fn previous_checksum_chains() {
        let data = LogBuilder::new(WalType::Xlog)
            .row_frame(&[0x80])
            .row_frame(&[0x81, 0x01, 0x02])
            .build();
        let first = parse_frame(&data[11..]).unwrap();
        let second = parse_frame(&data[11 + first.frame_len()..]).unwrap();
        assert_eq!(second.crc32p, first.crc32c);
    }

    #[test]
    fn temp_log_is_written() {
        let (_dir, path) = write_temp_log("a.xlog", b"XLOG\n\n");
        assert_eq!(std::fs::read(path).unwrap(), b"XLOG\n\n");
    }
}
