//! Sinks that render or capture decoded items.

use crate::body::BodyEntry;
use crate::driver::RecordSink;
use crate::error::BodyKeyTypeError;
use crate::frame::FrameHeader;
use crate::meta::Meta;
use crate::row::RecordHeader;
use serde::Serialize;
use std::io::{self, Write};

const HR: &str = "-------";

/// Line-oriented text output.
///
/// ```text
/// meta: 'XLOG'
/// fixed header
/// -------
///   magic 0xd5ba0bab crc32p 0x0 crc32c 0x6b2b1aa5 len 12
/// -------
/// xrow header
/// -------
///   type 0x2 (INSERT) replica_id 0x1 group_id 0x0 sync 0 lsn 10 tm 0 tsn 10 is_commit 1 bodycnt 1 schema_version 0x0
///     iov: len 7
/// -------
/// key: 0x10 'space id' value: 512
/// -------
/// ```
#[derive(Debug)]
pub struct TextRenderer<W: Write> {
    out: W,
    show_frames: bool,
}

impl<W: Write> TextRenderer<W> {
    /// Renders to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            show_frames: true,
        }
    }

    /// Whether to print frame preambles. Records print the same either way.
    #[must_use]
    pub fn show_frames(mut self, value: bool) -> Self {
        self.show_frames = value;
        self
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for TextRenderer<W> {
    fn meta(&mut self, meta: &Meta) -> io::Result<()> {
        for line in meta.lines() {
            writeln!(self.out, "meta: '{line}'")?;
        }
        Ok(())
    }

    fn frame(&mut self, _offset: usize, header: &FrameHeader) -> io::Result<()> {
        if !self.show_frames {
            return Ok(());
        }
        writeln!(self.out, "fixed header")?;
        writeln!(self.out, "{HR}")?;
        writeln!(
            self.out,
            "  magic {:#x} crc32p {:#x} crc32c {:#x} len {}",
            header.kind.magic(),
            header.crc32p,
            header.crc32c,
            header.len
        )?;
        writeln!(self.out, "{HR}")
    }

    fn record(&mut self, h: &RecordHeader<'_>) -> io::Result<()> {
        writeln!(self.out, "xrow header")?;
        writeln!(self.out, "{HR}")?;
        writeln!(
            self.out,
            "  type {:#x} ({}) replica_id {:#x} group_id {:#x} sync {} lsn {} tm {} tsn {} \
             is_commit {} bodycnt {} schema_version {:#x}",
            h.request_type,
            h.type_name(),
            h.replica_id,
            h.group_id,
            h.sync,
            h.lsn,
            h.timestamp,
            h.tsn,
            u8::from(h.is_commit),
            h.bodycnt(),
            h.schema_version
        )?;
        if let Some(body) = h.body {
            writeln!(self.out, "    iov: len {}", body.len())?;
        }
        writeln!(self.out, "{HR}")
    }

    fn body_entry(&mut self, entry: &BodyEntry) -> io::Result<()> {
        writeln!(
            self.out,
            "key: {:#x} '{}' value: {}",
            entry.key,
            entry.name.unwrap_or("unknown"),
            entry.value
        )
    }

    fn body_error(&mut self, error: &BodyKeyTypeError) -> io::Result<()> {
        writeln!(self.out, "body error: {error}")
    }

    fn frame_end(&mut self) -> io::Result<()> {
        writeln!(self.out, "{HR}")?;
        self.out.flush()
    }
}

/// Owned copy of a [`RecordHeader`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapturedRecord {
    /// Request type code.
    pub request_type: u32,
    /// Request type name.
    pub type_name: &'static str,
    /// Originating replica.
    pub replica_id: u32,
    /// Replication group.
    pub group_id: u32,
    /// Request sync number.
    pub sync: u64,
    /// Log sequence number.
    pub lsn: i64,
    /// Timestamp.
    pub timestamp: f64,
    /// Transaction id.
    pub tsn: i64,
    /// Whether the record ends its transaction.
    pub is_commit: bool,
    /// Schema version.
    pub schema_version: u32,
    /// Number of body values.
    pub bodycnt: usize,
    /// Raw body bytes.
    #[serde(skip)]
    pub body: Option<Vec<u8>>,
}

impl From<&RecordHeader<'_>> for CapturedRecord {
    fn from(h: &RecordHeader<'_>) -> Self {
        Self {
            request_type: h.request_type,
            type_name: h.type_name(),
            replica_id: h.replica_id,
            group_id: h.group_id,
            sync: h.sync,
            lsn: h.lsn,
            timestamp: h.timestamp,
            tsn: h.tsn,
            is_commit: h.is_commit,
            schema_version: h.schema_version,
            bodycnt: h.bodycnt(),
            body: h.body.map(<[u8]>::to_vec),
        }
    }
}

/// One item reported to a [`CollectingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    /// Metadata lines.
    Meta(Vec<String>),
    /// A frame preamble and its offset.
    Frame(usize, FrameHeader),
    /// A record header.
    Record(CapturedRecord),
    /// A body entry.
    BodyEntry(BodyEntry),
    /// A body error.
    BodyError(BodyKeyTypeError),
    /// End of a frame's records.
    FrameEnd,
}

/// Captures everything reported, in order.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    events: Vec<SinkEvent>,
}

impl CollectingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in order.
    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    /// Captured records.
    pub fn records(&self) -> Vec<&CapturedRecord> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Record(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    /// Captured body entries.
    pub fn body_entries(&self) -> Vec<&BodyEntry> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::BodyEntry(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    /// Captured body errors.
    pub fn body_errors(&self) -> Vec<&BodyKeyTypeError> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::BodyError(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    /// Captured frame preambles.
    pub fn frames(&self) -> Vec<&FrameHeader> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Frame(_, h) => Some(h),
                _ => None,
            })
            .collect()
    }
}

impl RecordSink for CollectingSink {
    fn meta(&mut self, meta: &Meta) -> io::Result<()> {
        self.events.push(SinkEvent::Meta(meta.lines().to_vec()));
        Ok(())
    }

    fn frame(&mut self, offset: usize, header: &FrameHeader) -> io::Result<()> {
        self.events.push(SinkEvent::Frame(offset, *header));
        Ok(())
    }

    fn record(&mut self, header: &RecordHeader<'_>) -> io::Result<()> {
        self.events.push(SinkEvent::Record(header.into()));
        Ok(())
    }

    fn body_entry(&mut self, entry: &BodyEntry) -> io::Result<()> {
        self.events.push(SinkEvent::BodyEntry(entry.clone()));
        Ok(())
    }

    fn body_error(&mut self, error: &BodyKeyTypeError) -> io::Result<()> {
        self.events.push(SinkEvent::BodyError(error.clone()));
        Ok(())
    }

    fn frame_end(&mut self) -> io::Result<()> {
        self.events.push(SinkEvent::FrameEnd);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameKind;
    use crate::meta::WalType;
    use xlog_codec::Value;

    fn render(f: impl FnOnce(&mut TextRenderer<Vec<u8>>) -> io::Result<()>) -> String {
        let mut r = TextRenderer::new(Vec::new());
        f(&mut r).unwrap();
        String::from_utf8(r.into_inner()).unwrap()
    }

    #[test]
    fn meta_lines() {
        let meta = Meta::parse(WalType::Xlog, b"XLOG\n0.13\n");
        assert_eq!(render(|r| r.meta(&meta)), "meta: 'XLOG'\nmeta: '0.13'\n");
    }

    #[test]
    fn fixed_header_block() {
        let header = FrameHeader::new(FrameKind::Row, 12, 0, 0xab);
        let text = render(|r| r.frame(0, &header));
        assert_eq!(
            text,
            "fixed header\n-------\n  magic 0xd5ba0bab crc32p 0x0 crc32c 0xab len 12\n-------\n"
        );
    }

    #[test]
    fn frames_can_be_hidden() {
        let header = FrameHeader::new(FrameKind::Row, 12, 0, 0xab);
        let mut r = TextRenderer::new(Vec::new()).show_frames(false);
        r.frame(0, &header).unwrap();
        assert!(r.into_inner().is_empty());
    }

    #[test]
    fn record_block() {
        let body = [0x80u8];
        let header = RecordHeader {
            request_type: 2,
            replica_id: 1,
            lsn: 10,
            tsn: 10,
            is_commit: true,
            body: Some(&body),
            ..RecordHeader::default()
        };
        let text = render(|r| r.record(&header));
        assert!(text.starts_with("xrow header\n-------\n  type 0x2 (INSERT) replica_id 0x1"));
        assert!(text.contains(" lsn 10 tm 0 tsn 10 is_commit 1 bodycnt 1 "));
        assert!(text.contains("    iov: len 1\n"));
    }

    #[test]
    fn body_entries() {
        let entry = BodyEntry {
            key: 0x21,
            name: Some("tuple"),
            known: true,
            value: Value::Array(vec![Value::Uint(1), Value::from("x")]),
        };
        assert_eq!(
            render(|r| r.body_entry(&entry)),
            "key: 0x21 'tuple' value: {1, x}\n"
        );

        let entry = BodyEntry {
            key: 0x60,
            name: None,
            known: false,
            value: Value::Nil,
        };
        assert_eq!(
            render(|r| r.body_entry(&entry)),
            "key: 0x60 'unknown' value: nil\n"
        );
    }

    #[test]
    fn collecting_sink_captures_in_order() {
        let mut sink = CollectingSink::new();
        let header = RecordHeader {
            lsn: 3,
            ..RecordHeader::default()
        };
        sink.frame(5, &FrameHeader::eof()).unwrap();
        sink.record(&header).unwrap();
        sink.frame_end().unwrap();

        assert_eq!(sink.events().len(), 3);
        assert_eq!(sink.records()[0].lsn, 3);
        assert_eq!(sink.records()[0].type_name, "OK");
        assert_eq!(sink.frames()[0].kind, FrameKind::Eof);
        assert_eq!(sink.events()[2], SinkEvent::FrameEnd);
    }
}
