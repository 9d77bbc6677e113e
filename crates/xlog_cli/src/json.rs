//! JSON Lines output.

use serde::Serialize;
use std::io::{self, Write};
use xlog_core::{BodyEntry, BodyKeyTypeError, CapturedRecord, Meta, RecordHeader, RecordSink};

/// One output line.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Line<'a> {
    Meta {
        file_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        version: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        instance: Option<String>,
        lines: &'a [String],
    },
    Record(&'a PendingRecord),
}

#[derive(Debug, Serialize)]
struct PendingRecord {
    #[serde(flatten)]
    header: CapturedRecord,
    body: Vec<BodyEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body_error: Option<String>,
}

/// Writes the metadata block and then one JSON object per record.
///
/// A record is held until its body has been reported, so [`finish`] must be
/// called once decoding stops.
///
/// [`finish`]: JsonRenderer::finish
#[derive(Debug)]
pub struct JsonRenderer<W: Write> {
    out: W,
    pending: Option<PendingRecord>,
}

impl<W: Write> JsonRenderer<W> {
    /// Renders to `out`.
    pub fn new(out: W) -> Self {
        Self { out, pending: None }
    }

    /// Writes any held record and flushes.
    pub fn finish(&mut self) -> io::Result<()> {
        self.flush_pending()?;
        self.out.flush()
    }

    /// Returns the underlying writer.
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &Line<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, line)?;
        self.out.write_all(b"\n")
    }

    fn flush_pending(&mut self) -> io::Result<()> {
        if let Some(record) = self.pending.take() {
            self.write_line(&Line::Record(&record))?;
        }
        Ok(())
    }
}

impl<W: Write> RecordSink for JsonRenderer<W> {
    fn meta(&mut self, meta: &Meta) -> io::Result<()> {
        self.write_line(&Line::Meta {
            file_type: meta.wal_type().to_string(),
            version: meta.version(),
            instance: meta.instance().map(|u| u.to_string()),
            lines: meta.lines(),
        })
    }

    fn record(&mut self, header: &RecordHeader<'_>) -> io::Result<()> {
        self.flush_pending()?;
        self.pending = Some(PendingRecord {
            header: header.into(),
            body: Vec::new(),
            body_error: None,
        });
        Ok(())
    }

    fn body_entry(&mut self, entry: &BodyEntry) -> io::Result<()> {
        if let Some(record) = &mut self.pending {
            record.body.push(entry.clone());
        }
        Ok(())
    }

    fn body_error(&mut self, error: &BodyKeyTypeError) -> io::Result<()> {
        if let Some(record) = &mut self.pending {
            record.body_error = Some(error.to_string());
        }
        Ok(())
    }

    fn frame_end(&mut self) -> io::Result<()> {
        self.flush_pending()
    }
}
