//! File signature detection and the metadata block.
//!
//! Every log file starts with a text block such as:
//!
//! ```text
//! XLOG
//! 0.13
//! Version: 2.10.0
//! Instance: 4c1e2f0a-8a6b-4d7e-9c3b-0f1e2d3c4b5a
//! VClock: {1: 10}
//!
//! ```
//!
//! The first line is the file type, the second the format version, and the
//! rest are `Key: value` pairs. A blank line ends the block.

use crate::constants::MAGIC_SIZE;
use crate::error::FormatError;
use std::fmt;
use uuid::Uuid;

/// Type of log file, from its signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalType {
    /// Memtx snapshot.
    Snap,
    /// Write-ahead log.
    Xlog,
    /// Vinyl metadata log.
    VyLog,
    /// Vinyl run file.
    Run,
    /// Vinyl index file.
    Index,
}

impl WalType {
    /// Signatures in detection order.
    pub const ALL: [WalType; 5] = [Self::Snap, Self::Xlog, Self::VyLog, Self::Run, Self::Index];

    /// Leading signature text.
    pub const fn signature(self) -> &'static str {
        match self {
            Self::Snap => "SNAP",
            Self::Xlog => "XLOG",
            Self::VyLog => "VYLOG",
            Self::Run => "RUN",
            Self::Index => "INDEX",
        }
    }

    /// Detects the file type from its leading bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::TooSmall`] for input shorter than a magic and
    /// [`FormatError::UnsupportedFormat`] if no signature matches.
    pub fn detect(data: &[u8]) -> Result<Self, FormatError> {
        if data.len() < MAGIC_SIZE {
            return Err(FormatError::TooSmall { size: data.len() });
        }
        Self::ALL
            .into_iter()
            .find(|t| data.starts_with(t.signature().as_bytes()))
            .ok_or(FormatError::UnsupportedFormat)
    }
}

impl fmt::Display for WalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signature())
    }
}

/// Finds the end of the metadata block and returns the offset of the first
/// payload byte.
///
/// # Errors
///
/// Returns [`FormatError::MissingMetaBoundary`] if there is no blank line and
/// [`FormatError::EmptyPayload`] if nothing follows it.
pub fn locate_meta_end(data: &[u8]) -> Result<usize, FormatError> {
    let boundary = data
        .windows(2)
        .position(|w| w == b"\n\n")
        .ok_or(FormatError::MissingMetaBoundary)?;
    let end = boundary + 2;
    if end >= data.len() {
        return Err(FormatError::EmptyPayload);
    }
    Ok(end)
}

/// The parsed metadata block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    wal_type: WalType,
    lines: Vec<String>,
}

impl Meta {
    /// Splits a metadata block into its non-empty lines.
    pub fn parse(wal_type: WalType, block: &[u8]) -> Self {
        let lines = block
            .split(|&b| b == b'\n')
            .filter(|line| !line.is_empty())
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect();
        Self { wal_type, lines }
    }

    /// File type.
    pub fn wal_type(&self) -> WalType {
        self.wal_type
    }

    /// All non-empty lines, signature line included.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Format version, the second line.
    pub fn version(&self) -> Option<&str> {
        self.lines.get(1).map(String::as_str)
    }

    /// `Key: value` pairs in order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines
            .iter()
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim(), v.trim()))
    }

    /// Value of the first pair named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Instance UUID, when present and well formed.
    pub fn instance(&self) -> Option<Uuid> {
        self.get("Instance").and_then(|v| Uuid::parse_str(v).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_signatures() {
        assert_eq!(WalType::detect(b"SNAP\n"), Ok(WalType::Snap));
        assert_eq!(WalType::detect(b"XLOG\n"), Ok(WalType::Xlog));
        assert_eq!(WalType::detect(b"VYLOG\n"), Ok(WalType::VyLog));
        assert_eq!(WalType::detect(b"RUN\n\n"), Ok(WalType::Run));
        assert_eq!(WalType::detect(b"INDEX\n"), Ok(WalType::Index));
    }

    #[test]
    fn detect_rejects() {
        assert_eq!(WalType::detect(b"XLO"), Err(FormatError::TooSmall { size: 3 }));
        assert_eq!(WalType::detect(b"ABCD\n"), Err(FormatError::UnsupportedFormat));
        // Too short for the five-byte signature it starts like.
        assert_eq!(WalType::detect(b"VYLO"), Err(FormatError::UnsupportedFormat));
    }

    #[test]
    fn meta_boundary() {
        assert_eq!(locate_meta_end(b"XLOG\n0.13\n\n\xd5"), Ok(11));
        assert_eq!(
            locate_meta_end(b"XLOG\n0.13\n"),
            Err(FormatError::MissingMetaBoundary)
        );
        assert_eq!(locate_meta_end(b"XLOG\n0.13\n\n"), Err(FormatError::EmptyPayload));
    }

    #[test]
    fn meta_lines_and_pairs() {
        let block = b"XLOG\n0.13\nVersion: 2.10.0\nInstance: 4c1e2f0a-8a6b-4d7e-9c3b-0f1e2d3c4b5a\nVClock: {1: 10}\n";
        let meta = Meta::parse(WalType::Xlog, block);
        assert_eq!(meta.lines().len(), 5);
        assert_eq!(meta.lines()[0], "XLOG");
        assert_eq!(meta.version(), Some("0.13"));
        assert_eq!(meta.get("Version"), Some("2.10.0"));
        assert_eq!(meta.get("VClock"), Some("{1: 10}"));
        assert_eq!(
            meta.instance().map(|u| u.to_string()),
            Some("4c1e2f0a-8a6b-4d7e-9c3b-0f1e2d3c4b5a".to_string())
        );
        assert_eq!(meta.wal_type().to_string(), "XLOG");
    }

    #[test]
    fn malformed_instance_ignored() {
        let meta = Meta::parse(WalType::Snap, b"SNAP\n0.13\nInstance: nope\n");
        assert_eq!(meta.get("Instance"), Some("nope"));
        assert_eq!(meta.instance(), None);
    }
}
