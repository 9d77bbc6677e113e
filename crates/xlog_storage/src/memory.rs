//! In-memory log source.

use crate::error::StorageResult;
use crate::source::LogSource;
use std::io::Read;

/// An owned buffer exposed as a log source.
///
/// Suitable for unit tests, fuzzing and input read from a pipe.
///
/// # Example
///
/// ```rust
/// use xlog_storage::{LogSource, InMemorySource};
///
/// let source = InMemorySource::new(vec![1, 2, 3]);
/// assert_eq!(source.bytes(), &[1, 2, 3]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemorySource {
    data: Vec<u8>,
}

impl InMemorySource {
    /// Wraps an owned buffer.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Reads a reader to its end.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`](crate::StorageError::Io) if reading
    /// fails.
    pub fn from_reader<R: Read>(mut reader: R) -> StorageResult<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self { data })
    }

    /// Returns the underlying buffer.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl LogSource for InMemorySource {
    fn bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for InMemorySource {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_empty() {
        let source = InMemorySource::default();
        assert!(source.is_empty());
        assert_eq!(source.len(), 0);
    }

    #[test]
    fn memory_bytes() {
        let source = InMemorySource::from(b"SNAP\n".to_vec());
        assert_eq!(source.len(), 5);
        assert_eq!(source.bytes(), b"SNAP\n");
        assert_eq!(source.into_inner(), b"SNAP\n".to_vec());
    }

    #[test]
    fn memory_from_reader() {
        let source = InMemorySource::from_reader(&b"XLOG"[..]).unwrap();
        assert_eq!(source.bytes(), b"XLOG");
    }

    struct BrokenPipe;

    impl Read for BrokenPipe {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn memory_from_failing_reader() {
        let err = InMemorySource::from_reader(BrokenPipe).unwrap_err();
        assert!(matches!(err, crate::StorageError::Io(_)));
    }

    #[test]
    fn slices_are_sources() {
        let v = vec![9u8, 8];
        assert_eq!(LogSource::len(&v), 2);
        assert_eq!(LogSource::bytes(&v[..1]), &[9]);
    }
}
