//! Log source trait definition.

/// A read-only, contiguous view of a log file.
///
/// # Invariants
///
/// - `bytes` returns the same slice for the lifetime of the source
/// - `len` equals `bytes().len()`
///
/// # Implementors
///
/// - [`super::MappedFile`] - For files on disk
/// - [`super::InMemorySource`] - For tests
pub trait LogSource {
    /// The full contents of the source.
    fn bytes(&self) -> &[u8];

    /// Size of the source in bytes.
    fn len(&self) -> usize {
        self.bytes().len()
    }

    /// Whether the source holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSource for [u8] {
    fn bytes(&self) -> &[u8] {
        self
    }
}

impl LogSource for Vec<u8> {
    fn bytes(&self) -> &[u8] {
        self
    }
}
