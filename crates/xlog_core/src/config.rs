//! Decoder configuration.

use crate::constants::BODY_LEN_MAX;
use xlog_codec::DEFAULT_MAX_DEPTH;

/// Configuration for decoding a log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum nesting depth of any single value.
    pub max_depth: usize,

    /// Ceiling for the decompressed size of one frame.
    pub max_decompressed_len: usize,

    /// Whether to check each payload against its CRC32C.
    pub verify_checksums: bool,

    /// Whether input that ends without an EOF marker is an error.
    pub require_eof: bool,

    /// Initial size of the decompression scratch buffer.
    pub initial_scratch_len: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_decompressed_len: BODY_LEN_MAX as usize, // 2 GiB
            verify_checksums: false,
            require_eof: true,
            initial_scratch_len: 64 * 1024, // 64 KB
        }
    }
}

impl DecoderConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum value nesting depth.
    #[must_use]
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the decompressed size ceiling.
    #[must_use]
    pub const fn max_decompressed_len(mut self, len: usize) -> Self {
        self.max_decompressed_len = len;
        self
    }

    /// Sets whether payload checksums are verified.
    #[must_use]
    pub const fn verify_checksums(mut self, value: bool) -> Self {
        self.verify_checksums = value;
        self
    }

    /// Sets whether a missing EOF marker is an error.
    #[must_use]
    pub const fn require_eof(mut self, value: bool) -> Self {
        self.require_eof = value;
        self
    }

    /// Sets the initial scratch buffer size.
    #[must_use]
    pub const fn initial_scratch_len(mut self, len: usize) -> Self {
        self.initial_scratch_len = len;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = DecoderConfig::default();
        assert_eq!(config.max_depth, 128);
        assert_eq!(config.max_decompressed_len, 2 * 1024 * 1024 * 1024);
        assert!(!config.verify_checksums);
        assert!(config.require_eof);
        assert_eq!(config.initial_scratch_len, 64 * 1024);
    }

    #[test]
    fn builder_pattern() {
        let config = DecoderConfig::new()
            .max_depth(16)
            .max_decompressed_len(1024)
            .verify_checksums(true)
            .require_eof(false)
            .initial_scratch_len(128);

        assert_eq!(config.max_depth, 16);
        assert_eq!(config.max_decompressed_len, 1024);
        assert!(config.verify_checksums);
        assert!(!config.require_eof);
        assert_eq!(config.initial_scratch_len, 128);
    }
}
