//! Streaming zstd decompression of compressed row frames.

use crate::error::DecompressionError;
use tracing::trace;
use zstd::stream::raw::{Decoder, InBuffer, Operation, OutBuffer};

/// Inflates compressed frame payloads into a reusable scratch buffer.
///
/// One decompressor serves a whole file. The zstd context is reset at the
/// start of every frame, and the scratch buffer grows on demand up to the
/// configured ceiling and is reused across frames. The context is released
/// when this value is dropped.
pub struct StreamDecompressor {
    ctx: Decoder<'static>,
    scratch: Vec<u8>,
    initial_len: usize,
    max_len: usize,
}

impl std::fmt::Debug for StreamDecompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamDecompressor")
            .field("scratch_len", &self.scratch.len())
            .field("max_len", &self.max_len)
            .finish_non_exhaustive()
    }
}

impl StreamDecompressor {
    /// Creates a decompressor whose output never exceeds `max_len` bytes per
    /// frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the zstd context cannot be created.
    pub fn new(initial_len: usize, max_len: usize) -> Result<Self, DecompressionError> {
        let ctx = Decoder::new().map_err(DecompressionError::Stream)?;
        Ok(Self {
            ctx,
            scratch: Vec::new(),
            initial_len: initial_len.clamp(1, max_len.max(1)),
            max_len,
        })
    }

    /// Current scratch buffer size.
    pub fn capacity(&self) -> usize {
        self.scratch.len()
    }

    /// Decompresses one frame payload and returns the inflated bytes.
    ///
    /// The returned slice borrows the scratch buffer and is valid until the
    /// next call.
    ///
    /// # Errors
    ///
    /// Returns [`DecompressionError::Stream`] if zstd rejects the input,
    /// [`DecompressionError::OutputTooLarge`] if the output would exceed the
    /// ceiling, and [`DecompressionError::Incomplete`] if the input ends
    /// inside a zstd frame.
    pub fn decompress(&mut self, src: &[u8]) -> Result<&[u8], DecompressionError> {
        self.ctx.reinit().map_err(DecompressionError::Stream)?;

        let mut input = InBuffer::around(src);
        let mut written = 0usize;

        loop {
            if written == self.scratch.len() && written < self.max_len {
                self.grow();
            }
            // At the ceiling the decoder still runs once with no room left,
            // so a stream that ends exactly at the limit is accepted.
            let at_ceiling = written == self.scratch.len();

            let consumed_before = input.pos();
            let mut output = OutBuffer::around(&mut self.scratch[written..]);
            let hint = self
                .ctx
                .run(&mut input, &mut output)
                .map_err(DecompressionError::Stream)?;
            let produced = output.pos();
            written += produced;

            if hint == 0 && input.pos() == src.len() {
                break;
            }
            if at_ceiling {
                return Err(DecompressionError::OutputTooLarge {
                    limit: self.max_len,
                });
            }
            if produced == 0 && input.pos() == consumed_before {
                return Err(DecompressionError::Incomplete);
            }
        }

        trace!(compressed = src.len(), decompressed = written, "inflated frame");
        Ok(&self.scratch[..written])
    }

    fn grow(&mut self) {
        let current = self.scratch.len();
        let next = if current == 0 {
            self.initial_len
        } else {
            current.saturating_mul(2)
        };
        self.scratch.resize(next.min(self.max_len), 0);
    }
}
