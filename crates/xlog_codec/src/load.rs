//! Unaligned fixed-width loads from raw bytes.
//!
//! The plain `load_*` helpers read in host byte order, which is how the
//! frame magic is compared. The `_be` variants read network order and back
//! the MessagePack decoder.
//!
//! Callers guarantee that `offset + width <= buf.len()`; an out-of-range
//! read panics on the slice index.

macro_rules! load_fn {
    ($name:ident, $be:ident, $ty:ty, $width:expr) => {
        /// Loads a value in host byte order at `offset`.
        #[inline]
        #[must_use]
        pub fn $name(buf: &[u8], offset: usize) -> $ty {
            let mut raw = [0u8; $width];
            raw.copy_from_slice(&buf[offset..offset + $width]);
            <$ty>::from_ne_bytes(raw)
        }

        /// Loads a big-endian value at `offset`.
        #[inline]
        #[must_use]
        pub fn $be(buf: &[u8], offset: usize) -> $ty {
            let mut raw = [0u8; $width];
            raw.copy_from_slice(&buf[offset..offset + $width]);
            <$ty>::from_be_bytes(raw)
        }
    };
}

load_fn!(load_u16, load_u16_be, u16, 2);
load_fn!(load_u32, load_u32_be, u32, 4);
load_fn!(load_u64, load_u64_be, u64, 8);

/// Loads a byte at `offset`.
#[inline]
#[must_use]
pub fn load_u8(buf: &[u8], offset: usize) -> u8 {
    buf[offset]
}

/// Loads a boolean stored as one byte; any non-zero byte is `true`.
#[inline]
#[must_use]
pub fn load_bool(buf: &[u8], offset: usize) -> bool {
    buf[offset] != 0
}

/// Loads an `f32` in host byte order.
#[inline]
#[must_use]
pub fn load_f32(buf: &[u8], offset: usize) -> f32 {
    f32::from_bits(load_u32(buf, offset))
}

/// Loads an `f64` in host byte order.
#[inline]
#[must_use]
pub fn load_f64(buf: &[u8], offset: usize) -> f64 {
    f64::from_bits(load_u64(buf, offset))
}

/// Loads a big-endian `f32`.
#[inline]
#[must_use]
pub fn load_f32_be(buf: &[u8], offset: usize) -> f32 {
    f32::from_bits(load_u32_be(buf, offset))
}

/// Loads a big-endian `f64`.
#[inline]
#[must_use]
pub fn load_f64_be(buf: &[u8], offset: usize) -> f64 {
    f64::from_bits(load_u64_be(buf, offset))
}
