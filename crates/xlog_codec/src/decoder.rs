//! MessagePack decoder and validator.
//!
//! [`MsgpackDecoder::decode`] materializes a [`Value`];
//! [`MsgpackDecoder::validate`] walks the same bytes without allocating.
//! Both go through [`MsgpackDecoder::read_head`] and the same payload skip,
//! so for any input they advance the cursor by exactly the same amount.

use crate::error::{CodecError, CodecResult};
use crate::load::{load_f32_be, load_f64_be, load_u16_be, load_u32_be, load_u64_be};
use crate::value::{Value, ValueType};

/// Default ceiling for container nesting.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Decode a single value starting at `cursor`. The end of `data` is the end
/// of the region.
///
/// Returns the value and the cursor just past it.
///
/// # Errors
///
/// Returns an error if the bytes are not a complete, well-formed value.
pub fn decode(data: &[u8], cursor: usize) -> CodecResult<(Value, usize)> {
    let mut decoder = MsgpackDecoder::at(data, cursor);
    let value = decoder.decode()?;
    Ok((value, decoder.position()))
}

/// Validate a single value starting at `cursor` and return the cursor just
/// past it.
///
/// # Errors
///
/// Returns an error if the bytes are not a complete, well-formed value.
pub fn validate(data: &[u8], cursor: usize) -> CodecResult<usize> {
    let mut decoder = MsgpackDecoder::at(data, cursor);
    decoder.validate()?;
    Ok(decoder.position())
}

/// Decode exactly one value occupying all of `bytes`.
///
/// # Errors
///
/// Returns an error if the bytes are malformed or followed by garbage.
pub fn from_msgpack(bytes: &[u8]) -> CodecResult<Value> {
    let (value, end) = decode(bytes, 0)?;
    if end != bytes.len() {
        return Err(CodecError::InvalidTag {
            tag: bytes[end],
            offset: end,
        });
    }
    Ok(value)
}

/// Shape and length of a value, read from its tag and length prefix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Head {
    /// `nil`
    Nil,
    /// Boolean.
    Bool(bool),
    /// Unsigned integer.
    Uint(u64),
    /// Signed integer.
    Int(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// String of the given byte length.
    Str(usize),
    /// Binary of the given byte length.
    Bin(usize),
    /// Extension with type and payload length.
    Ext(i8, usize),
    /// Array with the given element count.
    Array(usize),
    /// Map with the given pair count.
    Map(usize),
}

/// A cursor-based MessagePack decoder over a borrowed byte region.
#[derive(Debug, Clone)]
pub struct MsgpackDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    max_depth: usize,
}

impl<'a> MsgpackDecoder<'a> {
    /// Create a new decoder for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self::at(data, 0)
    }

    /// Create a decoder positioned at `cursor`.
    pub fn at(data: &'a [u8], cursor: usize) -> Self {
        Self {
            data,
            pos: cursor,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the container nesting ceiling.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Current cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }

    /// Decode the next value.
    pub fn decode(&mut self) -> CodecResult<Value> {
        self.decode_at(0)
    }

    /// Skip the next value without materializing it.
    pub fn validate(&mut self) -> CodecResult<()> {
        self.validate_at(0)
    }

    /// Alias of [`Self::validate`] for call sites that read better as "skip".
    pub fn skip(&mut self) -> CodecResult<()> {
        self.validate()
    }

    /// Type of the next value, without consuming it.
    pub fn peek_type(&self) -> CodecResult<ValueType> {
        let Some(&tag) = self.data.get(self.pos) else {
            return Err(CodecError::eof(self.pos, 1));
        };
        ValueType::from_tag(tag).ok_or(CodecError::InvalidTag {
            tag,
            offset: self.pos,
        })
    }

    /// Decode the next value as an unsigned integer.
    pub fn decode_uint(&mut self) -> CodecResult<u64> {
        let start = self.pos;
        match self.read_head()? {
            Head::Uint(n) => Ok(n),
            other => {
                self.pos = start;
                Err(CodecError::type_mismatch(
                    ValueType::Uint,
                    head_type(&other),
                    start,
                ))
            }
        }
    }

    /// Decode the next value as a `u32`.
    pub fn decode_u32(&mut self) -> CodecResult<u32> {
        let start = self.pos;
        let n = self.decode_uint()?;
        u32::try_from(n).map_err(|_| CodecError::IntegerOverflow {
            value: n,
            target: "u32",
            offset: start,
        })
    }

    /// Decode the next value as a double.
    pub fn decode_double(&mut self) -> CodecResult<f64> {
        let start = self.pos;
        match self.read_head()? {
            Head::Double(x) => Ok(x),
            other => {
                self.pos = start;
                Err(CodecError::type_mismatch(
                    ValueType::Double,
                    head_type(&other),
                    start,
                ))
            }
        }
    }

    /// Read a map header and return its pair count.
    pub fn decode_map_len(&mut self) -> CodecResult<usize> {
        let start = self.pos;
        match self.read_head()? {
            Head::Map(n) => Ok(n),
            other => {
                self.pos = start;
                Err(CodecError::type_mismatch(
                    ValueType::Map,
                    head_type(&other),
                    start,
                ))
            }
        }
    }

    /// Read the tag and length prefix of the next value.
    ///
    /// For strings, binaries and extensions the payload is not consumed.
    /// Container counts are checked against the remaining bytes so that a
    /// hostile header cannot drive a large allocation.
    pub fn read_head(&mut self) -> CodecResult<Head> {
        let offset = self.pos;
        let tag = self.read_byte()?;
        let head = match tag {
            0x00..=0x7f => Head::Uint(u64::from(tag)),
            0x80..=0x8f => Head::Map(usize::from(tag & 0x0f)),
            0x90..=0x9f => Head::Array(usize::from(tag & 0x0f)),
            0xa0..=0xbf => Head::Str(usize::from(tag & 0x1f)),
            0xc0 => Head::Nil,
            0xc1 => return Err(CodecError::InvalidTag { tag, offset }),
            0xc2 => Head::Bool(false),
            0xc3 => Head::Bool(true),
            0xc4 => Head::Bin(usize::from(self.read_byte()?)),
            0xc5 => Head::Bin(usize::from(self.read_u16()?)),
            0xc6 => Head::Bin(self.read_u32()? as usize),
            0xc7 => {
                let len = usize::from(self.read_byte()?);
                Head::Ext(self.read_i8()?, len)
            }
            0xc8 => {
                let len = usize::from(self.read_u16()?);
                Head::Ext(self.read_i8()?, len)
            }
            0xc9 => {
                let len = self.read_u32()? as usize;
                Head::Ext(self.read_i8()?, len)
            }
            0xca => {
                self.ensure(4)?;
                let x = load_f32_be(self.data, self.pos);
                self.pos += 4;
                Head::Float(x)
            }
            0xcb => {
                self.ensure(8)?;
                let x = load_f64_be(self.data, self.pos);
                self.pos += 8;
                Head::Double(x)
            }
            0xcc => Head::Uint(u64::from(self.read_byte()?)),
            0xcd => Head::Uint(u64::from(self.read_u16()?)),
            0xce => Head::Uint(u64::from(self.read_u32()?)),
            0xcf => Head::Uint(self.read_u64()?),
            0xd0 => Head::Int(i64::from(self.read_i8()?)),
            #[allow(clippy::cast_possible_wrap)]
            0xd1 => Head::Int(i64::from(self.read_u16()? as i16)),
            #[allow(clippy::cast_possible_wrap)]
            0xd2 => Head::Int(i64::from(self.read_u32()? as i32)),
            #[allow(clippy::cast_possible_wrap)]
            0xd3 => Head::Int(self.read_u64()? as i64),
            0xd4 => Head::Ext(self.read_i8()?, 1),
            0xd5 => Head::Ext(self.read_i8()?, 2),
            0xd6 => Head::Ext(self.read_i8()?, 4),
            0xd7 => Head::Ext(self.read_i8()?, 8),
            0xd8 => Head::Ext(self.read_i8()?, 16),
            0xd9 => Head::Str(usize::from(self.read_byte()?)),
            0xda => Head::Str(usize::from(self.read_u16()?)),
            0xdb => Head::Str(self.read_u32()? as usize),
            0xdc => Head::Array(usize::from(self.read_u16()?)),
            0xdd => Head::Array(self.read_u32()? as usize),
            0xde => Head::Map(usize::from(self.read_u16()?)),
            0xdf => Head::Map(self.read_u32()? as usize),
            #[allow(clippy::cast_possible_wrap)]
            0xe0..=0xff => Head::Int(i64::from(tag as i8)),
        };

        match head {
            Head::Array(n) => self.check_count(n as u64)?,
            Head::Map(n) => self.check_count(2 * n as u64)?,
            _ => {}
        }
        Ok(head)
    }

    fn decode_at(&mut self, depth: usize) -> CodecResult<Value> {
        let value = match self.read_head()? {
            Head::Nil => Value::Nil,
            Head::Bool(b) => Value::Bool(b),
            Head::Uint(n) => Value::Uint(n),
            Head::Int(n) => Value::Int(n),
            Head::Float(x) => Value::Float(x),
            Head::Double(x) => Value::Double(x),
            Head::Str(len) => {
                let bytes = self.read_bytes(len)?;
                Value::Str(String::from_utf8_lossy(bytes).into_owned())
            }
            Head::Bin(len) => Value::Bin(self.read_bytes(len)?.to_vec()),
            Head::Ext(type_id, len) => Value::Ext {
                type_id,
                data: self.read_bytes(len)?.to_vec(),
            },
            Head::Array(len) => {
                let depth = self.enter(depth)?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.decode_at(depth)?);
                }
                Value::Array(items)
            }
            Head::Map(len) => {
                let depth = self.enter(depth)?;
                let mut pairs = Vec::with_capacity(len);
                for _ in 0..len {
                    let key = self.decode_at(depth)?;
                    let value = self.decode_at(depth)?;
                    pairs.push((key, value));
                }
                Value::Map(pairs)
            }
        };
        Ok(value)
    }

    fn validate_at(&mut self, depth: usize) -> CodecResult<()> {
        match self.read_head()? {
            Head::Str(len) | Head::Bin(len) | Head::Ext(_, len) => {
                self.read_bytes(len)?;
            }
            Head::Array(len) => {
                let depth = self.enter(depth)?;
                for _ in 0..len {
                    self.validate_at(depth)?;
                }
            }
            Head::Map(len) => {
                let depth = self.enter(depth)?;
                for _ in 0..2 * len {
                    self.validate_at(depth)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    #[inline]
    fn enter(&self, depth: usize) -> CodecResult<usize> {
        let next = depth + 1;
        if next > self.max_depth {
            return Err(CodecError::DepthExceeded {
                max: self.max_depth,
            });
        }
        Ok(next)
    }

    #[inline]
    fn check_count(&self, min_bytes: u64) -> CodecResult<()> {
        let remaining = self.data.len().saturating_sub(self.pos);
        if min_bytes > remaining as u64 {
            return Err(CodecError::SizeLimitExceeded {
                claimed: min_bytes,
                remaining,
            });
        }
        Ok(())
    }

    #[inline]
    fn ensure(&self, len: usize) -> CodecResult<()> {
        let available = self.data.len().saturating_sub(self.pos);
        if len > available {
            return Err(CodecError::eof(self.pos, len - available));
        }
        Ok(())
    }

    #[inline]
    fn read_byte(&mut self) -> CodecResult<u8> {
        self.ensure(1)?;
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    #[allow(clippy::cast_possible_wrap)]
    fn read_i8(&mut self) -> CodecResult<i8> {
        self.read_byte().map(|b| b as i8)
    }

    #[inline]
    fn read_u16(&mut self) -> CodecResult<u16> {
        self.ensure(2)?;
        let v = load_u16_be(self.data, self.pos);
        self.pos += 2;
        Ok(v)
    }

    #[inline]
    fn read_u32(&mut self) -> CodecResult<u32> {
        self.ensure(4)?;
        let v = load_u32_be(self.data, self.pos);
        self.pos += 4;
        Ok(v)
    }

    #[inline]
    fn read_u64(&mut self) -> CodecResult<u64> {
        self.ensure(8)?;
        let v = load_u64_be(self.data, self.pos);
        self.pos += 8;
        Ok(v)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        self.ensure(len)?;
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }
}

fn head_type(head: &Head) -> ValueType {
    match head {
        Head::Nil => ValueType::Nil,
        Head::Bool(_) => ValueType::Bool,
        Head::Uint(_) => ValueType::Uint,
        Head::Int(_) => ValueType::Int,
        Head::Float(_) => ValueType::Float,
        Head::Double(_) => ValueType::Double,
        Head::Str(_) => ValueType::Str,
        Head::Bin(_) => ValueType::Bin,
        Head::Ext(..) => ValueType::Ext,
        Head::Array(_) => ValueType::Array,
        Head::Map(_) => ValueType::Map,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::to_msgpack;
    use proptest::prelude::*;

    #[test]
    fn decode_nil_and_bools() {
        assert_eq!(from_msgpack(&[0xc0]).unwrap(), Value::Nil);
        assert_eq!(from_msgpack(&[0xc2]).unwrap(), Value::Bool(false));
        assert_eq!(from_msgpack(&[0xc3]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn decode_unsigned_widths() {
        assert_eq!(from_msgpack(&[0x00]).unwrap(), Value::Uint(0));
        assert_eq!(from_msgpack(&[0x7f]).unwrap(), Value::Uint(127));
        assert_eq!(from_msgpack(&[0xcc, 0xff]).unwrap(), Value::Uint(255));
        assert_eq!(
            from_msgpack(&[0xcd, 0x01, 0x00]).unwrap(),
            Value::Uint(256)
        );
        assert_eq!(
            from_msgpack(&[0xce, 0xd5, 0xba, 0x0b, 0xab]).unwrap(),
            Value::Uint(0xd5ba_0bab)
        );
        assert_eq!(
            from_msgpack(&[0xcf, 0, 0, 0, 1, 0, 0, 0, 0]).unwrap(),
            Value::Uint(1 << 32)
        );
    }

    #[test]
    fn decode_signed_widths() {
        assert_eq!(from_msgpack(&[0xff]).unwrap(), Value::Int(-1));
        assert_eq!(from_msgpack(&[0xe0]).unwrap(), Value::Int(-32));
        assert_eq!(from_msgpack(&[0xd0, 0x80]).unwrap(), Value::Int(-128));
        assert_eq!(from_msgpack(&[0xd1, 0xff, 0x00]).unwrap(), Value::Int(-256));
        assert_eq!(
            from_msgpack(&[0xd2, 0xff, 0xff, 0xff, 0xfe]).unwrap(),
            Value::Int(-2)
        );
        assert_eq!(
            from_msgpack(&[0xd3, 0x80, 0, 0, 0, 0, 0, 0, 0]).unwrap(),
            Value::Int(i64::MIN)
        );
        // A non-negative value in a signed encoding stays signed.
        assert_eq!(from_msgpack(&[0xd0, 0x05]).unwrap(), Value::Int(5));
    }

    #[test]
    fn decode_strings_and_bins() {
        assert_eq!(from_msgpack(&[0xa0]).unwrap(), Value::Str(String::new()));
        assert_eq!(
            from_msgpack(&[0xa3, b'a', b'b', b'c']).unwrap(),
            Value::from("abc")
        );
        assert_eq!(
            from_msgpack(&[0xd9, 0x02, b'h', b'i']).unwrap(),
            Value::from("hi")
        );
        assert_eq!(
            from_msgpack(&[0xc4, 0x02, 0x01, 0x02]).unwrap(),
            Value::Bin(vec![1, 2])
        );
    }

    #[test]
    fn invalid_utf8_is_lossy_not_fatal() {
        let (value, end) = decode(&[0xa2, 0xff, 0xfe], 0).unwrap();
        assert_eq!(end, 3);
        assert_eq!(value.value_type(), ValueType::Str);
    }

    #[test]
    fn decode_floats() {
        let mut bytes = vec![0xcb];
        bytes.extend_from_slice(&1.25f64.to_be_bytes());
        assert_eq!(from_msgpack(&bytes).unwrap(), Value::Double(1.25));

        let mut bytes = vec![0xca];
        bytes.extend_from_slice(&0.5f32.to_be_bytes());
        assert_eq!(from_msgpack(&bytes).unwrap(), Value::Float(0.5));
    }

    #[test]
    fn decode_ext() {
        assert_eq!(
            from_msgpack(&[0xd4, 0x01, 0xaa]).unwrap(),
            Value::Ext {
                type_id: 1,
                data: vec![0xaa]
            }
        );
        assert_eq!(
            from_msgpack(&[0xc7, 0x02, 0xfe, 0x01, 0x02]).unwrap(),
            Value::Ext {
                type_id: -2,
                data: vec![1, 2]
            }
        );
    }

    #[test]
    fn decode_containers() {
        assert_eq!(
            from_msgpack(&[0x92, 0x01, 0xa1, b'x']).unwrap(),
            Value::Array(vec![Value::Uint(1), Value::from("x")])
        );
        assert_eq!(
            from_msgpack(&[0x82, 0x00, 0x0c, 0x03, 0x0a]).unwrap(),
            Value::Map(vec![
                (Value::Uint(0), Value::Uint(12)),
                (Value::Uint(3), Value::Uint(10)),
            ])
        );
        assert_eq!(
            from_msgpack(&[0xdc, 0x00, 0x01, 0xc0]).unwrap(),
            Value::Array(vec![Value::Nil])
        );
    }

    #[test]
    fn cursor_advances_past_value() {
        let bytes = [0xc0, 0x92, 0x01, 0x02, 0xc3];
        let (value, next) = decode(&bytes, 1).unwrap();
        assert_eq!(value, Value::Array(vec![Value::Uint(1), Value::Uint(2)]));
        assert_eq!(next, 4);
        assert_eq!(validate(&bytes, 1).unwrap(), 4);
    }

    #[test]
    fn reserved_tag_rejected() {
        assert!(matches!(
            from_msgpack(&[0xc1]),
            Err(CodecError::InvalidTag { tag: 0xc1, .. })
        ));
        assert!(validate(&[0x91, 0xc1], 0).is_err());
    }

    #[test]
    fn truncated_input_rejected() {
        assert!(matches!(from_msgpack(&[]), Err(CodecError::UnexpectedEof { .. })));
        assert!(matches!(
            from_msgpack(&[0xcd, 0x01]),
            Err(CodecError::UnexpectedEof { .. })
        ));
        assert!(matches!(
            from_msgpack(&[0xa5, b'a']),
            Err(CodecError::UnexpectedEof { .. })
        ));
        assert!(validate(&[0xcb, 0, 0], 0).is_err());
    }

    #[test]
    fn container_count_checked_against_remaining() {
        // array32 claiming four billion elements
        let bytes = [0xdd, 0xff, 0xff, 0xff, 0xff, 0x00];
        assert!(matches!(
            decode(&bytes, 0),
            Err(CodecError::SizeLimitExceeded { .. })
        ));
        assert!(matches!(
            validate(&bytes, 0),
            Err(CodecError::SizeLimitExceeded { .. })
        ));
    }

    #[test]
    fn depth_limit_enforced() {
        let mut bytes = vec![0x91; 10];
        bytes.push(0xc0);

        let mut shallow = MsgpackDecoder::new(&bytes).with_max_depth(10);
        assert!(shallow.decode().is_ok());

        let mut tight = MsgpackDecoder::new(&bytes).with_max_depth(9);
        assert!(matches!(
            tight.decode(),
            Err(CodecError::DepthExceeded { max: 9 })
        ));
        let mut tight = MsgpackDecoder::new(&bytes).with_max_depth(9);
        assert!(matches!(
            tight.validate(),
            Err(CodecError::DepthExceeded { max: 9 })
        ));
    }

    #[test]
    fn typed_reads() {
        let mut d = MsgpackDecoder::new(&[0xce, 0, 0, 0, 5, 0xa0]);
        assert_eq!(d.peek_type().unwrap(), ValueType::Uint);
        assert_eq!(d.decode_u32().unwrap(), 5);
        let err = d.decode_uint().unwrap_err();
        assert!(matches!(
            err,
            CodecError::TypeMismatch {
                expected: ValueType::Uint,
                found: ValueType::Str,
                offset: 5
            }
        ));
        // A failed typed read leaves the cursor in place.
        assert_eq!(d.position(), 5);

        let mut d = MsgpackDecoder::new(&[0xcf, 0, 0, 0, 1, 0, 0, 0, 0]);
        assert!(matches!(
            d.decode_u32(),
            Err(CodecError::IntegerOverflow { .. })
        ));
    }

    #[test]
    fn trailing_bytes_rejected_by_from_msgpack() {
        assert!(from_msgpack(&[0x01, 0x02]).is_err());
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Nil),
            any::<bool>().prop_map(Value::Bool),
            any::<u64>().prop_map(Value::Uint),
            (i64::MIN..0i64).prop_map(Value::Int),
            ".{0,40}".prop_map(Value::Str),
            prop::collection::vec(any::<u8>(), 0..64).prop_map(Value::Bin),
            any::<f32>()
                .prop_filter("NaN breaks equality", |x| !x.is_nan())
                .prop_map(Value::Float),
            any::<f64>()
                .prop_filter("NaN breaks equality", |x| !x.is_nan())
                .prop_map(Value::Double),
            (any::<i8>(), prop::collection::vec(any::<u8>(), 0..20))
                .prop_map(|(type_id, data)| Value::Ext { type_id, data }),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
                prop::collection::vec((inner.clone(), inner), 0..6).prop_map(Value::Map),
            ]
        })
    }

    proptest! {
        #[test]
        fn validate_and_decode_consume_same_bytes(value in arb_value(), prefix in 0usize..4) {
            let mut bytes = vec![0xc0; prefix];
            bytes.extend_from_slice(&to_msgpack(&value));
            let (decoded, decoded_end) = decode(&bytes, prefix).unwrap();
            let validated_end = validate(&bytes, prefix).unwrap();
            prop_assert_eq!(decoded_end, validated_end);
            prop_assert_eq!(decoded_end, bytes.len());
            prop_assert_eq!(decoded, value);
        }

        #[test]
        fn truncation_never_panics(value in arb_value(), cut in 0usize..64) {
            let bytes = to_msgpack(&value);
            let cut = cut.min(bytes.len().saturating_sub(1));
            let truncated = &bytes[..cut];
            prop_assert!(decode(truncated, 0).is_err());
            prop_assert!(validate(truncated, 0).is_err());
        }
    }
}
