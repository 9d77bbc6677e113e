//! MessagePack encoder.
//!
//! The decoder side of this crate is what the log reader uses. The encoder
//! exists to build log fixtures and test inputs, and always picks the
//! shortest form for every length and integer.

use crate::value::Value;

/// Encode a value to MessagePack bytes.
pub fn to_msgpack(value: &Value) -> Vec<u8> {
    let mut encoder = MsgpackEncoder::new();
    encoder.encode(value);
    encoder.into_bytes()
}

/// A MessagePack encoder writing into an owned buffer.
#[derive(Debug, Default, Clone)]
pub struct MsgpackEncoder {
    buffer: Vec<u8>,
}

impl MsgpackEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new encoder with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Encode a value.
    pub fn encode(&mut self, value: &Value) {
        match value {
            Value::Nil => self.encode_nil(),
            Value::Bool(b) => self.encode_bool(*b),
            Value::Uint(n) => self.encode_uint(*n),
            Value::Int(n) => self.encode_int(*n),
            Value::Float(x) => self.encode_float(*x),
            Value::Double(x) => self.encode_double(*x),
            Value::Str(s) => self.encode_str(s),
            Value::Bin(b) => self.encode_bin(b),
            Value::Ext { type_id, data } => self.encode_ext(*type_id, data),
            Value::Array(items) => {
                self.encode_array_header(items.len());
                for item in items {
                    self.encode(item);
                }
            }
            Value::Map(pairs) => {
                self.encode_map_header(pairs.len());
                for (k, v) in pairs {
                    self.encode(k);
                    self.encode(v);
                }
            }
        }
    }

    /// Consume this encoder and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Append raw bytes without framing.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Encode `nil`.
    pub fn encode_nil(&mut self) {
        self.buffer.push(0xc0);
    }

    /// Encode a boolean.
    pub fn encode_bool(&mut self, b: bool) {
        self.buffer.push(if b { 0xc3 } else { 0xc2 });
    }

    /// Encode an unsigned integer in its shortest form.
    pub fn encode_uint(&mut self, n: u64) {
        if n < 0x80 {
            self.buffer.push(n as u8);
        } else if n <= u64::from(u8::MAX) {
            self.buffer.extend_from_slice(&[0xcc, n as u8]);
        } else if n <= u64::from(u16::MAX) {
            self.buffer.push(0xcd);
            self.buffer.extend_from_slice(&(n as u16).to_be_bytes());
        } else if n <= u64::from(u32::MAX) {
            self.buffer.push(0xce);
            self.buffer.extend_from_slice(&(n as u32).to_be_bytes());
        } else {
            self.buffer.push(0xcf);
            self.buffer.extend_from_slice(&n.to_be_bytes());
        }
    }

    /// Encode an unsigned integer as a fixed five-byte `uint32`.
    pub fn encode_uint32(&mut self, n: u32) {
        self.buffer.push(0xce);
        self.buffer.extend_from_slice(&n.to_be_bytes());
    }

    /// Encode a signed integer.
    ///
    /// Negative values use the shortest signed form. Non-negative values
    /// also use a signed form so they decode back as signed.
    #[allow(clippy::cast_sign_loss)]
    pub fn encode_int(&mut self, n: i64) {
        if (-32..0).contains(&n) {
            self.buffer.push(n as i8 as u8);
        } else if i64::from(i8::MIN) <= n && n <= i64::from(i8::MAX) {
            self.buffer.extend_from_slice(&[0xd0, n as i8 as u8]);
        } else if i64::from(i16::MIN) <= n && n <= i64::from(i16::MAX) {
            self.buffer.push(0xd1);
            self.buffer.extend_from_slice(&(n as i16).to_be_bytes());
        } else if i64::from(i32::MIN) <= n && n <= i64::from(i32::MAX) {
            self.buffer.push(0xd2);
            self.buffer.extend_from_slice(&(n as i32).to_be_bytes());
        } else {
            self.buffer.push(0xd3);
            self.buffer.extend_from_slice(&n.to_be_bytes());
        }
    }

    /// Encode a 32-bit float.
    pub fn encode_float(&mut self, x: f32) {
        self.buffer.push(0xca);
        self.buffer.extend_from_slice(&x.to_be_bytes());
    }

    /// Encode a 64-bit float.
    pub fn encode_double(&mut self, x: f64) {
        self.buffer.push(0xcb);
        self.buffer.extend_from_slice(&x.to_be_bytes());
    }

    /// Encode a string header for `len` bytes.
    pub fn encode_str_header(&mut self, len: usize) {
        if len < 32 {
            self.buffer.push(0xa0 | len as u8);
        } else if len <= usize::from(u8::MAX) {
            self.buffer.extend_from_slice(&[0xd9, len as u8]);
        } else if len <= usize::from(u16::MAX) {
            self.buffer.push(0xda);
            self.buffer.extend_from_slice(&(len as u16).to_be_bytes());
        } else {
            self.buffer.push(0xdb);
            self.buffer.extend_from_slice(&(len as u32).to_be_bytes());
        }
    }

    /// Encode a string.
    pub fn encode_str(&mut self, s: &str) {
        self.encode_str_header(s.len());
        self.buffer.extend_from_slice(s.as_bytes());
    }

    /// Encode a binary blob.
    pub fn encode_bin(&mut self, b: &[u8]) {
        let len = b.len();
        if len <= usize::from(u8::MAX) {
            self.buffer.extend_from_slice(&[0xc4, len as u8]);
        } else if len <= usize::from(u16::MAX) {
            self.buffer.push(0xc5);
            self.buffer.extend_from_slice(&(len as u16).to_be_bytes());
        } else {
            self.buffer.push(0xc6);
            self.buffer.extend_from_slice(&(len as u32).to_be_bytes());
        }
        self.buffer.extend_from_slice(b);
    }

    /// Encode an extension value.
    #[allow(clippy::cast_sign_loss)]
    pub fn encode_ext(&mut self, type_id: i8, data: &[u8]) {
        let len = data.len();
        match len {
            1 => self.buffer.push(0xd4),
            2 => self.buffer.push(0xd5),
            4 => self.buffer.push(0xd6),
            8 => self.buffer.push(0xd7),
            16 => self.buffer.push(0xd8),
            _ if len <= usize::from(u8::MAX) => {
                self.buffer.extend_from_slice(&[0xc7, len as u8]);
            }
            _ if len <= usize::from(u16::MAX) => {
                self.buffer.push(0xc8);
                self.buffer.extend_from_slice(&(len as u16).to_be_bytes());
            }
            _ => {
                self.buffer.push(0xc9);
                self.buffer.extend_from_slice(&(len as u32).to_be_bytes());
            }
        }
        self.buffer.push(type_id as u8);
        self.buffer.extend_from_slice(data);
    }

    /// Encode an array header for `len` elements.
    pub fn encode_array_header(&mut self, len: usize) {
        if len < 16 {
            self.buffer.push(0x90 | len as u8);
        } else if len <= usize::from(u16::MAX) {
            self.buffer.push(0xdc);
            self.buffer.extend_from_slice(&(len as u16).to_be_bytes());
        } else {
            self.buffer.push(0xdd);
            self.buffer.extend_from_slice(&(len as u32).to_be_bytes());
        }
    }

    /// Encode a map header for `len` pairs.
    pub fn encode_map_header(&mut self, len: usize) {
        if len < 16 {
            self.buffer.push(0x80 | len as u8);
        } else if len <= usize::from(u16::MAX) {
            self.buffer.push(0xde);
            self.buffer.extend_from_slice(&(len as u16).to_be_bytes());
        } else {
            self.buffer.push(0xdf);
            self.buffer.extend_from_slice(&(len as u32).to_be_bytes());
        }
    }
}
