//! Dynamic MessagePack value type.

use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};
use std::fmt;

/// The runtime type of a MessagePack value, without its payload.
///
/// Key tables in `xlog_core` are expressed in terms of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// `nil`
    Nil,
    /// Unsigned integer (positive fixint, uint 8..64).
    Uint,
    /// Signed integer (negative fixint, int 8..64).
    Int,
    /// UTF-8 string (fixstr, str 8..32).
    Str,
    /// Binary blob.
    Bin,
    /// Array.
    Array,
    /// Map.
    Map,
    /// Boolean.
    Bool,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// Extension type.
    Ext,
}

impl ValueType {
    /// Classifies a leading tag byte. Returns `None` for the never-used tag `0xc1`.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0x00..=0x7f | 0xcc..=0xcf => Self::Uint,
            0x80..=0x8f | 0xde | 0xdf => Self::Map,
            0x90..=0x9f | 0xdc | 0xdd => Self::Array,
            0xa0..=0xbf | 0xd9..=0xdb => Self::Str,
            0xc0 => Self::Nil,
            0xc1 => return None,
            0xc2 | 0xc3 => Self::Bool,
            0xc4..=0xc6 => Self::Bin,
            0xc7..=0xc9 | 0xd4..=0xd8 => Self::Ext,
            0xca => Self::Float,
            0xcb => Self::Double,
            0xd0..=0xd3 | 0xe0..=0xff => Self::Int,
        })
    }

    /// Conventional upper-case name (`MP_UINT`, `MP_MAP`, ...).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nil => "MP_NIL",
            Self::Uint => "MP_UINT",
            Self::Int => "MP_INT",
            Self::Str => "MP_STR",
            Self::Bin => "MP_BIN",
            Self::Array => "MP_ARRAY",
            Self::Map => "MP_MAP",
            Self::Bool => "MP_BOOL",
            Self::Float => "MP_FLOAT",
            Self::Double => "MP_DOUBLE",
            Self::Ext => "MP_EXT",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded MessagePack value.
///
/// Strings that are not valid UTF-8 are converted lossily; decoding never
/// fails on string contents.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Nil value.
    Nil,
    /// Boolean value.
    Bool(bool),
    /// Unsigned integer.
    Uint(u64),
    /// Signed integer.
    Int(i64),
    /// Text string.
    Str(String),
    /// Byte string.
    Bin(Vec<u8>),
    /// Array of values.
    Array(Vec<Value>),
    /// Map of key-value pairs in wire order.
    Map(Vec<(Value, Value)>),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// Extension value.
    Ext {
        /// Application-defined extension type.
        type_id: i8,
        /// Raw extension payload.
        data: Vec<u8>,
    },
}

impl Value {
    /// Returns the runtime type of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Nil => ValueType::Nil,
            Value::Bool(_) => ValueType::Bool,
            Value::Uint(_) => ValueType::Uint,
            Value::Int(_) => ValueType::Int,
            Value::Str(_) => ValueType::Str,
            Value::Bin(_) => ValueType::Bin,
            Value::Array(_) => ValueType::Array,
            Value::Map(_) => ValueType::Map,
            Value::Float(_) => ValueType::Float,
            Value::Double(_) => ValueType::Double,
            Value::Ext { .. } => ValueType::Ext,
        }
    }

    /// Check if this value is nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Get this value as an unsigned integer, if it is one.
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::Uint(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a signed integer. Unsigned values that fit are converted.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Uint(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Get this value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as an array, if it is one.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a map, if it is one.
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Look up an unsigned integer key in this map value.
    pub fn get(&self, key: u64) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_uint() == Some(key))
            .map(|(_, v)| v)
    }
}

/// Human-readable rendering used by the dump output.
///
/// Arrays and maps print with braces, `nil`/`true`/`false` as words,
/// binaries as lossy text and extensions as `ext`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Uint(n) => write!(f, "{n}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::Bin(b) => f.write_str(&String::from_utf8_lossy(b)),
            Value::Array(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("}")
            }
            Value::Map(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Float(x) => write!(f, "{x}"),
            Value::Double(x) => write!(f, "{x}"),
            Value::Ext { .. } => f.write_str("ext"),
        }
    }
}

/// Maps serialize with string keys: strings as-is, anything else through
/// its `Display` rendering. This keeps JSON output valid for integer and
/// composite keys alike.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Uint(n) => serializer.serialize_u64(*n),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Bin(b) => serializer.serialize_bytes(b),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (k, v) in pairs {
                    match k {
                        Value::Str(s) => map.serialize_entry(s, v)?,
                        other => map.serialize_entry(&other.to_string(), v)?,
                    }
                }
                map.end()
            }
            Value::Float(x) => serializer.serialize_f32(*x),
            Value::Double(x) => serializer.serialize_f64(*x),
            Value::Ext { type_id, data } => {
                let mut st = serializer.serialize_struct("Ext", 2)?;
                st.serialize_field("type", type_id)?;
                st.serialize_field("data", data)?;
                st.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Uint(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Uint(u64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Double(x)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bin(b)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Nil
    }
}
