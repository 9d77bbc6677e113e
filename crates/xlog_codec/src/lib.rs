//! # xlog Codec
//!
//! MessagePack decoding and validation for the Tarantool xlog reader.
//!
//! Every field of a log record is a MessagePack value. This crate provides:
//! - A cursor-based decoder that materializes a [`Value`]
//! - A validator that skips a value without allocating, consuming exactly the
//!   bytes the decoder would
//! - Bounds on nesting depth and container sizes, so hostile input fails
//!   cleanly instead of exhausting the stack or memory
//! - Unaligned fixed-width loads used by the frame reader
//! - An encoder for building fixtures
//!
//! ## Usage
//!
//! ```
//! use xlog_codec::{decode, validate, to_msgpack, Value};
//!
//! let bytes = to_msgpack(&Value::Array(vec![Value::Uint(1), Value::from("x")]));
//! let (value, next) = decode(&bytes, 0).unwrap();
//! assert_eq!(next, bytes.len());
//! assert_eq!(validate(&bytes, 0).unwrap(), next);
//! assert_eq!(value.to_string(), "{1, x}");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
pub mod load;
mod value;

pub use decoder::{decode, from_msgpack, validate, Head, MsgpackDecoder, DEFAULT_MAX_DEPTH};
pub use encoder::{to_msgpack, MsgpackEncoder};
pub use error::{CodecError, CodecResult};
pub use value::{Value, ValueType};
