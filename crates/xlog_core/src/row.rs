//! Record header decoding.
//!
//! A record is a MessagePack map of header fields optionally followed by
//! exactly one body value. The header is decoded into [`RecordHeader`]; the
//! body is only validated here and handed on as a byte range.

use crate::constants::{header_key, request_type_name, RequestType, FLAG_COMMIT};
use crate::error::{HeaderKeyError, RecordError};
use crate::keys::HEADER_KEYS;
use tracing::debug;
use xlog_codec::{MsgpackDecoder, ValueType};

/// One decoded record header.
///
/// `body` borrows the buffer the record was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RecordHeader<'a> {
    /// Request type code.
    pub request_type: u32,
    /// Originating replica.
    pub replica_id: u32,
    /// Replication group.
    pub group_id: u32,
    /// Request sync number.
    pub sync: u64,
    /// Log sequence number.
    pub lsn: i64,
    /// Wall-clock timestamp, seconds.
    pub timestamp: f64,
    /// Transaction id, reconstructed from the LSN.
    pub tsn: i64,
    /// Whether this record ends its transaction.
    pub is_commit: bool,
    /// Schema version.
    pub schema_version: u32,
    /// Raw body value, if any.
    pub body: Option<&'a [u8]>,
}

impl RecordHeader<'_> {
    /// Number of body values, zero or one.
    pub fn bodycnt(&self) -> usize {
        usize::from(self.body.is_some())
    }

    /// Request type, if the code is known.
    pub fn kind(&self) -> Option<RequestType> {
        RequestType::from_code(self.request_type)
    }

    /// Display name of the request type.
    pub fn type_name(&self) -> &'static str {
        request_type_name(self.request_type)
    }
}

/// Decodes the record starting at `cursor` and returns it together with the
/// cursor just past it.
///
/// The end of `data` is the end of the region. With `exact`, the record must
/// fill the region completely.
///
/// # Errors
///
/// Returns [`RecordError::Value`] for malformed MessagePack and
/// [`RecordError::Key`] for header keys that are not integers, are unknown,
/// or hold a value of the wrong type.
pub fn decode_record<'a>(
    data: &'a [u8],
    cursor: usize,
    exact: bool,
    max_depth: usize,
) -> Result<(RecordHeader<'a>, usize), RecordError> {
    // The whole header must be well formed before any field is read.
    MsgpackDecoder::at(data, cursor)
        .with_max_depth(max_depth)
        .validate()?;

    let mut d = MsgpackDecoder::at(data, cursor).with_max_depth(max_depth);
    let found = d.peek_type()?;
    if found != ValueType::Map {
        return Err(HeaderKeyError::NotAMap { found }.into());
    }
    let size = d.decode_map_len()?;

    let mut header = RecordHeader::default();
    let mut tsn_delta = None;
    let mut flags = 0u64;

    for _ in 0..size {
        let found = d.peek_type()?;
        if found != ValueType::Uint {
            return Err(HeaderKeyError::NonIntegerKey { found }.into());
        }
        let key = d.decode_uint()?;
        let expected = HEADER_KEYS
            .expected_type(key)
            .ok_or(HeaderKeyError::UnknownHeaderKey { key })?;
        let found = d.peek_type()?;
        if found != expected {
            return Err(HeaderKeyError::TypeMismatch {
                key,
                expected,
                found,
            }
            .into());
        }

        match key {
            header_key::REQUEST_TYPE => header.request_type = d.decode_u32()?,
            header_key::SYNC => header.sync = d.decode_uint()?,
            header_key::REPLICA_ID => header.replica_id = d.decode_u32()?,
            header_key::GROUP_ID => header.group_id = d.decode_u32()?,
            #[allow(clippy::cast_possible_wrap)]
            header_key::LSN => header.lsn = d.decode_uint()? as i64,
            header_key::TIMESTAMP => header.timestamp = d.decode_double()?,
            header_key::SCHEMA_VERSION => header.schema_version = d.decode_u32()?,
            #[allow(clippy::cast_possible_wrap)]
            header_key::TSN => tsn_delta = Some(d.decode_uint()? as i64),
            header_key::FLAGS => flags = d.decode_uint()?,
            _ => {
                debug!(key, name = HEADER_KEYS.name(key), "skipping header key");
                d.skip()?;
            }
        }
    }

    // Without a transaction id the record is a single-statement transaction.
    header.is_commit = match tsn_delta {
        None => true,
        Some(_) => flags & FLAG_COMMIT != 0,
    };
    header.tsn = header.lsn.wrapping_sub(tsn_delta.unwrap_or(0));

    let mut end = d.position();
    if end < data.len() && header.kind() != Some(RequestType::Nop) {
        d.validate()?;
        header.body = Some(&data[end..d.position()]);
        end = d.position();
    }

    if exact && end < data.len() {
        return Err(HeaderKeyError::TrailingData {
            remaining: data.len() - end,
        }
        .into());
    }

    Ok((header, end))
}
