//! Property-based test generators using proptest.
//!
//! Generated records and frames are always well formed, so properties can
//! assert exact decoding results.

use crate::fixtures::RecordBuilder;
use proptest::prelude::*;
use xlog_codec::Value;
use xlog_core::constants::BODY_LEN_MAX;
use xlog_core::{FrameHeader, FrameKind, RequestType};

/// Strategy for arbitrary MessagePack values, nested up to four levels.
///
/// NaN floats are excluded so decoded values compare equal.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::Bool),
        any::<u64>().prop_map(Value::Uint),
        (i64::MIN..0i64).prop_map(Value::Int),
        "[a-zA-Z0-9 ]{0,24}".prop_map(Value::Str),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::Bin),
        any::<f64>()
            .prop_filter("NaN breaks equality", |x| !x.is_nan())
            .prop_map(Value::Double),
        (any::<i8>(), prop::collection::vec(any::<u8>(), 0..17))
            .prop_map(|(type_id, data)| Value::Ext { type_id, data }),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec((inner.clone(), inner), 0..4).prop_map(Value::Map),
        ]
    })
}

/// Strategy for `(lsn, delta)` pairs with `delta <= lsn`, delta 0 included.
pub fn lsn_delta_strategy() -> impl Strategy<Value = (u64, u64)> {
    (0..=i64::MAX as u64).prop_flat_map(|lsn| (Just(lsn), prop_oneof![Just(0), 0..=lsn]))
}

/// Strategy for valid frame preambles of every kind.
pub fn frame_header_strategy() -> impl Strategy<Value = FrameHeader> {
    let max_len = u32::try_from(BODY_LEN_MAX).unwrap_or(u32::MAX);
    prop_oneof![
        4 => (
            prop_oneof![Just(FrameKind::Row), Just(FrameKind::CompressedRow)],
            prop_oneof![0..=255u32, 0..=max_len],
            any::<u32>(),
            any::<u32>(),
        )
            .prop_map(|(kind, len, crc32p, crc32c)| FrameHeader::new(kind, len, crc32p, crc32c)),
        1 => Just(FrameHeader::eof()),
    ]
}

/// Strategy for request types that may carry a body.
pub fn request_type_strategy() -> impl Strategy<Value = RequestType> {
    prop::sample::select(
        RequestType::ALL
            .iter()
            .copied()
            .filter(|t| *t != RequestType::Nop)
            .collect::<Vec<_>>(),
    )
}

/// Strategy for a body map using known integer keys with values of the
/// right type, plus unknown keys with anything.
pub fn body_strategy() -> impl Strategy<Value = Vec<(u64, Value)>> {
    let entry = prop_oneof![
        (0x10..=0x15u64, any::<u32>()).prop_map(|(k, v)| (k, Value::Uint(u64::from(v)))),
        prop::collection::vec(value_strategy(), 0..4)
            .prop_map(|items| (0x21, Value::Array(items))),
        "[a-z ]{0,16}".prop_map(|s| (0x40, Value::Str(s))),
        (0x60..=0x7fu64, value_strategy()),
    ];
    prop::collection::vec(entry, 0..5)
}

/// Strategy for a well-formed record with a body.
///
/// Every non-NOP record carries a body, so records can share a frame.
pub fn record_strategy() -> impl Strategy<Value = RecordBuilder> {
    (
        request_type_strategy(),
        any::<u64>(),
        0..32u32,
        lsn_delta_strategy(),
        prop::option::of(any::<bool>()),
        body_strategy(),
    )
        .prop_map(|(kind, sync, replica, (lsn, delta), commit, body)| {
            let mut record = RecordBuilder::new(kind)
                .sync(sync)
                .replica_id(replica)
                .lsn(lsn);
            if let Some(commit) = commit {
                record = record.tsn_delta(delta).commit(commit);
            }
            record.body_map(body)
        })
}
