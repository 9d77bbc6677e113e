//! Benchmark fixtures.

use xlog_codec::Value;
use xlog_core::{RequestType, WalType};
use xlog_testkit::{LogBuilder, RecordBuilder};

/// A replace record with a tuple of `width` fields.
pub fn replace_record(lsn: u64, width: usize) -> RecordBuilder {
    let tuple = (0..width)
        .map(|i| {
            if i % 2 == 0 {
                Value::Uint(i as u64)
            } else {
                Value::Str(format!("field_{i}"))
            }
        })
        .collect();
    RecordBuilder::new(RequestType::Replace)
        .replica_id(1)
        .lsn(lsn)
        .timestamp(1_700_000_000.0)
        .body_map(vec![(0x10, Value::Uint(512)), (0x21, Value::Array(tuple))])
}

/// A log of `frames` frames holding `per_frame` records each.
pub fn sample_log(frames: usize, per_frame: usize, compressed: bool) -> Vec<u8> {
    let mut builder = LogBuilder::new(WalType::Xlog);
    let mut lsn = 1;
    for _ in 0..frames {
        let records: Vec<_> = (0..per_frame)
            .map(|_| {
                lsn += 1;
                replace_record(lsn, 8)
            })
            .collect();
        builder = if compressed {
            builder.zrows(&records)
        } else {
            builder.rows(&records)
        };
    }
    builder.eof().build()
}

/// A value nested `depth` levels deep with `width` entries per level.
pub fn nested_value(depth: usize, width: usize) -> Value {
    if depth == 0 {
        Value::Str("leaf".into())
    } else {
        Value::Map(
            (0..width)
                .map(|i| (Value::Uint(i as u64), nested_value(depth - 1, width)))
                .collect(),
        )
    }
}
