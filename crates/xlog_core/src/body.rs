//! Record body interpretation.
//!
//! A body is a map keyed by small integer codes. Each entry is checked
//! against the body key table and decoded for display. Problems here never
//! abort the file: the walk stops at the first bad entry and reports it.

use crate::error::BodyKeyTypeError;
use crate::keys::BODY_KEYS;
use serde::Serialize;
use xlog_codec::{MsgpackDecoder, Value, ValueType};

/// One decoded body entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyEntry {
    /// Key code.
    pub key: u64,
    /// Display name, if the code has one.
    pub name: Option<&'static str>,
    /// Whether the code is in the body key table.
    pub known: bool,
    /// Decoded value.
    pub value: Value,
}

/// Iterator over the entries of a body map.
///
/// Yields `Ok` entries in order and at most one `Err`, after which it is
/// exhausted.
#[derive(Debug)]
pub struct BodyEntries<'a> {
    decoder: MsgpackDecoder<'a>,
    remaining: usize,
    started: bool,
    failed: bool,
}

impl<'a> BodyEntries<'a> {
    /// Starts walking `body`.
    pub fn new(body: &'a [u8], max_depth: usize) -> Self {
        Self {
            decoder: MsgpackDecoder::new(body).with_max_depth(max_depth),
            remaining: 0,
            started: false,
            failed: false,
        }
    }

    fn open(&mut self) -> Result<(), BodyKeyTypeError> {
        let found = self.decoder.peek_type()?;
        if found != ValueType::Map {
            return Err(BodyKeyTypeError::NotAMap { found });
        }
        self.remaining = self.decoder.decode_map_len()?;
        Ok(())
    }

    fn next_entry(&mut self) -> Result<BodyEntry, BodyKeyTypeError> {
        let found = self.decoder.peek_type()?;
        if found != ValueType::Uint {
            return Err(BodyKeyTypeError::NonIntegerKey { found });
        }
        let key = self.decoder.decode_uint()?;

        let spec = BODY_KEYS.lookup(key);
        if let Some(spec) = spec {
            let found = self.decoder.peek_type()?;
            if found != spec.value_type {
                return Err(BodyKeyTypeError::TypeMismatch {
                    key,
                    expected: spec.value_type,
                    found,
                });
            }
        }

        let value = self.decoder.decode()?;
        Ok(BodyEntry {
            key,
            name: spec.and_then(|s| s.name),
            known: spec.is_some(),
            value,
        })
    }
}

impl Iterator for BodyEntries<'_> {
    type Item = Result<BodyEntry, BodyKeyTypeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if !self.started {
            self.started = true;
            if let Err(err) = self.open() {
                self.failed = true;
                return Some(Err(err));
            }
        }
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let entry = self.next_entry();
        if entry.is_err() {
            self.failed = true;
        }
        Some(entry)
    }
}

/// Walks `body` and returns its entries.
pub fn body_entries(body: &[u8], max_depth: usize) -> BodyEntries<'_> {
    BodyEntries::new(body, max_depth)
}

/// Walks `body` to the end, collecting entries and the error that stopped
/// the walk, if any.
pub fn interpret_body(body: &[u8], max_depth: usize) -> (Vec<BodyEntry>, Option<BodyKeyTypeError>) {
    let mut entries = Vec::new();
    for entry in body_entries(body, max_depth) {
        match entry {
            Ok(entry) => entries.push(entry),
            Err(err) => return (entries, Some(err)),
        }
    }
    (entries, None)
}
