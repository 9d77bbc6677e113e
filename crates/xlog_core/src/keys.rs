//! Key type tables for record headers and bodies.
//!
//! Both tables map a small integer key code to the value type a well-formed
//! record must carry under that key. They are built at compile time and
//! indexed directly by code.
//!
//! The tables differ on purpose: `0x02` is an unsigned replica id in a
//! header but an array in a body, and the body table knows the SQL and
//! replication keys above `0x2b`.

use xlog_codec::ValueType;

/// Expected type and display name of one key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpec {
    /// Required value type.
    pub value_type: ValueType,
    /// Display name, if the code has one.
    pub name: Option<&'static str>,
}

impl KeySpec {
    const fn unnamed(value_type: ValueType) -> Self {
        Self {
            value_type,
            name: None,
        }
    }

    const fn named(value_type: ValueType, name: &'static str) -> Self {
        Self {
            value_type,
            name: Some(name),
        }
    }
}

/// Immutable mapping from key code to [`KeySpec`].
#[derive(Debug)]
pub struct KeyTypeTable {
    entries: &'static [Option<KeySpec>],
}

impl KeyTypeTable {
    /// Spec for `code`, or `None` if the code is not listed.
    pub fn lookup(&self, code: u64) -> Option<KeySpec> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.entries.get(i))
            .copied()
            .flatten()
    }

    /// Required value type for `code`.
    pub fn expected_type(&self, code: u64) -> Option<ValueType> {
        self.lookup(code).map(|spec| spec.value_type)
    }

    /// Display name for `code`.
    pub fn name(&self, code: u64) -> Option<&'static str> {
        self.lookup(code).and_then(|spec| spec.name)
    }
}

const HEADER_LEN: usize = 0x2c;
const BODY_LEN: usize = 0x53;

/// Names shared by both namespaces for codes `0x20..=0x2b`.
const fn request_keys<const N: usize>(mut t: [Option<KeySpec>; N]) -> [Option<KeySpec>; N] {
    use ValueType::{Array, Map, Str};
    t[0x20] = Some(KeySpec::named(Array, "key"));
    t[0x21] = Some(KeySpec::named(Array, "tuple"));
    t[0x22] = Some(KeySpec::named(Str, "function name"));
    t[0x23] = Some(KeySpec::named(Str, "user name"));
    t[0x24] = Some(KeySpec::named(Str, "instance uuid"));
    t[0x25] = Some(KeySpec::named(Str, "cluster uuid"));
    t[0x26] = Some(KeySpec::named(Map, "vector clock"));
    t[0x27] = Some(KeySpec::named(Str, "expression"));
    t[0x28] = Some(KeySpec::named(Array, "operations"));
    t[0x29] = Some(KeySpec::named(Map, "ballot"));
    t[0x2a] = Some(KeySpec::named(Map, "tuple meta"));
    t[0x2b] = Some(KeySpec::named(Map, "options"));
    t
}

const fn integer_keys<const N: usize>(mut t: [Option<KeySpec>; N]) -> [Option<KeySpec>; N] {
    use ValueType::Uint;
    t[0x10] = Some(KeySpec::named(Uint, "space id"));
    t[0x11] = Some(KeySpec::named(Uint, "index id"));
    t[0x12] = Some(KeySpec::named(Uint, "limit"));
    t[0x13] = Some(KeySpec::named(Uint, "offset"));
    t[0x14] = Some(KeySpec::named(Uint, "iterator"));
    t[0x15] = Some(KeySpec::named(Uint, "index base"));
    t
}

const fn header_entries() -> [Option<KeySpec>; HEADER_LEN] {
    use ValueType::{Double, Uint};
    let mut t = [None; HEADER_LEN];

    // Every code below the request keys is unsigned, named or not.
    let mut code = 0;
    while code < 0x20 {
        t[code] = Some(KeySpec::unnamed(Uint));
        code += 1;
    }

    t[0x00] = Some(KeySpec::named(Uint, "type"));
    t[0x01] = Some(KeySpec::named(Uint, "sync"));
    t[0x02] = Some(KeySpec::named(Uint, "replica id"));
    t[0x03] = Some(KeySpec::named(Uint, "lsn"));
    t[0x04] = Some(KeySpec::named(Double, "timestamp"));
    t[0x05] = Some(KeySpec::named(Uint, "schema version"));
    t[0x06] = Some(KeySpec::named(Uint, "server version"));
    t[0x07] = Some(KeySpec::named(Uint, "group id"));
    t[0x08] = Some(KeySpec::named(Uint, "tsn"));
    t[0x09] = Some(KeySpec::named(Uint, "flags"));

    request_keys(integer_keys(t))
}

const fn body_entries() -> [Option<KeySpec>; BODY_LEN] {
    use ValueType::{Array, Bool, Map, Str, Uint};
    let mut t = [None; BODY_LEN];

    t[0x02] = Some(KeySpec::named(Array, "replica id"));

    t[0x30] = Some(KeySpec::named(Array, "data"));
    t[0x31] = Some(KeySpec::named(Str, "error"));
    t[0x32] = Some(KeySpec::named(Array, "metadata"));
    t[0x33] = Some(KeySpec::named(Array, "bind meta"));
    t[0x34] = Some(KeySpec::named(Uint, "bind count"));

    t[0x40] = Some(KeySpec::named(Str, "SQL text"));
    t[0x41] = Some(KeySpec::named(Array, "SQL bind"));
    t[0x42] = Some(KeySpec::named(Map, "SQL info"));
    t[0x43] = Some(KeySpec::named(Uint, "stmt id"));

    t[0x50] = Some(KeySpec::named(Bool, "replica anon"));
    t[0x51] = Some(KeySpec::named(Array, "id filter"));
    t[0x52] = Some(KeySpec::named(Map, "error"));

    request_keys(integer_keys(t))
}

static HEADER_ENTRIES: [Option<KeySpec>; HEADER_LEN] = header_entries();
static BODY_ENTRIES: [Option<KeySpec>; BODY_LEN] = body_entries();

/// Key types allowed in a record header. Unlisted codes are fatal.
pub static HEADER_KEYS: KeyTypeTable = KeyTypeTable {
    entries: &HEADER_ENTRIES,
};

/// Key types allowed in a record body. Unlisted codes render generically.
pub static BODY_KEYS: KeyTypeTable = KeyTypeTable {
    entries: &BODY_ENTRIES,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_fields() {
        assert_eq!(HEADER_KEYS.expected_type(0x00), Some(ValueType::Uint));
        assert_eq!(HEADER_KEYS.expected_type(0x04), Some(ValueType::Double));
        assert_eq!(HEADER_KEYS.expected_type(0x09), Some(ValueType::Uint));
        assert_eq!(HEADER_KEYS.name(0x08), Some("tsn"));
    }

    #[test]
    fn header_unused_codes_are_unsigned() {
        for code in (0x0a..=0x0f).chain(0x16..=0x1f) {
            assert_eq!(HEADER_KEYS.expected_type(code), Some(ValueType::Uint));
            assert_eq!(HEADER_KEYS.name(code), None);
        }
    }

    #[test]
    fn header_table_ends_at_options() {
        assert_eq!(HEADER_KEYS.expected_type(0x2b), Some(ValueType::Map));
        assert_eq!(HEADER_KEYS.lookup(0x2c), None);
        assert_eq!(HEADER_KEYS.lookup(0x30), None);
        assert_eq!(HEADER_KEYS.lookup(u64::MAX), None);
    }

    #[test]
    fn request_keys_shared() {
        for table in [&HEADER_KEYS, &BODY_KEYS] {
            assert_eq!(table.expected_type(0x20), Some(ValueType::Array));
            assert_eq!(table.expected_type(0x21), Some(ValueType::Array));
            assert_eq!(table.expected_type(0x24), Some(ValueType::Str));
            assert_eq!(table.expected_type(0x26), Some(ValueType::Map));
            assert_eq!(table.expected_type(0x28), Some(ValueType::Array));
            assert_eq!(table.expected_type(0x10), Some(ValueType::Uint));
            assert_eq!(table.name(0x10), Some("space id"));
        }
    }

    #[test]
    fn replica_id_differs_between_namespaces() {
        assert_eq!(HEADER_KEYS.expected_type(0x02), Some(ValueType::Uint));
        assert_eq!(BODY_KEYS.expected_type(0x02), Some(ValueType::Array));
    }

    #[test]
    fn body_only_keys() {
        assert_eq!(BODY_KEYS.expected_type(0x30), Some(ValueType::Array));
        assert_eq!(BODY_KEYS.expected_type(0x31), Some(ValueType::Str));
        assert_eq!(BODY_KEYS.expected_type(0x34), Some(ValueType::Uint));
        assert_eq!(BODY_KEYS.expected_type(0x40), Some(ValueType::Str));
        assert_eq!(BODY_KEYS.expected_type(0x42), Some(ValueType::Map));
        assert_eq!(BODY_KEYS.expected_type(0x50), Some(ValueType::Bool));
        assert_eq!(BODY_KEYS.expected_type(0x52), Some(ValueType::Map));
        assert_eq!(BODY_KEYS.name(0x40), Some("SQL text"));
        assert_eq!(BODY_KEYS.lookup(0x53), None);
    }

    #[test]
    fn body_unlisted_codes() {
        for code in [0x00, 0x01, 0x03, 0x04, 0x09, 0x0a, 0x1f, 0x2c, 0x35, 0x44, 0x53, 0xff] {
            assert_eq!(BODY_KEYS.lookup(code), None, "code {code:#x}");
        }
    }
}
