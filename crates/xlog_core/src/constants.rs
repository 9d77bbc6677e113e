//! Protocol constants and request type names.

use std::fmt;

/// Size of the fixed preamble of a non-EOF frame:
/// magic (4) + length + previous checksum + current checksum + padding.
pub const FIXHEADER_SIZE: usize = 19;

/// Size of a frame magic.
pub const MAGIC_SIZE: usize = 4;

/// Largest frame payload a writer may declare (2 GiB).
pub const BODY_LEN_MAX: u64 = 1 << 31;

/// Flag bit set on the last record of a transaction.
pub const FLAG_COMMIT: u64 = 0x01;

/// Header key codes the record decoder consumes.
pub mod header_key {
    /// Request type.
    pub const REQUEST_TYPE: u64 = 0x00;
    /// Request sync number.
    pub const SYNC: u64 = 0x01;
    /// Originating replica.
    pub const REPLICA_ID: u64 = 0x02;
    /// Log sequence number.
    pub const LSN: u64 = 0x03;
    /// Wall-clock timestamp.
    pub const TIMESTAMP: u64 = 0x04;
    /// Schema version.
    pub const SCHEMA_VERSION: u64 = 0x05;
    /// Replication group.
    pub const GROUP_ID: u64 = 0x07;
    /// Transaction id, as a delta from the LSN.
    pub const TSN: u64 = 0x08;
    /// Record flags.
    pub const FLAGS: u64 = 0x09;
}

/// Record request types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RequestType {
    /// Successful acknowledgement.
    Ok = 0,
    /// Select.
    Select = 1,
    /// Insert.
    Insert = 2,
    /// Replace.
    Replace = 3,
    /// Update.
    Update = 4,
    /// Delete.
    Delete = 5,
    /// Legacy call.
    Call16 = 6,
    /// Authentication.
    Auth = 7,
    /// Eval.
    Eval = 8,
    /// Upsert.
    Upsert = 9,
    /// Call.
    Call = 10,
    /// SQL execute.
    Execute = 11,
    /// No-op; bumps the LSN and never carries a body.
    Nop = 12,
    /// SQL prepare.
    Prepare = 13,
    /// Ping.
    Ping = 64,
    /// Replication join.
    Join = 65,
    /// Replication subscribe.
    Subscribe = 66,
    /// Deprecated vote.
    VoteDeprecated = 67,
    /// Election vote.
    Vote = 68,
    /// Anonymous replica snapshot fetch.
    FetchSnapshot = 69,
    /// Anonymous replica registration.
    Register = 70,
    /// Vinyl run info, stored in `.index` files.
    VyIndexRunInfo = 100,
    /// Vinyl page info, stored in `.index` files.
    VyIndexPageInfo = 101,
    /// Vinyl row index, stored in `.run` files.
    VyRunRowIndex = 102,
    /// Non-final response.
    Chunk = 128,
}

impl RequestType {
    /// Every known request type, in code order.
    pub const ALL: [RequestType; 25] = [
        Self::Ok,
        Self::Select,
        Self::Insert,
        Self::Replace,
        Self::Update,
        Self::Delete,
        Self::Call16,
        Self::Auth,
        Self::Eval,
        Self::Upsert,
        Self::Call,
        Self::Execute,
        Self::Nop,
        Self::Prepare,
        Self::Ping,
        Self::Join,
        Self::Subscribe,
        Self::VoteDeprecated,
        Self::Vote,
        Self::FetchSnapshot,
        Self::Register,
        Self::VyIndexRunInfo,
        Self::VyIndexPageInfo,
        Self::VyRunRowIndex,
        Self::Chunk,
    ];

    /// Looks up a request type by its wire code.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.code() == code)
    }

    /// Wire code.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Replace => "REPLACE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Call16 => "CALL_16",
            Self::Auth => "AUTH",
            Self::Eval => "EVAL",
            Self::Upsert => "UPSERT",
            Self::Call => "CALL",
            Self::Execute => "EXECUTE",
            Self::Nop => "NOP",
            Self::Prepare => "PREPARE",
            Self::Ping => "PING",
            Self::Join => "JOIN",
            Self::Subscribe => "SUBSCRIBE",
            Self::VoteDeprecated => "VOTE_DEPRECATED",
            Self::Vote => "VOTE",
            Self::FetchSnapshot => "FETCH_SNAPSHOT",
            Self::Register => "REGISTER",
            Self::VyIndexRunInfo => "VY_INDEX_RUN_INFO",
            Self::VyIndexPageInfo => "VY_INDEX_PAGE_INFO",
            Self::VyRunRowIndex => "VY_RUN_ROW_INDEX",
            Self::Chunk => "CHUNK",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name of a request type code, or `UNKNOWN`.
pub fn request_type_name(code: u32) -> &'static str {
    RequestType::from_code(code).map_or("UNKNOWN", RequestType::name)
}
