//! # xlog Testkit
//!
//! Test utilities for the xlog reader.
//!
//! This crate provides:
//! - Builders for records and whole log files
//! - Property-based test generators using proptest
//! - Text rendering helpers for golden-style comparisons
//! - Fuzz harnesses that must never panic
//! - End-to-end decoding scenarios
//!
//! ## Usage
//!
//! ```
//! use xlog_core::{RequestType, WalType};
//! use xlog_testkit::{LogBuilder, RecordBuilder};
//!
//! let file = LogBuilder::new(WalType::Xlog)
//!     .rows(&[RecordBuilder::new(RequestType::Nop).sync(1).lsn(10)])
//!     .eof()
//!     .build();
//! assert!(file.starts_with(b"XLOG\n"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod golden;
pub mod scenarios;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::golden::*;
    pub use crate::scenarios::*;
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use golden::*;
pub use scenarios::*;
