//! # xlog Storage
//!
//! Read-only byte sources for the xlog reader.
//!
//! Sources are **opaque byte regions**: they hand out the whole file as one
//! contiguous slice and know nothing about signatures, frames or records.
//! The reader borrows that slice for the full decode.
//!
//! ## Available Sources
//!
//! - [`MappedFile`] - A file mapped read-only into memory
//! - [`InMemorySource`] - An owned buffer, for tests and piped input
//!
//! ## Example
//!
//! ```rust
//! use xlog_storage::{LogSource, InMemorySource};
//!
//! let source = InMemorySource::new(b"XLOG\n0.13\n\n".to_vec());
//! assert_eq!(source.len(), 11);
//! assert!(source.bytes().starts_with(b"XLOG"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod mapped;
mod memory;
mod source;

pub use error::{StorageError, StorageResult};
pub use mapped::MappedFile;
pub use memory::InMemorySource;
pub use source::LogSource;
