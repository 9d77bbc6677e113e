//! Memory-mapped file source.

use crate::error::{StorageError, StorageResult};
use crate::source::LogSource;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A file mapped read-only into memory.
///
/// The mapping lives as long as this value; the reader borrows it for the
/// whole decode and releases it when dropped. Zero-length files are not
/// mapped, since most platforms refuse an empty mapping.
///
/// Modifying the file while it is mapped is undefined behaviour at the OS
/// level. Log files are append-only and the reader only inspects files the
/// database has finished with.
///
/// # Example
///
/// ```no_run
/// use xlog_storage::{LogSource, MappedFile};
/// use std::path::Path;
///
/// let file = MappedFile::open(Path::new("00000000000000000000.xlog")).unwrap();
/// println!("{} bytes", file.len());
/// ```
#[derive(Debug)]
pub struct MappedFile {
    path: PathBuf,
    map: Option<Mmap>,
}

impl MappedFile {
    /// Opens and maps the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, its size cannot be
    /// read, or the mapping fails.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = File::open(path).map_err(|source| StorageError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let len = file
            .metadata()
            .map_err(|source| StorageError::Stat {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        let map = if len == 0 {
            None
        } else {
            // SAFETY: the mapping is read-only and log files are not
            // modified while the reader holds them.
            #[allow(unsafe_code)]
            let map = unsafe { Mmap::map(&file) }.map_err(|source| StorageError::Map {
                path: path.to_path_buf(),
                source,
            })?;
            Some(map)
        };

        Ok(Self {
            path: path.to_path_buf(),
            map,
        })
    }

    /// Returns the path this source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSource for MappedFile {
    fn bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }
}
