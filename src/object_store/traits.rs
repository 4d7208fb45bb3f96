//! Traits and types for object store access

use async_trait::async_trait;
use std::fmt;
use std::ops::Range;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Streamed reader over an object's bytes
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// Reference to an object at a specific key
///
/// A handle is a plain value: it is built on demand, never mutated, and reading it
/// goes through the [`ObjectStore`] that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileObj {
    key: String,
    size: Option<u64>,
}

impl FileObj {
    /// Handle for `key` with unknown size
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size: None,
        }
    }

    /// Handle for `key` with a known size in bytes
    pub fn with_size(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size: Some(size),
        }
    }

    /// Full storage key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Size in bytes, when the listing reported one
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Terminal path segment of the key
    pub fn name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    /// Dot-separated segments of the name after the stem
    ///
    /// `paper.tar.gz` gives `["tar", "gz"]`. New-style names keep their number as a
    /// segment: `0704.0001v1.tar.gz` gives `["0001v1", "tar", "gz"]`, so compare
    /// extensions with [`FileObj::has_suffix`] instead.
    pub fn suffixes(&self) -> Vec<&str> {
        self.name().split('.').skip(1).collect()
    }

    /// Whether the object's name ends with `suffix` (e.g. `".tar.gz"`)
    pub fn has_suffix(&self, suffix: &str) -> bool {
        self.name().ends_with(suffix)
    }
}

impl fmt::Display for FileObj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Trait for byte-blob stores
///
/// Implementations must be safe to share between tasks. None of the operations
/// mutate the store.
///
/// # Examples
///
/// ```no_run
/// use dissemination::object_store::{MemoryObjectStore, ObjectStore};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryObjectStore::new();
/// store.insert("ftp/arxiv/papers/0704/0704.0001.abs", "\\\\\n");
/// assert!(store.exists("ftp/arxiv/papers/0704/0704.0001.abs").await?);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether an object exists at `key`
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend fails; absence is `Ok(false)`.
    async fn exists(&self, key: &str) -> crate::Result<bool>;

    /// Objects whose key starts with `prefix`, sorted by key
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails. A prefix with no matches is an
    /// empty list.
    async fn list(&self, prefix: &str) -> crate::Result<Vec<FileObj>>;

    /// Open the object at `key` for streamed reading
    ///
    /// # Errors
    ///
    /// Returns [`Error::ObjectNotFound`](crate::Error::ObjectNotFound) if there is no
    /// object at `key`, or a backend error.
    async fn open(&self, key: &str) -> crate::Result<ObjectReader>;

    /// Open the bytes `range` of the object at `key`
    ///
    /// A range extending past the end of the object is truncated.
    ///
    /// # Errors
    ///
    /// Same as [`ObjectStore::open`].
    async fn open_range(&self, key: &str, range: Range<u64>) -> crate::Result<ObjectReader>;

    /// Read the whole object at `key`
    ///
    /// # Errors
    ///
    /// Same as [`ObjectStore::open`], plus read failures.
    async fn read_to_end(&self, key: &str) -> crate::Result<Vec<u8>> {
        let mut reader = self.open(key).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Read the object at `key` as text lines
    ///
    /// Invalid UTF-8 is replaced rather than rejected; legacy descriptors are not
    /// guaranteed to be UTF-8. The reader is released before returning.
    ///
    /// # Errors
    ///
    /// Same as [`ObjectStore::read_to_end`].
    async fn read_lines(&self, key: &str) -> crate::Result<Vec<String>> {
        let bytes = self.read_to_end(key).await?;
        Ok(String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect())
    }

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
