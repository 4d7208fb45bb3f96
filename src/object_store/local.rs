//! Filesystem-backed object store

use super::traits::{FileObj, ObjectReader, ObjectStore};
use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::io::SeekFrom;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt, BufReader};
use tracing::debug;

/// Default read buffer, matching [`Config::chunk_size`]'s default
const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Object store whose keys are `/`-separated paths under a root directory
///
/// Listing is by prefix within the prefix's parent directory, which matches how
/// the tiers lay objects out (one flat directory per archive and month).
#[derive(Clone, Debug)]
pub struct LocalObjectStore {
    root: PathBuf,
    chunk_size: usize,
}

impl LocalObjectStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Use `chunk_size` bytes as the read buffer for opened objects
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.split('/').any(|segment| segment == "..") {
            return Err(Error::ObjectStore(format!(
                "key {key:?} escapes the store root"
            )));
        }
        Ok(self.root.join(key.trim_start_matches('/')))
    }

    async fn open_file(&self, key: &str) -> Result<tokio::fs::File> {
        let path = self.path_for(key)?;
        match tokio::fs::File::open(&path).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::ObjectNotFound(key.to_string()))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Io(e)),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<FileObj>> {
        let (dir_key, _) = prefix.rsplit_once('/').unwrap_or(("", prefix));
        let dir = self.path_for(dir_key)?;

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(prefix, "no directory for prefix");
                return Ok(Vec::new());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let mut objects = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let key = if dir_key.is_empty() {
                file_name.into_owned()
            } else {
                format!("{dir_key}/{file_name}")
            };
            if key.starts_with(prefix) {
                objects.push(FileObj::with_size(key, meta.len()));
            }
        }

        objects.sort_by(|a, b| a.key().cmp(b.key()));
        Ok(objects)
    }

    async fn open(&self, key: &str) -> Result<ObjectReader> {
        let file = self.open_file(key).await?;
        Ok(Box::new(BufReader::with_capacity(self.chunk_size, file)))
    }

    async fn open_range(&self, key: &str, range: Range<u64>) -> Result<ObjectReader> {
        let mut file = self.open_file(key).await?;
        file.seek(SeekFrom::Start(range.start)).await?;
        let len = range.end.saturating_sub(range.start);
        Ok(Box::new(BufReader::with_capacity(
            self.chunk_size,
            file.take(len),
        )))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Build a filesystem store from `config`
///
/// # Errors
///
/// Returns [`Error::Config`] if the configuration is invalid, if `storage_prefix`
/// names a remote scheme (`gs://`, `s3://`, ...), or if the directory does not exist.
pub fn from_config(config: &Config) -> Result<LocalObjectStore> {
    config.validate()?;

    if config.storage_prefix.contains("://") {
        return Err(Error::Config {
            message: format!(
                "remote storage prefix {} needs an ObjectStore supplied by the application",
                config.storage_prefix
            ),
            key: Some("storage_prefix".to_string()),
        });
    }

    let root = PathBuf::from(&config.storage_prefix);
    if !root.is_dir() {
        return Err(Error::Config {
            message: format!(
                "storage prefix {} does not exist or cannot be read",
                config.storage_prefix
            ),
            key: Some("storage_prefix".to_string()),
        });
    }

    Ok(LocalObjectStore::new(root).with_chunk_size(config.chunk_size))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, key: &str, content: &[u8]) {
        let path = root.join(key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn exists_only_for_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "ftp/arxiv/papers/0704/0704.0001.abs", b"abs");
        let store = LocalObjectStore::new(temp.path());

        assert!(store.exists("ftp/arxiv/papers/0704/0704.0001.abs").await.unwrap());
        assert!(!store.exists("ftp/arxiv/papers/0704").await.unwrap());
        assert!(!store.exists("ftp/arxiv/papers/0704/missing.abs").await.unwrap());
    }

    #[tokio::test]
    async fn list_matches_prefix_in_parent_directory() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "orig/arxiv/papers/0704/0704.0001v1.abs", b"a");
        write(temp.path(), "orig/arxiv/papers/0704/0704.0001v2.abs", b"bb");
        write(temp.path(), "orig/arxiv/papers/0704/0704.0002v1.abs", b"c");
        let store = LocalObjectStore::new(temp.path());

        let listed = store
            .list("orig/arxiv/papers/0704/0704.0001")
            .await
            .unwrap();
        let names: Vec<&str> = listed.iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["0704.0001v1.abs", "0704.0001v2.abs"]);
        assert_eq!(listed[1].size(), Some(2));
    }

    #[tokio::test]
    async fn list_of_missing_directory_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path());
        assert!(store.list("orig/arxiv/papers/9999/x").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_missing_is_object_not_found() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path());
        match store.open("ftp/nothing.abs").await {
            Err(Error::ObjectNotFound(key)) => assert_eq!(key, "ftp/nothing.abs"),
            Err(e) => panic!("unexpected error {e}"),
            Ok(_) => panic!("expected ObjectNotFound"),
        }
    }

    #[tokio::test]
    async fn open_range_reads_slice() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "ftp/file.pdf", b"0123456789");
        let store = LocalObjectStore::new(temp.path()).with_chunk_size(4);

        let mut reader = store.open_range("ftp/file.pdf", 2..6).await.unwrap();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"2345");

        let mut reader = store.open_range("ftp/file.pdf", 8..100).await.unwrap();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"89");
    }

    #[tokio::test]
    async fn parent_segments_are_rejected() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path());
        assert!(matches!(
            store.exists("../etc/passwd").await,
            Err(Error::ObjectStore(_))
        ));
    }

    #[test]
    fn from_config_rejects_remote_prefix() {
        let config = Config {
            storage_prefix: "gs://arxiv-production-data".to_string(),
            ..Default::default()
        };
        assert!(matches!(from_config(&config), Err(Error::Config { .. })));
    }

    #[test]
    fn from_config_requires_existing_directory() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");
        let config = Config {
            storage_prefix: missing.to_string_lossy().into_owned(),
            ..Default::default()
        };
        assert!(matches!(from_config(&config), Err(Error::Config { .. })));

        let config = Config {
            storage_prefix: temp.path().to_string_lossy().into_owned(),
            ..Default::default()
        };
        let store = from_config(&config).unwrap();
        assert_eq!(store.root(), temp.path());
    }
}
