//! In-memory object store

use super::traits::{FileObj, ObjectReader, ObjectStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::ops::Range;
use std::sync::RwLock;

/// Object store holding every object in memory
///
/// Useful for tests and for embedding small fixed data sets. Objects can be
/// added and removed through `&self`, so a store shared behind an `Arc` can be
/// updated while a resolver holds it.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the object at `key`
    pub fn insert(&self, key: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.write_guard().insert(key.into(), content.into());
    }

    /// Remove the object at `key`, returning its content
    pub fn remove(&self, key: &str) -> Option<Vec<u8>> {
        self.write_guard().remove(key)
    }

    /// Number of objects held
    pub fn len(&self) -> usize {
        self.read_guard().len()
    }

    /// Whether the store holds no objects
    pub fn is_empty(&self) -> bool {
        self.read_guard().is_empty()
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.read_guard()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::ObjectNotFound(key.to_string()))
    }

    // a poisoned lock still holds a consistent map; writers only insert or remove
    fn read_guard(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.objects.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_guard(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.objects.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.read_guard().contains_key(key))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<FileObj>> {
        Ok(self
            .read_guard()
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, content)| FileObj::with_size(key.clone(), content.len() as u64))
            .collect())
    }

    async fn open(&self, key: &str) -> Result<ObjectReader> {
        Ok(Box::new(Cursor::new(self.get(key)?)))
    }

    async fn open_range(&self, key: &str, range: Range<u64>) -> Result<ObjectReader> {
        let content = self.get(key)?;
        let len = content.len();
        let start = usize::try_from(range.start).unwrap_or(usize::MAX).min(len);
        let end = usize::try_from(range.end)
            .unwrap_or(usize::MAX)
            .clamp(start, len);
        Ok(Box::new(Cursor::new(content[start..end].to_vec())))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
