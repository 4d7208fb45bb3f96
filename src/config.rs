//! Configuration types for dissemination

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Object-store reads are chunked in multiples of this size (256 KiB)
pub const CHUNK_ALIGNMENT: usize = 256 * 1024;

/// Names of the three storage tiers
///
/// Each name is the top-level directory of that tier inside the object store.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Tier holding the most recently published descriptor and rendition (default: "ftp")
    #[serde(default = "default_current_tier")]
    pub current: String,

    /// Immutable per-version tier (default: "orig")
    #[serde(default = "default_archive_tier")]
    pub archive: String,

    /// Pre-rendered output tier (default: "ps_cache")
    #[serde(default = "default_cache_tier")]
    pub cache: String,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            current: default_current_tier(),
            archive: default_archive_tier(),
            cache: default_cache_tier(),
        }
    }
}

/// Main configuration for [`ArticleStore`](crate::ArticleStore)
///
/// All fields have serde defaults, so an empty document deserializes to
/// [`Config::default()`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Root of the object store, e.g. `gs://bucket` or `/cache/data` (default: "./testing/data")
    ///
    /// Must not end with a `/`.
    #[serde(default = "default_storage_prefix")]
    pub storage_prefix: String,

    /// Chunk size in bytes for streamed range reads (default: 1 MiB)
    ///
    /// Must be a multiple of 256 KiB.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Listing size above which a source-existence check stops scanning and
    /// reports that source exists (default: 1000)
    #[serde(default = "default_max_source_listing")]
    pub max_source_listing: usize,

    /// Storage tier names
    #[serde(default)]
    pub tiers: TierConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_prefix: default_storage_prefix(),
            chunk_size: default_chunk_size(),
            max_source_listing: default_max_source_listing(),
            tiers: TierConfig::default(),
        }
    }
}

impl Config {
    /// Check the configuration for values the store cannot work with
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if self.storage_prefix.is_empty() {
            return Err(config_error("storage_prefix must not be empty", "storage_prefix"));
        }
        if self.storage_prefix.ends_with('/') {
            return Err(config_error(
                format!(
                    "storage_prefix should not end with a slash, prefix was {}",
                    self.storage_prefix
                ),
                "storage_prefix",
            ));
        }
        if self.chunk_size == 0 || self.chunk_size % CHUNK_ALIGNMENT != 0 {
            return Err(config_error(
                format!(
                    "chunk_size must be a non-zero multiple of 256kb, was {}",
                    self.chunk_size
                ),
                "chunk_size",
            ));
        }
        if self.max_source_listing == 0 {
            return Err(config_error(
                "max_source_listing must be at least 1",
                "max_source_listing",
            ));
        }
        for (key, name) in [
            ("tiers.current", &self.tiers.current),
            ("tiers.archive", &self.tiers.archive),
            ("tiers.cache", &self.tiers.cache),
        ] {
            if name.is_empty() || name.contains('/') {
                return Err(config_error(
                    format!("tier name must be a single non-empty path segment, was {name:?}"),
                    key,
                ));
            }
        }
        Ok(())
    }
}

fn config_error(message: impl Into<String>, key: &str) -> Error {
    Error::Config {
        message: message.into(),
        key: Some(key.to_string()),
    }
}

fn default_storage_prefix() -> String {
    "./testing/data".to_string()
}

fn default_chunk_size() -> usize {
    4 * CHUNK_ALIGNMENT
}

fn default_max_source_listing() -> usize {
    1000
}

fn default_current_tier() -> String {
    "ftp".to_string()
}

fn default_archive_tier() -> String {
    "orig".to_string()
}

fn default_cache_tier() -> String {
    "ps_cache".to_string()
}
