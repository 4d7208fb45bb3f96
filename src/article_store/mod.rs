//! Artifact resolution across the storage tiers
//!
//! An article's objects live in three tiers:
//! - the **cache** tier holds pre-rendered output and is consulted first
//! - the **current** tier holds the latest version's descriptor, rendition and source
//! - the **archive** tier holds every earlier version, suffixed `vN`
//!
//! The current tier is always exactly one version ahead of the highest archived
//! version. [`ArticleStore`] probes the tiers in a fixed priority order and returns
//! either the object that represents the requested artifact or the [`Condition`]
//! explaining why there is none.

use crate::config::Config;
use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::formats::{
    AncillaryFile, VALID_SOURCE_EXTENSIONS, formats_from_source_file_name,
    formats_from_source_flag, list_ancillary_files,
};
use crate::identifier::Identifier;
use crate::key_patterns::KeyPatterns;
use crate::object_store::{FileObj, ObjectStore};
use crate::types::{Condition, Format, Resolution};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};


/// Source-type flag that marks a version as withdrawn
pub const WITHDRAWN_SOURCE_TYPE: &str = "I";

static RE_VERSION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r".*v(\d+)").unwrap_or_else(|e| panic!("invalid version suffix regex: {e}"))
});

/// Version number from the trailing `vN` of an object name, 0 if there is none
fn path_to_version(obj: &FileObj) -> u32 {
    RE_VERSION_SUFFIX
        .captures(obj.name())
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

fn is_source_name(name: &str) -> bool {
    VALID_SOURCE_EXTENSIONS
        .iter()
        .any(|(extension, _)| name.ends_with(extension))
}

/// Options for [`ArticleStore::descriptor_for_id`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DescriptorLookup {
    /// Version to look up; overrides the identifier's version
    pub version: Option<u32>,
    /// Always read the current descriptor
    pub current: bool,
    /// Accept the current descriptor when no archived descriptor matches but the
    /// version exists (the current descriptor records every version)
    pub any: bool,
}

/// Resolves identifiers to objects in a tiered object store
///
/// Holds no state besides the object store reference and key layout, so one
/// instance can serve concurrent requests.
#[derive(Clone)]
pub struct ArticleStore {
    store: Arc<dyn ObjectStore>,
    keys: KeyPatterns,
    max_source_listing: usize,
}

impl std::fmt::Debug for ArticleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArticleStore")
            .field("store", &self.store.name())
            .field("keys", &self.keys)
            .field("max_source_listing", &self.max_source_listing)
            .finish()
    }
}

impl ArticleStore {
    /// Create a resolver over `store` with the default tier layout
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self::with_config(store, &Config::default())
    }

    /// Create a resolver over `store` with tier names and listing cap from `config`
    pub fn with_config(store: Arc<dyn ObjectStore>, config: &Config) -> Self {
        Self {
            store,
            keys: KeyPatterns::new(config.tiers.clone()),
            max_source_listing: config.max_source_listing,
        }
    }

    /// The underlying object store
    pub fn object_store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    /// Key layout in use
    pub fn keys(&self) -> &KeyPatterns {
        &self.keys
    }

    /// Latest version of the article, or `None` if the article does not exist
    ///
    /// With archived versions present this is the highest archived version plus
    /// one; with none, the article is at version 1 if its current descriptor exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the object store fails.
    pub async fn current_version(&self, id: &Identifier) -> Result<Option<u32>> {
        let archive_prefix = self.keys.archive_listing_prefix(id);
        let archived = self.store.list(&archive_prefix).await?;
        if let Some(highest) = archived.iter().map(path_to_version).max() {
            return Ok(Some(highest + 1));
        }

        let current_key = self.keys.current_descriptor(id);
        if self.store.exists(&current_key).await? {
            Ok(Some(1))
        } else {
            debug!(
                store = self.store.name(),
                %archive_prefix,
                %current_key,
                "no current version, no objects found"
            );
            Ok(None)
        }
    }

    /// Locate the descriptor for `id`
    ///
    /// The current descriptor is used when `current` is set, when the identifier
    /// has no version, or when version 1 is asked for; it must exist for every real
    /// article, so its absence is [`Condition::ArticleNotFound`]. Otherwise the
    /// archived descriptor of the version is tried, then that of the version before
    /// it (the archive lags the current tier by one version), and finally
    /// [`Condition::VersionNotFound`].
    ///
    /// # Errors
    ///
    /// Returns an error if the object store fails.
    pub async fn descriptor_for_id(
        &self,
        id: &Identifier,
        lookup: DescriptorLookup,
    ) -> Result<Resolution> {
        let first_version = lookup.version == Some(1) || id.version() == Some(1);
        let version = match lookup.version.or(id.version()) {
            Some(version) if !lookup.current && id.has_version() && !first_version => version,
            _ => {
                let key = self.keys.current_descriptor(id);
                return if self.store.exists(&key).await? {
                    Ok(Resolution::Found(FileObj::new(key)))
                } else {
                    Ok(Condition::ArticleNotFound.into())
                };
            }
        };

        let key = self.keys.archived_descriptor(id, version);
        if self.store.exists(&key).await? {
            return Ok(Resolution::Found(FileObj::new(key)));
        }

        if version > 1 {
            let key = self.keys.archived_descriptor(id, version - 1);
            if self.store.exists(&key).await? {
                return Ok(Resolution::Found(FileObj::new(key)));
            }
        }

        if lookup.any
            && let Some(current) = self.current_version(id).await?
            && version <= current
        {
            let key = self.keys.current_descriptor(id);
            if self.store.exists(&key).await? {
                return Ok(Resolution::Found(FileObj::new(key)));
            }
        }

        Ok(Condition::VersionNotFound.into())
    }

    /// Resolve the `format` rendition of `id`
    ///
    /// Unversioned identifiers are resolved by
    /// [`dissemination_for_id_current`](Self::dissemination_for_id_current). For a
    /// versioned identifier the probes are, in order: the cache tier, the legacy
    /// previous-version rendition, and the current-tier rendition when the version is
    /// the current one. With nothing found the version is reported withdrawn if its
    /// source type says so or if it has no source, and unavailable otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for any format but [`Format::Pdf`],
    /// [`Error::Descriptor`] if the current descriptor is corrupted, or an object
    /// store error.
    pub async fn dissemination_for_id(&self, format: Format, id: &Identifier) -> Result<Resolution> {
        if format != Format::Pdf {
            return Err(Error::UnsupportedFormat(format));
        }

        let Some(version) = id.version() else {
            return self.dissemination_for_id_current(format, id).await;
        };

        let cache_key = self.keys.cache_rendition(format, id, None);
        if self.store.exists(&cache_key).await? {
            return Ok(Resolution::Found(FileObj::new(cache_key)));
        }

        let previous_key = self.keys.previous_rendition(id);
        if self.store.exists(&previous_key).await? {
            return Ok(Resolution::Found(FileObj::new(previous_key)));
        }

        let Some(current_version) = self.current_version(id).await? else {
            return Ok(Condition::ArticleNotFound.into());
        };
        if version > current_version {
            return Ok(Condition::VersionNotFound.into());
        }

        let current_key = self.keys.current_rendition(id);
        if version == current_version && self.store.exists(&current_key).await? {
            return Ok(Resolution::Found(FileObj::new(current_key)));
        }

        if self.is_withdrawn(id).await? {
            return Ok(Condition::Withdrawn.into());
        }
        // no source on this path is reported as withdrawn, unlike the current path
        if !self.source_exists(id).await? {
            return Ok(Condition::Withdrawn.into());
        }

        debug!(
            id = %id,
            tried = ?[&cache_key, &previous_key, &current_key],
            "no rendition found, source exists and version is not withdrawn"
        );
        Ok(Condition::Unavailable.into())
    }

    /// Resolve the `format` rendition of the latest version of `id`
    ///
    /// Probes the cache tier for the current version, then the current-tier
    /// rendition. With nothing found, descriptor resolution decides between
    /// [`Condition::ArticleNotFound`] and [`Condition::VersionNotFound`], then the
    /// version is reported withdrawn, [`Condition::NoSource`], or unavailable.
    ///
    /// # Errors
    ///
    /// Same as [`dissemination_for_id`](Self::dissemination_for_id).
    pub async fn dissemination_for_id_current(
        &self,
        format: Format,
        id: &Identifier,
    ) -> Result<Resolution> {
        if format != Format::Pdf {
            return Err(Error::UnsupportedFormat(format));
        }

        let Some(version) = self.current_version(id).await? else {
            debug!(id = id.id(), "no current version found for article");
            return Ok(Condition::ArticleNotFound.into());
        };

        let cache_key = self.keys.cache_rendition(format, id, Some(version));
        if self.store.exists(&cache_key).await? {
            return Ok(Resolution::Found(FileObj::new(cache_key)));
        }

        let current_key = self.keys.current_rendition(id);
        if self.store.exists(&current_key).await? {
            return Ok(Resolution::Found(FileObj::new(current_key)));
        }

        if let Resolution::Condition(condition) =
            self.descriptor_for_id(id, DescriptorLookup::default()).await?
        {
            return Ok(condition.into());
        }

        if self.is_withdrawn(id).await? {
            return Ok(Condition::Withdrawn.into());
        }
        if !self.source_exists(id).await? {
            return Ok(Condition::NoSource.into());
        }

        warn!(
            id = %id,
            tried = ?[&cache_key, &current_key],
            "no rendition found, source exists and version is not withdrawn"
        );
        Ok(Condition::Unavailable.into())
    }

    /// Parsed submission history from the current descriptor
    ///
    /// # Errors
    ///
    /// Returns [`Error::ObjectNotFound`] if the current descriptor is missing and
    /// [`Error::Descriptor`] if it is corrupted.
    pub async fn descriptor(&self, id: &Identifier) -> Result<Descriptor> {
        let lines = self
            .store
            .read_lines(&self.keys.current_descriptor(id))
            .await?;
        Descriptor::from_lines(lines)
    }

    /// Source-type flag of the identifier's version, or of the latest version
    ///
    /// Empty when the version is not recorded in the current descriptor.
    ///
    /// # Errors
    ///
    /// Same as [`descriptor`](Self::descriptor).
    pub async fn source_type(&self, id: &Identifier) -> Result<String> {
        let descriptor = self.descriptor(id).await?;
        Ok(descriptor.source_type_for(id.version()).to_string())
    }

    /// Whether the identifier's version is withdrawn
    ///
    /// True exactly when its source-type flag is `I`.
    ///
    /// # Errors
    ///
    /// Same as [`descriptor`](Self::descriptor).
    pub async fn is_withdrawn(&self, id: &Identifier) -> Result<bool> {
        Ok(self.source_type(id).await? == WITHDRAWN_SOURCE_TYPE)
    }

    /// The version `id` resolves to and whether it is the current one
    ///
    /// `None` if the article does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the object store fails.
    pub async fn versioned_or_current(&self, id: &Identifier) -> Result<Option<(u32, bool)>> {
        let Some(current) = self.current_version(id).await? else {
            return Ok(None);
        };
        Ok(Some(match id.version() {
            Some(version) => (version, version == current),
            None => (current, true),
        }))
    }

    /// Whether any source file exists for the identifier's version
    ///
    /// A listing longer than the configured cap is taken to mean source exists
    /// without scanning it.
    ///
    /// # Errors
    ///
    /// Returns an error if the object store fails.
    pub async fn source_exists(&self, id: &Identifier) -> Result<bool> {
        let Some(candidates) = self.source_candidates(id).await? else {
            return Ok(false);
        };
        match candidates {
            SourceListing::Oversized(len) => {
                warn!(
                    id = %id,
                    len,
                    cap = self.max_source_listing,
                    "source listing unexpectedly large, assuming source exists"
                );
                Ok(true)
            }
            SourceListing::Objects(objects) => {
                Ok(objects.iter().any(|obj| is_source_name(obj.name())))
            }
        }
    }

    /// The source file of the identifier's version, if there is one
    ///
    /// When several objects match, the extension table order decides.
    ///
    /// # Errors
    ///
    /// Returns an error if the object store fails.
    pub async fn source_for_id(&self, id: &Identifier) -> Result<Option<FileObj>> {
        let objects = match self.source_candidates(id).await? {
            Some(SourceListing::Objects(objects)) => objects,
            Some(SourceListing::Oversized(len)) => {
                warn!(id = %id, len, "source listing unexpectedly large, not scanning");
                return Ok(None);
            }
            None => return Ok(None),
        };

        Ok(VALID_SOURCE_EXTENSIONS.iter().find_map(|(extension, _)| {
            objects
                .iter()
                .find(|obj| obj.name().ends_with(extension))
                .cloned()
        }))
    }

    /// Ancillary files shipped in the source package of the identifier's version
    ///
    /// # Errors
    ///
    /// Returns an error if the object store fails.
    pub async fn ancillary_files_for_id(&self, id: &Identifier) -> Result<Vec<AncillaryFile>> {
        match self.source_for_id(id).await? {
            Some(package) => list_ancillary_files(self.store.as_ref(), &package).await,
            None => Ok(Vec::new()),
        }
    }

    /// Formats the identifier's version can be disseminated in
    ///
    /// The source file name decides when its extension constrains the formats;
    /// otherwise the source-type flag and `format_pref` do.
    ///
    /// # Errors
    ///
    /// Same as [`descriptor`](Self::descriptor).
    pub async fn dissemination_formats(
        &self,
        id: &Identifier,
        format_pref: &str,
    ) -> Result<Vec<&'static str>> {
        if let Some(source) = self.source_for_id(id).await? {
            let formats = formats_from_source_file_name(source.name());
            if !formats.is_empty() {
                return Ok(formats);
            }
        }
        let source_type = self.source_type(id).await?;
        Ok(formats_from_source_flag(&source_type, format_pref, false))
    }

    /// Objects that may be the source of the identifier's version
    async fn source_candidates(&self, id: &Identifier) -> Result<Option<SourceListing>> {
        let Some((version, is_current)) = self.versioned_or_current(id).await? else {
            return Ok(None);
        };

        let prefix = if is_current {
            self.keys.current_listing_prefix(id)
        } else {
            format!("{}v{version}", self.keys.archive_listing_prefix(id))
        };

        let objects = self.store.list(&prefix).await?;
        if objects.len() > self.max_source_listing {
            return Ok(Some(SourceListing::Oversized(objects.len())));
        }

        let objects = if is_current {
            objects
        } else {
            // `v1` is also a prefix of `v10`
            objects
                .into_iter()
                .filter(|obj| path_to_version(obj) == version)
                .collect()
        };
        Ok(Some(SourceListing::Objects(objects)))
    }
}

enum SourceListing {
    Objects(Vec<FileObj>),
    Oversized(usize),
}
