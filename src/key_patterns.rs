//! Storage key construction for the three tiers
//!
//! | Object | Key |
//! |--------|-----|
//! | current descriptor | `ftp/{archive}/papers/{yymm}/{filename}.abs` |
//! | archived descriptor | `orig/{archive}/papers/{yymm}/{filename}v{N}.abs` |
//! | current rendition | `ftp/{archive}/papers/{yymm}/{filename}.pdf` |
//! | previous rendition | `orig/{archive}/papers/{yymm}/{filename}v{N}.pdf` |
//! | cache rendition | `ps_cache/{archive}/{format}/{yymm}/{filename}v{N}.{format}` |
//!
//! Tier roots come from [`TierConfig`]. Every function is pure: identical inputs give
//! identical keys, which listing by prefix depends on.

use crate::config::TierConfig;
use crate::identifier::Identifier;
use crate::types::Format;

/// Builds storage keys for a given tier layout
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyPatterns {
    tiers: TierConfig,
}

impl KeyPatterns {
    /// Create key patterns for the given tier names
    pub fn new(tiers: TierConfig) -> Self {
        Self { tiers }
    }

    /// Tier names in use
    pub fn tiers(&self) -> &TierConfig {
        &self.tiers
    }

    /// Directory holding the current descriptor, rendition and sources
    pub fn current_parent(&self, id: &Identifier) -> String {
        format!("{}/{}/papers/{}", self.tiers.current, id.archive(), id.yymm())
    }

    /// Directory holding archived versions
    pub fn archive_parent(&self, id: &Identifier) -> String {
        format!("{}/{}/papers/{}", self.tiers.archive, id.archive(), id.yymm())
    }

    /// Prefix matching every current-tier object of the article
    pub fn current_listing_prefix(&self, id: &Identifier) -> String {
        format!("{}/{}", self.current_parent(id), id.filename())
    }

    /// Prefix matching every archived object of the article, across versions
    pub fn archive_listing_prefix(&self, id: &Identifier) -> String {
        format!("{}/{}", self.archive_parent(id), id.filename())
    }

    /// Descriptor of the current version
    pub fn current_descriptor(&self, id: &Identifier) -> String {
        format!("{}.abs", self.current_listing_prefix(id))
    }

    /// Descriptor of an archived version
    pub fn archived_descriptor(&self, id: &Identifier, version: u32) -> String {
        format!("{}v{version}.abs", self.archive_listing_prefix(id))
    }

    /// Primary rendition of the current version
    pub fn current_rendition(&self, id: &Identifier) -> String {
        format!("{}.pdf", self.current_listing_prefix(id))
    }

    /// Legacy pre-rendered location of an archived version's rendition
    ///
    /// Uses the identifier's own version; an unversioned identifier maps to the
    /// unsuffixed name, which never exists in the archive tier.
    pub fn previous_rendition(&self, id: &Identifier) -> String {
        match id.version() {
            Some(v) => format!("{}v{v}.pdf", self.archive_listing_prefix(id)),
            None => format!("{}.pdf", self.archive_listing_prefix(id)),
        }
    }

    /// Cache-tier rendition in `format`
    ///
    /// `version` overrides the identifier's version; with neither, the key has no
    /// version suffix.
    pub fn cache_rendition(&self, format: Format, id: &Identifier, version: Option<u32>) -> String {
        let stem = format!(
            "{}/{}/{}/{}/{}",
            self.tiers.cache,
            id.archive(),
            format,
            id.yymm(),
            id.filename()
        );
        match version.or(id.version()) {
            Some(v) => format!("{stem}v{v}.{format}"),
            None => format!("{stem}.{format}"),
        }
    }
}
