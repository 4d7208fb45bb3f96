//! Core types for dissemination

use crate::object_store::FileObj;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A rendition format that can be requested from the store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Portable Document Format, the primary rendition
    Pdf,
    /// PostScript
    Ps,
    /// HTML submission
    Html,
    /// DVI output
    Dvi,
    /// Original source package
    Src,
    /// Catch-all "other formats" listing
    Other,
}

impl Format {
    /// Lowercase name used in storage keys and file extensions
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Pdf => "pdf",
            Format::Ps => "ps",
            Format::Html => "html",
            Format::Dvi => "dvi",
            Format::Src => "src",
            Format::Other => "other",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Format::Pdf),
            "ps" => Ok(Format::Ps),
            "html" => Ok(Format::Html),
            "dvi" => Ok(Format::Dvi),
            "src" => Ok(Format::Src),
            "other" => Ok(Format::Other),
            _ => Err(crate::Error::Config {
                message: format!("unknown format {s:?}"),
                key: Some("format".to_string()),
            }),
        }
    }
}

/// Terminal outcome of a resolution that found no artifact
///
/// These are expected, enumerable results and are returned as values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// The version is withdrawn (source type `I`), or has no source on the versioned path
    Withdrawn,
    /// There is no article with this identifier
    ArticleNotFound,
    /// The article exists but the requested version does not
    VersionNotFound,
    /// Article and version exist but no source file does
    NoSource,
    /// Metadata says the rendition should exist but no tier holds it
    Unavailable,
}

impl Condition {
    /// Machine-readable name of the condition
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Withdrawn => "withdrawn",
            Condition::ArticleNotFound => "article_not_found",
            Condition::VersionNotFound => "version_not_found",
            Condition::NoSource => "no_source",
            Condition::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result shape of every resolution operation: an object or a condition, never both
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The object that represents the requested artifact
    Found(FileObj),
    /// Why no artifact could be returned
    Condition(Condition),
}

impl Resolution {
    /// The resolved object, if any
    pub fn found(&self) -> Option<&FileObj> {
        match self {
            Resolution::Found(obj) => Some(obj),
            Resolution::Condition(_) => None,
        }
    }

    /// The condition, if resolution did not find an object
    pub fn condition(&self) -> Option<Condition> {
        match self {
            Resolution::Found(_) => None,
            Resolution::Condition(c) => Some(*c),
        }
    }

    /// Returns `true` if an object was resolved
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

impl From<Condition> for Resolution {
    fn from(condition: Condition) -> Self {
        Resolution::Condition(condition)
    }
}

impl From<FileObj> for Resolution {
    fn from(obj: FileObj) -> Self {
        Resolution::Found(obj)
    }
}
