//! Error types for dissemination
//!
//! This module separates the two kinds of failure the crate knows about:
//! - Hard errors (corrupted descriptors, unsupported format requests, object-store
//!   failures) are returned as [`Error`] and must propagate to the caller
//! - Domain outcomes (withdrawn, not found, ...) are *not* errors; they are
//!   [`Condition`](crate::types::Condition) values returned inside a
//!   [`Resolution`](crate::types::Resolution)
//!
//! Both are mapped to HTTP status codes through [`ToHttpStatus`] so an HTTP layer
//! can translate outcomes without string matching.

use crate::types::{Condition, Format};
use thiserror::Error;

/// Result type alias for dissemination operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dissemination
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "chunk_size")
        key: Option<String>,
    },

    /// A format other than the primary rendition was requested
    #[error("unsupported dissemination format: {0} (only pdf is supported)")]
    UnsupportedFormat(Format),

    /// Descriptor text is corrupted
    #[error("descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    /// Identifier string could not be parsed
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// An object was opened that does not exist in the store
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// Object store backend failure
    #[error("object store error: {0}")]
    ObjectStore(String),

    /// Source package could not be decoded
    #[error("archive error: {0}")]
    Archive(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Descriptor (`.abs`) parsing errors
///
/// Both variants mean the stored descriptor is corrupted. They are never
/// converted into a [`Condition`].
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// A `Date` line did not match the expected layout
    #[error("could not extract date components from date line: {line:?}")]
    UnmatchedDateLine {
        /// The offending line
        line: String,
    },

    /// The date text of a `Date` line is not a calendar date
    #[error("could not parse submitted date {date:?}")]
    UnparseableDate {
        /// The captured date text
        date: String,
    },
}

/// Convert outcomes to HTTP status codes
///
/// This trait maps errors and domain conditions to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - caller asked for something malformed
            Error::UnsupportedFormat(_) => 400,
            Error::InvalidIdentifier(_) => 400,

            // 500 Internal Server Error - corrupted data or misconfiguration
            Error::Config { .. } => 500,
            Error::Descriptor(_) => 500,
            Error::Archive(_) => 500,
            Error::Io(_) => 500,
            Error::ObjectNotFound(_) => 500,

            // 502 Bad Gateway - storage backend failed
            Error::ObjectStore(_) => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::UnsupportedFormat(_) => "unsupported_format",
            Error::Descriptor(e) => match e {
                DescriptorError::UnmatchedDateLine { .. } => "descriptor_unmatched_date_line",
                DescriptorError::UnparseableDate { .. } => "descriptor_unparseable_date",
            },
            Error::InvalidIdentifier(_) => "invalid_identifier",
            Error::ObjectNotFound(_) => "object_not_found",
            Error::ObjectStore(_) => "object_store_error",
            Error::Archive(_) => "archive_error",
            Error::Io(_) => "io_error",
        }
    }
}

impl ToHttpStatus for Condition {
    fn status_code(&self) -> u16 {
        match self {
            Condition::ArticleNotFound => 404,
            Condition::VersionNotFound => 404,
            Condition::Withdrawn => 404,
            Condition::NoSource => 404,
            // metadata says the artifact exists but no tier has it
            Condition::Unavailable => 500,
        }
    }

    fn error_code(&self) -> &str {
        self.as_str()
    }
}
