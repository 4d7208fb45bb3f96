//! Parser for legacy `.abs` descriptor files
//!
//! A descriptor is plain text. Its submission history sits in a section opened
//! and closed by lines consisting of the marker `\\`, one `Date` line per version:
//!
//! ```text
//! \\
//! arXiv:0704.0001
//! From: Some Author <author@example.org>
//! Date: Mon, 2 Apr 2007 19:18:42 GMT   (21kb)
//! Date (revised v2): Tue, 24 Jul 2007 20:10:27 GMT   (23kb,D)
//! \\
//! ```
//!
//! The trailing `(<size>kb,<source type>)` group is optional, as is the source
//! type inside it. Versions are numbered by line order starting at 1.

use crate::error::{DescriptorError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Marker that opens and closes the metadata section
pub const SECTION_MARKER: &str = "\\\\";

static RE_DATE_COMPONENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^Date\s*(?::|\(revised\s*(?P<version>.*?)\):)\s*(?P<date>.*?)(?:\s+\((?P<size_kilobytes>\d+)kb,?(?P<source_type>.*)\))?$",
    )
    .unwrap_or_else(|e| panic!("invalid date line regex: {e}"))
});

/// Date-time layouts seen in descriptors that are not RFC 2822
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S",
    "%a %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%a, %d %b %y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d %b %Y", "%a, %d %b %Y"];

/// One submission version as recorded in a descriptor
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VersionEntry {
    /// Version number, 1-based, in line order
    pub version: u32,
    /// Submission date
    pub submitted_date: DateTime<Utc>,
    /// Size in kilobytes, when recorded
    pub size_kilobytes: Option<u64>,
    /// Raw source-type flag; empty when not recorded
    pub source_type: String,
    /// Label from `Date (revised <label>):`, e.g. `v2`
    pub revised_label: Option<String>,
    /// The line this entry was parsed from
    pub raw: String,
}

/// Submission history parsed from a descriptor
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Descriptor {
    versions: Vec<VersionEntry>,
}

impl Descriptor {
    /// Parse the submission history out of full descriptor text
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError`] if a `Date` line in the metadata section is
    /// malformed. No partial history is returned.
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_lines(text.lines())
    }

    /// Parse the submission history out of descriptor lines
    ///
    /// # Errors
    ///
    /// Same as [`Descriptor::parse`].
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let date_lines = extract_date_lines(lines);
        let (_, versions) = parse_version_entries(&date_lines)?;
        Ok(Self { versions })
    }

    /// Number of versions recorded
    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    /// All versions, oldest first
    pub fn versions(&self) -> &[VersionEntry] {
        &self.versions
    }

    /// The most recent version
    pub fn latest(&self) -> Option<&VersionEntry> {
        self.versions.last()
    }

    /// Version `version` (1-based)
    pub fn entry(&self, version: u32) -> Option<&VersionEntry> {
        let index = usize::try_from(version).ok()?.checked_sub(1)?;
        self.versions.get(index)
    }

    /// Source-type flag of `version`, or of the latest version when `None`
    ///
    /// Returns an empty string when the version is not recorded; callers that need
    /// a hard failure must check [`Descriptor::entry`] themselves.
    pub fn source_type_for(&self, version: Option<u32>) -> &str {
        let entry = match version {
            Some(v) => self.entry(v),
            None => self.latest(),
        };
        entry.map(|e| e.source_type.as_str()).unwrap_or("")
    }
}

/// Collect the `Date` lines of the first `\\`-delimited section
///
/// Lines are trimmed. Everything before the first marker is skipped and
/// scanning stops at the next marker.
pub fn extract_date_lines<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut in_section = false;
    let mut date_lines = Vec::new();

    for line in lines {
        let line = line.as_ref().trim();
        if !in_section {
            if line.starts_with(SECTION_MARKER) {
                in_section = true;
            }
            continue;
        }
        if line.starts_with("Date") {
            date_lines.push(line.to_string());
        }
        if line.starts_with(SECTION_MARKER) {
            break;
        }
    }

    date_lines
}

/// Parse `Date` lines into version entries
///
/// Returns the number of lines parsed and the entries, numbered 1.. in order.
///
/// # Errors
///
/// - [`DescriptorError::UnmatchedDateLine`] if a line does not have the `Date` layout
/// - [`DescriptorError::UnparseableDate`] if its date text is not a calendar date
pub fn parse_version_entries<S: AsRef<str>>(lines: &[S]) -> Result<(usize, Vec<VersionEntry>)> {
    let mut entries = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        let caps = RE_DATE_COMPONENTS
            .captures(line)
            .ok_or_else(|| DescriptorError::UnmatchedDateLine {
                line: line.to_string(),
            })?;

        let date_text = caps.name("date").map(|m| m.as_str()).unwrap_or("");
        let submitted_date =
            parse_submitted_date(date_text).ok_or_else(|| DescriptorError::UnparseableDate {
                date: date_text.to_string(),
            })?;

        let size_kilobytes = caps
            .name("size_kilobytes")
            .and_then(|m| m.as_str().parse::<u64>().ok());
        let source_type = caps
            .name("source_type")
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        let revised_label = caps
            .name("version")
            .map(|m| m.as_str().trim().to_string())
            .filter(|label| !label.is_empty());

        entries.push(VersionEntry {
            version: u32::try_from(index + 1).unwrap_or(u32::MAX),
            submitted_date,
            size_kilobytes,
            source_type,
            revised_label,
            raw: line.to_string(),
        });
    }

    Ok((entries.len(), entries))
}

/// Parse descriptor date text
///
/// RFC 2822 first (covers `GMT`/`UT` and two digit years), then the naive layouts
/// above, retried without up to two trailing alphabetic zone names.
fn parse_submitted_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(dt) = parse_naive(text) {
        return Some(dt);
    }

    // zone names such as "MET" or "MET DST"
    let mut head = text;
    for _ in 0..2 {
        let (rest, zone) = head.rsplit_once(char::is_whitespace)?;
        if !zone.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        head = rest.trim_end();
        if let Some(dt) = parse_naive(head) {
            return Some(dt);
        }
    }
    None
}

fn parse_naive(text: &str) -> Option<DateTime<Utc>> {
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NAIVE_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}
