//! Dissemination format derivation
//!
//! Which formats an article can be served in follows from either the extension of
//! its source file or the single-letter source-type flags recorded in its
//! descriptor. Source packages may also carry ancillary files under `anc/`.

use crate::error::{Error, Result};
use crate::object_store::{FileObj, ObjectStore};
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tokio::task::spawn_blocking;
use tracing::{debug, error};

/// Valid source file extensions and the formats each one implies
///
/// Order matters: lookups take the first suffix with a format list, and some
/// suffixes are tails of others (`.gz` of `.ps.gz`).
pub const VALID_SOURCE_EXTENSIONS: &[(&str, Option<&[&str]>)] = &[
    (".tar.gz", None),
    (".pdf", Some(&["pdfonly"])),
    (".ps.gz", Some(&["pdf", "ps"])),
    (".gz", None),
    (".dvi.gz", None),
    (".html.gz", Some(&["html"])),
];

/// Directory inside a source package that holds ancillary files
pub const ANCILLARY_PREFIX: &str = "anc/";

/// Source-type flags, each an independent case-insensitive letter
///
/// | Letter | Meaning |
/// |--------|---------|
/// | `I` | ignore: no paper available |
/// | `S` | source encrypted, must not be served |
/// | `P` | multi-file PostScript submission |
/// | `D` | TeX that must be processed with PDFLaTeX |
/// | `F` | PDF-only submission packaged as `.tar.gz` |
/// | `H` | multi-file HTML submission |
/// | `X`, `O` | DOCX or ODF submission |
/// | `A` | includes ancillary files under `anc/` |
/// | `B` | has data in the data-citation pilot |
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceFlag {
    /// `I`
    pub ignore: bool,
    /// `S`
    pub encrypted: bool,
    /// `P`
    pub ps_only: bool,
    /// `D`
    pub pdflatex: bool,
    /// `F`
    pub pdf_only: bool,
    /// `H`
    pub html: bool,
    /// `X` or `O`
    pub docx_or_odf: bool,
    /// `A`
    pub ancillary: bool,
    /// `B`
    pub data_pilot: bool,
}

impl SourceFlag {
    /// Read the flags present in `flag`; unknown letters are ignored
    pub fn parse(flag: &str) -> Self {
        let mut parsed = Self::default();
        for c in flag.chars().map(|c| c.to_ascii_uppercase()) {
            match c {
                'I' => parsed.ignore = true,
                'S' => parsed.encrypted = true,
                'P' => parsed.ps_only = true,
                'D' => parsed.pdflatex = true,
                'F' => parsed.pdf_only = true,
                'H' => parsed.html = true,
                'X' | 'O' => parsed.docx_or_odf = true,
                'A' => parsed.ancillary = true,
                'B' => parsed.data_pilot = true,
                _ => {}
            }
        }
        parsed
    }
}

/// Formats implied by a source file name
///
/// Returns an empty list for names with no matching extension or whose extension
/// does not constrain the formats.
///
/// # Examples
///
/// ```
/// use dissemination::formats::formats_from_source_file_name;
///
/// assert_eq!(formats_from_source_file_name("0704.0001v1.ps.gz"), vec!["pdf", "ps"]);
/// assert_eq!(formats_from_source_file_name("0704.0001v1.tar.gz"), Vec::<&str>::new());
/// ```
pub fn formats_from_source_file_name(source_file_name: &str) -> Vec<&'static str> {
    if source_file_name.is_empty() {
        return Vec::new();
    }
    VALID_SOURCE_EXTENSIONS
        .iter()
        .find_map(|(extension, formats)| match formats {
            Some(formats) if source_file_name.ends_with(extension) => Some(formats.to_vec()),
            _ => None,
        })
        .unwrap_or_default()
}

/// Formats available for a source-type flag and a user format preference
///
/// `cache_flag` marks a cache entry that is present, not older than the source,
/// and empty.
///
/// # Examples
///
/// ```
/// use dissemination::formats::formats_from_source_flag;
///
/// assert_eq!(formats_from_source_flag("I", "", false), vec!["src"]);
/// assert_eq!(formats_from_source_flag("", "", false), vec!["pdf", "ps", "other"]);
/// ```
pub fn formats_from_source_flag(
    source_flag: &str,
    format_pref: &str,
    cache_flag: bool,
) -> Vec<&'static str> {
    let flag = SourceFlag::parse(source_flag);
    let has_src_pref = format_pref.contains("src");

    if flag.ignore && !flag.encrypted {
        return vec!["src"];
    }
    if flag.ps_only {
        return vec!["pdf", "ps", "other"];
    }
    if flag.pdflatex {
        let mut formats = vec!["pdf", "other"];
        // PDFLaTeX has source, so a src preference is honoured
        if has_src_pref && !flag.encrypted {
            formats.insert(1, "src");
        }
        return formats;
    }
    if flag.pdf_only {
        return vec!["pdf", "other"];
    }
    if flag.html {
        return vec!["html", "other"];
    }
    if flag.docx_or_odf {
        return vec!["pdf", "other"];
    }
    if cache_flag {
        return vec!["nops", "other"];
    }

    let mut formats = if format_pref.contains("pdf") {
        vec!["pdf"]
    } else if format_pref.contains("400") {
        vec!["ps(400)"]
    } else if format_pref.contains("600") {
        vec!["ps(600)"]
    } else if format_pref.contains("fname=cm") {
        vec!["ps(cm)"]
    } else if format_pref.contains("fname=CM") {
        vec!["ps(CM)"]
    } else if format_pref.contains("dvi") {
        vec!["dvi"]
    } else if has_src_pref {
        let mut formats = vec!["pdf", "ps"];
        if !flag.encrypted {
            formats.push("src");
        }
        formats
    } else {
        vec!["pdf", "ps"]
    };
    formats.push("other");
    formats
}

/// Whether the source-type flag records ancillary files
pub fn has_ancillary_files(source_flag: &str) -> bool {
    SourceFlag::parse(source_flag).ancillary
}

/// An ancillary file inside a source package
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncillaryFile {
    /// Path below `anc/`
    pub name: String,
    /// Uncompressed size in bytes
    pub size_bytes: u64,
}

/// List the ancillary files of a `.tar.gz` source package
///
/// Only regular files under `anc/` are listed, with the prefix stripped, sorted
/// by name. Returns an empty list if `package` is not a `.tar.gz`, does not exist,
/// or cannot be decoded.
///
/// # Errors
///
/// Only object-store failures other than absence are returned.
pub async fn list_ancillary_files(
    store: &dyn ObjectStore,
    package: &FileObj,
) -> Result<Vec<AncillaryFile>> {
    if !package.has_suffix(".tar.gz") {
        debug!(key = %package, "not a tar.gz package, no ancillary files");
        return Ok(Vec::new());
    }

    let bytes = match store.read_to_end(package.key()).await {
        Ok(bytes) => bytes,
        Err(Error::ObjectNotFound(_)) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let listing = spawn_blocking(move || read_ancillary_entries(&bytes))
        .await
        .map_err(|e| Error::Archive(format!("ancillary listing task failed: {e}")))?;

    match listing {
        Ok(files) => Ok(files),
        Err(e) => {
            error!(key = %package, error = %e, "error while trying to read anc files");
            Ok(Vec::new())
        }
    }
}

fn read_ancillary_entries(bytes: &[u8]) -> Result<Vec<AncillaryFile>> {
    let mut archive = tar::Archive::new(GzDecoder::new(Cursor::new(bytes)));
    let mut files = Vec::new();

    let entries = archive
        .entries()
        .map_err(|e| Error::Archive(e.to_string()))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::Archive(e.to_string()))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path().map_err(|e| Error::Archive(e.to_string()))?;
        let path = path.to_string_lossy();
        if let Some(name) = path.strip_prefix(ANCILLARY_PREFIX) {
            files.push(AncillaryFile {
                name: name.to_string(),
                size_bytes: entry.size(),
            });
        }
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}
