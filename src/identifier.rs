//! Article identifiers
//!
//! Two identifier schemes are in use:
//! - Old style, minted 1991 through 2007-03: `archive[.SUBJ]/YYMMNNN`, e.g. `hep-th/9901001`
//! - New style, minted from 2007-04: `YYMM.NNNN`, with a five digit number from 2015,
//!   e.g. `0704.0001` or `1501.00001`
//!
//! Either may carry a `vN` version suffix. The store only needs the base id, the
//! optional version and the canonical filename; the rest is kept for key building
//! and display.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static RE_OLD_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<archive>[a-z]+(-[a-z]{2,})?)(\.([a-zA-Z\-]{2,}))?/(?P<yymm>(?P<yy>\d\d)(?P<mm>\d\d))(?P<num>\d\d\d)(v(?P<version>[1-9]\d*))?(?P<extra>[#/].*)?$",
    )
    .unwrap_or_else(|e| panic!("invalid old identifier regex: {e}"))
});

static RE_NEW_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<yymm>(?P<yy>\d\d)(?P<mm>\d\d))\.(?P<num>\d{4,5})(v(?P<version>[1-9]\d*))?(?P<extra>[#/].*)?$",
    )
    .unwrap_or_else(|e| panic!("invalid new identifier regex: {e}"))
});

/// Normalising rewrites applied before matching: (pattern, replacement, max replacements)
///
/// A limit of 0 replaces every match.
static SUBSTITUTIONS: LazyLock<Vec<(Regex, &'static str, usize)>> = LazyLock::new(|| {
    [
        (r"\.(pdf|ps|gz|ps\.gz)$", "", 0),
        (r"^/", "", 0),
        (r"(?i)^arxiv:", "", 1),
        (r"//+", "/", 0),
        (r"--+", "-", 0),
        (r"([^a\-])(ph|ex|th|qc|mat|lat|sci)(/|$)", "${1}-${2}${3}", 1),
    ]
    .into_iter()
    .map(|(pattern, replacement, limit)| {
        let re = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("invalid identifier substitution {pattern}: {e}"));
        (re, replacement, limit)
    })
    .collect()
});

/// A parsed article identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identifier {
    raw: String,
    id: String,
    archive: String,
    filename: String,
    yymm: String,
    year: u32,
    month: u32,
    num: u32,
    version: Option<u32>,
    is_old_id: bool,
    extra: Option<String>,
}

impl Identifier {
    /// Parse and validate an identifier string
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if the string is not a well-formed
    /// old or new style identifier.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidIdentifier(input.to_string());

        let normalized = normalize(input);

        let (caps, is_old_id) = if let Some(caps) = RE_OLD_ID.captures(&normalized) {
            (caps, true)
        } else if let Some(caps) = RE_NEW_ID.captures(&normalized) {
            (caps, false)
        } else {
            return Err(invalid());
        };

        let yymm = caps["yymm"].to_string();
        let yy: u32 = caps["yy"].parse().map_err(|_| invalid())?;
        let month: u32 = caps["mm"].parse().map_err(|_| invalid())?;
        let num: u32 = caps["num"].parse().map_err(|_| invalid())?;
        let version = caps
            .name("version")
            .map(|v| v.as_str().parse::<u32>())
            .transpose()
            .map_err(|_| invalid())?;
        let extra = caps.name("extra").map(|m| m.as_str().to_string());

        let (archive, year, id, filename) = if is_old_id {
            let archive = caps["archive"].to_string();
            let year = if yy < 91 { 2000 + yy } else { 1900 + yy };
            let filename = format!("{yymm}{num:03}");
            (archive.clone(), year, format!("{archive}/{filename}"), filename)
        } else {
            let year = 2000 + yy;
            let id = if year >= 2015 {
                format!("{yymm}.{num:05}")
            } else {
                format!("{yymm}.{num:04}")
            };
            ("arxiv".to_string(), year, id.clone(), id)
        };

        if num == 0
            || (num > 99_999 && year >= 2015)
            || (num > 9_999 && year < 2015)
            || (num > 999 && is_old_id)
        {
            return Err(invalid());
        }
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        if is_old_id {
            if !(1991..=2007).contains(&year) || (year == 2007 && month > 3) {
                return Err(invalid());
            }
        } else if year < 2007 || (year == 2007 && month < 4) {
            return Err(invalid());
        }

        Ok(Self {
            raw: input.to_string(),
            id,
            archive,
            filename,
            yymm,
            year,
            month,
            num,
            version,
            is_old_id,
            extra,
        })
    }

    /// Base identifier without version, e.g. `hep-th/9901001` or `0704.0001`
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identifier with version suffix when one was given
    pub fn idv(&self) -> String {
        match self.version {
            Some(v) => format!("{}v{v}", self.id),
            None => self.id.clone(),
        }
    }

    /// The identifier exactly as supplied
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Requested version; `None` means "latest"
    pub fn version(&self) -> Option<u32> {
        self.version
    }

    /// Whether an explicit version was requested
    pub fn has_version(&self) -> bool {
        self.version.is_some()
    }

    /// Canonical filename used in storage keys, e.g. `9901001` or `0704.0001`
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Archive the identifier belongs to; `arxiv` for new style identifiers
    pub fn archive(&self) -> &str {
        &self.archive
    }

    /// Four digit year-month component
    pub fn yymm(&self) -> &str {
        &self.yymm
    }

    /// Four digit year
    pub fn year(&self) -> u32 {
        self.year
    }

    /// Month (1-12)
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Sequence number within the month
    pub fn num(&self) -> u32 {
        self.num
    }

    /// Whether this is a pre-2007-04 identifier
    pub fn is_old_id(&self) -> bool {
        self.is_old_id
    }

    /// Trailing `#...` or `/...` text after the identifier, if any
    pub fn extra(&self) -> Option<&str> {
        self.extra.as_deref()
    }

    /// The same identifier pinned to `version`
    pub fn with_version(&self, version: u32) -> Self {
        Self {
            version: Some(version),
            ..self.clone()
        }
    }
}

fn normalize(input: &str) -> String {
    let mut s = input.to_string();
    for (index, (re, replacement, limit)) in SUBSTITUTIONS.iter().enumerate() {
        s = re.replacen(&s, *limit, *replacement).into_owned();
        // archive names are matched lowercase; done after the prefix cleanups
        if index == 4 {
            s = lowercase_first_segment(&s);
        }
    }
    s
}

fn lowercase_first_segment(s: &str) -> String {
    match s.split_once('/') {
        Some((head, rest)) => format!("{}/{rest}", head.to_lowercase()),
        None => s.to_lowercase(),
    }
}

impl FromStr for Identifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.idv())
    }
}
