use crate::consts::{ARCHIVE_EXTENSION_REGEX, AUTHOR_ID_REGEX, PATHNAME_REGEX};
use crate::error::{ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

const TRIAL_SUFFIX: &str = "-TRIAL";

/// Whether a release is a stable release or a developer preview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Maturity {
    #[default]
    Released,
    Developer,
}

/// Who released what, derived from an archive path or URL.
///
/// Only the `authors/id/A/AU/AUTHOR/...` layout of a CPAN mirror carries an
/// author, so anything outside of it fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchiveIdentity {
    /// Uploader's author id, e.g. `OALDERS`.
    pub author: String,
    /// Distribution name, e.g. `HTML-Parser`.
    pub distribution: String,
    pub version: Option<String>,
    /// Path relative to the author's directory (usually just the file name,
    /// but authors are allowed subdirectories).
    pub filename: String,
    /// Release name: the file name without its archive extension.
    pub name: String,
    pub maturity: Maturity,
}

/// Returns `true` if the file name ends in one of the known archive extensions.
pub fn is_archive_name(name: impl AsRef<str>) -> bool {
    ARCHIVE_EXTENSION_REGEX.is_match(name.as_ref())
}

impl ArchiveIdentity {
    /// Parse an identity from a local path or a URL.
    ///
    /// ```
    /// use relidx_model::{ArchiveIdentity, Maturity};
    ///
    /// let id = ArchiveIdentity::parse("https://cpan.example/authors/id/O/OA/OALDERS/HTML-Parser-3.76.tar.gz").unwrap();
    /// assert_eq!(id.author, "OALDERS");
    /// assert_eq!(id.distribution, "HTML-Parser");
    /// assert_eq!(id.version.as_deref(), Some("3.76"));
    /// assert_eq!(id.maturity, Maturity::Released);
    /// ```
    pub fn parse(input: impl AsRef<str>) -> Result<Self> {
        let input = input.as_ref();
        let path = strip_url(input);
        let captures = AUTHOR_ID_REGEX
            .captures(path)
            .or_else(|| PATHNAME_REGEX.captures(path))
            .ok_or_else(|| exn::Exn::from(ErrorKind::MissingAuthor(input.to_string())))?;
        let author = captures[3].to_string();
        let filename = captures[4].to_string();
        let basename = filename.rsplit('/').next().unwrap_or(&filename);
        let Some(extension) = ARCHIVE_EXTENSION_REGEX.find(basename) else {
            exn::bail!(ErrorKind::NotAnArchive(input.to_string()));
        };
        let name = basename[..extension.start()].to_string();
        let (distribution, version, trial) = split_distname(&name);
        let developer = trial || version.as_deref().is_some_and(|v| v.contains('_'));
        Ok(Self {
            author,
            distribution,
            version,
            filename,
            name,
            maturity: if developer { Maturity::Developer } else { Maturity::Released },
        })
    }

    /// Convenience wrapper around [`parse`](Self::parse) for filesystem paths.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse(path.as_ref().to_string_lossy())
    }

    /// The mirror-relative pathname, e.g. `O/OA/OALDERS/HTML-Parser-3.76.tar.gz`.
    pub fn pathname(&self) -> String {
        let first = &self.author[..1];
        let second = &self.author[..self.author.len().min(2)];
        format!("{first}/{second}/{}/{}", self.author, self.filename)
    }

    /// Key used by the backpan listing: `AUTHOR/filename`.
    pub fn backpan_key(&self) -> String {
        format!("{}/{}", self.author, self.filename)
    }
}

impl Display for ArchiveIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.author, self.name)
    }
}

/// Drop scheme, host, query and fragment; leave local paths untouched.
fn strip_url(input: &str) -> &str {
    let Some((_, rest)) = input.split_once("://") else {
        return input;
    };
    let path = rest.find('/').map(|i| &rest[i..]).unwrap_or("");
    path.split(['?', '#']).next().unwrap_or(path)
}

/// Split `Foo-Bar-1.23` into (`Foo-Bar`, `1.23`). The version starts after the
/// right-most dash that is followed by a digit (or `v` and a digit).
fn split_distname(name: &str) -> (String, Option<String>, bool) {
    let (name, trial) = match name.strip_suffix(TRIAL_SUFFIX) {
        Some(stripped) => (stripped, true),
        None => (name, false),
    };
    for (index, _) in name.match_indices('-').rev() {
        let rest = &name[index + 1..];
        let mut chars = rest.chars();
        let looks_like_version = match chars.next() {
            Some(c) if c.is_ascii_digit() => true,
            Some('v' | 'V') => chars.next().is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        };
        if index > 0 && looks_like_version {
            return (name[..index].to_string(), Some(rest.to_string()), trial);
        }
    }
    (name.to_string(), None, trial)
}
