use crate::error::{Error, ErrorKind};
use crate::identity::{ArchiveIdentity, Maturity};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Where a release currently lives.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The newest release of its distribution on the primary mirror.
    #[display("latest")]
    Latest,
    /// Still on the primary mirror.
    #[default]
    #[display("cpan")]
    Cpan,
    /// Only on the archival mirror.
    #[display("backpan")]
    Backpan,
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "latest" => Ok(Self::Latest),
            "cpan" => Ok(Self::Cpan),
            "backpan" => Ok(Self::Backpan),
            _ => exn::bail!(ErrorKind::UnknownStatus(s.to_string())),
        }
    }
}

/// One per archive. Mutated in place by the importer and saved after every
/// change, so the last write wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDocument {
    pub name: String,
    pub distribution: String,
    pub author: String,
    pub version: Option<String>,
    /// Archive filename relative to the author directory.
    pub archive: String,
    pub maturity: Maturity,
    pub status: Status,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    #[serde(rename = "abstract")]
    pub r#abstract: Option<String>,
    pub provides: Vec<String>,
    pub authorized: bool,
    pub first: bool,
}

impl ReleaseDocument {
    pub fn new(identity: &ArchiveIdentity, status: Status, date: OffsetDateTime) -> Self {
        Self {
            name: identity.name.clone(),
            distribution: identity.distribution.clone(),
            author: identity.author.clone(),
            version: identity.version.clone(),
            archive: identity.filename.clone(),
            maturity: identity.maturity,
            status,
            date,
            r#abstract: None,
            provides: Vec::new(),
            authorized: true,
            first: false,
        }
    }

    /// Deterministic document id: the same release always maps to the same id.
    pub fn id(&self) -> String {
        crate::document::digest(&["release", &self.author, &self.name])
    }
}
