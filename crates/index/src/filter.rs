use relidx_model::ReleaseDocument;
use time::OffsetDateTime;

/// Criteria for looking up release documents. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseFilter {
    /// Archive filename relative to the author directory.
    pub archive: Option<String>,
    pub author: Option<String>,
    pub distribution: Option<String>,
    /// Only releases dated strictly before this instant.
    pub before: Option<OffsetDateTime>,
}

impl ReleaseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn archive(mut self, archive: impl Into<String>) -> Self {
        self.archive = Some(archive.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn distribution(mut self, distribution: impl Into<String>) -> Self {
        self.distribution = Some(distribution.into());
        self
    }

    pub fn before(mut self, before: OffsetDateTime) -> Self {
        self.before = Some(before);
        self
    }

    pub fn matches(&self, release: &ReleaseDocument) -> bool {
        self.archive.as_ref().is_none_or(|archive| *archive == release.archive)
            && self.author.as_ref().is_none_or(|author| *author == release.author)
            && self.distribution.as_ref().is_none_or(|distribution| *distribution == release.distribution)
            && self.before.is_none_or(|before| release.date < before)
    }
}
