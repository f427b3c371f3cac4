use crate::record::FileRecord;
use crate::release::ReleaseDocument;
use serde::{Deserialize, Serialize};

/// Anything written to the search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Document {
    Release(ReleaseDocument),
    File(FileRecord),
}

impl Document {
    pub fn id(&self) -> String {
        match self {
            Self::Release(release) => release.id(),
            Self::File(file) => digest(&["file", &file.author, &file.release, &file.path]),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Release(_) => "release",
            Self::File(_) => "file",
        }
    }

    pub fn as_release(&self) -> Option<&ReleaseDocument> {
        match self {
            Self::Release(release) => Some(release),
            Self::File(_) => None,
        }
    }
}

impl From<ReleaseDocument> for Document {
    fn from(release: ReleaseDocument) -> Self {
        Self::Release(release)
    }
}

impl From<FileRecord> for Document {
    /// Resolves the lazily computed documentation name so it is serialized.
    fn from(mut file: FileRecord) -> Self {
        file.documentation();
        Self::File(file)
    }
}

/// BLAKE3 over NUL-separated parts, hex encoded.
pub(crate) fn digest(parts: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            hasher.update(&[0]);
        }
        hasher.update(part.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ArchiveIdentity;
    use crate::release::Status;
    use time::OffsetDateTime;

    fn release() -> ReleaseDocument {
        let identity = ArchiveIdentity::parse("A/AB/ABC/Foo-1.0.tar.gz").unwrap();
        ReleaseDocument::new(&identity, Status::Latest, OffsetDateTime::UNIX_EPOCH)
    }

    #[test]
    fn test_ids_are_deterministic_and_distinct() {
        let release = release();
        let a = Document::from(FileRecord::new(&release, "lib/Foo.pm"));
        let b = Document::from(FileRecord::new(&release, "lib/Foo.pm"));
        let c = Document::from(FileRecord::new(&release, "lib/Bar.pm"));
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_ne!(a.id(), Document::from(release).id());
    }

    #[test]
    fn test_digest_separates_parts() {
        assert_ne!(digest(&["ab", "c"]), digest(&["a", "bc"]));
    }

    #[test]
    fn test_serialized_shape() {
        let mut file = FileRecord::new(&release(), "lib/Foo.pod");
        file.pod_name = Some("Foo".to_string());
        let json = serde_json::to_value(Document::from(file)).unwrap();
        assert_eq!(json["type"], "file");
        assert_eq!(json["documentation"], "Foo");
        assert_eq!(json["status"], "latest");

        let json = serde_json::to_value(Document::from(release())).unwrap();
        assert_eq!(json["type"], "release");
        assert_eq!(json["date"], "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_release_round_trip() {
        let document = Document::from(release());
        let json = serde_json::to_string(&document).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_release(), document.as_release());
    }
}
