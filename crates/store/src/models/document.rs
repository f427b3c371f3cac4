use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use relidx_model::{Document, ReleaseDocument};
use time::OffsetDateTime;

/// Release dates are stored as nanoseconds since the Unix epoch, clamped to
/// what an `i64` holds (1677 to 2262).
pub(crate) fn timestamp(date: OffsetDateTime) -> i64 {
    date.unix_timestamp_nanos().clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

/// A document as stored: the JSON body plus the columns releases are
/// filtered on.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DocumentRow {
    pub id: String,
    pub kind: String,
    pub author: String,
    pub distribution: String,
    pub archive: Option<String>,
    pub released_at: Option<i64>,
    pub body: String,
}

impl TryFrom<&Document> for DocumentRow {
    type Error = Error;
    fn try_from(document: &Document) -> Result<Self, Self::Error> {
        let (author, distribution, archive, released_at) = match document {
            Document::Release(release) => (
                release.author.clone(),
                release.distribution.clone(),
                Some(release.archive.clone()),
                Some(timestamp(release.date)),
            ),
            Document::File(file) => (file.author.clone(), file.distribution.clone(), None, None),
        };
        Ok(Self {
            id: document.id(),
            kind: document.kind().to_string(),
            author,
            distribution,
            archive,
            released_at,
            body: serde_json::to_string(document).or_raise(|| ErrorKind::InvalidData("document body"))?,
        })
    }
}

impl TryFrom<DocumentRow> for ReleaseDocument {
    type Error = Error;
    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        match serde_json::from_str(&row.body).or_raise(|| ErrorKind::InvalidData("document body"))? {
            Document::Release(release) => Ok(release),
            Document::File(_) => exn::bail!(ErrorKind::InvalidData("expected a release document")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relidx_model::{ArchiveIdentity, FileRecord, Status};
    use time::macros::datetime;

    fn release() -> ReleaseDocument {
        let identity = ArchiveIdentity::parse("A/AB/ABC/Foo-1.0.tar.gz").unwrap();
        ReleaseDocument::new(&identity, Status::Latest, datetime!(2024-03-01 12:00 UTC))
    }

    #[test]
    fn test_release_row() {
        let row = DocumentRow::try_from(&Document::from(release())).unwrap();
        assert_eq!(row.kind, "release");
        assert_eq!(row.archive.as_deref(), Some("Foo-1.0.tar.gz"));
        assert_eq!(row.released_at, Some(1_709_294_400_000_000_000));
        assert_eq!(ReleaseDocument::try_from(row).unwrap(), release());
    }

    #[test]
    fn test_file_row_is_not_a_release() {
        let row = DocumentRow::try_from(&Document::from(FileRecord::new(&release(), "lib/Foo.pm"))).unwrap();
        assert_eq!(row.kind, "file");
        assert_eq!(row.archive, None);
        let err = ReleaseDocument::try_from(row).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData(_)));
    }
}
