use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{DocumentRow, timestamp};
use async_trait::async_trait;
use exn::ResultExt;
use relidx_index::error::{ErrorKind as IndexErrorKind, Result as IndexResult};
use relidx_index::{ReleaseFilter, SearchIndex};
use relidx_model::{Document, ReleaseDocument};
use sqlx::{Sqlite, SqlitePool};
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;

const NAME: &str = "sqlite";

/// [`SearchIndex`] stored in SQLite.
///
/// `put` writes straight into `documents`; `bulk` appends to `pending` in one
/// transaction; `refresh` moves everything pending into `documents`.
#[derive(Debug, Clone)]
pub struct SqliteIndex {
    pool: SqlitePool,
}

impl From<&Database> for SqliteIndex {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}

/// Bind the seven document columns, in table order.
fn bind_row<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    row: DocumentRow,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    query
        .bind(row.id)
        .bind(row.kind)
        .bind(row.author)
        .bind(row.distribution)
        .bind(row.archive)
        .bind(row.released_at)
        .bind(row.body)
}

type FilterArgs = (Option<String>, Option<String>, Option<String>, Option<i64>);

/// The four filter parameters, in query order.
fn filter_args(filter: &ReleaseFilter) -> FilterArgs {
    (
        filter.archive.clone(),
        filter.author.clone(),
        filter.distribution.clone(),
        filter.before.map(timestamp),
    )
}

impl SqliteIndex {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn upsert(&self, document: &Document) -> Result<()> {
        let row = DocumentRow::try_from(document)?;
        bind_row(sqlx::query(include_str!("../queries/upsert_document.sql")), row)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn insert_pending(&self, documents: &[Document]) -> Result<()> {
        let rows = documents.iter().map(DocumentRow::try_from).collect::<Result<Vec<_>>>()?;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for row in rows {
            bind_row(sqlx::query(include_str!("../queries/insert_pending.sql")), row)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn flush_pending(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let moved = sqlx::query(include_str!("../queries/refresh.sql"))
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?
            .rows_affected();
        sqlx::query(include_str!("../queries/clear_pending.sql"))
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(moved)
    }

    async fn select_releases(&self, filter: &ReleaseFilter) -> Result<Vec<ReleaseDocument>> {
        let (archive, author, distribution, before) = filter_args(filter);
        let rows: Vec<DocumentRow> = sqlx::query_as(include_str!("../queries/find_releases.sql"))
            .bind(archive)
            .bind(author)
            .bind(distribution)
            .bind(before)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(ReleaseDocument::try_from).collect()
    }

    async fn select_count(&self, filter: &ReleaseFilter) -> Result<u64> {
        let (archive, author, distribution, before) = filter_args(filter);
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_releases.sql"))
            .bind(archive)
            .bind(author)
            .bind(distribution)
            .bind(before)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("release count"))
    }

    /// Documents committed through `bulk` that a refresh has not yet exposed.
    pub async fn pending(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_pending.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("pending count"))
    }
}

#[async_trait]
impl SearchIndex for SqliteIndex {
    fn name(&self) -> &str {
        NAME
    }

    async fn put(&self, document: &Document) -> IndexResult<()> {
        self.upsert(document).await.or_raise(|| IndexErrorKind::Backend(NAME.to_string()))
    }

    async fn bulk(&self, documents: Vec<Document>) -> IndexResult<()> {
        self.insert_pending(&documents).await.or_raise(|| IndexErrorKind::Backend(NAME.to_string()))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn refresh(&self) -> IndexResult<()> {
        let moved = self.flush_pending().await.or_raise(|| IndexErrorKind::Backend(NAME.to_string()))?;
        tracing::debug!(documents = moved, "Refreshed index");
        Ok(())
    }

    async fn count_releases(&self, filter: &ReleaseFilter) -> IndexResult<u64> {
        self.select_count(filter).await.or_raise(|| IndexErrorKind::Backend(NAME.to_string()))
    }

    async fn find_releases(&self, filter: &ReleaseFilter) -> IndexResult<Vec<ReleaseDocument>> {
        self.select_releases(filter).await.or_raise(|| IndexErrorKind::Backend(NAME.to_string()))
    }
}
