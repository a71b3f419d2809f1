use anyhow::Result;
use sqlx::{QueryBuilder, Sqlite};
use std::collections::BTreeSet;

use super::schema::Database;
use super::types::{ArticleDbRow, DatabaseError, NewArticle, Tag};
use crate::nav::{PageQueryResult, PageRange};

/// Newest first, undated last, ties by id. Must match the order the
/// presented page is sorted in.
const PAGE_ORDER: &str = " ORDER BY a.published IS NULL, a.published DESC, a.id DESC";

/// Append the `FROM ... WHERE ...` clause selecting a feed set and an
/// optional tag.
fn push_filter<'a>(
    builder: &mut QueryBuilder<'a, Sqlite>,
    feed_urls: &'a BTreeSet<String>,
    tag_id: Option<i64>,
) {
    builder.push(" FROM articles a JOIN feeds f ON f.id = a.feed_id WHERE f.url IN (");
    let mut urls = builder.separated(", ");
    for url in feed_urls {
        urls.push_bind(url.as_str());
    }
    urls.push_unseparated(")");

    if let Some(tag_id) = tag_id {
        builder.push(" AND a.id IN (SELECT article_id FROM article_tags WHERE tag_id = ");
        builder.push_bind(tag_id);
        builder.push(")");
    }
}

impl Database {
    // ========================================================================
    // Article Operations
    // ========================================================================

    /// Insert articles for a feed, skipping guids already stored.
    /// Returns the number of new articles.
    ///
    /// Batches of 50 keep us well under SQLite's 999 parameter limit
    /// (6 columns * 50 = 300).
    pub async fn insert_articles(&self, feed_id: i64, articles: &[NewArticle]) -> Result<usize> {
        if articles.is_empty() {
            return Ok(0);
        }

        const BATCH_SIZE: usize = 50;
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for chunk in articles.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT OR IGNORE INTO articles (feed_id, guid, title, url, published, image) ",
            );
            builder.push_values(chunk, |mut b, article| {
                b.push_bind(feed_id)
                    .push_bind(&article.guid)
                    .push_bind(&article.title)
                    .push_bind(&article.url)
                    .push_bind(article.published)
                    .push_bind(&article.image);
            });
            inserted += builder.build().execute(&mut *tx).await?.rows_affected() as usize;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// One page of articles plus the totals needed for paging.
    ///
    /// All four queries run in one transaction so the counts agree with
    /// the returned rows.
    pub async fn get_article_page(
        &self,
        feed_urls: &BTreeSet<String>,
        range: PageRange,
        tag_id: Option<i64>,
    ) -> Result<PageQueryResult, DatabaseError> {
        if feed_urls.is_empty() {
            return Ok(PageQueryResult {
                articles: Vec::new(),
                total_matching: 0,
                unread_before: 0,
                unread_after: 0,
            });
        }

        let from = i64::try_from(range.from).unwrap_or(i64::MAX);
        let limit = i64::try_from(range.len()).unwrap_or(i64::MAX);
        let to = i64::try_from(range.to).unwrap_or(i64::MAX);
        let mut tx = self.pool.begin().await?;

        let mut total: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*)");
        push_filter(&mut total, feed_urls, tag_id);
        let total_matching: i64 = total.build_query_scalar::<i64>().fetch_one(&mut *tx).await?;

        let mut rows: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT a.id, a.feed_id, a.title, a.url, a.published, a.image, a.read",
        );
        push_filter(&mut rows, feed_urls, tag_id);
        rows.push(PAGE_ORDER);
        rows.push(" LIMIT ").push_bind(limit);
        rows.push(" OFFSET ").push_bind(from);
        let articles: Vec<ArticleDbRow> = rows.build_query_as::<ArticleDbRow>().fetch_all(&mut *tx).await?;

        // Unread in [0, from)
        let mut before: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM (SELECT a.read");
        push_filter(&mut before, feed_urls, tag_id);
        before.push(PAGE_ORDER);
        before.push(" LIMIT ").push_bind(from);
        before.push(") WHERE read = 0");
        let unread_before: i64 = before.build_query_scalar::<i64>().fetch_one(&mut *tx).await?;

        // Unread in [to, end); LIMIT -1 means no limit in SQLite
        let mut after: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM (SELECT a.read");
        push_filter(&mut after, feed_urls, tag_id);
        after.push(PAGE_ORDER);
        after.push(" LIMIT -1 OFFSET ").push_bind(to);
        after.push(") WHERE read = 0");
        let unread_after: i64 = after.build_query_scalar::<i64>().fetch_one(&mut *tx).await?;

        tx.commit().await?;

        Ok(PageQueryResult {
            articles: articles.into_iter().map(ArticleDbRow::into_article).collect(),
            total_matching: usize::try_from(total_matching).unwrap_or(0),
            unread_before: u64::try_from(unread_before).unwrap_or(0),
            unread_after: u64::try_from(unread_after).unwrap_or(0),
        })
    }

    /// Set an article's read flag
    pub async fn set_article_read(&self, article_id: i64, read: bool) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE articles SET read = ? WHERE id = ?")
            .bind(read)
            .bind(article_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Mark every unread article of the given feeds read. Returns the
    /// number of articles changed.
    pub async fn mark_feeds_read(&self, feed_urls: &BTreeSet<String>) -> Result<u64, DatabaseError> {
        if feed_urls.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "UPDATE articles SET read = 1 WHERE read = 0 AND feed_id IN (SELECT id FROM feeds WHERE url IN (",
        );
        let mut urls = builder.separated(", ");
        for url in feed_urls {
            urls.push_bind(url.as_str());
        }
        urls.push_unseparated("))");

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Unread articles of the given feeds, optionally restricted to a tag
    pub async fn count_unread(
        &self,
        feed_urls: &BTreeSet<String>,
        tag_id: Option<i64>,
    ) -> Result<u64, DatabaseError> {
        if feed_urls.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*)");
        push_filter(&mut builder, feed_urls, tag_id);
        builder.push(" AND a.read = 0");
        let count: i64 = builder.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    // ========================================================================
    // Tag Operations
    // ========================================================================

    /// Create a tag (or find the existing one) and return its id.
    pub async fn upsert_tag(&self, name: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO tags (name) VALUES (?) ON CONFLICT(name) DO UPDATE SET name = excluded.name RETURNING id",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    pub async fn tag_article(&self, article_id: i64, tag_id: i64) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO article_tags (article_id, tag_id) VALUES (?, ?)")
            .bind(article_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_tags(&self) -> Result<Vec<Tag>> {
        let tags: Vec<Tag> = sqlx::query_as("SELECT id, name FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(tags)
    }
}
