use anyhow::Result;
use std::sync::Arc;

use super::schema::Database;
use super::types::Feed;

/// Row type for feed query with unread count
type FeedRow = (i64, String, String, Option<String>, i64);

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Insert a feed, or update its title and category if the URL exists.
    /// Returns the feed id.
    pub async fn upsert_feed(&self, title: &str, url: &str, category: Option<&str>) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
                INSERT INTO feeds (title, url, category) VALUES (?, ?, ?)
                ON CONFLICT(url) DO UPDATE SET title = excluded.title, category = excluded.category
                RETURNING id
            "#,
        )
        .bind(title)
        .bind(url)
        .bind(category)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    /// Get all feeds with their unread article counts
    pub async fn get_feeds_with_unread_counts(&self) -> Result<Vec<Feed>> {
        let rows: Vec<FeedRow> = sqlx::query_as(
            r#"
                SELECT
                    f.id, f.title, f.url, f.category,
                    COUNT(CASE WHEN a.read = 0 THEN 1 END) as unread_count
                FROM feeds f
                LEFT JOIN articles a ON f.id = a.feed_id
                GROUP BY f.id
                ORDER BY f.title
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, title, url, category, unread_count)| Feed {
                id,
                title: Arc::from(title),
                url,
                category,
                unread_count,
            })
            .collect())
    }

    /// URLs of the feeds in a category, or of every feed for `None`.
    pub async fn feed_urls(&self, category: Option<&str>) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = match category {
            Some(name) => {
                sqlx::query_as("SELECT url FROM feeds WHERE category = ? ORDER BY url")
                    .bind(name)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT url FROM feeds ORDER BY url")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(|(url,)| url).collect())
    }

    /// Distinct category names, sorted.
    pub async fn categories(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT category FROM feeds WHERE category IS NOT NULL ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}
