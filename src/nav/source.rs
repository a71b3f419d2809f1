//! Collaborator contracts consumed by the navigation core.
//!
//! Implementations:
//! - `storage::Database`: SQLite via sqlx (the binary)
//! - hand-written mocks in tests

use async_trait::async_trait;
use std::collections::BTreeSet;

use super::types::{ArticleId, PageQueryResult, PageRange, QueryError};

/// Read-only article queries plus the bulk mark-read operation.
#[async_trait]
pub trait ArticleQuery: Send + Sync {
    /// Fetch the articles in `range` for the given feeds, optionally
    /// restricted to a tag.
    ///
    /// # Errors
    /// `QueryError::Offline` when the data source is unreachable.
    async fn fetch_page(
        &self,
        feed_urls: &BTreeSet<String>,
        range: PageRange,
        tag_id: Option<i64>,
    ) -> Result<PageQueryResult, QueryError>;

    /// Mark every article of the given feeds as read, including articles
    /// outside the presented page.
    async fn mark_all_read_in_feeds(&self, feed_urls: &BTreeSet<String>) -> Result<u64, QueryError>;

    /// Unread articles matching the filter, recomputed on every call.
    async fn unread_count(
        &self,
        feed_urls: &BTreeSet<String>,
        tag_id: Option<i64>,
    ) -> Result<u64, QueryError>;
}

/// Durable per-article read flag.
#[async_trait]
pub trait ReadStateStore: Send + Sync {
    async fn set_read(&self, article_id: ArticleId, read: bool) -> Result<(), QueryError>;
}
