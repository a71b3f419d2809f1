//! Navigation collaborator contracts backed by SQLite.

use async_trait::async_trait;
use std::collections::BTreeSet;

use super::schema::Database;
use crate::nav::{ArticleId, ArticleQuery, PageQueryResult, PageRange, QueryError, ReadStateStore};

#[async_trait]
impl ArticleQuery for Database {
    async fn fetch_page(
        &self,
        feed_urls: &BTreeSet<String>,
        range: PageRange,
        tag_id: Option<i64>,
    ) -> Result<PageQueryResult, QueryError> {
        Ok(self.get_article_page(feed_urls, range, tag_id).await?)
    }

    async fn mark_all_read_in_feeds(&self, feed_urls: &BTreeSet<String>) -> Result<u64, QueryError> {
        Ok(self.mark_feeds_read(feed_urls).await?)
    }

    async fn unread_count(
        &self,
        feed_urls: &BTreeSet<String>,
        tag_id: Option<i64>,
    ) -> Result<u64, QueryError> {
        Ok(self.count_unread(feed_urls, tag_id).await?)
    }
}

#[async_trait]
impl ReadStateStore for Database {
    async fn set_read(&self, article_id: ArticleId, read: bool) -> Result<(), QueryError> {
        Ok(self.set_article_read(article_id, read).await?)
    }
}
