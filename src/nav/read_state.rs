//! Optimistic read marking.
//!
//! Flags flip in memory first; the persistence write runs on its own task
//! and a failure there is logged, never rolled back.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use super::source::{ArticleQuery, ReadStateStore};
use super::types::{Article, ArticleId, QueryError, Selection};

/// Completion of a single read-state write.
///
/// Always resolves to `()`: persistence failures are logged by the write
/// task and never reported back. Dropping the ack does not cancel the
/// write.
#[derive(Debug)]
#[must_use = "an ack does nothing unless awaited; drop it to fire and forget"]
pub struct ReadAck {
    article_id: ArticleId,
    handle: Option<JoinHandle<()>>,
}

impl ReadAck {
    fn ready(article_id: ArticleId) -> Self {
        Self {
            article_id,
            handle: None,
        }
    }

    pub fn article_id(&self) -> ArticleId {
        self.article_id
    }
}

impl Future for ReadAck {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let article_id = self.article_id;
        let Some(handle) = self.handle.as_mut() else {
            return Poll::Ready(());
        };
        match Pin::new(handle).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(result) => {
                if let Err(e) = result {
                    tracing::error!(article_id, error = %e, "Read-state write task failed");
                }
                self.handle = None;
                Poll::Ready(())
            }
        }
    }
}

/// Read/unread bookkeeping over presented articles.
///
/// Cheap to clone; clones share the same collaborators.
#[derive(Clone)]
pub struct ReadStateTracker {
    store: Arc<dyn ReadStateStore>,
    query: Arc<dyn ArticleQuery>,
}

impl ReadStateTracker {
    pub fn new(store: Arc<dyn ReadStateStore>, query: Arc<dyn ArticleQuery>) -> Self {
        Self { store, query }
    }

    /// Mark an article read.
    ///
    /// The in-memory flag flips immediately and a persistence write is
    /// spawned. A failed write is logged and the flag stays set. Marking an
    /// already-read article issues no write and returns a ready ack.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mark_read(&self, article: &mut Article) -> ReadAck {
        if article.read {
            return ReadAck::ready(article.id);
        }
        article.read = true;

        let article_id = article.id;
        let store = Arc::clone(&self.store);
        let handle = tokio::spawn(async move {
            if let Err(e) = store.set_read(article_id, true).await {
                tracing::warn!(article_id, error = %e, "Failed to persist read state");
            }
        });

        ReadAck {
            article_id,
            handle: Some(handle),
        }
    }

    /// Mark every article matching the selection read, on any page.
    ///
    /// The request covers the selection's feeds only: a tag filter is not
    /// applied, so untagged articles of those feeds are marked as well.
    ///
    /// Callers must settle all outstanding [`ReadAck`]s for the presented
    /// page before issuing this.
    pub async fn mark_all_read_in_selection(&self, selection: &Selection) -> Result<u64, QueryError> {
        if let Some(tag_id) = selection.tag_id {
            tracing::debug!(tag_id, "Tag filter not applied to mark-all-read");
        }
        let marked = self.query.mark_all_read_in_feeds(&selection.feed_urls).await?;
        tracing::info!(selection = %selection.label, marked, "Marked selection read");
        Ok(marked)
    }

    /// Current unread count of the selection, recomputed by the data layer.
    pub async fn unread_count(&self, selection: &Selection) -> Result<u64, QueryError> {
        self.query
            .unread_count(&selection.feed_urls, selection.tag_id)
            .await
    }
}

/// Read and unread totals of a presented sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadCounts {
    pub read: usize,
    pub unread: usize,
}

impl ReadCounts {
    pub fn of(articles: &[Article]) -> Self {
        let read = articles.iter().filter(|a| a.read).count();
        Self {
            read,
            unread: articles.len() - read,
        }
    }
}
