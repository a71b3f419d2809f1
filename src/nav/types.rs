use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Failure reported by an article collaborator (page query, read-state write).
///
/// None of these are fatal to navigation state: the orchestrator turns
/// `Offline` into a notification plus cached-page fallback, and persistence
/// failures are only logged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The data source could not be reached.
    #[error("No connection: {0}")]
    Offline(String),

    /// The backing store rejected the operation.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}

impl QueryError {
    /// True for connectivity failures, which the UI reports as
    /// "showing cached articles only".
    pub fn is_offline(&self) -> bool {
        matches!(self, QueryError::Offline(_))
    }
}

// ============================================================================
// Article
// ============================================================================

/// Stable article identifier, also used as the key of its rendered element.
pub type ArticleId = i64;

/// An article as presented on a page.
///
/// `feed_id` is a lookup key into the feed list, not an owning reference.
/// The read flag is the only field mutated while the article is presented.
///
/// `title`, `url` and `image` use `Arc<str>` so page snapshots held by the
/// cache and the view are cheap to clone.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub id: ArticleId,
    pub feed_id: i64,
    pub title: Arc<str>,
    pub url: Option<Arc<str>>,
    /// Publish time as unix seconds.
    pub published: Option<i64>,
    /// Lead image source, loaded lazily by the view.
    pub image: Option<Arc<str>>,
    pub read: bool,
}

// ============================================================================
// Selection
// ============================================================================

/// The active feed/category/tag filter governing which articles are queried.
///
/// Feed URLs are kept in a sorted set so two selections naming the same
/// feeds compare (and hash) equal regardless of the order they were given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub label: Arc<str>,
    pub feed_urls: BTreeSet<String>,
    pub tag_id: Option<i64>,
}

impl Selection {
    /// Selection covering a single feed.
    pub fn feed(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            label: Arc::from(url.as_str()),
            feed_urls: BTreeSet::from([url]),
            tag_id: None,
        }
    }

    /// Selection covering every feed in a category (or "All").
    pub fn category<I, S>(label: &str, feed_urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: Arc::from(label),
            feed_urls: feed_urls.into_iter().map(Into::into).collect(),
            tag_id: None,
        }
    }

    /// Restrict the selection to articles carrying a tag.
    pub fn with_tag(mut self, tag_id: Option<i64>) -> Self {
        self.tag_id = tag_id;
        self
    }

    pub fn has_feeds(&self) -> bool {
        !self.feed_urls.is_empty()
    }
}

// ============================================================================
// Page query contract types
// ============================================================================

/// Half-open range `[from, to)` into the ordered result set of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub from: usize,
    pub to: usize,
}

impl PageRange {
    pub fn len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of one page query.
///
/// `unread_before` / `unread_after` count unread articles of the selection
/// strictly outside the requested range.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQueryResult {
    pub articles: Vec<Article>,
    pub total_matching: usize,
    pub unread_before: u64,
    pub unread_after: u64,
}

/// Unread articles strictly outside the current page.
///
/// Recomputed when a page loads; not updated when on-page articles change
/// read state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageCounters {
    pub unread_before_page: u64,
    pub unread_after_page: u64,
}

// ============================================================================
// View state
// ============================================================================

/// Coarse view state exposed to the presentation layer; input is only
/// handled while `ShowingArticles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    NoFeeds,
    Refreshing,
    ShowingArticles,
}

impl ViewState {
    pub fn name(self) -> &'static str {
        match self {
            ViewState::NoFeeds => "no-feeds",
            ViewState::Refreshing => "refreshing",
            ViewState::ShowingArticles => "showing-articles",
        }
    }
}

/// Discrete navigation inputs, already decoded from key or pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavAction {
    ScrollUp,
    ScrollDown,
    PreviousArticle,
    NextArticle,
    /// Space key-up.
    MarkReadAndAdvance,
    /// Context-menu gesture; behaves like `MarkReadAndAdvance`.
    ContextGesture,
    MarkAllRead,
    PrevPage,
    NextPage,
}
