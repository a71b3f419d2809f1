//! Page index, page boundaries and the offline page cache.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::page::{page_range, PresentedPage};
use super::source::ArticleQuery;
use super::types::{PageCounters, QueryError, Selection};

/// Pages kept for offline fallback.
pub const PAGE_CACHE_CAPACITY: usize = 16;

/// A loaded page plus its boundary information.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLoad {
    pub page_index: usize,
    pub page: PresentedPage,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub counters: PageCounters,
}

/// Owns the page index and the boundary flags of the current page.
pub struct PaginationController {
    query: Arc<dyn ArticleQuery>,
    page_index: usize,
    has_prev_page: bool,
    has_next_page: bool,
    counters: PageCounters,
}

impl PaginationController {
    pub fn new(query: Arc<dyn ArticleQuery>) -> Self {
        Self {
            query,
            page_index: 0,
            has_prev_page: false,
            has_next_page: false,
            counters: PageCounters::default(),
        }
    }

    /// Query one page of the selection.
    ///
    /// The returned future owns everything it needs, so it can be spawned.
    /// Nothing is changed here; pass the result to [`apply`](Self::apply).
    pub fn load_page(
        &self,
        selection: &Selection,
        page_index: usize,
    ) -> impl Future<Output = Result<PageLoad, QueryError>> + Send + 'static {
        let query = Arc::clone(&self.query);
        let selection = selection.clone();
        async move {
            let range = page_range(page_index);
            let result = query
                .fetch_page(&selection.feed_urls, range, selection.tag_id)
                .await?;

            tracing::debug!(
                selection = %selection.label,
                page_index,
                received = result.articles.len(),
                total = result.total_matching,
                "Loaded page"
            );

            Ok(PageLoad {
                page_index,
                page: PresentedPage::new(result.articles),
                has_prev_page: range.from > 0,
                has_next_page: range.to <= result.total_matching,
                counters: PageCounters {
                    unread_before_page: result.unread_before,
                    unread_after_page: result.unread_after,
                },
            })
        }
    }

    /// Adopt the boundaries of a loaded page.
    pub fn apply(&mut self, load: &PageLoad) {
        self.page_index = load.page_index;
        self.has_prev_page = load.has_prev_page;
        self.has_next_page = load.has_next_page;
        self.counters = load.counters;
    }

    /// Called whenever the selection changes.
    pub fn reset_to_first_page(&mut self) {
        self.page_index = 0;
    }

    /// Advance the index if a next page exists. Returns whether a reload is
    /// needed.
    pub fn next_page(&mut self) -> bool {
        if !self.has_next_page {
            return false;
        }
        self.page_index += 1;
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if !self.has_prev_page || self.page_index == 0 {
            return false;
        }
        self.page_index -= 1;
        true
    }

    /// Return to the index of the presented page after its replacement
    /// failed to load.
    pub fn revert_to(&mut self, page_index: usize) {
        self.page_index = page_index;
    }

    /// Zero both counters after the whole selection was marked read.
    pub fn reset_counters(&mut self) {
        self.counters = PageCounters::default();
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn has_prev_page(&self) -> bool {
        self.has_prev_page
    }

    pub fn has_next_page(&self) -> bool {
        self.has_next_page
    }

    pub fn counters(&self) -> PageCounters {
        self.counters
    }
}

/// Recently loaded pages keyed by selection and page index.
pub struct PageCache {
    pages: LruCache<(Selection, usize), PageLoad>,
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new(PAGE_CACHE_CAPACITY)
    }
}

impl PageCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            pages: LruCache::new(capacity),
        }
    }

    pub fn store(&mut self, selection: &Selection, load: &PageLoad) {
        self.pages
            .put((selection.clone(), load.page_index), load.clone());
    }

    pub fn get(&mut self, selection: &Selection, page_index: usize) -> Option<&PageLoad> {
        self.pages.get(&(selection.clone(), page_index))
    }

    /// Drop every cached page of a selection, e.g. after marking it read.
    pub fn invalidate(&mut self, selection: &Selection) {
        let stale: Vec<_> = self
            .pages
            .iter()
            .filter(|((cached, _), _)| cached == selection)
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            self.pages.pop(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
