//! Integration tests for the navigation core driven end to end.
//!
//! A `Library` mock stands in for the article source, a `StackedLayout`
//! for the rendered view. Background results are pumped back into the
//! navigator until nothing is in flight, the way the event loop does.

use async_trait::async_trait;
use glance::nav::{
    Article, ArticleId, ArticleQuery, NavAction, NavConfig, NavEvent, Navigator, Notification,
    PageCounters, PageQueryResult, PageRange, QueryError, ReadStateStore, ScrollRequest,
    Selection, StackedLayout, Subscription, ViewState, Viewport,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Semaphore};

const FEED: &str = "https://feed.example/rss";
const ARTICLE_HEIGHT: f64 = 100.0;
/// Blank space after each article, larger than the 20 unit anchor margin.
const ARTICLE_GAP: f64 = 40.0;
const PITCH: f64 = ARTICLE_HEIGHT + ARTICLE_GAP;

// ============================================================================
// Mock collaborators
// ============================================================================

#[derive(Default)]
struct LibraryState {
    /// (id, read), newest first
    articles: Vec<(ArticleId, bool)>,
    with_images: bool,
    offline: bool,
    fetched: Vec<(BTreeSet<String>, PageRange)>,
    set_read_calls: Vec<ArticleId>,
    mark_all_calls: usize,
    /// Writes wait for a permit when set
    read_gate: Option<Arc<Semaphore>>,
    /// Bulk requests wait for a permit when set
    bulk_gate: Option<Arc<Semaphore>>,
}

#[derive(Default)]
struct Library {
    state: Mutex<LibraryState>,
}

impl Library {
    /// `total` articles with ids `0..total`; `read(id)` gives the initial flag.
    fn new(total: i64, read: impl Fn(i64) -> bool) -> Arc<Self> {
        let library = Self::default();
        library.state.lock().unwrap().articles = (0..total).map(|id| (id, read(id))).collect();
        Arc::new(library)
    }

    fn with_images(self: Arc<Self>) -> Arc<Self> {
        self.state.lock().unwrap().with_images = true;
        self
    }

    /// Hold every read-state write until a permit is added.
    fn hold_reads(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.state.lock().unwrap().read_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Hold every mark-all-read request until a permit is added.
    fn hold_bulk_requests(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.state.lock().unwrap().bulk_gate = Some(Arc::clone(&gate));
        gate
    }

    fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    fn mark_all_calls(&self) -> usize {
        self.state.lock().unwrap().mark_all_calls
    }

    fn set_read_calls(&self) -> usize {
        self.state.lock().unwrap().set_read_calls.len()
    }

    fn last_fetch(&self) -> Option<(BTreeSet<String>, PageRange)> {
        self.state.lock().unwrap().fetched.last().cloned()
    }
}

#[async_trait]
impl ArticleQuery for Library {
    async fn fetch_page(
        &self,
        feed_urls: &BTreeSet<String>,
        range: PageRange,
        _tag_id: Option<i64>,
    ) -> Result<PageQueryResult, QueryError> {
        let mut state = self.state.lock().unwrap();
        state.fetched.push((feed_urls.clone(), range));
        if state.offline {
            return Err(QueryError::Offline("network unreachable".into()));
        }

        let total = state.articles.len();
        let to = range.to.min(total);
        let from = range.from.min(to);
        let unread_in = |slice: &[(ArticleId, bool)]| slice.iter().filter(|(_, r)| !r).count() as u64;
        let articles = state.articles[from..to]
            .iter()
            .map(|&(id, read)| Article {
                id,
                feed_id: 1,
                title: Arc::from(format!("Article {id}")),
                url: None,
                published: Some(1_700_000_000 - id),
                image: state
                    .with_images
                    .then(|| Arc::from(format!("https://img.example/{id}.png"))),
                read,
            })
            .collect();

        Ok(PageQueryResult {
            articles,
            total_matching: total,
            unread_before: unread_in(&state.articles[..from]),
            unread_after: unread_in(&state.articles[to..]),
        })
    }

    async fn mark_all_read_in_feeds(&self, _feed_urls: &BTreeSet<String>) -> Result<u64, QueryError> {
        let gate = self.state.lock().unwrap().bulk_gate.clone();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await.unwrap();
        }
        let mut state = self.state.lock().unwrap();
        state.mark_all_calls += 1;
        let mut marked = 0;
        for (_, read) in state.articles.iter_mut().filter(|(_, r)| !r) {
            *read = true;
            marked += 1;
        }
        Ok(marked)
    }

    async fn unread_count(
        &self,
        _feed_urls: &BTreeSet<String>,
        _tag_id: Option<i64>,
    ) -> Result<u64, QueryError> {
        let state = self.state.lock().unwrap();
        Ok(state.articles.iter().filter(|(_, r)| !r).count() as u64)
    }
}

#[async_trait]
impl ReadStateStore for Library {
    async fn set_read(&self, article_id: ArticleId, read: bool) -> Result<(), QueryError> {
        let gate = self.state.lock().unwrap().read_gate.clone();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await.unwrap();
        }
        let mut state = self.state.lock().unwrap();
        state.set_read_calls.push(article_id);
        if let Some(entry) = state.articles.iter_mut().find(|(id, _)| *id == article_id) {
            entry.1 = read;
        }
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    nav: Navigator<StackedLayout>,
    rx: mpsc::Receiver<NavEvent>,
    notifications: Arc<Mutex<Vec<Notification>>>,
    _subscription: Subscription,
}

impl Harness {
    fn new(library: Arc<Library>, selection: Selection) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let nav = Navigator::new(
            StackedLayout::default(),
            library.clone(),
            library.clone(),
            selection,
            NavConfig::default(),
            tx,
        );
        let notifications = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&notifications);
        let subscription = nav
            .hub()
            .subscribe(move |n| sink.lock().unwrap().push(n.clone()));

        Self {
            nav,
            rx,
            notifications,
            _subscription: subscription,
        }
    }

    /// Deliver background results until nothing is in flight.
    async fn settle(&mut self) {
        while self.nav.in_flight() > 0 {
            let event = self.rx.recv().await.expect("navigator channel closed");
            self.nav.handle_event(event);
        }
    }

    /// Deliver background results until `done` holds.
    async fn pump_until(&mut self, done: impl Fn(&Navigator<StackedLayout>) -> bool) {
        while !done(&self.nav) {
            let event = self.rx.recv().await.expect("navigator channel closed");
            self.nav.handle_event(event);
        }
    }

    /// Lay the presented page out in a container of `container` units,
    /// then fire the layout-ready hook.
    fn lay_out(&mut self, container: f64) {
        *self.nav.viewport_mut() = stacked(self.nav.page().articles(), container);
        assert!(self.nav.layout_ready());
    }

    async fn start(&mut self, container: f64) {
        self.nav.start();
        self.settle().await;
        self.lay_out(container);
    }

    fn finish_animation(&mut self) {
        let mut ticks = 0;
        while self.nav.tick() {
            ticks += 1;
            assert!(ticks < 500, "animation did not converge");
        }
    }

    fn scroll_top(&self) -> f64 {
        self.nav.viewport().scroll_metrics().current_top
    }

    fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    fn count(&self, wanted: &Notification) -> usize {
        self.notifications().iter().filter(|n| *n == wanted).count()
    }
}

fn feed() -> Selection {
    Selection::feed(FEED)
}

/// 100-unit article blocks separated by 40-unit gaps.
fn stacked(articles: &[Article], container: f64) -> StackedLayout {
    let mut layout = StackedLayout::with_gap(container, ARTICLE_GAP);
    for article in articles {
        layout.push_article(article.id, ARTICLE_HEIGHT);
    }
    layout
}

/// Scroll position that lands article `index` under the anchor margin.
fn anchor(index: usize) -> f64 {
    index as f64 * PITCH - 20.0
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_120_unread_then_mark_all_read() {
    let library = Library::new(120, |_| false);
    let mut h = Harness::new(library.clone(), feed());
    h.start(300.0).await;

    assert_eq!(h.nav.page().len(), 50);
    assert!(!h.nav.has_prev_page());
    assert!(h.nav.has_next_page());
    assert_eq!(
        h.nav.counters(),
        PageCounters {
            unread_before_page: 0,
            unread_after_page: 70,
        }
    );

    assert!(h.nav.handle_action(NavAction::MarkAllRead));
    h.settle().await;

    assert_eq!(h.nav.counters(), PageCounters::default());
    assert_eq!(library.mark_all_calls(), 1);
    assert_eq!(library.set_read_calls(), 50);
    assert!(h.nav.page().articles().iter().all(|a| a.read));

    let changed = h
        .notifications()
        .iter()
        .filter(|n| matches!(n, Notification::ArticleReadStateChanged { .. }))
        .count();
    assert_eq!(changed, 50);
    assert_eq!(h.count(&Notification::AllRead), 1);
}

#[tokio::test]
async fn test_paging_forward_and_back() {
    let library = Library::new(120, |_| true);
    let mut h = Harness::new(library.clone(), feed());
    h.start(300.0).await;

    assert!(h.nav.handle_action(NavAction::NextPage));
    h.settle().await;
    assert_eq!(h.nav.page_index(), 1);
    assert_eq!(h.nav.page().articles()[0].id, 50);
    assert!(h.nav.has_prev_page());
    assert!(h.nav.awaiting_layout());

    assert!(h.nav.handle_action(NavAction::NextPage));
    h.settle().await;
    assert_eq!(h.nav.page_index(), 2);
    assert_eq!(h.nav.page().len(), 20);
    assert!(!h.nav.handle_action(NavAction::NextPage), "last page");

    assert!(h.nav.handle_action(NavAction::PrevPage));
    h.settle().await;
    assert_eq!(h.nav.page_index(), 1);
    assert_eq!(library.last_fetch().map(|(_, r)| r), Some(PageRange { from: 50, to: 100 }));
}

#[tokio::test]
async fn test_layout_ready_resets_scroll() {
    let library = Library::new(60, |_| true);
    let mut h = Harness::new(library, feed());
    h.start(300.0).await;

    h.nav.viewport_mut().set_scroll_top(1200.0);
    h.nav.handle_action(NavAction::NextPage);
    h.settle().await;
    assert!(h.nav.awaiting_layout());

    // A zero-height container is not laid out yet
    *h.nav.viewport_mut() = StackedLayout::new(0.0);
    assert!(!h.nav.layout_ready());

    // The view kept its old scroll position when it re-rendered
    let mut layout = stacked(h.nav.page().articles(), 300.0);
    layout.set_scroll_top(400.0);
    *h.nav.viewport_mut() = layout;
    assert_eq!(h.scroll_top(), 400.0);

    assert!(h.nav.layout_ready());
    assert_eq!(h.scroll_top(), 0.0);
    assert!(!h.nav.layout_ready(), "one-shot");
}

// ============================================================================
// Navigation targets
// ============================================================================

#[tokio::test]
async fn test_space_marks_read_and_advances() {
    let library = Library::new(10, |_| false);
    let mut h = Harness::new(library.clone(), feed());
    h.start(300.0).await;

    assert!(h.nav.handle_action(NavAction::MarkReadAndAdvance));
    // The flag flips before the write settles
    assert!(h.nav.page().articles()[0].read);

    h.settle().await;
    h.finish_animation();

    assert_eq!(h.scroll_top(), anchor(1));
    assert_eq!(library.set_read_calls(), 1);
    assert_eq!(
        h.count(&Notification::ArticleReadStateChanged { article_id: 0 }),
        1
    );
    assert_eq!(h.count(&Notification::AllRead), 0);
}

#[tokio::test]
async fn test_next_unread_wraps_from_last_article() {
    // Only the articles at index 3 and 49 are unread
    let library = Library::new(50, |id| id != 3 && id != 49);
    let mut h = Harness::new(library, feed());
    h.start(50.0).await;

    // Article 49 alone is visible
    h.nav.viewport_mut().set_scroll_top(49.0 * PITCH + 10.0);
    h.nav.handle_action(NavAction::MarkReadAndAdvance);
    h.settle().await;
    h.finish_animation();

    assert!(h.nav.page().articles()[49].read);
    assert_eq!(h.scroll_top(), anchor(3));
}

#[tokio::test]
async fn test_next_unread_falls_back_to_page_end() {
    // Everything on page 0 is read, later pages are not
    let library = Library::new(80, |id| id < 50);
    let mut h = Harness::new(library, feed());
    h.start(300.0).await;
    assert_eq!(h.nav.counters().unread_after_page, 30);

    assert!(h.nav.scroll_to(ScrollRequest::NextUnread));
    h.finish_animation();
    let metrics = h.nav.viewport().scroll_metrics();
    assert_eq!(h.scroll_top(), metrics.content_height - metrics.container_height);
}

#[tokio::test]
async fn test_next_unread_with_nothing_left() {
    let library = Library::new(5, |_| true);
    let mut h = Harness::new(library, feed());
    h.start(300.0).await;

    assert!(!h.nav.scroll_to(ScrollRequest::NextUnread));
    assert!(!h.nav.is_animating());
}

#[tokio::test]
async fn test_next_article_walks_forward_and_back() {
    let library = Library::new(10, |_| true);
    let mut h = Harness::new(library, feed());
    h.start(300.0).await;

    let mut tops = Vec::new();
    for _ in 0..3 {
        assert!(h.nav.handle_action(NavAction::NextArticle));
        h.finish_animation();
        tops.push(h.scroll_top());
    }
    assert_eq!(tops, vec![anchor(1), anchor(2), anchor(3)]);

    tops.clear();
    for _ in 0..3 {
        assert!(h.nav.handle_action(NavAction::PreviousArticle));
        h.finish_animation();
        tops.push(h.scroll_top());
    }
    // Anchoring article 0 asks for -20, which clamps to the top
    assert_eq!(tops, vec![anchor(2), anchor(1), 0.0]);
}

#[tokio::test]
async fn test_space_walks_through_unread_articles() {
    let library = Library::new(10, |_| false);
    let mut h = Harness::new(library.clone(), feed());
    h.start(300.0).await;

    let mut tops = Vec::new();
    for _ in 0..4 {
        assert!(h.nav.handle_action(NavAction::MarkReadAndAdvance));
        h.settle().await;
        h.finish_animation();
        tops.push(h.scroll_top());
    }

    assert_eq!(tops, vec![anchor(1), anchor(2), anchor(3), anchor(4)]);
    let read: Vec<ArticleId> = h
        .nav
        .page()
        .articles()
        .iter()
        .filter(|a| a.read)
        .map(|a| a.id)
        .collect();
    assert_eq!(read, vec![0, 1, 2, 3]);
    assert_eq!(library.set_read_calls(), 4);
}

#[tokio::test]
async fn test_space_walks_through_terminal_layout() {
    use glance::ui::{build_layout, gap_rows};

    let library = Library::new(10, |_| false);
    let mut h = Harness::new(library, feed());
    h.nav.start();
    h.settle().await;

    // One day header, then 8-row articles in a 24-row terminal
    let groups = h.nav.page().organize_by_days(&chrono::Utc);
    assert_eq!(groups.len(), 1);
    let gap = gap_rows(h.nav.config().anchor_margin);
    *h.nav.viewport_mut() = build_layout(h.nav.page(), &groups, 8, gap, 24);
    assert!(h.nav.layout_ready());

    let mut tops = Vec::new();
    for _ in 0..4 {
        h.nav.handle_action(NavAction::MarkReadAndAdvance);
        h.settle().await;
        h.finish_animation();
        tops.push(h.scroll_top());
    }

    // Header 20, articles 160 with 40 after each: article k sits at
    // 20 + 200k and is anchored 20 units higher
    assert_eq!(tops, vec![200.0, 400.0, 600.0, 800.0]);
    assert_eq!(h.nav.page().unread_count(), 6);
}

#[tokio::test]
async fn test_neighbour_at_boundaries_scrolls_to_ends() {
    let library = Library::new(10, |_| true);
    let mut h = Harness::new(library, feed());
    h.start(300.0).await;

    h.nav.viewport_mut().set_scroll_top(50.0);
    h.nav.handle_action(NavAction::PreviousArticle);
    h.finish_animation();
    assert_eq!(h.scroll_top(), 0.0);

    // Last article alone in view: Next goes to the bottom of the list
    *h.nav.viewport_mut() = {
        let mut layout = stacked(h.nav.page().articles(), 50.0);
        layout.set_scroll_top(9.0 * PITCH + 10.0);
        layout
    };
    h.nav.handle_action(NavAction::NextArticle);
    h.finish_animation();
    let metrics = h.nav.viewport().scroll_metrics();
    assert_eq!(h.scroll_top(), metrics.content_height - metrics.container_height);
}

#[tokio::test]
async fn test_scroll_targets_are_clamped() {
    let library = Library::new(10, |_| true);
    let mut h = Harness::new(library, feed());
    h.start(300.0).await;

    assert!(h.nav.scroll_to(ScrollRequest::By(-50.0)));
    h.finish_animation();
    assert_eq!(h.scroll_top(), 0.0);

    assert!(h.nav.scroll_to(ScrollRequest::By(5000.0)));
    h.finish_animation();
    let metrics = h.nav.viewport().scroll_metrics();
    assert_eq!(h.scroll_top(), metrics.content_height - metrics.container_height);

    assert!(!h.nav.scroll_to(ScrollRequest::By(f64::NAN)));
}

#[tokio::test]
async fn test_scroll_down_steps_by_configured_distance() {
    let library = Library::new(20, |_| true);
    let mut h = Harness::new(library, feed());
    h.start(300.0).await;

    h.nav.handle_action(NavAction::ScrollDown);
    h.finish_animation();
    assert_eq!(h.scroll_top(), 300.0);

    h.nav.handle_action(NavAction::ScrollUp);
    h.finish_animation();
    assert_eq!(h.scroll_top(), 0.0);
}

// ============================================================================
// Read state and notifications
// ============================================================================

#[tokio::test]
async fn test_last_unread_read_emits_all_read() {
    let library = Library::new(3, |id| id != 0);
    let mut h = Harness::new(library, feed());
    h.start(300.0).await;

    h.nav.handle_action(NavAction::ContextGesture);
    h.settle().await;

    assert_eq!(h.count(&Notification::AllRead), 1);
    assert!(!h.nav.is_animating());
}

#[tokio::test]
async fn test_space_on_read_article_writes_nothing() {
    let library = Library::new(3, |id| id == 0);
    let mut h = Harness::new(library.clone(), feed());
    h.start(300.0).await;

    h.nav.handle_action(NavAction::MarkReadAndAdvance);
    h.settle().await;
    h.finish_animation();

    assert_eq!(library.set_read_calls(), 0);
    assert_eq!(h.scroll_top(), anchor(1));
}

#[tokio::test]
async fn test_read_ack_from_previous_page_does_not_advance() {
    let library = Library::new(120, |_| false);
    let reads = library.hold_reads();
    let mut h = Harness::new(library.clone(), feed());
    h.start(300.0).await;

    // The write is still pending when the next page replaces this one
    assert!(h.nav.handle_action(NavAction::MarkReadAndAdvance));
    assert!(h.nav.handle_action(NavAction::NextPage));
    h.pump_until(|nav| nav.awaiting_layout()).await;
    h.lay_out(300.0);
    assert_eq!(h.nav.page_index(), 1);
    let counters = h.nav.counters();

    reads.add_permits(1);
    h.settle().await;

    assert!(!h.nav.is_animating());
    assert_eq!(h.scroll_top(), 0.0);
    assert_eq!(h.nav.counters(), counters);
    assert_eq!(library.set_read_calls(), 1);
    assert_eq!(
        h.count(&Notification::ArticleReadStateChanged { article_id: 0 }),
        1
    );
}

#[tokio::test]
async fn test_mark_all_read_of_left_selection_keeps_counters() {
    let library = Library::new(120, |_| false);
    let bulk = library.hold_bulk_requests();
    let mut h = Harness::new(library.clone(), feed());
    h.start(300.0).await;

    assert!(h.nav.handle_action(NavAction::MarkAllRead));
    let other = Selection::feed("https://other.example/rss");
    assert!(h.nav.select(other.clone()));
    h.pump_until(|nav| nav.awaiting_layout()).await;
    h.lay_out(300.0);

    let counters = PageCounters {
        unread_before_page: 0,
        unread_after_page: 70,
    };
    assert_eq!(h.nav.counters(), counters);

    // The bulk request finishes for the selection it was issued for
    bulk.add_permits(1);
    h.settle().await;

    assert_eq!(library.mark_all_calls(), 1);
    assert_eq!(h.nav.selection(), &other);
    assert_eq!(h.nav.counters(), counters);
    assert_eq!(h.scroll_top(), 0.0);
    assert!(!h.nav.is_animating());
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn test_offline_falls_back_to_cached_page() {
    let library = Library::new(120, |_| true);
    let mut h = Harness::new(library.clone(), feed());
    h.start(300.0).await;

    h.nav.handle_action(NavAction::NextPage);
    h.settle().await;
    assert_eq!(h.nav.page_index(), 1);

    library.set_offline(true);
    h.nav.handle_action(NavAction::PrevPage);
    h.settle().await;

    assert_eq!(h.nav.page_index(), 0);
    assert_eq!(h.nav.page().articles()[0].id, 0);
    assert_eq!(h.nav.state(), ViewState::ShowingArticles);
    assert_eq!(h.count(&Notification::Offline), 1);
}

#[tokio::test]
async fn test_offline_without_cache_keeps_presentation() {
    let library = Library::new(120, |_| true);
    let mut h = Harness::new(library.clone(), feed());
    h.start(300.0).await;

    library.set_offline(true);
    h.nav.handle_action(NavAction::NextPage);
    h.settle().await;

    assert_eq!(h.nav.page_index(), 0);
    assert_eq!(h.nav.page().articles()[0].id, 0);
    assert_eq!(h.count(&Notification::Offline), 1);

    // The reverted index allows trying again
    library.set_offline(false);
    assert!(h.nav.handle_action(NavAction::NextPage));
    h.settle().await;
    assert_eq!(h.nav.page_index(), 1);
}

#[tokio::test]
async fn test_offline_refresh_reports_then_loads() {
    let library = Library::new(10, |_| true);
    let mut h = Harness::new(library, feed());
    h.start(300.0).await;

    h.nav.refresh_started();
    assert_eq!(h.nav.state(), ViewState::Refreshing);
    assert!(!h.nav.handle_action(NavAction::ScrollDown), "input ignored while refreshing");

    h.nav
        .refresh_finished(Err(QueryError::Offline("no route".into())));
    h.settle().await;

    assert_eq!(h.count(&Notification::Offline), 1);
    assert_eq!(h.nav.state(), ViewState::ShowingArticles);
}

// ============================================================================
// Selection
// ============================================================================

#[tokio::test]
async fn test_no_feeds_selection() {
    let library = Library::new(10, |_| false);
    let mut h = Harness::new(library.clone(), Selection::category("Empty", Vec::<String>::new()));
    h.nav.start();

    assert_eq!(h.nav.state(), ViewState::NoFeeds);
    assert_eq!(h.nav.in_flight(), 0);
    assert!(!h.nav.handle_action(NavAction::MarkAllRead));
    assert!(library.last_fetch().is_none());
}

#[tokio::test]
async fn test_select_during_refresh_defers_reload() {
    let library = Library::new(120, |_| true);
    let mut h = Harness::new(library.clone(), feed());
    h.start(300.0).await;
    h.nav.handle_action(NavAction::NextPage);
    h.settle().await;

    h.nav.refresh_started();
    let other = Selection::feed("https://other.example/rss");
    assert!(!h.nav.select(other.clone()));
    assert_eq!(h.nav.in_flight(), 0);

    h.nav.refresh_finished(Ok(()));
    h.settle().await;

    let (urls, range) = library.last_fetch().unwrap();
    assert_eq!(urls, other.feed_urls);
    assert_eq!(range, PageRange { from: 0, to: 50 });
    assert_eq!(h.nav.page_index(), 0);
}

#[tokio::test]
async fn test_rapid_selection_keeps_latest() {
    let library = Library::new(10, |_| true);
    let mut h = Harness::new(library, feed());
    h.start(300.0).await;

    let first = Selection::feed("https://first.example/rss");
    let second = Selection::feed("https://second.example/rss");
    assert!(h.nav.select(first));
    assert!(h.nav.select(second.clone()));
    h.settle().await;

    assert_eq!(h.nav.selection(), &second);
    assert_eq!(h.nav.state(), ViewState::ShowingArticles);
}

// ============================================================================
// Lazy images
// ============================================================================

#[tokio::test]
async fn test_lazy_images_wait_for_animation_end() {
    let library = Library::new(40, |_| true).with_images();
    let mut h = Harness::new(library, feed());
    h.start(100.0).await;

    // Window is five screens from the top: offsets 0..500, every 140
    let active: Vec<ArticleId> = (0..40).filter(|&id| h.nav.images().is_active(id)).collect();
    assert_eq!(active, vec![0, 1, 2, 3]);

    assert!(h.nav.scroll_to(ScrollRequest::By(2000.0)));
    assert!(h.nav.is_animating());
    assert_eq!(h.nav.on_scroll(), 0, "no scan mid-animation");
    assert!(!h.nav.images().is_active(15));

    // Window 2000..2500 holds the articles at 2100, 2240 and 2380
    h.finish_animation();
    assert_eq!(h.scroll_top(), 2000.0);
    assert!(!h.nav.images().is_active(14));
    assert!(h.nav.images().is_active(15));
    assert!(h.nav.images().is_active(17));
    assert!(!h.nav.images().is_active(18));
}
