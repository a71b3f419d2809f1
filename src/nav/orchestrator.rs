//! Top-level navigation state machine.
//!
//! [`Navigator`] owns the presented page and every navigation component.
//! It is mutated only from the event loop task: user input arrives through
//! [`Navigator::handle_action`], animation ticks through
//! [`Navigator::tick`], and the results of background work (page queries,
//! read-state writes) come back as [`NavEvent`]s on the channel passed to
//! [`Navigator::new`], to be fed into [`Navigator::handle_event`].

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::animator::{AnimationConfig, ScrollAnimator, Tick};
use super::lazy_images::{LazyImage, LazyImageLoader, DEFAULT_WINDOW_SCREENS};
use super::notify::{Notification, NotificationHub};
use super::page::PresentedPage;
use super::pagination::{PageCache, PageLoad, PaginationController};
use super::read_state::{ReadAck, ReadStateTracker};
use super::resolver::{self, Direction};
use super::source::{ArticleQuery, ReadStateStore};
use super::task::catch_task_panic;
use super::types::{ArticleId, NavAction, PageCounters, QueryError, Selection, ViewState};
use super::viewport::Viewport;

pub const DEFAULT_SCROLL_STEP: f64 = 300.0;
pub const DEFAULT_ANCHOR_MARGIN: f64 = 20.0;

/// Tunables of the navigation core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavConfig {
    /// Distance of one Up/Down scroll.
    pub scroll_step: f64,
    /// Gap left above an article scrolled into place.
    pub anchor_margin: f64,
    /// Lazy-load window, in viewport heights.
    pub lazy_load_screens: f64,
    pub animation: AnimationConfig,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            scroll_step: DEFAULT_SCROLL_STEP,
            anchor_margin: DEFAULT_ANCHOR_MARGIN,
            lazy_load_screens: DEFAULT_WINDOW_SCREENS,
            animation: AnimationConfig::default(),
        }
    }
}

/// Where a navigation should scroll to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollRequest {
    /// Relative to the current position.
    By(f64),
    /// Article adjacent to the first visible one, or the top / bottom of
    /// the list when there is none.
    Neighbour(Direction),
    /// Next unread article, else the end of the list that has unread
    /// articles beyond the page.
    NextUnread,
}

// ============================================================================
// Background Events
// ============================================================================

/// Results of background work, delivered through the event channel.
#[derive(Debug)]
pub enum NavEvent {
    /// A page query finished.
    PageLoaded {
        /// Load request this result answers; older ones are discarded
        generation: u64,
        selection: Selection,
        page_index: usize,
        result: Result<PageLoad, QueryError>,
    },

    /// A single read-state write settled.
    ReadAcknowledged {
        article_id: ArticleId,
        /// Presented page the write was issued from
        page_generation: u64,
        /// False when the article was already read
        changed: bool,
        /// Continue to the next unread article
        advance: bool,
    },

    /// The mark-all-read workflow finished.
    AllMarkedRead {
        /// Selection captured when the workflow started
        selection: Selection,
        /// On-page articles that flipped to read
        article_ids: Vec<ArticleId>,
        result: Result<u64, QueryError>,
    },

    /// Unread count of a selection, for the "all read" check.
    UnreadCount {
        selection: Selection,
        result: Result<u64, QueryError>,
    },

    /// Background task panicked.
    TaskPanicked { task: &'static str, error: String },
}

// ============================================================================
// Navigator
// ============================================================================

pub struct Navigator<V: Viewport> {
    state: ViewState,
    selection: Selection,
    page: PresentedPage,
    pagination: PaginationController,
    read_state: ReadStateTracker,
    animator: ScrollAnimator,
    images: LazyImageLoader,
    viewport: V,
    hub: NotificationHub,
    cache: PageCache,
    config: NavConfig,
    events: mpsc::Sender<NavEvent>,

    /// Incremented per page request; stale results are dropped
    load_generation: u64,
    /// Incremented whenever a new page is presented
    page_generation: u64,
    /// Page index of the presented page
    presented_index: usize,
    /// Scroll reset and first lazy scan wait for the layout to be measured
    awaiting_layout: bool,
    /// Spawned tasks whose event has not been handled yet
    in_flight: usize,
    page_task: Option<JoinHandle<()>>,
}

impl<V: Viewport> Navigator<V> {
    pub fn new(
        viewport: V,
        query: Arc<dyn ArticleQuery>,
        store: Arc<dyn ReadStateStore>,
        selection: Selection,
        config: NavConfig,
        events: mpsc::Sender<NavEvent>,
    ) -> Self {
        let state = if selection.has_feeds() {
            ViewState::ShowingArticles
        } else {
            ViewState::NoFeeds
        };

        Self {
            state,
            selection,
            page: PresentedPage::default(),
            pagination: PaginationController::new(Arc::clone(&query)),
            read_state: ReadStateTracker::new(store, query),
            animator: ScrollAnimator::new(config.animation),
            images: LazyImageLoader::new(config.lazy_load_screens),
            viewport,
            hub: NotificationHub::new(),
            cache: PageCache::default(),
            config,
            events,
            load_generation: 0,
            page_generation: 0,
            presented_index: 0,
            awaiting_layout: false,
            in_flight: 0,
            page_task: None,
        }
    }

    /// Initial load: nothing happens without feeds, otherwise the first
    /// page of the selection is requested.
    pub fn start(&mut self) {
        if !self.selection.has_feeds() {
            self.state = ViewState::NoFeeds;
            tracing::info!("No feeds in selection");
            return;
        }
        self.load_current_page();
    }

    // ========================================================================
    // Selection and paging
    // ========================================================================

    /// Switch to another feed, category or tag.
    ///
    /// The page index always resets; the reload is skipped while there are
    /// no feeds or a refresh runs (the refresh reloads when it finishes).
    /// Returns whether a reload was requested.
    pub fn select(&mut self, selection: Selection) -> bool {
        tracing::debug!(selection = %selection.label, tag_id = ?selection.tag_id, "Select");
        self.selection = selection;
        self.pagination.reset_to_first_page();

        if matches!(self.state, ViewState::NoFeeds | ViewState::Refreshing) {
            return false;
        }
        self.load_current_page();
        true
    }

    pub fn next_page(&mut self) -> bool {
        if !self.pagination.next_page() {
            return false;
        }
        self.load_current_page();
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if !self.pagination.prev_page() {
            return false;
        }
        self.load_current_page();
        true
    }

    pub fn refresh_started(&mut self) {
        self.state = ViewState::Refreshing;
        self.animator.cancel();
    }

    /// End of a refresh. An offline failure is reported, then the current
    /// page is loaded either way.
    pub fn refresh_finished(&mut self, result: Result<(), QueryError>) {
        if let Err(e) = result {
            tracing::warn!(error = %e, "Refresh failed");
            if e.is_offline() {
                self.hub.emit(&Notification::Offline);
            }
        }
        if !self.selection.has_feeds() {
            self.state = ViewState::NoFeeds;
            return;
        }
        self.load_current_page();
    }

    fn load_current_page(&mut self) {
        self.load_generation += 1;
        let generation = self.load_generation;
        let selection = self.selection.clone();
        let page_index = self.pagination.page_index();
        let load = self.pagination.load_page(&selection, page_index);

        tracing::debug!(selection = %selection.label, page_index, generation, "Loading page");
        let handle = self.spawn("load_page", async move {
            NavEvent::PageLoaded {
                generation,
                selection,
                page_index,
                result: load.await,
            }
        });
        self.page_task = Some(handle);
    }

    fn present(&mut self, load: PageLoad) {
        self.pagination.apply(&load);
        self.presented_index = load.page_index;
        self.page = load.page;
        self.page_generation += 1;
        self.state = ViewState::ShowingArticles;

        self.animator.cancel();
        self.images.clear();
        self.awaiting_layout = true;

        tracing::info!(
            selection = %self.selection.label,
            page_index = self.presented_index,
            articles = self.page.len(),
            "Presented page"
        );
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Dispatch a decoded input. Ignored unless articles are shown.
    pub fn handle_action(&mut self, action: NavAction) -> bool {
        if self.state != ViewState::ShowingArticles {
            tracing::debug!(?action, state = self.state.name(), "Input ignored");
            return false;
        }

        match action {
            NavAction::ScrollUp => self.scroll_to(ScrollRequest::By(-self.config.scroll_step)),
            NavAction::ScrollDown => self.scroll_to(ScrollRequest::By(self.config.scroll_step)),
            NavAction::PreviousArticle => self.scroll_to(ScrollRequest::Neighbour(Direction::Prev)),
            NavAction::NextArticle => self.scroll_to(ScrollRequest::Neighbour(Direction::Next)),
            NavAction::MarkReadAndAdvance | NavAction::ContextGesture => {
                self.mark_first_visible_read_and_advance()
            }
            NavAction::MarkAllRead => self.mark_all_read(),
            NavAction::PrevPage => self.prev_page(),
            NavAction::NextPage => self.next_page(),
        }
    }

    /// Resolve a navigation target and animate toward it.
    ///
    /// Returns `false` when there is nowhere to go: no unread article on or
    /// off the page, or the target article has no element to measure.
    pub fn scroll_to(&mut self, request: ScrollRequest) -> bool {
        let metrics = self.viewport.scroll_metrics();
        let articles = self.page.articles();
        let reference = resolver::first_visible(articles, &self.viewport).map(|i| articles[i].id);

        let target = match request {
            ScrollRequest::By(distance) => metrics.current_top + distance,
            ScrollRequest::Neighbour(direction) => {
                match resolver::neighbour(articles, direction, reference) {
                    Some(index) => match self.anchor_of(articles[index].id) {
                        Some(position) => position,
                        None => return false,
                    },
                    None => match direction {
                        Direction::Prev => 0.0,
                        Direction::Next => metrics.content_height,
                    },
                }
            }
            ScrollRequest::NextUnread => match resolver::next_unread(articles, reference) {
                Some(index) => match self.anchor_of(articles[index].id) {
                    Some(position) => position,
                    None => return false,
                },
                None => {
                    let counters = self.pagination.counters();
                    if counters.unread_after_page > 0 {
                        metrics.content_height
                    } else if counters.unread_before_page > 0 {
                        0.0
                    } else {
                        return false;
                    }
                }
            },
        };

        self.animator.animate_to(target, metrics)
    }

    fn anchor_of(&self, id: ArticleId) -> Option<f64> {
        let offset = self.viewport.offset_top(id);
        if offset.is_none() {
            tracing::debug!(article_id = id, "Article has no rendered element");
        }
        offset.map(|top| top - self.config.anchor_margin)
    }

    /// Space / context gesture: mark the first visible article read, then
    /// move on to the next unread one once the write settles.
    fn mark_first_visible_read_and_advance(&mut self) -> bool {
        let Some(index) = resolver::first_visible(self.page.articles(), &self.viewport) else {
            return false;
        };
        let Some(article) = self.page.get_mut(index) else {
            return false;
        };

        let changed = !article.read;
        let ack = self.read_state.mark_read(article);
        let article_id = ack.article_id();
        let page_generation = self.page_generation;

        self.spawn("mark_read", async move {
            ack.await;
            NavEvent::ReadAcknowledged {
                article_id,
                page_generation,
                changed,
                advance: true,
            }
        });
        true
    }

    /// Enter: mark every unread article on the page, wait for all writes,
    /// then mark the whole selection read.
    fn mark_all_read(&mut self) -> bool {
        let selection = self.selection.clone();
        let mut acks: Vec<ReadAck> = Vec::new();
        for index in 0..self.page.len() {
            if let Some(article) = self.page.get_mut(index) {
                if !article.read {
                    acks.push(self.read_state.mark_read(article));
                }
            }
        }
        let article_ids: Vec<ArticleId> = acks.iter().map(ReadAck::article_id).collect();
        let read_state = self.read_state.clone();

        tracing::info!(selection = %selection.label, on_page = acks.len(), "Marking all read");
        self.spawn("mark_all_read", async move {
            join_all(acks).await;
            let result = read_state.mark_all_read_in_selection(&selection).await;
            NavEvent::AllMarkedRead {
                selection,
                article_ids,
                result,
            }
        });
        true
    }

    fn check_if_all_read(&mut self) {
        let selection = self.selection.clone();
        let read_state = self.read_state.clone();
        self.spawn("unread_count", async move {
            let result = read_state.unread_count(&selection).await;
            NavEvent::UnreadCount { selection, result }
        });
    }

    // ========================================================================
    // View hooks
    // ========================================================================

    /// Advance the scroll animation by one tick. Returns whether another
    /// tick is needed.
    pub fn tick(&mut self) -> bool {
        match self.animator.tick() {
            Tick::Idle => false,
            Tick::Step(position) => {
                self.viewport.set_scroll_top(position);
                true
            }
            Tick::Finished(position) => {
                self.viewport.set_scroll_top(position);
                self.on_scroll();
                false
            }
        }
    }

    /// Scroll position changed; run a lazy-load pass unless animating.
    /// Returns the number of images activated.
    pub fn on_scroll(&mut self) -> usize {
        let metrics = self.viewport.scroll_metrics();
        self.images.scan(
            self.animator.phase(),
            metrics.current_top,
            metrics.container_height,
        )
    }

    /// One-shot hook after a new page was laid out.
    ///
    /// Once the container has a measured height: register the page's
    /// deferred images, reset the scroll to the top and run the first
    /// lazy-load pass. Returns `false` while still waiting.
    pub fn layout_ready(&mut self) -> bool {
        if !self.awaiting_layout || self.viewport.scroll_metrics().container_height <= 0.0 {
            return false;
        }
        self.awaiting_layout = false;

        let images = self
            .page
            .articles()
            .iter()
            .filter_map(|a| {
                let src = a.image.clone()?;
                let offset = self.viewport.offset_top(a.id)?;
                Some(LazyImage::new(a.id, offset, src))
            })
            .collect();
        self.images.register(images);

        self.animator.cancel();
        self.viewport.set_scroll_top(0.0);
        self.on_scroll();
        true
    }

    // ========================================================================
    // Background results
    // ========================================================================

    pub fn handle_event(&mut self, event: NavEvent) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match event {
            NavEvent::PageLoaded {
                generation,
                selection,
                page_index,
                result,
            } => {
                if generation != self.load_generation {
                    tracing::debug!(generation, current = self.load_generation, "Discarding stale page");
                    return;
                }
                self.page_task = None;
                match result {
                    Ok(load) => {
                        self.cache.store(&selection, &load);
                        self.present(load);
                    }
                    Err(e) => self.page_load_failed(&selection, page_index, e),
                }
            }

            NavEvent::ReadAcknowledged {
                article_id,
                page_generation,
                changed,
                advance,
            } => {
                if changed {
                    self.hub
                        .emit(&Notification::ArticleReadStateChanged { article_id });
                }
                let mut needs_check = changed;
                if advance && page_generation == self.page_generation {
                    // Nothing left to scroll to on or off the page
                    needs_check |= !self.scroll_to(ScrollRequest::NextUnread);
                }
                if needs_check {
                    self.check_if_all_read();
                }
            }

            NavEvent::AllMarkedRead {
                selection,
                article_ids,
                result,
            } => {
                for article_id in article_ids {
                    self.hub
                        .emit(&Notification::ArticleReadStateChanged { article_id });
                }
                match result {
                    Ok(marked) => {
                        tracing::debug!(selection = %selection.label, marked, "Selection marked read");
                        self.cache.invalidate(&selection);
                        if selection == self.selection {
                            self.pagination.reset_counters();
                        }
                    }
                    Err(e) => {
                        tracing::warn!(selection = %selection.label, error = %e, "Failed to mark selection read");
                    }
                }
                self.check_if_all_read();
            }

            NavEvent::UnreadCount { selection, result } => {
                if selection != self.selection {
                    return;
                }
                match result {
                    Ok(0) => self.hub.emit(&Notification::AllRead),
                    Ok(unread) => tracing::trace!(unread, "Unread remaining"),
                    Err(e) => tracing::warn!(error = %e, "Unread count query failed"),
                }
            }

            NavEvent::TaskPanicked { task, error } => {
                tracing::error!(task, error = %error, "Navigation task panicked");
                if task == "load_page" {
                    self.page_task = None;
                    self.pagination.revert_to(self.presented_index);
                    if self.state == ViewState::Refreshing {
                        self.state = ViewState::ShowingArticles;
                    }
                }
            }
        }
    }

    fn page_load_failed(&mut self, selection: &Selection, page_index: usize, error: QueryError) {
        if error.is_offline() {
            tracing::warn!(error = %error, page_index, "Page query offline, using cache");
            self.hub.emit(&Notification::Offline);
        } else {
            tracing::error!(error = %error, page_index, "Page query failed");
        }

        match self.cache.get(selection, page_index).cloned() {
            Some(cached) => self.present(cached),
            None => {
                // Keep what is shown and its page index
                self.pagination.revert_to(self.presented_index);
                self.state = ViewState::ShowingArticles;
            }
        }
    }

    fn spawn<F>(&mut self, task: &'static str, work: F) -> JoinHandle<()>
    where
        F: Future<Output = NavEvent> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.events.clone();
        tokio::spawn(async move {
            let event = match catch_task_panic(work).await {
                Ok(event) => event,
                Err(error) => {
                    tracing::error!(task, error = %error, "Background task panicked");
                    NavEvent::TaskPanicked { task, error }
                }
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, task, "Channel send failed (receiver dropped)");
            }
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn page(&self) -> &PresentedPage {
        &self.page
    }

    pub fn page_index(&self) -> usize {
        self.presented_index
    }

    pub fn has_prev_page(&self) -> bool {
        self.pagination.has_prev_page()
    }

    pub fn has_next_page(&self) -> bool {
        self.pagination.has_next_page()
    }

    pub fn counters(&self) -> PageCounters {
        self.pagination.counters()
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn animation_config(&self) -> &AnimationConfig {
        self.animator.config()
    }

    pub fn awaiting_layout(&self) -> bool {
        self.awaiting_layout
    }

    pub fn images(&self) -> &LazyImageLoader {
        &self.images
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    /// For the view to rebuild or resize the layout.
    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    /// Number of background results still to be delivered.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl<V: Viewport> Drop for Navigator<V> {
    fn drop(&mut self) {
        // Read-state writes keep running; only the page query is abandoned
        if let Some(handle) = self.page_task.take() {
            handle.abort();
        }
    }
}
