use crate::config::Config;
use crate::keybindings::{Context, KeybindingRegistry};
use crate::nav::task::catch_task_panic;
use crate::nav::{
    NavEvent, Navigator, Notification, QueryError, Selection, StackedLayout, Subscription,
    ViewState,
};
use crate::storage::Database;
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Status messages disappear after this many seconds.
const STATUS_TTL_SECS: u64 = 3;

// ============================================================================
// Application Events
// ============================================================================

/// Events from background tasks owned by the terminal front end.
///
/// Navigation results travel on their own `NavEvent` channel; this one
/// carries what the front end spawns itself plus forwarded notifications.
#[derive(Debug)]
pub enum AppEvent {
    /// A refresh finished.
    RefreshComplete(Result<(), QueryError>),

    /// Forwarded from the navigator's notification hub.
    Notified(Notification),

    /// Background task panicked.
    TaskPanicked { task: &'static str, error: String },
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub db: Database,
    pub nav: Navigator<StackedLayout>,
    pub keybindings: KeybindingRegistry,

    /// Terminal rows per article block.
    pub article_height: u16,

    /// Status message with expiry. `Cow` avoids allocation for static literals.
    pub status_message: Option<(Cow<'static, str>, Instant)>,

    /// Dirty flag to skip unnecessary frame renders.
    pub needs_redraw: bool,

    /// Handle to the running refresh, aborted on quit.
    pub refresh_handle: Option<tokio::task::JoinHandle<()>>,

    /// Keeps the notification forwarder registered for the app's lifetime.
    _notifications: Subscription,
}

impl App {
    pub fn new(
        db: Database,
        config: &Config,
        selection: Selection,
        nav_tx: mpsc::Sender<NavEvent>,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        let mut keybindings = KeybindingRegistry::new();
        for warning in keybindings.apply_overrides(&config.keybindings) {
            tracing::warn!(warning = %warning, "Keybinding override rejected");
        }

        let nav = Navigator::new(
            StackedLayout::default(),
            Arc::new(db.clone()),
            Arc::new(db.clone()),
            selection,
            config.nav_config(),
            nav_tx,
        );

        // Handlers run synchronously inside emit(), so hand off to the loop
        let notifications = nav.hub().subscribe(move |notification| {
            if let Err(e) = event_tx.try_send(AppEvent::Notified(notification.clone())) {
                tracing::warn!(error = %e, "Dropped notification (event queue full)");
            }
        });

        Self {
            db,
            nav,
            keybindings,
            article_height: config.article_height.max(1),
            status_message: None,
            needs_redraw: true,
            refresh_handle: None,
            _notifications: notifications,
        }
    }

    /// Keybinding context for the current navigation state.
    pub fn context(&self) -> Context {
        match self.nav.state() {
            ViewState::ShowingArticles => Context::Articles,
            ViewState::NoFeeds | ViewState::Refreshing => Context::Global,
        }
    }

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired (older than 3 seconds)
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    /// Start a refresh unless one is already running.
    ///
    /// The article source is a local database, so a refresh checks that it
    /// is still reachable and then reloads the current page.
    pub fn start_refresh(&mut self, event_tx: &mpsc::Sender<AppEvent>) -> bool {
        if self.nav.state() == ViewState::Refreshing {
            return false;
        }
        self.nav.refresh_started();
        self.set_status("Refreshing...");

        let db = self.db.clone();
        let tx = event_tx.clone();
        self.refresh_handle = Some(tokio::spawn(async move {
            let event = match catch_task_panic(db.ping()).await {
                Ok(result) => AppEvent::RefreshComplete(result.map_err(QueryError::from)),
                Err(error) => AppEvent::TaskPanicked {
                    task: "refresh",
                    error,
                },
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, "Channel send failed (receiver dropped)");
            }
        }));
        true
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::RefreshComplete(result) => {
                self.refresh_handle = None;
                match &result {
                    Ok(()) => self.status_message = None,
                    // Offline failures get their own notification
                    Err(e) if !e.is_offline() => self.set_status(format!("Refresh failed: {}", e)),
                    Err(_) => {}
                }
                self.nav.refresh_finished(result);
            }
            AppEvent::Notified(notification) => {
                if let Some(message) = notification.message() {
                    self.set_status(message);
                }
            }
            AppEvent::TaskPanicked { task, error } => {
                tracing::error!(task, error = %error, "Background task panicked");
                if task == "refresh" {
                    self.refresh_handle = None;
                    self.nav.refresh_finished(Err(QueryError::Other(error)));
                }
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(handle) = self.refresh_handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::{ViewState, MSG_ALL_READ, MSG_OFFLINE};
    use crate::storage::NewArticle;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::time;

    struct Harness {
        app: App,
        nav_rx: mpsc::Receiver<NavEvent>,
        event_tx: mpsc::Sender<AppEvent>,
        event_rx: mpsc::Receiver<AppEvent>,
    }

    async fn harness(config: Config) -> Harness {
        let db = Database::open(":memory:").await.unwrap();
        let feed_id = db
            .upsert_feed("Feed", "https://feed.example/rss", None)
            .await
            .unwrap();
        db.insert_articles(
            feed_id,
            &[NewArticle {
                guid: "a".into(),
                title: "A".into(),
                published: Some(1_700_000_000),
                ..NewArticle::default()
            }],
        )
        .await
        .unwrap();

        let (nav_tx, nav_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(16);
        let app = App::new(
            db,
            &config,
            Selection::feed("https://feed.example/rss"),
            nav_tx,
            event_tx.clone(),
        );
        Harness {
            app,
            nav_rx,
            event_tx,
            event_rx,
        }
    }

    #[tokio::test]
    async fn test_status_expires_after_3_seconds() {
        // Create app before pausing time to avoid DB connection timeout
        let mut h = harness(Config::default()).await;
        time::pause();
        h.app.set_status("Test message");

        time::advance(Duration::from_secs(2)).await;
        assert!(!h.app.clear_expired_status());
        assert!(h.app.status_message.is_some());

        time::advance(Duration::from_secs(2)).await;
        assert!(h.app.clear_expired_status());
        assert!(h.app.status_message.is_none());
    }

    #[tokio::test]
    async fn test_notifications_reach_status_line() {
        let mut h = harness(Config::default()).await;
        h.app.nav.hub().emit(&Notification::AllRead);

        let event = h.event_rx.recv().await.unwrap();
        h.app.handle_app_event(event);
        let (msg, _) = h.app.status_message.as_ref().unwrap();
        assert_eq!(msg.as_ref(), MSG_ALL_READ);
    }

    #[tokio::test]
    async fn test_read_state_notification_leaves_status_alone() {
        let mut h = harness(Config::default()).await;
        h.app
            .handle_app_event(AppEvent::Notified(Notification::ArticleReadStateChanged {
                article_id: 1,
            }));
        assert!(h.app.status_message.is_none());
    }

    #[tokio::test]
    async fn test_context_follows_view_state() {
        let mut h = harness(Config::default()).await;
        assert_eq!(h.app.context(), Context::Articles);
        h.app.nav.refresh_started();
        assert_eq!(h.app.context(), Context::Global);
    }

    #[tokio::test]
    async fn test_refresh_round_trip_reloads_page() {
        let mut h = harness(Config::default()).await;
        let tx = h.event_tx.clone();
        assert!(h.app.start_refresh(&tx));
        assert_eq!(h.app.nav.state(), ViewState::Refreshing);
        // A second refresh while one runs is ignored
        assert!(!h.app.start_refresh(&tx));

        let event = h.event_rx.recv().await.unwrap();
        assert!(matches!(event, AppEvent::RefreshComplete(Ok(()))));
        h.app.handle_app_event(event);
        assert!(h.app.refresh_handle.is_none());

        let loaded = h.nav_rx.recv().await.unwrap();
        h.app.nav.handle_event(loaded);
        assert_eq!(h.app.nav.state(), ViewState::ShowingArticles);
        assert_eq!(h.app.nav.page().len(), 1);
    }

    #[tokio::test]
    async fn test_offline_refresh_reports_and_reloads() {
        let mut h = harness(Config::default()).await;
        h.app.nav.refresh_started();
        h.app.handle_app_event(AppEvent::RefreshComplete(Err(QueryError::Offline(
            "down".into(),
        ))));

        let event = h.event_rx.recv().await.unwrap();
        h.app.handle_app_event(event);
        let (msg, _) = h.app.status_message.as_ref().unwrap();
        assert_eq!(msg.as_ref(), MSG_OFFLINE);
        assert_eq!(h.app.nav.in_flight(), 1);
    }

    #[tokio::test]
    async fn test_keybinding_overrides_from_config() {
        let config = Config {
            keybindings: HashMap::from([("mark_all_read".to_string(), "A".to_string())]),
            ..Config::default()
        };
        let h = harness(config).await;
        let action = h.app.keybindings.action_for_key(
            crossterm::event::KeyCode::Char('A'),
            crossterm::event::KeyModifiers::NONE,
            Context::Articles,
        );
        assert_eq!(action, Some(crate::keybindings::Action::MarkAllRead));
    }
}
