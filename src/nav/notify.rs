//! Typed notification broadcast.
//!
//! Subscribers register a callback and receive every [`Notification`] until
//! their [`Subscription`] guard is dropped. Handlers run outside the
//! registry lock, so a handler may subscribe or unsubscribe re-entrantly.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use super::types::ArticleId;

pub const MSG_ALL_READ: &str = "Everything read here.";
pub const MSG_OFFLINE: &str =
    "It looks like there is no internet connection. Only old articles are shown.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// An article's read flag changed.
    ArticleReadStateChanged { article_id: ArticleId },
    /// Nothing unread remains in the selection.
    AllRead,
    /// The page query could not reach its source; cached content is shown.
    Offline,
}

impl Notification {
    /// User-facing text, or `None` for internal signals.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Notification::ArticleReadStateChanged { .. } => None,
            Notification::AllRead => Some(MSG_ALL_READ),
            Notification::Offline => Some(MSG_OFFLINE),
        }
    }
}

type Handler = Arc<dyn Fn(&Notification) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
}

/// Cloneable handle to a shared subscriber registry.
#[derive(Clone, Default)]
pub struct NotificationHub {
    inner: Arc<Mutex<Registry>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. It stays registered while the returned guard
    /// lives.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.push((id, Arc::new(handler)));

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    pub fn emit(&self, notification: &Notification) {
        let handlers: Vec<Handler> = lock(&self.inner)
            .handlers
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();

        tracing::debug!(?notification, subscribers = handlers.len(), "Notify");
        for handler in handlers {
            handler(notification);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).handlers.len()
    }
}

/// Registry lock that survives a panicking handler on another thread.
fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Deregisters its handler on drop.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).handlers.retain(|(id, _)| *id != self.id);
        }
    }
}
