//! Reading-navigation core.
//!
//! Operates on one materialized page of articles supplied by an
//! [`ArticleQuery`] collaborator: tracks read state, resolves navigation
//! targets against a [`Viewport`] sensor, animates the scroll position and
//! reveals deferred images near the viewport.
//!
//! Component overview (leaf first):
//! - [`viewport`]: geometry sensor trait and the [`StackedLayout`] sensor
//! - [`resolver`]: first visible / neighbour / next unread lookups
//! - [`animator`]: eased, tick-driven scroll animation
//! - [`lazy_images`]: deferred image activation
//! - [`read_state`]: optimistic read marking
//! - [`pagination`]: page index, boundaries and the page cache
//! - [`orchestrator`]: [`Navigator`], which wires input to all of the above

pub mod animator;
pub mod lazy_images;
pub mod notify;
pub mod orchestrator;
pub mod page;
pub mod pagination;
pub mod read_state;
pub mod resolver;
pub mod source;
pub(crate) mod task;
pub mod types;
pub mod viewport;

pub use animator::{AnimationConfig, ScrollAnimator, ScrollPhase, Tick};
pub use lazy_images::{LazyImage, LazyImageLoader};
pub use notify::{Notification, NotificationHub, Subscription, MSG_ALL_READ, MSG_OFFLINE};
pub use orchestrator::{NavConfig, NavEvent, Navigator, ScrollRequest};
pub use page::{DayGroup, PresentedPage, PAGE_SIZE};
pub use pagination::{PageCache, PageLoad, PaginationController};
pub use read_state::{ReadAck, ReadCounts, ReadStateTracker};
pub use resolver::Direction;
pub use source::{ArticleQuery, ReadStateStore};
pub use types::{
    Article, ArticleId, NavAction, PageCounters, PageQueryResult, PageRange, QueryError,
    Selection, ViewState,
};
pub use viewport::{BoundingBox, ScrollMetrics, StackedLayout, Viewport};
