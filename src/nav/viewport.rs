//! Viewport geometry sensor.
//!
//! The navigation core never measures anything itself. It asks a
//! [`Viewport`] where an article's element sits relative to the visible
//! window, and how far the container is scrolled. [`StackedLayout`] is the
//! concrete sensor used by the terminal view and by tests: articles are
//! stacked top to bottom with known heights and a fixed gap between them.

use super::types::ArticleId;

/// Element bounds relative to the top of the visible container
/// (negative `top` means the element starts above the viewport).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub top: f64,
    pub bottom: f64,
}

impl BoundingBox {
    /// Any overlap with `[0, container_height]` counts as visible.
    pub fn intersects(&self, container_height: f64) -> bool {
        !(self.bottom < 0.0 || self.top > container_height)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollMetrics {
    pub current_top: f64,
    pub container_height: f64,
    pub content_height: f64,
}

/// Geometry sensor plus the single actuator the core needs: the scroll
/// position.
pub trait Viewport {
    /// Bounds of the article's rendered element, or `None` when the
    /// article has no element in the current layout.
    fn bounding_box(&self, id: ArticleId) -> Option<BoundingBox>;

    fn scroll_metrics(&self) -> ScrollMetrics;

    fn set_scroll_top(&mut self, top: f64);

    /// Offset of the element from the top of the scrolled content.
    fn offset_top(&self, id: ArticleId) -> Option<f64> {
        let current_top = self.scroll_metrics().current_top;
        self.bounding_box(id).map(|b| b.top + current_top)
    }

    fn is_visible(&self, id: ArticleId) -> bool {
        let container_height = self.scroll_metrics().container_height;
        self.bounding_box(id)
            .is_some_and(|b| b.intersects(container_height))
    }
}

// ============================================================================
// StackedLayout
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
struct Block {
    id: ArticleId,
    offset: f64,
    height: f64,
}

/// Vertical stack of fixed-height blocks inside a scrollable container.
///
/// Scroll position behaves like a DOM `scrollTop`: it is clamped to
/// `[0, content_height - container_height]`.
///
/// `gap` separates an article from whatever follows it. Navigation lands
/// an article `anchor_margin` below the top edge, so the gap must be
/// larger than that margin: otherwise the tail of the previous article
/// stays visible and remains the navigation reference.
#[derive(Debug, Clone, Default)]
pub struct StackedLayout {
    blocks: Vec<Block>,
    content_height: f64,
    container_height: f64,
    scroll_top: f64,
    gap: f64,
    /// The last pushed item was an article
    gap_pending: bool,
}

impl StackedLayout {
    /// Blocks stacked back to back.
    pub fn new(container_height: f64) -> Self {
        Self::with_gap(container_height, 0.0)
    }

    pub fn with_gap(container_height: f64, gap: f64) -> Self {
        Self {
            container_height: container_height.max(0.0),
            gap: if gap.is_finite() { gap.max(0.0) } else { 0.0 },
            ..Self::default()
        }
    }

    /// Append an article block and return its content offset.
    pub fn push_article(&mut self, id: ArticleId, height: f64) -> f64 {
        self.close_gap();
        let offset = self.content_height;
        let height = height.max(0.0);
        self.blocks.push(Block { id, offset, height });
        self.content_height += height;
        self.gap_pending = true;
        offset
    }

    /// Append non-article content (day headers).
    pub fn push_spacer(&mut self, height: f64) {
        self.close_gap();
        self.content_height += height.max(0.0);
    }

    pub fn gap(&self) -> f64 {
        self.gap
    }

    fn close_gap(&mut self) {
        if self.gap_pending {
            self.content_height += self.gap;
            self.gap_pending = false;
        }
    }

    pub fn set_container_height(&mut self, height: f64) {
        self.container_height = height.max(0.0);
        self.scroll_top = self.clamp_scroll(self.scroll_top);
    }

    /// True once the container has a measured, non-zero size.
    pub fn is_laid_out(&self) -> bool {
        self.container_height > 0.0
    }

    pub fn max_scroll(&self) -> f64 {
        (self.content_height - self.container_height).max(0.0)
    }

    pub fn article_ids(&self) -> impl Iterator<Item = ArticleId> + '_ {
        self.blocks.iter().map(|b| b.id)
    }

    fn clamp_scroll(&self, top: f64) -> f64 {
        if top.is_nan() {
            return 0.0;
        }
        top.clamp(0.0, self.max_scroll())
    }
}

impl Viewport for StackedLayout {
    fn bounding_box(&self, id: ArticleId) -> Option<BoundingBox> {
        self.blocks.iter().find(|b| b.id == id).map(|b| BoundingBox {
            top: b.offset - self.scroll_top,
            bottom: b.offset + b.height - self.scroll_top,
        })
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            current_top: self.scroll_top,
            container_height: self.container_height,
            content_height: self.content_height,
        }
    }

    fn set_scroll_top(&mut self, top: f64) {
        self.scroll_top = self.clamp_scroll(top);
    }
}
