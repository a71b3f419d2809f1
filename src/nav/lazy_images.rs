//! Deferred images, activated once they come within a few screens of the
//! viewport.

use std::sync::Arc;

use super::animator::ScrollPhase;
use super::types::ArticleId;

/// How many viewport heights below the top are loaded ahead.
pub const DEFAULT_WINDOW_SCREENS: f64 = 5.0;

/// A deferred image element.
#[derive(Debug, Clone, PartialEq)]
pub struct LazyImage {
    pub article_id: ArticleId,
    /// Offset of the element from the top of the scrolled content.
    pub offset_top: f64,
    /// Source held back until activation.
    pub lazy_src: Arc<str>,
    /// Real source, set once activated.
    pub src: Option<Arc<str>>,
}

impl LazyImage {
    pub fn new(article_id: ArticleId, offset_top: f64, lazy_src: Arc<str>) -> Self {
        Self {
            article_id,
            offset_top,
            lazy_src,
            src: None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.src.is_none()
    }
}

/// Activates deferred images that fall inside an expanded window below the
/// viewport top.
#[derive(Debug, Clone)]
pub struct LazyImageLoader {
    images: Vec<LazyImage>,
    window_screens: f64,
}

impl Default for LazyImageLoader {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SCREENS)
    }
}

impl LazyImageLoader {
    pub fn new(window_screens: f64) -> Self {
        let window_screens = if window_screens.is_finite() && window_screens > 0.0 {
            window_screens
        } else {
            DEFAULT_WINDOW_SCREENS
        };
        Self {
            images: Vec::new(),
            window_screens,
        }
    }

    /// Replace the tracked elements, e.g. after a new page is laid out.
    pub fn register(&mut self, images: Vec<LazyImage>) {
        self.images = images;
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    pub fn images(&self) -> &[LazyImage] {
        &self.images
    }

    pub fn is_active(&self, article_id: ArticleId) -> bool {
        self.images
            .iter()
            .any(|img| img.article_id == article_id && !img.is_deferred())
    }

    /// Activate deferred images with `offset_top` in
    /// `[viewport_top, viewport_top + viewport_height * window_screens)`.
    ///
    /// Does nothing while a scroll animation runs. Returns the number of
    /// images activated by this call.
    pub fn scan(&mut self, phase: ScrollPhase, viewport_top: f64, viewport_height: f64) -> usize {
        if phase == ScrollPhase::Animating {
            return 0;
        }

        let window_end = viewport_top + viewport_height * self.window_screens;
        let mut activated = 0;
        for img in self.images.iter_mut().filter(|img| img.is_deferred()) {
            if img.offset_top >= viewport_top && img.offset_top < window_end {
                img.src = Some(Arc::clone(&img.lazy_src));
                activated += 1;
            }
        }

        if activated > 0 {
            tracing::debug!(activated, viewport_top, "Activated lazy images");
        }
        activated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn loader(offsets: &[f64]) -> LazyImageLoader {
        let mut loader = LazyImageLoader::default();
        loader.register(
            offsets
                .iter()
                .enumerate()
                .map(|(i, &off)| LazyImage::new(i as ArticleId, off, Arc::from("img.png")))
                .collect(),
        );
        loader
    }

    fn active_ids(loader: &LazyImageLoader) -> Vec<ArticleId> {
        loader
            .images()
            .iter()
            .filter(|img| !img.is_deferred())
            .map(|img| img.article_id)
            .collect()
    }

    #[test]
    fn test_scan_while_animating_is_noop() {
        let mut loader = loader(&[0.0, 10.0]);
        assert_eq!(loader.scan(ScrollPhase::Animating, 0.0, 100.0), 0);
        assert!(active_ids(&loader).is_empty());
    }

    #[test]
    fn test_scan_window_is_half_open() {
        // Window for top=100, height=100 is [100, 600)
        let mut loader = loader(&[50.0, 100.0, 599.0, 600.0, 1000.0]);
        assert_eq!(loader.scan(ScrollPhase::Idle, 100.0, 100.0), 2);
        assert_eq!(active_ids(&loader), vec![1, 2]);
    }

    #[test]
    fn test_activation_is_idempotent() {
        let mut loader = loader(&[0.0]);
        assert_eq!(loader.scan(ScrollPhase::Idle, 0.0, 10.0), 1);
        assert_eq!(loader.scan(ScrollPhase::Idle, 0.0, 10.0), 0);
        assert!(loader.is_active(0));
    }

    #[test]
    fn test_scrolled_past_images_stay_active() {
        let mut loader = loader(&[0.0, 900.0]);
        loader.scan(ScrollPhase::Idle, 0.0, 100.0);
        loader.scan(ScrollPhase::Idle, 800.0, 100.0);
        assert_eq!(active_ids(&loader), vec![0, 1]);
    }
}
