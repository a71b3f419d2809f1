//! Article list widget and the geometry behind it.
//!
//! The presented page is drawn as day headers followed by fixed-height
//! article blocks, each article followed by a few blank rows.
//! [`build_layout`] produces the matching [`StackedLayout`], so the
//! navigator measures exactly what is drawn.

use crate::app::App;
use crate::nav::{
    resolver, Article, DayGroup, LazyImageLoader, PresentedPage, StackedLayout, Viewport,
};
use chrono::Local;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// View units per terminal row. Scroll distances in the config are in
/// view units, so a 300 unit step moves 15 rows.
pub const ROW_UNITS: f64 = 20.0;

/// Rows taken by a day header.
const HEADER_ROWS: u16 = 1;

/// Blank rows after each article: the smallest gap taller than
/// `anchor_margin`, so an article scrolled into place pushes its
/// predecessor fully out of view.
pub fn gap_rows(anchor_margin: f64) -> u16 {
    let rows = (anchor_margin.max(0.0) / ROW_UNITS).floor();
    // `as` saturates, and NaN becomes 0
    (rows as u16).saturating_add(1)
}

/// Build the layout for `groups` inside a container `container_rows` tall.
pub fn build_layout(
    page: &PresentedPage,
    groups: &[DayGroup],
    article_rows: u16,
    gap_rows: u16,
    container_rows: u16,
) -> StackedLayout {
    let mut layout = StackedLayout::with_gap(
        f64::from(container_rows) * ROW_UNITS,
        f64::from(gap_rows) * ROW_UNITS,
    );
    for group in groups {
        layout.push_spacer(f64::from(HEADER_ROWS) * ROW_UNITS);
        for &index in &group.indices {
            if let Some(article) = page.articles().get(index) {
                layout.push_article(article.id, f64::from(article_rows) * ROW_UNITS);
            }
        }
    }
    layout
}

/// Render the day-grouped page, rebuilding the layout first when the
/// navigator waits for one.
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let groups = app.nav.page().organize_by_days(&Local);
    let container = f64::from(area.height) * ROW_UNITS;
    let gap = gap_rows(app.nav.config().anchor_margin);
    if app.nav.awaiting_layout() {
        let layout = build_layout(app.nav.page(), &groups, app.article_height, gap, area.height);
        *app.nav.viewport_mut() = layout;
    } else if app.nav.viewport().scroll_metrics().container_height != container {
        app.nav.viewport_mut().set_container_height(container);
    }

    let nav = &app.nav;
    let focused = resolver::first_visible(nav.page().articles(), nav.viewport())
        .map(|i| nav.page().articles()[i].id);
    let lines = page_lines(
        nav.page(),
        &groups,
        nav.images(),
        focused,
        app.article_height,
        gap,
        area.width as usize,
    );

    let top = nav.viewport().scroll_metrics().current_top;
    let row = (top / ROW_UNITS).round().clamp(0.0, f64::from(u16::MAX)) as u16;
    f.render_widget(Paragraph::new(lines).scroll((row, 0)), area);
}

/// Every row of the page, top to bottom.
fn page_lines(
    page: &PresentedPage,
    groups: &[DayGroup],
    images: &LazyImageLoader,
    focused: Option<i64>,
    article_rows: u16,
    gap_rows: u16,
    width: usize,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut after_article = false;
    for group in groups {
        if std::mem::take(&mut after_article) {
            lines.extend((0..gap_rows).map(|_| Line::default()));
        }
        let label = match group.day {
            Some(day) => day.format("%A, %-d %B %Y").to_string(),
            None => "Undated".to_string(),
        };
        lines.push(Line::from(Span::styled(
            format!("── {} ──", label),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));

        for &index in &group.indices {
            if let Some(article) = page.articles().get(index) {
                if std::mem::take(&mut after_article) {
                    lines.extend((0..gap_rows).map(|_| Line::default()));
                }
                let is_focused = focused == Some(article.id);
                lines.extend(article_block(article, images, is_focused, article_rows, width));
                after_article = true;
            }
        }
    }
    lines
}

fn article_block(
    article: &Article,
    images: &LazyImageLoader,
    focused: bool,
    rows: u16,
    width: usize,
) -> Vec<Line<'static>> {
    let marker = match (focused, article.read) {
        (true, _) => "▶",
        (false, false) => "●",
        (false, true) => " ",
    };
    let title_style = if article.read {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let dim = Style::default().fg(Color::DarkGray);
    let text_width = width.saturating_sub(2);

    let mut block = vec![Line::from(vec![
        Span::raw(format!("{} ", marker)),
        Span::styled(truncate(&article.title, text_width).into_owned(), title_style),
    ])];

    if let Some(url) = &article.url {
        block.push(Line::from(Span::styled(
            format!("  {}", truncate(url, text_width)),
            dim,
        )));
    }

    if let Some(src) = &article.image {
        let text = if images.is_active(article.id) {
            format!("  [image: {}]", truncate(src, text_width.saturating_sub(9)))
        } else {
            "  [image]".to_string()
        };
        block.push(Line::from(Span::styled(text, Style::default().fg(Color::Magenta))));
    }

    // Blocks are exactly `rows` tall; the layout depends on it
    let rows = rows as usize;
    block.truncate(rows);
    while block.len() < rows {
        block.push(Line::default());
    }
    block
}

/// Truncate to `max_width` columns, marking the cut with "...".
fn truncate(s: &str, max_width: usize) -> Cow<'_, str> {
    if s.width() <= max_width {
        return Cow::Borrowed(s);
    }
    let budget = max_width.saturating_sub(3);
    let mut used = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    if max_width >= 3 {
        out.push_str("...");
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::PAGE_SIZE;
    use std::sync::Arc;

    fn article(id: i64, published: Option<i64>, image: bool) -> Article {
        Article {
            id,
            feed_id: 1,
            title: Arc::from(format!("Article {id}")),
            url: Some(Arc::from(format!("https://example.com/{id}"))),
            published,
            image: image.then(|| Arc::from(format!("https://img.example/{id}.png"))),
            read: false,
        }
    }

    fn sample_page() -> PresentedPage {
        let day = 86_400;
        PresentedPage::new(vec![
            article(1, Some(1_700_000_000), true),
            article(2, Some(1_700_000_000 - 3 * day), false),
            article(3, None, true),
        ])
    }

    #[test]
    fn test_layout_matches_rendered_rows() {
        let page = sample_page();
        let groups = page.organize_by_days(&Local);
        let layout = build_layout(&page, &groups, 6, 2, 20);
        let lines = page_lines(&page, &groups, &LazyImageLoader::default(), None, 6, 2, 80);

        let rows = layout.scroll_metrics().content_height / ROW_UNITS;
        assert_eq!(rows as usize, lines.len());
        assert_eq!(layout.article_ids().count(), 3);

        // Every article starts on the row the layout puts it at
        for article in page.articles() {
            let row = (layout.offset_top(article.id).unwrap() / ROW_UNITS) as usize;
            assert!(lines[row].to_string().contains(&*article.title));
        }
    }

    #[test]
    fn test_gap_is_taller_than_anchor_margin() {
        assert_eq!(gap_rows(20.0), 2);
        assert_eq!(gap_rows(0.0), 1);
        assert_eq!(gap_rows(45.0), 3);
        assert_eq!(gap_rows(f64::NAN), 1);
        for margin in [0.0, 19.9, 20.0, 60.0, 123.0] {
            assert!(f64::from(gap_rows(margin)) * ROW_UNITS > margin);
        }
    }

    #[test]
    fn test_first_article_sits_below_its_header() {
        let page = sample_page();
        let groups = page.organize_by_days(&Local);
        let layout = build_layout(&page, &groups, 8, 2, 20);
        let first = page.articles()[0].id;
        assert_eq!(layout.offset_top(first), Some(ROW_UNITS));
    }

    #[test]
    fn test_block_is_fixed_height() {
        let a = article(1, None, true);
        let images = LazyImageLoader::default();
        assert_eq!(article_block(&a, &images, false, 8, 40).len(), 8);
        assert_eq!(article_block(&a, &images, false, 2, 40).len(), 2);
    }

    #[test]
    fn test_deferred_image_is_placeholder() {
        let a = article(7, None, true);
        let block = article_block(&a, &LazyImageLoader::default(), false, 4, 80);
        assert_eq!(block[2].to_string(), "  [image]");
    }

    #[test]
    fn test_full_page_fits_u16_rows() {
        let page = PresentedPage::new(
            (0..PAGE_SIZE as i64)
                .map(|id| article(id, Some(1_700_000_000 - id * 86_400), false))
                .collect(),
        );
        let groups = page.organize_by_days(&Local);
        let layout = build_layout(&page, &groups, 40, 2, 10);
        assert!(layout.scroll_metrics().content_height / ROW_UNITS < f64::from(u16::MAX));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 8), "a lon...");
        assert_eq!(truncate("你好世界", 7), "你好...");
        assert_eq!(truncate("abc", 0), "");
    }
}
