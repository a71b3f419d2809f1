//! Render functions for the TUI.
//!
//! Splits the screen into a header, the article list and the status bar.

use crate::app::App;
use crate::nav::ViewState;
use ratatui::{
    layout::{Alignment, Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::{articles, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 40;
pub(super) const MIN_HEIGHT: u16 = 6;

/// Main render dispatch function.
///
/// Takes `&mut App` because drawing the article list (re)builds the
/// viewport layout the navigator measures against.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let [header, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(area);

    f.render_widget(Paragraph::new(header_line(app)), header);

    match app.nav.state() {
        ViewState::NoFeeds => {
            let msg = Paragraph::new(
                "No feeds to show.\n\nPass --feed <URL> or add feeds to the database.",
            )
            .alignment(Alignment::Center);
            f.render_widget(msg, body);
        }
        ViewState::Refreshing | ViewState::ShowingArticles => articles::render(f, app, body),
    }

    status::render(f, app, footer);
}

/// Selection label, page position and a refresh marker.
fn header_line(app: &App) -> Line<'static> {
    let nav = &app.nav;
    let mut spans = vec![Span::styled(
        nav.selection().label.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some(tag) = nav.selection().tag_id {
        spans.push(Span::raw(format!(" #{}", tag)));
    }
    if nav.state() != ViewState::NoFeeds {
        let prev = if nav.has_prev_page() { "‹ " } else { "  " };
        let next = if nav.has_next_page() { " ›" } else { "" };
        spans.push(Span::styled(
            format!("   {}page {}{}", prev, nav.page_index() + 1, next),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if nav.state() == ViewState::Refreshing {
        spans.push(Span::styled("   refreshing", Style::default().fg(Color::Yellow)));
    }
    Line::from(spans)
}
