use crate::app::App;
use crate::keybindings::{Action, Context};
use crate::nav::ViewState;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(status_text(app)).style(style), area);
}

/// Status message if one is set, otherwise hints for the current state.
/// Static hints and the borrowed message avoid allocation.
fn status_text(app: &App) -> Cow<'_, str> {
    if let Some((msg, _)) = &app.status_message {
        return Cow::Borrowed(msg.as_ref());
    }
    match app.nav.state() {
        ViewState::NoFeeds => Cow::Borrowed("No feeds selected | [r]efresh [q]uit"),
        ViewState::Refreshing => Cow::Borrowed("Refreshing... | [q]uit"),
        ViewState::ShowingArticles => Cow::Owned(article_hints(app)),
    }
}

/// Unread counters of the page plus the read-marking keys.
fn article_hints(app: &App) -> String {
    let counters = app.nav.counters();
    let mut parts = vec![format!("{} unread here", app.nav.page().unread_count())];
    if counters.unread_before_page > 0 {
        parts.push(format!("{} on earlier pages", counters.unread_before_page));
    }
    if counters.unread_after_page > 0 {
        parts.push(format!("{} on later pages", counters.unread_after_page));
    }

    let keys: Vec<String> = app
        .keybindings
        .all_bindings()
        .into_iter()
        .filter(|(ctx, _, action, _)| {
            *ctx == Context::Articles
                && matches!(action, Action::MarkReadAndAdvance | Action::MarkAllRead)
        })
        .map(|(_, key, _, desc)| format!("[{}] {}", key, desc.to_lowercase()))
        .collect();

    format!("{} | {}", parts.join(", "), keys.join(" "))
}
