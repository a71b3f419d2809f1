//! Input handling for the TUI.
//!
//! Decodes key events through the keybinding registry and feeds the
//! resulting actions to the navigator.

use crate::app::{App, AppEvent};
use crate::keybindings::{Action as KbAction, KeyPhase};
use crossterm::event::{KeyEvent, KeyEventKind};
use tokio::sync::mpsc;

use super::Action;

/// Main input dispatch function.
///
/// `reports_release` tells whether the terminal delivers key releases.
/// When it does not, the press of a release-triggered key stands in for
/// its release.
pub(super) fn handle_input(
    app: &mut App,
    key: KeyEvent,
    reports_release: bool,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    let Some(action) = app
        .keybindings
        .action_for_key(key.code, key.modifiers, app.context())
    else {
        return Action::Continue;
    };

    let fires = match (action.fires_on(), key.kind) {
        (KeyPhase::Press, KeyEventKind::Press | KeyEventKind::Repeat) => true,
        (KeyPhase::Release, KeyEventKind::Release) => true,
        (KeyPhase::Release, KeyEventKind::Press) => !reports_release,
        _ => false,
    };
    if !fires {
        return Action::Continue;
    }

    tracing::trace!(?action, kind = ?key.kind, "Key action");
    dispatch(app, action, event_tx)
}

fn dispatch(app: &mut App, action: KbAction, event_tx: &mpsc::Sender<AppEvent>) -> Action {
    match action {
        KbAction::Quit => return Action::Quit,
        KbAction::Refresh => {
            if !app.start_refresh(event_tx) {
                app.set_status("Refresh already running");
            }
        }
        other => {
            let Some(nav_action) = other.nav_action() else {
                return Action::Continue;
            };
            let handled = app.nav.handle_action(nav_action);
            match other {
                KbAction::NextPage if !handled => app.set_status("No later page"),
                KbAction::PrevPage if !handled => app.set_status("Already on the first page"),
                _ => {}
            }
        }
    }
    Action::Continue
}
