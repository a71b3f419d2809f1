//! Main event loop for the TUI.
//!
//! This module contains the core event loop that multiplexes terminal input,
//! navigation results, front-end events and the animation tick.

use crate::app::{App, AppEvent};
use crate::nav::NavEvent;
use anyhow::Result;
use crossterm::{
    event::{
        Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use super::input::handle_input;
use super::render::render;

/// Result of handling a key event.
///
/// Returned by input handlers to signal whether the application should
/// continue running or terminate gracefully.
pub enum Action {
    /// Continue the event loop and process more events.
    Continue,
    /// Exit the application and restore the terminal.
    Quit,
}

/// Runs the TUI application event loop.
///
/// Uses `tokio::select!` to multiplex:
/// - **Terminal input**: key events from crossterm's async event stream
/// - **Navigation results**: page loads and read-state writes (`NavEvent`)
/// - **Front-end events**: refresh completion, notifications (`AppEvent`)
/// - **Animation tick**: only polled while the navigator animates
/// - **Housekeeping tick**: 250ms timer for status expiry
///
/// # Panic Safety
///
/// Installs a panic hook that restores terminal state before unwinding,
/// ensuring the terminal is not left in raw mode on panic.
pub async fn run(
    app: &mut App,
    event_tx: mpsc::Sender<AppEvent>,
    mut event_rx: mpsc::Receiver<AppEvent>,
    mut nav_rx: mpsc::Receiver<NavEvent>,
) -> Result<()> {
    // Install panic hook BEFORE setting up terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let (mut terminal, reports_release) = setup_terminal()?;
    let mut event_stream = crossterm::event::EventStream::new();

    let mut housekeeping = tokio::time::interval(Duration::from_millis(250));
    let mut animation = tokio::time::interval(app.nav.animation_config().tick_interval);
    animation.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // Signal handlers for graceful shutdown (Unix only)
    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    loop {
        // Only render when state has changed
        if app.needs_redraw {
            terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;

            // The frame just drawn built the layout for a new page
            if app.nav.awaiting_layout() && app.nav.layout_ready() {
                app.needs_redraw = true;
            }
        }

        // Drain pending results before handling more input, so background
        // results are not starved by rapid key repeat
        while let Ok(event) = nav_rx.try_recv() {
            app.needs_redraw = true;
            app.nav.handle_event(event);
        }
        while let Ok(event) = event_rx.try_recv() {
            app.needs_redraw = true;
            app.handle_app_event(event);
        }

        let animating = app.nav.is_animating();

        // Platform-specific signal futures
        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = std::future::pending::<Option<()>>();

        tokio::select! {
            biased;  // Process in order listed for predictable behavior

            // Signal handlers for graceful shutdown (highest priority)
            _ = sigterm_fut => {
                tracing::info!("Received SIGTERM, shutting down gracefully");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down gracefully");
                break;
            }

            // Terminal input events
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        app.needs_redraw = true;
                        if let Action::Quit = handle_input(app, key, reports_release, &event_tx) {
                            break;
                        }
                    }
                    Some(Ok(Event::Resize(_, _))) => app.needs_redraw = true,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Terminal event stream error");
                    }
                    None => break,
                }
            }

            Some(event) = nav_rx.recv() => {
                app.needs_redraw = true;
                app.nav.handle_event(event);
            }

            Some(event) = event_rx.recv() => {
                app.needs_redraw = true;
                app.handle_app_event(event);
            }

            _ = animation.tick(), if animating => {
                app.nav.tick();
                app.needs_redraw = true;
            }

            _ = housekeeping.tick() => {
                if app.clear_expired_status() {
                    app.needs_redraw = true;
                }
            }
        }
    }

    restore_terminal(terminal, reports_release)?;
    Ok(())
}

/// Set up the terminal for TUI rendering.
///
/// Returns whether key release events were enabled.
fn setup_terminal() -> Result<(Terminal<CrosstermBackend<Stdout>>, bool)> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let reports_release = matches!(supports_keyboard_enhancement(), Ok(true));
    if reports_release {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    tracing::debug!(reports_release, "Terminal ready");

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok((terminal, reports_release))
}

/// Restore terminal to normal state.
fn restore_terminal(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    reports_release: bool,
) -> Result<()> {
    if reports_release {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
