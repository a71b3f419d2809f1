//! Keybinding registry: maps key events to actions, with config overrides.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

use crate::nav::NavAction;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    Refresh,
    ScrollUp,
    ScrollDown,
    PreviousArticle,
    NextArticle,
    MarkReadAndAdvance,
    ContextGesture,
    MarkAllRead,
    PrevPage,
    NextPage,
}

/// Which edge of a key stroke triggers an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPhase {
    Press,
    Release,
}

impl Action {
    /// Human-readable description for the help line.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit application",
            Self::Refresh => "Refresh articles",
            Self::ScrollUp => "Scroll up",
            Self::ScrollDown => "Scroll down",
            Self::PreviousArticle => "Previous article",
            Self::NextArticle => "Next article",
            Self::MarkReadAndAdvance => "Mark read, go to next unread",
            Self::ContextGesture => "Mark read, go to next unread",
            Self::MarkAllRead => "Mark all as read",
            Self::PrevPage => "Previous page",
            Self::NextPage => "Next page",
        }
    }

    /// The navigation input this action feeds, if any.
    pub fn nav_action(self) -> Option<NavAction> {
        match self {
            Self::Quit | Self::Refresh => None,
            Self::ScrollUp => Some(NavAction::ScrollUp),
            Self::ScrollDown => Some(NavAction::ScrollDown),
            Self::PreviousArticle => Some(NavAction::PreviousArticle),
            Self::NextArticle => Some(NavAction::NextArticle),
            Self::MarkReadAndAdvance => Some(NavAction::MarkReadAndAdvance),
            Self::ContextGesture => Some(NavAction::ContextGesture),
            Self::MarkAllRead => Some(NavAction::MarkAllRead),
            Self::PrevPage => Some(NavAction::PrevPage),
            Self::NextPage => Some(NavAction::NextPage),
        }
    }

    /// Scrolling repeats while a key is held, so it fires on press; article
    /// actions fire once, on release.
    pub fn fires_on(self) -> KeyPhase {
        match self {
            Self::Quit | Self::Refresh | Self::ScrollUp | Self::ScrollDown => KeyPhase::Press,
            _ => KeyPhase::Release,
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context: determines which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    /// Always active.
    Global,
    /// Active while articles are shown.
    Articles,
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

/// Parse a key string from config into a KeySpec.
///
/// Supported formats:
/// - Single char: "q", "j", "/"
/// - Named keys: "Enter", "Esc", "Space", "Up", "PageDown", ...
/// - Modifier combos: "Ctrl+d"
/// - Function keys: "F1" through "F12"
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let rest = rest.trim();
        if rest.chars().count() == 1 {
            let c = rest.chars().next()?;
            return Some(KeySpec::ctrl(c));
        }
        return None;
    }

    // Named keys (case-insensitive)
    match s.to_lowercase().as_str() {
        "enter" | "return" => return Some(KeySpec::plain(KeyCode::Enter)),
        "esc" | "escape" => return Some(KeySpec::plain(KeyCode::Esc)),
        "tab" => return Some(KeySpec::plain(KeyCode::Tab)),
        "up" => return Some(KeySpec::plain(KeyCode::Up)),
        "down" => return Some(KeySpec::plain(KeyCode::Down)),
        "left" => return Some(KeySpec::plain(KeyCode::Left)),
        "right" => return Some(KeySpec::plain(KeyCode::Right)),
        "pageup" | "pgup" => return Some(KeySpec::plain(KeyCode::PageUp)),
        "pagedown" | "pgdn" => return Some(KeySpec::plain(KeyCode::PageDown)),
        "home" => return Some(KeySpec::plain(KeyCode::Home)),
        "end" => return Some(KeySpec::plain(KeyCode::End)),
        "backspace" => return Some(KeySpec::plain(KeyCode::Backspace)),
        "space" => return Some(KeySpec::plain(KeyCode::Char(' '))),
        _ => {}
    }

    // Function keys
    if let Some(n) = s.strip_prefix(['F', 'f']).and_then(|n| n.parse::<u8>().ok()) {
        if (1..=12).contains(&n) {
            return Some(KeySpec::plain(KeyCode::F(n)));
        }
        return None;
    }

    // Single character
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeySpec::plain(KeyCode::Char(c))),
        _ => None,
    }
}

/// Format a KeySpec as a human-readable string for the help line.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let key_name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, key_name)
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Registry of keybindings, supporting default bindings and config overrides.
///
/// The same key can map to different actions in different contexts;
/// lookups fall back to `Global`.
pub struct KeybindingRegistry {
    /// Primary lookup: (Context, KeySpec) -> Action
    lookup: HashMap<(Context, KeySpec), Action>,
    /// All bindings, in registration order, for the help line
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        registry.register_defaults();
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    fn register_defaults(&mut self) {
        use Action::*;

        // === Global ===
        self.bind(Context::Global, KeySpec::plain(KeyCode::Char('q')), Quit);
        self.bind(Context::Global, KeySpec::plain(KeyCode::Esc), Quit);
        self.bind(Context::Global, KeySpec::plain(KeyCode::Char('r')), Refresh);

        // === Articles ===
        let articles = [
            (KeyCode::Up, ScrollUp),
            (KeyCode::Char('k'), ScrollUp),
            (KeyCode::Down, ScrollDown),
            (KeyCode::Char('j'), ScrollDown),
            (KeyCode::Left, PreviousArticle),
            (KeyCode::Char('h'), PreviousArticle),
            (KeyCode::Right, NextArticle),
            (KeyCode::Char('l'), NextArticle),
            (KeyCode::Char(' '), MarkReadAndAdvance),
            (KeyCode::Char('m'), ContextGesture),
            (KeyCode::Enter, MarkAllRead),
            (KeyCode::PageUp, PrevPage),
            (KeyCode::Char('p'), PrevPage),
            (KeyCode::PageDown, NextPage),
            (KeyCode::Char('n'), NextPage),
        ];
        for (code, action) in articles {
            self.bind(Context::Articles, KeySpec::plain(code), action);
        }
    }

    /// Apply user overrides from the config keybindings map.
    ///
    /// Keys in the map are action names (e.g., "quit", "next_article").
    /// Values are key strings (e.g., "q", "Ctrl+d", "F5"). An override
    /// replaces every default key of the action.
    ///
    /// Returns a list of warnings for unrecognized action names or unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };

            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            let mut contexts: Vec<Context> = self
                .bindings
                .iter()
                .filter(|(_, _, a)| *a == action)
                .map(|(c, _, _)| *c)
                .collect();
            contexts.dedup();

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);

            for ctx in contexts {
                self.bind(ctx, key, action);
            }

            tracing::info!(
                action = %action_name,
                key = %key_str,
                "Applied keybinding override"
            );
        }

        warnings
    }

    /// Look up the action for a given key in a given context.
    ///
    /// Tries the specific context first, then falls back to Global.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let key = KeySpec::new(code, modifiers);

        if let Some(&action) = self.lookup.get(&(context, key)) {
            return Some(action);
        }

        if context != Context::Global {
            if let Some(&action) = self.lookup.get(&(Context::Global, key)) {
                return Some(action);
            }
        }

        None
    }

    /// Get all bindings for the help line.
    ///
    /// Returns (context, key_display_string, action, description) tuples.
    pub fn all_bindings(&self) -> Vec<(Context, String, Action, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, format_key(key), *action, action.describe()))
            .collect()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an action name string (from config) into an Action enum.
fn parse_action_name(name: &str) -> Option<Action> {
    match name.to_lowercase().as_str() {
        "quit" => Some(Action::Quit),
        "refresh" => Some(Action::Refresh),
        "scroll_up" | "scrollup" => Some(Action::ScrollUp),
        "scroll_down" | "scrolldown" => Some(Action::ScrollDown),
        "previous_article" | "prev_article" | "prev" => Some(Action::PreviousArticle),
        "next_article" | "next" => Some(Action::NextArticle),
        "mark_read_and_advance" | "mark_read" | "advance" => Some(Action::MarkReadAndAdvance),
        "context_gesture" | "context_menu" | "contextmenu" => Some(Action::ContextGesture),
        "mark_all_read" | "markallread" => Some(Action::MarkAllRead),
        "prev_page" | "previous_page" | "page_up" | "pageup" => Some(Action::PrevPage),
        "next_page" | "page_down" | "pagedown" => Some(Action::NextPage),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
