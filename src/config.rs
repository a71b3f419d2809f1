//! Configuration file parser for ~/.config/glance/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos.
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::nav::{AnimationConfig, NavConfig};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Distance of one Up/Down scroll, in view units.
    pub scroll_step: f64,

    /// Gap left above an article scrolled into place.
    pub anchor_margin: f64,

    /// Deferred images within this many viewport heights are loaded.
    pub lazy_load_screens: f64,

    /// Scroll animation tick in milliseconds.
    pub tick_interval_ms: u64,

    /// Each tick closes 1/easing_divisor of the remaining distance.
    pub easing_divisor: f64,

    /// Steps smaller than this end the animation.
    pub snap_epsilon: f64,

    /// Terminal rows per article block.
    pub article_height: u16,

    /// Custom keybinding overrides. Keys are action names, values are key strings.
    pub keybindings: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let nav = NavConfig::default();
        Self {
            scroll_step: nav.scroll_step,
            anchor_margin: nav.anchor_margin,
            lazy_load_screens: nav.lazy_load_screens,
            tick_interval_ms: nav.animation.tick_interval.as_millis() as u64,
            easing_divisor: nav.animation.easing_divisor,
            snap_epsilon: nav.animation.snap_epsilon,
            article_height: 8,
            keybindings: HashMap::new(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "scroll_step",
        "anchor_margin",
        "lazy_load_screens",
        "tick_interval_ms",
        "easing_divisor",
        "snap_epsilon",
        "article_height",
        "keybindings",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            scroll_step = config.scroll_step,
            tick_interval_ms = config.tick_interval_ms,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Navigation tunables; nonsensical values fall back to the defaults.
    pub fn nav_config(&self) -> NavConfig {
        let defaults = NavConfig::default();
        let positive = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                tracing::warn!(value, fallback, "Invalid navigation setting, using default");
                fallback
            }
        };

        NavConfig {
            scroll_step: positive(self.scroll_step, defaults.scroll_step),
            anchor_margin: if self.anchor_margin.is_finite() && self.anchor_margin >= 0.0 {
                self.anchor_margin
            } else {
                defaults.anchor_margin
            },
            lazy_load_screens: positive(self.lazy_load_screens, defaults.lazy_load_screens),
            animation: AnimationConfig {
                tick_interval: Duration::from_millis(self.tick_interval_ms),
                easing_divisor: self.easing_divisor,
                snap_epsilon: self.snap_epsilon,
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("glance_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scroll_step, 300.0);
        assert_eq!(config.anchor_margin, 20.0);
        assert_eq!(config.lazy_load_screens, 5.0);
        assert_eq!(config.tick_interval_ms, 17);
        assert_eq!(config.easing_divisor, 8.0);
        assert_eq!(config.snap_epsilon, 0.1);
        assert_eq!(config.article_height, 8);
        assert!(config.keybindings.is_empty());
        assert_eq!(config.nav_config(), NavConfig::default());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/glance_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.scroll_step, 300.0);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let path = write_config("whitespace", "   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.tick_interval_ms, 17);
        cleanup(&path);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let path = write_config("partial", "scroll_step = 120.0\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.scroll_step, 120.0);
        assert_eq!(config.easing_divisor, 8.0);
        cleanup(&path);
    }

    #[test]
    fn test_full_config() {
        let content = r#"
scroll_step = 10.0
anchor_margin = 1.0
lazy_load_screens = 3.0
tick_interval_ms = 30
easing_divisor = 4.0
snap_epsilon = 0.5
article_height = 6

[keybindings]
quit = "Ctrl+q"
mark_all_read = "A"
"#;
        let path = write_config("full", content);
        let config = Config::load(&path).unwrap();
        let nav = config.nav_config();
        assert_eq!(nav.scroll_step, 10.0);
        assert_eq!(nav.anchor_margin, 1.0);
        assert_eq!(nav.lazy_load_screens, 3.0);
        assert_eq!(nav.animation.tick_interval, Duration::from_millis(30));
        assert_eq!(nav.animation.easing_divisor, 4.0);
        assert_eq!(nav.animation.snap_epsilon, 0.5);
        assert_eq!(config.article_height, 6);
        assert_eq!(
            config.keybindings.get("mark_all_read").map(String::as_str),
            Some("A")
        );
        cleanup(&path);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let path = write_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        cleanup(&path);
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let path = write_config("unknown", "scroll_step = 50.0\ntheme = \"dark\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.scroll_step, 50.0);
        cleanup(&path);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let path = write_config("wrongtype", "article_height = \"tall\"\n");
        assert!(Config::load(&path).is_err());
        cleanup(&path);
    }

    #[test]
    fn test_too_large_file_rejected() {
        let path = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        cleanup(&path);
    }

    #[test]
    fn test_nonsensical_values_fall_back() {
        let config = Config {
            scroll_step: -5.0,
            anchor_margin: f64::NAN,
            lazy_load_screens: 0.0,
            ..Config::default()
        };
        let nav = config.nav_config();
        assert_eq!(nav.scroll_step, 300.0);
        assert_eq!(nav.anchor_margin, 20.0);
        assert_eq!(nav.lazy_load_screens, 5.0);
    }
}
