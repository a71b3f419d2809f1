//! glance: keyboard-driven reading navigation over a paginated article list.
//!
//! - [`nav`]: the navigation core (pagination, read state, target
//!   resolution, scroll animation, lazy images)
//! - [`storage`]: SQLite-backed article source for the core
//! - [`config`], [`keybindings`]: user configuration
//! - [`app`], [`ui`]: the terminal front end

pub mod app;
pub mod config;
pub mod keybindings;
pub mod nav;
pub mod storage;
pub mod ui;
