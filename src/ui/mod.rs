//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Key event decoding and dispatch
//! - `render` - Screen layout dispatch
//! - `articles` - Day-grouped article list and its viewport layout
//! - `status` - Status bar widget

mod articles;
mod input;
mod loop_runner;
mod render;
mod status;

pub use articles::{build_layout, gap_rows, ROW_UNITS};
pub use loop_runner::{run, Action};
