//! Output formatting for tunnel settings.
//!
//! - [`terminal`] - terminal output with colors

mod terminal;

pub use terminal::{applied_status, format_row, print_settings, render_settings};
