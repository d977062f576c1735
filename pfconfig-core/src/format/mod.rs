//! Field diff output formatters.

pub mod text;

pub use text::{format_summary, format_text};
