//! Utility functions module
//!
//! Display formatting, duration input parsing and signal handling.

pub mod display;
pub mod duration;
pub mod signals;

// Re-export main functions
pub use display::{render, DisplayFields};
pub use duration::{parse_minutes, resolve_seconds};
pub use signals::shutdown_signal;
