//! Background tasks module
//!
//! The controller event loop that runs alongside the HTTP server.

pub mod event_loop;

// Re-export main types
pub use event_loop::{run_event_loop, spawn_controller, Command, ControllerHandle};
