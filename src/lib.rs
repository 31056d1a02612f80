//! Bell Timer - A state-managed HTTP countdown timer
//!
//! A countdown is started and stopped over HTTP. Each second the remaining
//! time is rendered as MM:SS; at zero an alert sounds, falling back to
//! vibration, a visual flash and retries when playback is refused. A wake lock
//! keeps the display awake while the countdown runs, and a random time shift
//! occasionally moves the remaining time.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use state::{AppState, TimerController};
pub use tasks::{spawn_controller, ControllerHandle};
pub use utils::signals::shutdown_signal;
