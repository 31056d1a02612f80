//! State management module
//!
//! The countdown state, the controller that owns it, the random time shift
//! policy and the shared application state for the HTTP layer.

pub mod app_state;
pub mod controller;
pub mod time_shift;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use controller::{
    StartOutcome, StopOutcome, TickOutcome, TimerController, TimerSettings, TimerSnapshot,
};
pub use time_shift::{ShiftPolicy, TimeShifter};
pub use timer_state::{Controls, Phase, TimerState};
