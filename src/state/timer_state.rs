//! Timer state structure and management

use serde::{Deserialize, Serialize};

/// Countdown phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
}

/// Enabled state of the start and stop controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub start_enabled: bool,
    pub stop_enabled: bool,
}

/// Timer state for tracking the countdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    phase: Phase,
    remaining_seconds: u64,
}

impl TimerState {
    /// Create a new idle timer state
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            remaining_seconds: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    /// Start is enabled exactly when stop is not.
    pub fn controls(&self) -> Controls {
        let running = self.is_running();
        Controls {
            start_enabled: !running,
            stop_enabled: running,
        }
    }

    /// Enter the running phase with `seconds` on the clock
    pub fn begin(&mut self, seconds: u64) {
        self.phase = Phase::Running;
        self.remaining_seconds = seconds;
    }

    /// Return to idle, keeping the remaining time on display
    pub fn halt(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Take one second off. Returns the new remaining time.
    pub fn decrement(&mut self) -> u64 {
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        self.remaining_seconds
    }

    pub fn set_remaining(&mut self, seconds: u64) {
        self.remaining_seconds = seconds;
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exactly_one_control(state: &TimerState) -> bool {
        let controls = state.controls();
        controls.start_enabled != controls.stop_enabled
    }

    #[test]
    fn starts_idle_with_start_enabled() {
        let state = TimerState::new();
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.remaining_seconds(), 0);
        assert_eq!(
            state.controls(),
            Controls {
                start_enabled: true,
                stop_enabled: false
            }
        );
    }

    #[test]
    fn controls_follow_the_phase() {
        let mut state = TimerState::new();
        assert!(exactly_one_control(&state));

        state.begin(60);
        assert!(state.controls().stop_enabled);
        assert!(exactly_one_control(&state));

        state.halt();
        assert!(state.controls().start_enabled);
        assert!(exactly_one_control(&state));
        assert_eq!(state.remaining_seconds(), 60);
    }

    #[test]
    fn decrement_saturates_at_zero() {
        let mut state = TimerState::new();
        state.begin(1);
        assert_eq!(state.decrement(), 0);
        assert_eq!(state.decrement(), 0);
    }
}
