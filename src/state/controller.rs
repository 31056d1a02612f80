//! The timer controller
//!
//! Owns every piece of mutable countdown state and reacts to start, stop,
//! tick, visibility and interaction events. Scheduling of the one-second tick
//! is left to the event loop, which drives [`TimerController::tick`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    time_shift::{Shift, TimeShifter},
    timer_state::{Phase, TimerState},
};
use crate::{
    error::StartError,
    services::{alert::AlertOutcome, AlertPlayer, WakeLockManager},
    utils::{resolve_seconds, DisplayFields},
};

/// Countdown behaviour settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSettings {
    /// Used when the minutes input is missing or invalid.
    pub default_seconds: u64,
    /// Start even when the audio unlock handshake fails.
    pub allow_silent_start: bool,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            default_seconds: 5 * 60,
            allow_silent_start: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { seconds: u64, defaulted: bool },
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped { remaining: u64 },
    AlreadyIdle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick arrived after the countdown ended and was ignored.
    Idle,
    Running { remaining: u64, shift: Option<Shift> },
    Completed { alert: AlertOutcome },
}

/// Serializable view of the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub running: bool,
    pub remaining_seconds: u64,
    pub minutes: String,
    pub seconds: String,
    pub display: String,
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub wake_lock_held: bool,
    pub alert_flashing: bool,
    pub alert_retry_pending: bool,
    pub alerts_fired: u64,
    pub last_error: Option<String>,
}

pub struct TimerController {
    settings: TimerSettings,
    state: TimerState,
    display: DisplayFields,
    alert: AlertPlayer,
    wake_lock: WakeLockManager,
    shifter: TimeShifter,
    alerts_fired: u64,
    seen_interaction: bool,
    last_error: Option<String>,
}

impl TimerController {
    pub fn new(
        settings: TimerSettings,
        alert: AlertPlayer,
        wake_lock: WakeLockManager,
        shifter: TimeShifter,
    ) -> Self {
        Self {
            settings,
            state: TimerState::new(),
            display: DisplayFields::new(),
            alert,
            wake_lock,
            shifter,
            alerts_fired: 0,
            seen_interaction: false,
            last_error: None,
        }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn display(&self) -> &DisplayFields {
        &self.display
    }

    pub fn alert(&self) -> &AlertPlayer {
        &self.alert
    }

    pub fn alert_mut(&mut self) -> &mut AlertPlayer {
        &mut self.alert
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let controls = self.state.controls();
        TimerSnapshot {
            phase: self.state.phase(),
            running: self.state.is_running(),
            remaining_seconds: self.state.remaining_seconds(),
            minutes: self.display.minutes.clone(),
            seconds: self.display.seconds.clone(),
            display: self.display.text(),
            start_enabled: controls.start_enabled,
            stop_enabled: controls.stop_enabled,
            wake_lock_held: self.wake_lock.is_held(),
            alert_flashing: self.alert.is_flashing(),
            alert_retry_pending: self.alert.retry_pending(),
            alerts_fired: self.alerts_fired,
            last_error: self.last_error.clone(),
        }
    }

    /// Idle -> Running.
    ///
    /// Unlocks audio and takes the wake lock before the countdown begins. A
    /// failed unlock leaves the controller idle unless silent starts are allowed.
    pub async fn start(&mut self, minutes: Option<&str>) -> Result<StartOutcome, StartError> {
        if self.state.is_running() {
            debug!("Start ignored, countdown already running");
            return Ok(StartOutcome::AlreadyRunning);
        }

        match self.alert.unlock().await {
            // Audio works again, so retries left over from an earlier alert are stale.
            Ok(()) => self.alert.cancel_retries(),
            Err(e) if !self.settings.allow_silent_start => {
                warn!("Timer initialization error: {}", e);
                self.last_error = Some(format!("Error initializing timer: {}", e));
                return Err(StartError::AudioUnlock(e));
            }
            Err(e) => warn!("Audio unlock failed, starting without sound: {}", e),
        }

        self.wake_lock.acquire().await;

        let (seconds, defaulted) = resolve_seconds(minutes, self.settings.default_seconds);
        if defaulted {
            info!(
                "Invalid duration input {:?}, defaulting to {}s",
                minutes, seconds
            );
        }

        self.state.begin(seconds);
        self.display.write(seconds);
        self.last_error = None;
        info!("Countdown started: {}", self.display.text());

        Ok(StartOutcome::Started { seconds, defaulted })
    }

    /// Running -> Idle without an alert.
    pub async fn stop(&mut self) -> StopOutcome {
        if !self.state.is_running() {
            debug!("Stop ignored, countdown not running");
            return StopOutcome::AlreadyIdle;
        }

        self.state.halt();
        self.wake_lock.release().await;
        let remaining = self.state.remaining_seconds();
        info!("Countdown stopped with {} remaining", self.display.text());

        StopOutcome::Stopped { remaining }
    }

    /// One second elapsed.
    pub async fn tick(&mut self) -> TickOutcome {
        if !self.state.is_running() {
            return TickOutcome::Idle;
        }

        let remaining = self.state.decrement();
        if remaining == 0 {
            self.state.halt();
            self.display.write(0);
            info!("Countdown finished");

            let alert = self.alert.play().await;
            self.alerts_fired += 1;
            self.wake_lock.release().await;
            return TickOutcome::Completed { alert };
        }

        let shift = self.shifter.on_tick(remaining);
        if let Some(shift) = shift {
            self.state.set_remaining(shift.remaining);
        }

        let remaining = self.state.remaining_seconds();
        self.display.write(remaining);
        debug!("Tick: {}", self.display.text());

        TickOutcome::Running { remaining, shift }
    }

    /// The host became visible or hidden.
    ///
    /// Backgrounding can invalidate unlocked audio and revoke the wake lock, so
    /// both are restored when a running countdown becomes visible again.
    pub async fn visibility_changed(&mut self, visible: bool) {
        if !visible {
            debug!("Host hidden");
            return;
        }
        if !self.state.is_running() {
            return;
        }

        if let Err(e) = self.alert.unlock().await {
            warn!("Visibility audio unlock failed: {}", e);
        }
        self.wake_lock.reacquire_if_lost().await;
    }

    /// A touch or other user gesture.
    pub async fn interaction(&mut self) {
        if !self.seen_interaction {
            self.seen_interaction = true;
            if let Err(e) = self.alert.unlock().await {
                warn!("Initial audio unlock failed: {}", e);
            }
        }

        self.alert.on_interaction().await;
    }
}
