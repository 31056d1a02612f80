//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{
    services::AlertSettings,
    state::{ShiftPolicy, TimerSettings},
};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "bell-timer")]
#[command(about = "A state-managed HTTP countdown timer with alert fallbacks and wake lock control")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Countdown length in minutes used when the start request has no valid duration
    #[arg(short = 'm', long, default_value = "5")]
    pub default_minutes: u64,

    /// Alert sound file
    #[arg(short, long, default_value = "bell.mp3")]
    pub sound: PathBuf,

    /// Player command; the sound path is appended
    #[arg(long, default_value = "mpg123 -q")]
    pub player: String,

    /// Vibration command; the pulse length in milliseconds is appended (e.g. "termux-vibrate -d")
    #[arg(long)]
    pub vibrate_command: Option<String>,

    /// Vibration pattern in milliseconds, alternating vibrate and pause
    #[arg(long, value_delimiter = ',', default_value = "300,200,300,200,300")]
    pub vibration_pattern: Vec<u64>,

    /// How long the visual flash lasts after a refused alert, in seconds
    #[arg(long, default_value = "3")]
    pub flash_secs: u64,

    /// Seconds between alert retries after a refused alert
    #[arg(long, default_value = "2")]
    pub retry_interval_secs: u64,

    /// Maximum number of alert retries
    #[arg(long, default_value = "30")]
    pub retry_attempts: u32,

    /// Disable the random time shift
    #[arg(long)]
    pub no_shift: bool,

    /// Chance per tick that the time shift is considered
    #[arg(long, default_value = "0.05")]
    pub shift_chance: f64,

    /// Chance that a considered time shift is applied
    #[arg(long, default_value = "0.3")]
    pub shift_gate: f64,

    /// Largest time shift in seconds, in either direction
    #[arg(long, default_value = "300")]
    pub shift_range: i64,

    /// Remaining seconds a time shift may never go below
    #[arg(long, default_value = "10")]
    pub shift_floor: u64,

    /// Do not hold a wake lock while counting down
    #[arg(long)]
    pub no_wake_lock: bool,

    /// Start the countdown even when audio cannot be unlocked
    #[arg(long)]
    pub allow_silent_start: bool,

    /// Use in-process audio and wake lock backends instead of system commands
    #[arg(long)]
    pub headless: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    pub fn timer_settings(&self) -> TimerSettings {
        TimerSettings {
            default_seconds: self.default_minutes.max(1).saturating_mul(60),
            allow_silent_start: self.allow_silent_start,
        }
    }

    pub fn alert_settings(&self) -> AlertSettings {
        AlertSettings {
            sound: self.sound.clone(),
            vibration_pattern: self
                .vibration_pattern
                .iter()
                .copied()
                .map(Duration::from_millis)
                .collect(),
            flash_duration: Duration::from_secs(self.flash_secs),
            retry_interval: Duration::from_secs(self.retry_interval_secs.max(1)),
            retry_attempts: self.retry_attempts,
        }
    }

    pub fn shift_policy(&self) -> ShiftPolicy {
        if self.no_shift {
            return ShiftPolicy::disabled();
        }
        ShiftPolicy {
            tick_chance: self.shift_chance,
            apply_chance: self.shift_gate,
            max_delta: self.shift_range,
            floor: self.shift_floor,
        }
        .sanitized()
    }
}
