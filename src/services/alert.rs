//! Countdown completion alert
//!
//! Playback may be refused until audio has been unlocked by a user gesture.
//! When the final alert is refused, every fallback is applied at once:
//! vibration, a visual flash, a one-shot retry on the next interaction and a
//! bounded series of periodic retries.

use std::{path::PathBuf, sync::Arc, time::Duration};

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::{
    audio::{AudioBackend, AudioClip},
    haptics::Vibrator,
};
use crate::error::AudioError;

/// Alert resources and fallback tuning
#[derive(Debug, Clone)]
pub struct AlertSettings {
    pub sound: PathBuf,
    pub vibration_pattern: Vec<Duration>,
    pub flash_duration: Duration,
    pub retry_interval: Duration,
    pub retry_attempts: u32,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            sound: PathBuf::from("bell.mp3"),
            vibration_pattern: [300, 200, 300, 200, 300]
                .into_iter()
                .map(Duration::from_millis)
                .collect(),
            flash_duration: Duration::from_secs(3),
            retry_interval: Duration::from_secs(2),
            retry_attempts: 30,
        }
    }
}

/// Result of a completion alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    Played,
    /// Playback was refused and the fallbacks are in effect.
    FellBack,
}

/// Owns the single shared audio handle
pub struct AlertPlayer {
    backend: Arc<dyn AudioBackend>,
    vibrator: Arc<dyn Vibrator>,
    settings: AlertSettings,
    clip: Option<Box<dyn AudioClip>>,
    flash_until: Option<Instant>,
    interaction_retry_armed: bool,
    retry_attempts_made: Option<u32>,
}

impl AlertPlayer {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        vibrator: Arc<dyn Vibrator>,
        settings: AlertSettings,
    ) -> Self {
        Self {
            backend,
            vibrator,
            settings,
            clip: None,
            flash_until: None,
            interaction_retry_armed: false,
            retry_attempts_made: None,
        }
    }

    pub fn settings(&self) -> &AlertSettings {
        &self.settings
    }

    /// Load the clip on first use; later calls reuse it.
    fn clip(&mut self) -> Result<&mut Box<dyn AudioClip>, AudioError> {
        if self.clip.is_none() {
            let clip = self.backend.load(&self.settings.sound)?;
            info!("Alert sound loaded from {}", self.settings.sound.display());
            self.clip = Some(clip);
        }

        self.clip
            .as_mut()
            .ok_or_else(|| AudioError::Unavailable("alert sound not loaded".to_string()))
    }

    /// Play, pause and rewind so later playback is allowed without a gesture.
    pub async fn unlock(&mut self) -> Result<(), AudioError> {
        let clip = self.clip()?;
        clip.play().await?;
        clip.pause();
        clip.rewind();
        debug!("Audio unlocked");
        Ok(())
    }

    async fn play_from_start(&mut self) -> Result<(), AudioError> {
        let clip = self.clip()?;
        clip.rewind();
        clip.play().await
    }

    /// Sound the completion alert, falling back when playback is refused.
    pub async fn play(&mut self) -> AlertOutcome {
        match self.play_from_start().await {
            Ok(()) => {
                info!("Alert played");
                AlertOutcome::Played
            }
            Err(e) => {
                error!("Play failed: {}", e);
                self.apply_fallbacks();
                AlertOutcome::FellBack
            }
        }
    }

    fn apply_fallbacks(&mut self) {
        if self.vibrator.is_supported() {
            self.vibrator.vibrate(&self.settings.vibration_pattern);
        }

        self.flash_until = Some(Instant::now() + self.settings.flash_duration);
        self.interaction_retry_armed = true;
        self.retry_attempts_made = (self.settings.retry_attempts > 0).then_some(0);
    }

    /// Fire the one-shot retry armed by a refused alert, if any.
    pub async fn on_interaction(&mut self) {
        if !self.interaction_retry_armed {
            return;
        }
        self.interaction_retry_armed = false;

        match self.play_from_start().await {
            Ok(()) => info!("Alert played on interaction"),
            Err(e) => warn!("Interaction retry failed: {}", e),
        }
    }

    /// One periodic retry. Stops the series on success or when the attempt
    /// budget is spent.
    pub async fn retry_tick(&mut self) {
        let Some(made) = self.retry_attempts_made else {
            return;
        };
        let attempt = made + 1;

        match self.play_from_start().await {
            Ok(()) => {
                info!("Alert played on retry attempt {}", attempt);
                self.retry_attempts_made = None;
            }
            Err(e) => {
                warn!("Retry attempt {} failed: {}", attempt, e);
                self.retry_attempts_made =
                    (attempt < self.settings.retry_attempts).then_some(attempt);
            }
        }
    }

    pub fn retry_pending(&self) -> bool {
        self.retry_attempts_made.is_some()
    }

    pub fn interaction_retry_armed(&self) -> bool {
        self.interaction_retry_armed
    }

    /// Drop outstanding retries from an earlier alert.
    pub fn cancel_retries(&mut self) {
        if self.retry_pending() || self.interaction_retry_armed {
            debug!("Cancelling pending alert retries");
        }
        self.retry_attempts_made = None;
        self.interaction_retry_armed = false;
    }

    pub fn flash_deadline(&self) -> Option<Instant> {
        self.flash_until
    }

    pub fn is_flashing(&self) -> bool {
        self.flash_until.is_some_and(|until| Instant::now() < until)
    }

    /// Clear the visual flash once its deadline has passed.
    pub fn clear_expired_flash(&mut self) {
        if self.flash_until.is_some() && !self.is_flashing() {
            self.flash_until = None;
        }
    }
}
