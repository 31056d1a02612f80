//! In-process platform backends
//!
//! These record every call instead of touching the host. They back the
//! `--headless` mode and the test suites.

use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use futures::future::BoxFuture;
use tracing::info;

use super::{
    audio::{AudioBackend, AudioClip},
    haptics::Vibrator,
    wake_lock::{WakeLockProvider, WakeLockSentinel},
};
use crate::error::{AudioError, WakeLockError};

/// Counters and switches shared by a [`MemoryAudio`] and its clips
#[derive(Debug, Default)]
pub struct AudioProbe {
    loads: AtomicUsize,
    plays: AtomicUsize,
    pauses: AtomicUsize,
    rewinds: AtomicUsize,
    blocked: AtomicBool,
    failures_remaining: AtomicUsize,
    unavailable: AtomicBool,
}

impl AudioProbe {
    /// Reject every playback until unblocked.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Reject the next `count` playbacks.
    pub fn fail_next(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Make loading fail, as if the sound file were missing.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Playback attempts, successful or not.
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    pub fn rewinds(&self) -> usize {
        self.rewinds.load(Ordering::SeqCst)
    }

    fn next_play_rejected(&self) -> bool {
        if self.blocked.load(Ordering::SeqCst) {
            return true;
        }
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryAudio {
    probe: Arc<AudioProbe>,
}

impl MemoryAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> Arc<AudioProbe> {
        Arc::clone(&self.probe)
    }
}

impl AudioBackend for MemoryAudio {
    fn load(&self, source: &Path) -> Result<Box<dyn AudioClip>, AudioError> {
        if self.probe.unavailable.load(Ordering::SeqCst) {
            return Err(AudioError::Unavailable(source.display().to_string()));
        }
        self.probe.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryClip {
            probe: Arc::clone(&self.probe),
        }))
    }
}

struct MemoryClip {
    probe: Arc<AudioProbe>,
}

impl AudioClip for MemoryClip {
    fn play(&mut self) -> BoxFuture<'_, Result<(), AudioError>> {
        Box::pin(async move {
            self.probe.plays.fetch_add(1, Ordering::SeqCst);
            if self.probe.next_play_rejected() {
                return Err(AudioError::Blocked("playback rejected".to_string()));
            }
            info!("*ding*");
            Ok(())
        })
    }

    fn pause(&mut self) {
        self.probe.pauses.fetch_add(1, Ordering::SeqCst);
    }

    fn rewind(&mut self) {
        self.probe.rewinds.fetch_add(1, Ordering::SeqCst);
    }
}

/// Shared view of a [`MemoryWakeLock`]
#[derive(Debug, Default)]
pub struct WakeLockProbe {
    requests: AtomicUsize,
    releases: AtomicUsize,
    denied: AtomicBool,
    current: Mutex<Option<Arc<AtomicBool>>>,
}

impl WakeLockProbe {
    pub fn set_denied(&self, denied: bool) {
        self.denied.store(denied, Ordering::SeqCst);
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Whether a granted lock is currently in force.
    pub fn is_active(&self) -> bool {
        self.current
            .lock()
            .map(|current| {
                current
                    .as_ref()
                    .is_some_and(|released| !released.load(Ordering::SeqCst))
            })
            .unwrap_or(false)
    }

    /// Revoke the current lock the way a platform does when the page is hidden.
    pub fn revoke(&self) {
        if let Ok(current) = self.current.lock() {
            if let Some(released) = current.as_ref() {
                released.store(true, Ordering::SeqCst);
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryWakeLock {
    probe: Arc<WakeLockProbe>,
}

impl MemoryWakeLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> Arc<WakeLockProbe> {
        Arc::clone(&self.probe)
    }
}

impl WakeLockProvider for MemoryWakeLock {
    fn request(&self) -> BoxFuture<'_, Result<Box<dyn WakeLockSentinel>, WakeLockError>> {
        Box::pin(async move {
            self.probe.requests.fetch_add(1, Ordering::SeqCst);
            if self.probe.denied.load(Ordering::SeqCst) {
                return Err(WakeLockError::Denied("request refused".to_string()));
            }

            let released = Arc::new(AtomicBool::new(false));
            if let Ok(mut current) = self.probe.current.lock() {
                *current = Some(Arc::clone(&released));
            }
            Ok(Box::new(MemorySentinel {
                probe: Arc::clone(&self.probe),
                released,
            }) as Box<dyn WakeLockSentinel>)
        })
    }
}

struct MemorySentinel {
    probe: Arc<WakeLockProbe>,
    released: Arc<AtomicBool>,
}

impl WakeLockSentinel for MemorySentinel {
    fn is_released(&mut self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    fn release(self: Box<Self>) -> BoxFuture<'static, Result<(), WakeLockError>> {
        Box::pin(async move {
            self.released.store(true, Ordering::SeqCst);
            self.probe.releases.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

/// Vibrator that records each requested pattern
#[derive(Debug, Clone)]
pub struct RecordingVibrator {
    supported: bool,
    patterns: Arc<Mutex<Vec<Vec<Duration>>>>,
}

impl RecordingVibrator {
    pub fn new(supported: bool) -> Self {
        Self {
            supported,
            patterns: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn patterns(&self) -> Vec<Vec<Duration>> {
        self.patterns
            .lock()
            .map(|patterns| patterns.clone())
            .unwrap_or_default()
    }
}

impl Vibrator for RecordingVibrator {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn vibrate(&self, pattern: &[Duration]) {
        if let Ok(mut patterns) = self.patterns.lock() {
            patterns.push(pattern.to_vec());
        }
    }
}
