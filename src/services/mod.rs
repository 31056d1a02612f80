//! Platform capability module
//!
//! Audio playback, vibration and wake locks, each behind a trait with a
//! system-command implementation and an in-memory one, plus the alert player
//! and wake lock manager built on top of them.

pub mod alert;
pub mod audio;
pub mod haptics;
pub mod memory;
pub mod wake_lock;

// Re-export main types
pub use alert::{AlertOutcome, AlertPlayer, AlertSettings};
pub use audio::{AudioBackend, AudioClip, CommandAudio};
pub use haptics::{CommandVibrator, NoVibration, Vibrator};
pub use memory::{MemoryAudio, MemoryWakeLock, RecordingVibrator};
pub use wake_lock::{SystemdInhibitor, WakeLockManager, WakeLockProvider, WakeLockSentinel};
