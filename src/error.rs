//! Error types shared across the timer, alert and wake lock layers

use thiserror::Error;

/// Audio playback errors
#[derive(Error, Debug)]
pub enum AudioError {
    /// The platform refused to start playback (autoplay restrictions, no device).
    #[error("playback blocked: {0}")]
    Blocked(String),

    /// The sound resource could not be loaded.
    #[error("audio resource unavailable: {0}")]
    Unavailable(String),

    /// IO failure while driving the player.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Wake lock errors
#[derive(Error, Debug)]
pub enum WakeLockError {
    /// The platform has no wake lock capability.
    #[error("wake lock is not supported on this platform")]
    Unsupported,

    /// The platform refused the request.
    #[error("wake lock denied: {0}")]
    Denied(String),

    /// IO failure while holding or releasing the lock.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reasons a countdown could not be started
#[derive(Error, Debug)]
pub enum StartError {
    /// The play/pause handshake failed during the start gesture.
    #[error("audio unlock failed: {0}")]
    AudioUnlock(#[source] AudioError),
}

/// Errors returned by [`ControllerHandle`](crate::tasks::ControllerHandle)
#[derive(Error, Debug)]
pub enum ControllerError {
    /// The event loop has shut down.
    #[error("timer controller is not running")]
    Closed,

    #[error(transparent)]
    Start(#[from] StartError),
}
