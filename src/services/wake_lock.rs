//! Screen wake lock management
//!
//! The lock is best-effort: an unsupported platform or a denied request is
//! logged and otherwise ignored.

use std::{io::ErrorKind, process::Stdio, sync::Arc, time::Duration};

use futures::future::BoxFuture;
use tokio::{
    process::{Child, Command},
    time::sleep,
};
use tracing::{debug, info, warn};

use crate::error::WakeLockError;

/// How long the inhibitor gets to fail before the lock counts as granted
const INHIBIT_GRACE: Duration = Duration::from_millis(200);

/// A platform capability that keeps the display awake
pub trait WakeLockProvider: Send + Sync {
    fn request(&self) -> BoxFuture<'_, Result<Box<dyn WakeLockSentinel>, WakeLockError>>;
}

/// A granted wake lock
pub trait WakeLockSentinel: Send {
    /// Whether the platform has revoked the lock on its own.
    fn is_released(&mut self) -> bool;

    fn release(self: Box<Self>) -> BoxFuture<'static, Result<(), WakeLockError>>;
}

/// Owns the single wake lock handle
pub struct WakeLockManager {
    provider: Option<Arc<dyn WakeLockProvider>>,
    held: Option<Box<dyn WakeLockSentinel>>,
}

impl WakeLockManager {
    /// `None` models a platform without the capability.
    pub fn new(provider: Option<Arc<dyn WakeLockProvider>>) -> Self {
        Self {
            provider,
            held: None,
        }
    }

    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    /// Request the lock unless one is already held.
    pub async fn acquire(&mut self) {
        if self.held.is_some() {
            debug!("Wake lock already held");
            return;
        }

        let Some(provider) = self.provider.as_ref() else {
            debug!("Wake lock not supported, skipping");
            return;
        };

        match provider.request().await {
            Ok(sentinel) => {
                self.held = Some(sentinel);
                info!("Wake lock activated");
            }
            Err(WakeLockError::Unsupported) => debug!("Wake lock not supported, skipping"),
            Err(e) => warn!("Wake lock error: {}", e),
        }
    }

    /// Release and clear the held lock, if any.
    pub async fn release(&mut self) {
        let Some(sentinel) = self.held.take() else {
            return;
        };

        match sentinel.release().await {
            Ok(()) => info!("Wake lock released"),
            Err(e) => warn!("Failed to release wake lock: {}", e),
        }
    }

    /// Forget a lock the platform revoked, then acquire one if none is held.
    pub async fn reacquire_if_lost(&mut self) {
        if let Some(sentinel) = self.held.as_mut() {
            if sentinel.is_released() {
                info!("Wake lock was revoked by the platform");
                self.held = None;
            }
        }

        if self.held.is_none() {
            self.acquire().await;
        }
    }
}

/// Holds a `systemd-inhibit --what=idle` process for the lifetime of the lock
#[derive(Debug, Clone)]
pub struct SystemdInhibitor {
    who: String,
    why: String,
}

impl SystemdInhibitor {
    pub fn new(who: impl Into<String>, why: impl Into<String>) -> Self {
        Self {
            who: who.into(),
            why: why.into(),
        }
    }
}

impl Default for SystemdInhibitor {
    fn default() -> Self {
        Self::new("bell-timer", "Countdown running")
    }
}

impl WakeLockProvider for SystemdInhibitor {
    fn request(&self) -> BoxFuture<'_, Result<Box<dyn WakeLockSentinel>, WakeLockError>> {
        Box::pin(async move {
            let mut child = Command::new("systemd-inhibit")
                .arg("--what=idle")
                .arg(format!("--who={}", self.who))
                .arg(format!("--why={}", self.why))
                .arg("--mode=block")
                .args(["sleep", "infinity"])
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| match e.kind() {
                    ErrorKind::NotFound => WakeLockError::Unsupported,
                    _ => WakeLockError::Io(e),
                })?;

            sleep(INHIBIT_GRACE).await;

            if let Some(status) = child.try_wait()? {
                return Err(WakeLockError::Denied(format!(
                    "systemd-inhibit exited with {}",
                    status
                )));
            }

            Ok(Box::new(InhibitorLock { child }) as Box<dyn WakeLockSentinel>)
        })
    }
}

struct InhibitorLock {
    child: Child,
}

impl WakeLockSentinel for InhibitorLock {
    fn is_released(&mut self) -> bool {
        !matches!(self.child.try_wait(), Ok(None))
    }

    fn release(mut self: Box<Self>) -> BoxFuture<'static, Result<(), WakeLockError>> {
        Box::pin(async move {
            if self.child.try_wait()?.is_none() {
                self.child.kill().await?;
            }
            Ok(())
        })
    }
}
