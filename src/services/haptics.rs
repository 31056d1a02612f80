//! Device vibration

use std::{process::Stdio, time::Duration};

use tokio::{process::Command, time::sleep};
use tracing::{debug, warn};

/// A vibration capability. Patterns alternate vibrate and pause lengths,
/// starting with a vibration.
pub trait Vibrator: Send + Sync {
    fn is_supported(&self) -> bool;

    /// Play `pattern` without blocking the caller.
    fn vibrate(&self, pattern: &[Duration]);
}

/// Platforms without a vibration motor
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVibration;

impl Vibrator for NoVibration {
    fn is_supported(&self) -> bool {
        false
    }

    fn vibrate(&self, _pattern: &[Duration]) {}
}

/// Runs a command once per pulse with the pulse length in milliseconds
/// appended, e.g. `termux-vibrate -d`.
#[derive(Debug, Clone)]
pub struct CommandVibrator {
    program: String,
    args: Vec<String>,
}

impl CommandVibrator {
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl Vibrator for CommandVibrator {
    fn is_supported(&self) -> bool {
        true
    }

    fn vibrate(&self, pattern: &[Duration]) {
        let program = self.program.clone();
        let args = self.args.clone();
        let pattern = pattern.to_vec();

        tokio::spawn(async move {
            for (index, step) in pattern.iter().enumerate() {
                if index % 2 == 0 {
                    let result = Command::new(&program)
                        .args(&args)
                        .arg(step.as_millis().to_string())
                        .stdin(Stdio::null())
                        .stdout(Stdio::null())
                        .stderr(Stdio::null())
                        .status()
                        .await;
                    match result {
                        Ok(status) if status.success() => debug!("Vibration pulse {}ms", step.as_millis()),
                        Ok(status) => warn!("{} exited with {}", program, status),
                        Err(e) => {
                            warn!("Failed to run {}: {}", program, e);
                            return;
                        }
                    }
                }
                sleep(*step).await;
            }
        });
    }
}
