//! Audio playback backends

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use futures::future::BoxFuture;
use tokio::{
    process::{Child, Command},
    time::sleep,
};
use tracing::debug;

use crate::error::AudioError;

/// How long a freshly spawned player gets to fail before playback counts as started
const SPAWN_GRACE: Duration = Duration::from_millis(150);

/// Source of playable clips
pub trait AudioBackend: Send + Sync {
    /// Load and preload the clip at `source`.
    fn load(&self, source: &Path) -> Result<Box<dyn AudioClip>, AudioError>;
}

/// A single loaded sound
pub trait AudioClip: Send {
    /// Start playback from the current position. Resolves once the platform
    /// has accepted or rejected the request.
    fn play(&mut self) -> BoxFuture<'_, Result<(), AudioError>>;

    fn pause(&mut self);

    /// Move the playback position back to the start.
    fn rewind(&mut self);
}

/// Plays clips through an external player command, e.g. `mpg123 -q`
#[derive(Debug, Clone)]
pub struct CommandAudio {
    program: String,
    args: Vec<String>,
}

impl CommandAudio {
    /// Build from a whitespace separated command line. The sound path is
    /// appended as the final argument on every playback.
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl AudioBackend for CommandAudio {
    fn load(&self, source: &Path) -> Result<Box<dyn AudioClip>, AudioError> {
        let metadata = std::fs::metadata(source)
            .map_err(|e| AudioError::Unavailable(format!("{}: {}", source.display(), e)))?;
        if !metadata.is_file() {
            return Err(AudioError::Unavailable(format!(
                "{} is not a file",
                source.display()
            )));
        }

        debug!("Loaded sound {}", source.display());
        Ok(Box::new(CommandClip {
            program: self.program.clone(),
            args: self.args.clone(),
            path: source.to_path_buf(),
            child: None,
        }))
    }
}

/// One player process per playback; pausing kills it
struct CommandClip {
    program: String,
    args: Vec<String>,
    path: PathBuf,
    child: Option<Child>,
}

impl CommandClip {
    fn kill_current(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                debug!("Player process already gone: {}", e);
            }
        }
    }
}

impl AudioClip for CommandClip {
    fn play(&mut self) -> BoxFuture<'_, Result<(), AudioError>> {
        Box::pin(async move {
            self.kill_current();

            let mut child = Command::new(&self.program)
                .args(&self.args)
                .arg(&self.path)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| {
                    AudioError::Blocked(format!("failed to launch {}: {}", self.program, e))
                })?;

            sleep(SPAWN_GRACE).await;

            match child.try_wait()? {
                Some(status) if !status.success() => Err(AudioError::Blocked(format!(
                    "{} exited with {}",
                    self.program, status
                ))),
                Some(_) => Ok(()),
                None => {
                    self.child = Some(child);
                    Ok(())
                }
            }
        })
    }

    fn pause(&mut self) {
        self.kill_current();
    }

    fn rewind(&mut self) {
        // Every playback spawns a fresh player from the start of the file.
        self.kill_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_splits_program_and_args() {
        let audio = CommandAudio::from_command_line("mpg123  -q --no-control").unwrap();
        assert_eq!(audio.program, "mpg123");
        assert_eq!(audio.args, vec!["-q", "--no-control"]);
    }

    #[test]
    fn empty_command_line_is_rejected() {
        assert!(CommandAudio::from_command_line("   ").is_none());
    }

    #[test]
    fn missing_sound_file_is_unavailable() {
        let audio = CommandAudio::from_command_line("mpg123 -q").unwrap();
        let result = audio.load(Path::new("/definitely/not/here/bell.mp3"));
        assert!(matches!(result, Err(AudioError::Unavailable(_))));
    }
}
