//! Controller event loop
//!
//! A single task owns the [`TimerController`] and handles one event at a time:
//! commands from the HTTP layer, countdown ticks, alert retries and the end of
//! the visual flash. Because the tick interval lives in the same loop, stopping
//! or finishing a countdown cancels it before another tick can be observed.

use std::time::Duration;

use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    error::{ControllerError, StartError},
    state::{StartOutcome, StopOutcome, TickOutcome, TimerController, TimerSnapshot},
};

const TICK_PERIOD: Duration = Duration::from_secs(1);
const COMMAND_BUFFER: usize = 32;
/// Shortest period a schedule may use; a zero period would panic in tokio.
const MIN_PERIOD: Duration = Duration::from_millis(100);

/// Events delivered to the controller from outside the loop
#[derive(Debug)]
pub enum Command {
    Start {
        minutes: Option<String>,
        reply: oneshot::Sender<Result<StartOutcome, StartError>>,
    },
    Stop {
        reply: oneshot::Sender<StopOutcome>,
    },
    Visibility {
        visible: bool,
        reply: oneshot::Sender<()>,
    },
    Interaction {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle for sending events to the controller
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<TimerSnapshot>,
}

impl ControllerHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ControllerError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| ControllerError::Closed)?;
        response.await.map_err(|_| ControllerError::Closed)
    }

    pub async fn start(&self, minutes: Option<String>) -> Result<StartOutcome, ControllerError> {
        let outcome = self
            .request(|reply| Command::Start { minutes, reply })
            .await??;
        Ok(outcome)
    }

    pub async fn stop(&self) -> Result<StopOutcome, ControllerError> {
        self.request(|reply| Command::Stop { reply }).await
    }

    pub async fn visibility(&self, visible: bool) -> Result<(), ControllerError> {
        self.request(|reply| Command::Visibility { visible, reply })
            .await
    }

    pub async fn interaction(&self) -> Result<(), ControllerError> {
        self.request(|reply| Command::Interaction { reply }).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshots.clone()
    }
}

/// Spawn the event loop for `controller`.
pub fn spawn_controller(controller: TimerController) -> (ControllerHandle, JoinHandle<()>) {
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
    let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());

    let task = tokio::spawn(run_event_loop(controller, commands_rx, snapshot_tx));
    let handle = ControllerHandle {
        commands: commands_tx,
        snapshots: snapshot_rx,
    };
    (handle, task)
}

fn periodic(period: Duration) -> Interval {
    let period = period.max(MIN_PERIOD);
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn deadline(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Tick sources owned by the event loop
#[derive(Default)]
struct Schedules {
    countdown: Option<Interval>,
    alert_retry: Option<Interval>,
}

impl Schedules {
    /// Keep the retry interval in step with the alert player's retry state.
    fn sync_alert_retry(&mut self, controller: &TimerController) {
        let pending = controller.alert().retry_pending();
        if pending && self.alert_retry.is_none() {
            self.alert_retry = Some(periodic(controller.alert().settings().retry_interval));
        } else if !pending {
            self.alert_retry = None;
        }
    }
}

/// Settle the schedules and publish the controller state
fn publish(
    controller: &TimerController,
    schedules: &mut Schedules,
    snapshots: &watch::Sender<TimerSnapshot>,
) {
    schedules.sync_alert_retry(controller);
    snapshots.send_replace(controller.snapshot());
}

/// Process events until every [`ControllerHandle`] has been dropped
pub async fn run_event_loop(
    mut controller: TimerController,
    mut commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<TimerSnapshot>,
) {
    info!("Starting timer controller event loop");

    let mut schedules = Schedules::default();

    loop {
        let flash_deadline = controller.alert().flash_deadline();

        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                handle_command(&mut controller, command, &mut schedules, &snapshots).await;
                continue;
            }

            _ = next_tick(&mut schedules.countdown) => {
                match controller.tick().await {
                    TickOutcome::Completed { alert } => {
                        debug!("Countdown complete, alert outcome {:?}", alert);
                        schedules.countdown = None;
                    }
                    TickOutcome::Idle => {
                        warn!("Tick arrived while idle, cancelling schedule");
                        schedules.countdown = None;
                    }
                    TickOutcome::Running { .. } => {}
                }
            }

            _ = next_tick(&mut schedules.alert_retry) => {
                controller.alert_mut().retry_tick().await;
            }

            _ = deadline(flash_deadline) => {
                controller.alert_mut().clear_expired_flash();
            }
        }

        publish(&controller, &mut schedules, &snapshots);
    }

    controller.stop().await;
    info!("Timer controller event loop stopped");
}

/// Apply one command. The new state is published before the caller is answered.
async fn handle_command(
    controller: &mut TimerController,
    command: Command,
    schedules: &mut Schedules,
    snapshots: &watch::Sender<TimerSnapshot>,
) {
    match command {
        Command::Start { minutes, reply } => {
            let result = controller.start(minutes.as_deref()).await;
            if let Ok(StartOutcome::Started { .. }) = result {
                schedules.countdown = Some(periodic(TICK_PERIOD));
            }
            publish(controller, schedules, snapshots);
            let _ = reply.send(result);
        }
        Command::Stop { reply } => {
            let outcome = controller.stop().await;
            if let StopOutcome::Stopped { .. } = outcome {
                schedules.countdown = None;
            }
            publish(controller, schedules, snapshots);
            let _ = reply.send(outcome);
        }
        Command::Visibility { visible, reply } => {
            controller.visibility_changed(visible).await;
            publish(controller, schedules, snapshots);
            let _ = reply.send(());
        }
        Command::Interaction { reply } => {
            controller.interaction().await;
            publish(controller, schedules, snapshots);
            let _ = reply.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::{rngs::StdRng, SeedableRng};
    use tokio::time::sleep;

    use super::*;
    use crate::{
        services::{
            memory::{AudioProbe, MemoryAudio, MemoryWakeLock, WakeLockProbe},
            AlertPlayer, AlertSettings, NoVibration, WakeLockManager,
        },
        state::{ShiftPolicy, TimeShifter, TimerSettings},
    };

    struct Running {
        handle: ControllerHandle,
        task: JoinHandle<()>,
        audio: Arc<AudioProbe>,
        lock: Arc<WakeLockProbe>,
    }

    fn spawn_with(alert_settings: AlertSettings) -> Running {
        let audio = MemoryAudio::new();
        let lock = MemoryWakeLock::new();
        let (audio_probe, lock_probe) = (audio.probe(), lock.probe());

        let controller = TimerController::new(
            TimerSettings::default(),
            AlertPlayer::new(Arc::new(audio), Arc::new(NoVibration), alert_settings),
            WakeLockManager::new(Some(Arc::new(lock))),
            TimeShifter::with_rng(ShiftPolicy::disabled(), StdRng::seed_from_u64(5)),
        );
        let (handle, task) = spawn_controller(controller);
        Running {
            handle,
            task,
            audio: audio_probe,
            lock: lock_probe,
        }
    }

    fn spawn() -> (ControllerHandle, Arc<AudioProbe>, Arc<WakeLockProbe>) {
        let running = spawn_with(AlertSettings::default());
        (running.handle, running.audio, running.lock)
    }

    #[tokio::test(start_paused = true)]
    async fn one_minute_countdown_runs_to_completion() {
        let (handle, audio, lock) = spawn();

        handle.start(Some("1".to_string())).await.unwrap();
        assert_eq!(handle.snapshot().display, "01:00");

        sleep(Duration::from_millis(30_500)).await;
        let snapshot = handle.snapshot();
        assert!(snapshot.running);
        assert_eq!(snapshot.display, "00:30");

        sleep(Duration::from_secs(31)).await;
        let snapshot = handle.snapshot();
        assert!(!snapshot.running);
        assert_eq!(snapshot.display, "00:00");
        assert_eq!(snapshot.alerts_fired, 1);
        assert!(snapshot.start_enabled);
        assert!(!snapshot.stop_enabled);
        assert!(!lock.is_active());
        assert_eq!(audio.plays(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_further_ticks() {
        let (handle, _audio, lock) = spawn();

        handle.start(Some("2".to_string())).await.unwrap();
        sleep(Duration::from_millis(5_500)).await;
        let outcome = handle.stop().await.unwrap();
        assert_eq!(outcome, StopOutcome::Stopped { remaining: 115 });

        sleep(Duration::from_secs(10)).await;
        let snapshot = handle.snapshot();
        assert!(!snapshot.running);
        assert_eq!(snapshot.remaining_seconds, 115);
        assert!(!lock.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_does_not_add_a_tick_source() {
        let (handle, _audio, _lock) = spawn();

        handle.start(Some("1".to_string())).await.unwrap();
        let outcome = handle.start(Some("1".to_string())).await.unwrap();
        assert_eq!(outcome, StartOutcome::AlreadyRunning);

        sleep(Duration::from_millis(10_500)).await;
        assert_eq!(handle.snapshot().remaining_seconds, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn refused_alert_is_retried_every_two_seconds() {
        let (handle, audio, _lock) = spawn();

        handle.start(Some("1".to_string())).await.unwrap();
        audio.fail_next(3);

        sleep(Duration::from_millis(60_500)).await;
        let snapshot = handle.snapshot();
        assert!(snapshot.alert_retry_pending);
        assert!(snapshot.alert_flashing);
        assert_eq!(audio.plays(), 2);

        sleep(Duration::from_secs(3)).await;
        assert!(!handle.snapshot().alert_flashing);

        sleep(Duration::from_secs(3)).await;
        assert_eq!(audio.plays(), 5);
        assert!(!handle.snapshot().alert_retry_pending);
    }

    #[tokio::test]
    async fn failed_start_is_reported() {
        let (handle, audio, _lock) = spawn();
        audio.set_blocked(true);

        let result = handle.start(None).await;
        assert!(matches!(result, Err(ControllerError::Start(_))));
        let snapshot = handle.snapshot();
        assert!(!snapshot.running);
        assert!(snapshot.last_error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retry_interval_does_not_stall_the_loop() {
        let running = spawn_with(AlertSettings {
            retry_interval: Duration::ZERO,
            ..AlertSettings::default()
        });

        running.handle.start(Some("1".to_string())).await.unwrap();
        running.audio.fail_next(1);

        sleep(Duration::from_secs(61)).await;
        assert!(!running.handle.snapshot().alert_retry_pending);
        assert_eq!(running.audio.plays(), 3);
        assert!(!running.task.is_finished());
    }

    #[tokio::test]
    async fn dropping_every_handle_stops_the_countdown() {
        let running = spawn_with(AlertSettings::default());
        running.handle.start(Some("1".to_string())).await.unwrap();
        assert!(running.lock.is_active());

        drop(running.handle);
        running.task.await.unwrap();
        assert!(!running.lock.is_active());
        assert_eq!(running.lock.releases(), 1);
    }
}
