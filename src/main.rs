//! Bell Timer - A state-managed HTTP countdown timer
//!
//! This is the main entry point for the bell-timer application.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use tokio::{net::TcpListener, time::timeout};
use tracing::{info, warn};

use bell_timer::{
    config::Config,
    create_router,
    services::{
        AlertPlayer, AudioBackend, CommandAudio, CommandVibrator, MemoryAudio, MemoryWakeLock,
        NoVibration, SystemdInhibitor, Vibrator, WakeLockManager, WakeLockProvider,
    },
    shutdown_signal, spawn_controller,
    state::{AppState, TimeShifter, TimerController},
};

/// How long the controller gets to release its resources after the server stops
const EVENT_LOOP_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "bell_timer={},tower_http=info",
            config.log_level()
        ))
        .init();

    info!("Starting bell-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, default={}min, sound={}",
        config.host,
        config.port,
        config.default_minutes,
        config.sound.display()
    );

    let controller = build_controller(&config)?;
    let (handle, event_loop) = spawn_controller(controller);

    let state = Arc::new(AppState::new(handle, config.port, config.host.clone()));
    let app = create_router(state);

    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start       - Start a countdown ({{\"minutes\": 5}})");
    info!("  POST /stop        - Stop the countdown");
    info!("  POST /visibility  - Report visibility ({{\"visible\": true}})");
    info!("  POST /interaction - Report a user gesture");
    info!("  GET  /status      - Check the countdown");
    info!("  GET  /health      - Health check");

    // Graceful shutdown drains connections, dropping every router clone and
    // with it every controller handle, which ends the event loop.
    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        shutdown_signal().await;
        info!("Shutdown signal received");
    });
    if let Err(e) = server.await {
        tracing::error!("Server error: {}", e);
    }

    match timeout(EVENT_LOOP_GRACE, event_loop).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("Timer controller task failed: {}", e),
        Err(_) => warn!("Timer controller did not stop within {:?}", EVENT_LOOP_GRACE),
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Wire the controller to either system backends or in-process ones
fn build_controller(config: &Config) -> anyhow::Result<TimerController> {
    let audio: Arc<dyn AudioBackend>;
    let provider: Arc<dyn WakeLockProvider>;
    if config.headless {
        info!("Headless mode: using in-process audio and wake lock");
        audio = Arc::new(MemoryAudio::new());
        provider = Arc::new(MemoryWakeLock::new());
    } else {
        let player = CommandAudio::from_command_line(&config.player)
            .context("player command is empty")?;
        audio = Arc::new(player);
        provider = Arc::new(SystemdInhibitor::default());
    }

    let wake_lock = if config.no_wake_lock {
        None
    } else {
        Some(provider)
    };

    let vibrator: Arc<dyn Vibrator> = match config
        .vibrate_command
        .as_deref()
        .and_then(CommandVibrator::from_command_line)
    {
        Some(vibrator) => Arc::new(vibrator),
        None => Arc::new(NoVibration),
    };

    let alert = AlertPlayer::new(audio, vibrator, config.alert_settings());
    Ok(TimerController::new(
        config.timer_settings(),
        alert,
        WakeLockManager::new(wake_lock),
        TimeShifter::new(config.shift_policy()),
    ))
}
