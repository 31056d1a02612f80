use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use rand::{rngs::StdRng, SeedableRng};
use serde_json::Value;
use tower::ServiceExt;

use bell_timer::{
    create_router,
    services::{
        memory::AudioProbe, AlertPlayer, AlertSettings, MemoryAudio, MemoryWakeLock, NoVibration,
        WakeLockManager,
    },
    spawn_controller,
    state::{AppState, ShiftPolicy, TimeShifter, TimerController, TimerSettings},
};

fn app() -> (Router, Arc<AudioProbe>) {
    let audio = MemoryAudio::new();
    let probe = audio.probe();

    let controller = TimerController::new(
        TimerSettings::default(),
        AlertPlayer::new(Arc::new(audio), Arc::new(NoVibration), AlertSettings::default()),
        WakeLockManager::new(Some(Arc::new(MemoryWakeLock::new()))),
        TimeShifter::with_rng(ShiftPolicy::disabled(), StdRng::seed_from_u64(9)),
    );
    let (handle, _task) = spawn_controller(controller);
    let state = Arc::new(AppState::new(handle, 20554, "127.0.0.1".to_string()));
    (create_router(state), probe)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = app();
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn initial_status_is_idle() {
    let (app, _) = app();
    let (status, body) = call(&app, Method::GET, "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["display"], "00:00");
    assert_eq!(body["timer"]["start_enabled"], true);
    assert_eq!(body["timer"]["stop_enabled"], false);
    assert_eq!(body["last_action"], Value::Null);
}

#[tokio::test]
async fn start_and_stop_round_trip() {
    let (app, _) = app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/start",
        Some(serde_json::json!({ "minutes": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["timer"]["display"], "01:00");
    assert_eq!(body["timer"]["stop_enabled"], true);
    assert_eq!(body["timer"]["wake_lock_held"], true);

    let (_, body) = call(&app, Method::POST, "/stop", None).await;
    assert_eq!(body["status"], "idle");
    assert_eq!(body["message"], "Countdown stopped");
    assert_eq!(body["timer"]["start_enabled"], true);
    assert_eq!(body["timer"]["wake_lock_held"], false);

    let (_, body) = call(&app, Method::POST, "/stop", None).await;
    assert_eq!(body["message"], "Countdown not running");

    let (_, body) = call(&app, Method::GET, "/status", None).await;
    assert_eq!(body["last_action"], "stop");
}

#[tokio::test]
async fn invalid_or_missing_duration_uses_default() {
    for body in [
        Some(serde_json::json!({ "minutes": 0 })),
        Some(serde_json::json!({ "minutes": "later" })),
        None,
    ] {
        let (app, _) = app();
        let (_, response) = call(&app, Method::POST, "/start", body).await;
        assert_eq!(response["status"], "running");
        assert_eq!(response["timer"]["display"], "05:00");
    }
}

#[tokio::test]
async fn second_start_is_ignored() {
    let (app, _) = app();
    call(&app, Method::POST, "/start", Some(serde_json::json!({ "minutes": 2 }))).await;

    let (_, body) = call(&app, Method::POST, "/start", Some(serde_json::json!({ "minutes": 9 }))).await;
    assert_eq!(body["message"], "Countdown already running");
    assert_eq!(body["timer"]["display"], "02:00");
}

#[tokio::test]
async fn blocked_audio_reports_an_error_and_stays_idle() {
    let (app, probe) = app();
    probe.set_blocked(true);

    let (status, body) = call(&app, Method::POST, "/start", Some(serde_json::json!({ "minutes": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert_eq!(body["timer"]["running"], false);
    assert_eq!(body["timer"]["start_enabled"], true);
    assert_eq!(body["timer"]["stop_enabled"], false);
}

#[tokio::test]
async fn visibility_and_interaction_are_accepted() {
    let (app, probe) = app();
    call(&app, Method::POST, "/start", Some(serde_json::json!({ "minutes": 1 }))).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/visibility",
        Some(serde_json::json!({ "visible": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(probe.plays(), 2);

    let (status, _) = call(&app, Method::POST, "/interaction", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(probe.plays(), 3);
}
