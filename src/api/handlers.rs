//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{error, info, warn};

use super::responses::{
    ApiResponse, HealthResponse, StartRequest, StatusResponse, VisibilityRequest,
};
use crate::{
    error::ControllerError,
    state::{AppState, StartOutcome, StopOutcome},
};

fn closed(e: ControllerError) -> StatusCode {
    error!("Controller unavailable: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Handle POST /start - Begin a countdown
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    body: Option<Json<StartRequest>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let minutes = body.and_then(|Json(request)| request.minutes_text());
    state.record_action("start");

    match state.controller.start(minutes).await {
        Ok(StartOutcome::Started { seconds, defaulted }) => {
            let message = if defaulted {
                format!("Countdown started with default duration of {}s", seconds)
            } else {
                format!("Countdown started for {}s", seconds)
            };
            info!("Start endpoint called - {}", message);
            Ok(Json(ApiResponse::for_timer(message, state.snapshot())))
        }
        Ok(StartOutcome::AlreadyRunning) => Ok(Json(ApiResponse::for_timer(
            "Countdown already running".to_string(),
            state.snapshot(),
        ))),
        Err(ControllerError::Start(e)) => {
            warn!("Failed to start countdown: {}", e);
            Ok(Json(ApiResponse::error(
                format!("Error initializing timer. Please try again. ({})", e),
                state.snapshot(),
            )))
        }
        Err(e) => Err(closed(e)),
    }
}

/// Handle POST /stop - Cancel the countdown without an alert
pub async fn stop_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    state.record_action("stop");

    let message = match state.controller.stop().await.map_err(closed)? {
        StopOutcome::Stopped { remaining } => {
            info!("Stop endpoint called - {}s remaining", remaining);
            "Countdown stopped".to_string()
        }
        StopOutcome::AlreadyIdle => "Countdown not running".to_string(),
    };

    Ok(Json(ApiResponse::for_timer(message, state.snapshot())))
}

/// Handle POST /visibility - The client was shown or hidden
pub async fn visibility_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VisibilityRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    state.record_action(if request.visible { "visible" } else { "hidden" });
    state
        .controller
        .visibility(request.visible)
        .await
        .map_err(closed)?;

    let message = if request.visible { "Visible" } else { "Hidden" };
    Ok(Json(ApiResponse::for_timer(
        message.to_string(),
        state.snapshot(),
    )))
}

/// Handle POST /interaction - A touch or other user gesture
pub async fn interaction_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    state.record_action("interaction");
    state.controller.interaction().await.map_err(closed)?;

    Ok(Json(ApiResponse::for_timer(
        "Interaction received".to_string(),
        state.snapshot(),
    )))
}

/// Handle GET /status - Return the current countdown status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer: state.snapshot(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
