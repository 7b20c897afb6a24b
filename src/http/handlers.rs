use super::state::AppState;
use crate::error::DeviceErrorKind;
use crate::remote::SessionReport;
use crate::session::{LifecycleState, StartOutcome, StopOutcome};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StartMonitorResponse {
    pub status: LifecycleState,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StopMonitorResponse {
    /// How the recording was finalized
    pub outcome: String,
    pub session_id: Option<String>,
    pub message: Option<String>,
    pub report: Option<SessionReport>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackendHealthResponse {
    pub backend: String,
    pub healthy: bool,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /monitor/start
/// Acquire camera and microphone and begin a monitoring session
pub async fn start_monitoring(State(state): State<AppState>) -> impl IntoResponse {
    match state.coordinator.start().await {
        Ok(StartOutcome::Started) => {
            info!("Monitoring started via API");
            (
                StatusCode::OK,
                Json(StartMonitorResponse {
                    status: LifecycleState::Recording,
                    message: format!(
                        "Monitoring started for {}",
                        state.coordinator.config().lecture_name
                    ),
                }),
            )
                .into_response()
        }
        Ok(StartOutcome::AlreadyActive(current)) => error_response(
            StatusCode::CONFLICT,
            format!("Monitoring is already {}", current),
        ),
        Ok(StartOutcome::Cancelled) => {
            error_response(StatusCode::CONFLICT, "Monitoring start was cancelled")
        }
        Err(e) => {
            error!("Failed to start monitoring: {}", e);
            let status = match e.kind {
                DeviceErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
                DeviceErrorKind::DeviceNotFound => StatusCode::NOT_FOUND,
                DeviceErrorKind::DeviceBusy => StatusCode::CONFLICT,
                DeviceErrorKind::ApiUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                DeviceErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error_response(status, e.user_message())
        }
    }
}

/// POST /monitor/stop
/// Stop the session and submit its audio. Backend failures still answer 200
/// with the outcome; only a stop while not recording is rejected.
pub async fn stop_monitoring(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = state.coordinator.stop().await;

    if outcome == StopOutcome::Ignored {
        return error_response(StatusCode::CONFLICT, "Not recording");
    }

    let message = match &outcome {
        StopOutcome::Failed { message, .. } => Some(message.clone()),
        StopOutcome::Discarded { reason } => Some(reason.clone()),
        _ => None,
    };

    (
        StatusCode::OK,
        Json(StopMonitorResponse {
            outcome: outcome.label().to_string(),
            session_id: outcome.session_id().map(str::to_string),
            message,
            report: outcome.report().cloned(),
        }),
    )
        .into_response()
}

/// GET /monitor/status
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.coordinator.status()))
}

/// DELETE /monitor/error
/// Dismiss the current error message
pub async fn dismiss_error(State(state): State<AppState>) -> impl IntoResponse {
    state.coordinator.dismiss_error();
    StatusCode::NO_CONTENT
}

/// GET /backend/health
/// Opportunistic backend reachability check
pub async fn backend_health(State(state): State<AppState>) -> impl IntoResponse {
    let healthy = state.remote.health().await;
    (
        StatusCode::OK,
        Json(BackendHealthResponse {
            backend: state.remote.name().to_string(),
            healthy,
        }),
    )
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
