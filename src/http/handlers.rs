use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{error, info};

use crate::error::RecordingError;
use crate::session::SessionStatus;

use super::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StartRecordingResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopRecordingResponse {
    pub status: String,
    pub size: u64,
    pub mime_type: String,
    pub delivered: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub recoverable: bool,
}

fn error_response(err: &RecordingError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        RecordingError::PermissionDenied => StatusCode::FORBIDDEN,
        RecordingError::NotFound => StatusCode::NOT_FOUND,
        RecordingError::NotSupported => StatusCode::NOT_IMPLEMENTED,
        RecordingError::NoActiveRecording => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let report = err.report();
    (
        status,
        Json(ErrorResponse {
            error: report.message,
            code: report.code,
            recoverable: report.recoverable,
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /recordings/start
/// Start recording in this context
pub async fn start_recording(State(state): State<AppState>) -> impl IntoResponse {
    info!("start recording requested");

    let result = state.session.lock().await.start().await;
    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(StartRecordingResponse {
                status: "recording".to_string(),
                message: "Recording started".to_string(),
            }),
        )
            .into_response(),
        Err(err) => {
            error!(code = err.code(), "failed to start recording");
            error_response(&err).into_response()
        }
    }
}

/// POST /recordings/stop
/// Stop the active recording and hand the artifact to the consumer
pub async fn stop_recording(State(state): State<AppState>) -> impl IntoResponse {
    info!("stop recording requested");

    let result = state.session.lock().await.stop().await;
    match result {
        Ok(artifact) => {
            let delivered = match state.consumer.consume(&artifact).await {
                Ok(()) => true,
                Err(err) => {
                    error!(consumer = state.consumer.name(), %err, "artifact delivery failed");
                    false
                }
            };

            (
                StatusCode::OK,
                Json(StopRecordingResponse {
                    status: "stopped".to_string(),
                    size: artifact.size(),
                    mime_type: artifact.mime_type().to_string(),
                    delivered,
                }),
            )
                .into_response()
        }
        Err(err) => {
            error!(code = err.code(), "failed to stop recording");
            error_response(&err).into_response()
        }
    }
}

/// GET /recordings/status
/// Snapshot of the session state
pub async fn get_status(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.session.lock().await.status())
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
