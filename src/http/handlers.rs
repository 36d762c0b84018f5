use super::state::AppState;
use crate::error::VaultError;
use crate::resolver::FormatMetadata;
use crate::vault::{DecryptRequest, EncryptedRecording};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StartRecordingRequest {
    /// Optional session ID (if not provided, generate UUID)
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartRecordingResponse {
    pub success: bool,
    pub session_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct RecordingResponse {
    pub success: bool,
    #[serde(flatten)]
    pub recording: EncryptedRecording,
}

#[derive(Debug, Deserialize)]
pub struct EncryptRequest {
    /// Base64 raw audio bytes (float64 little-endian by default)
    pub audio: Option<String>,
    pub sample_rate: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct DecryptRawResponse {
    pub success: bool,
    /// Base64 float64 little-endian normalized samples
    pub audio: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub format: crate::audio::SampleFormat,
    pub metadata: FormatMetadata,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl IntoResponse for VaultError {
    fn into_response(self) -> Response {
        let status = match &self {
            VaultError::InvalidInput(_) | VaultError::CipherPrecondition { .. } => {
                StatusCode::BAD_REQUEST
            }
            VaultError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            VaultError::SessionConflict(_) | VaultError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            VaultError::NoDataCaptured | VaultError::FormatDetectionFailure(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            VaultError::ContainerWriteFailure(_) | VaultError::Capture(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        error!("Request failed ({}): {}", status, self);

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Unwrap a JSON body, turning extractor rejections into typed errors
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, VaultError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| VaultError::InvalidInput(rejection.body_text()))
}

fn recording_response(recording: EncryptedRecording) -> Response {
    (
        StatusCode::OK,
        Json(RecordingResponse {
            success: true,
            recording,
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/record
/// Record for the configured duration and return the encrypted audio
pub async fn record(State(state): State<AppState>) -> Response {
    info!("Starting fixed-duration recording");

    match state.vault.record().await {
        Ok(recording) => recording_response(recording),
        Err(e) => e.into_response(),
    }
}

/// POST /api/record/start
/// Start a new capture session
pub async fn start_recording(
    State(state): State<AppState>,
    body: Option<Json<StartRecordingRequest>>,
) -> Response {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    match state.vault.start_session(req.session_id).await {
        Ok(session_id) => {
            info!("Recording started for session: {}", session_id);
            (
                StatusCode::OK,
                Json(StartRecordingResponse {
                    success: true,
                    session_id,
                    status: "recording".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// POST /api/record/stop/:session_id
/// Stop a session and return its encrypted audio
pub async fn stop_recording(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    info!("Stopping recording for session: {}", session_id);

    match state.vault.stop_session(&session_id).await {
        Ok(recording) => recording_response(recording),
        Err(e) => e.into_response(),
    }
}

/// GET /api/record/:session_id/status
pub async fn get_session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.vault.session_stats(&session_id).await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /api/encrypt
/// Encrypt caller-supplied audio bytes under a fresh key
pub async fn encrypt_audio(
    State(state): State<AppState>,
    payload: Result<Json<EncryptRequest>, JsonRejection>,
) -> Response {
    let req = match json_body(payload) {
        Ok(req) => req,
        Err(e) => return e.into_response(),
    };
    let Some(audio) = req.audio else {
        return VaultError::InvalidInput("missing audio payload".to_string()).into_response();
    };

    match state.vault.encrypt_audio(&audio, req.sample_rate).await {
        Ok(recording) => recording_response(recording),
        Err(e) => e.into_response(),
    }
}

/// POST /api/decrypt
/// Decrypt and return a WAV attachment
pub async fn decrypt_audio(
    State(state): State<AppState>,
    payload: Result<Json<DecryptRequest>, JsonRejection>,
) -> Response {
    let req = match json_body(payload) {
        Ok(req) => req,
        Err(e) => return e.into_response(),
    };

    match state.vault.decrypt_to_wav(&req) {
        Ok(wav) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "audio/wav"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"decrypted_audio.wav\"",
                ),
            ],
            wav,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /api/decrypt/raw
/// Decrypt and return normalized samples as base64 float64
pub async fn decrypt_raw(
    State(state): State<AppState>,
    payload: Result<Json<DecryptRequest>, JsonRejection>,
) -> Response {
    let req = match json_body(payload) {
        Ok(req) => req,
        Err(e) => return e.into_response(),
    };

    match state.vault.decrypt(&req) {
        Ok(buffer) => {
            let metadata = FormatMetadata::for_buffer(&buffer);
            (
                StatusCode::OK,
                Json(DecryptRawResponse {
                    success: true,
                    audio: base64::engine::general_purpose::STANDARD
                        .encode(buffer.to_f64_le_bytes()),
                    sample_rate: buffer.sample_rate,
                    channels: buffer.channels,
                    format: buffer.source_format,
                    metadata,
                }),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
