use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::TranscriptionId;
use crate::presentation::state::AppState;

use super::transcribe::error_response;

#[derive(Serialize)]
pub struct TranscriptionResponse {
    pub id: String,
    pub conversation_id: String,
    pub title: String,
    pub summary: String,
    pub transcription: String,
    pub source_kind: String,
    pub duration_seconds: Option<f64>,
    pub created_at: String,
}

#[tracing::instrument(skip(state))]
pub async fn get_transcription_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let record = match state
        .transcription_repository
        .get_by_id(TranscriptionId::from_uuid(id))
        .await
    {
        Ok(Some(record)) => record,
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, "Transcription not found".to_string());
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load transcription");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load transcription".to_string(),
            );
        }
    };

    (
        StatusCode::OK,
        Json(TranscriptionResponse {
            id: record.id.as_uuid().to_string(),
            conversation_id: record.conversation_id.as_uuid().to_string(),
            title: record.title,
            summary: record.summary,
            transcription: record.text,
            source_kind: record.source_kind.to_string(),
            duration_seconds: record.duration_secs,
            created_at: record.created_at.to_rfc3339(),
        }),
    )
        .into_response()
}
