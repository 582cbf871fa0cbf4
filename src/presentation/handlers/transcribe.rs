use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

use crate::application::ports::{FetchError, SpeechToTextError};
use crate::application::services::{MediaError, MediaTranscript, TranscriptionError};
use crate::domain::{Conversation, MediaKind, Message, MessageRole, TranscriptionRecord};
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct TranscribeResponse {
    pub transcription_id: String,
    pub conversation_id: String,
    pub title: String,
    pub summary: String,
    pub transcription: String,
    pub duration_seconds: Option<f64>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[tracing::instrument(skip(state, multipart))]
pub async fn transcribe_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let field = match multipart.next_field().await {
        Ok(Some(f)) => f,
        Ok(None) => {
            tracing::warn!("Transcription request with no file");
            return error_response(StatusCode::BAD_REQUEST, "No file uploaded".to_string());
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to read multipart");
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Failed to read multipart: {}", e),
            );
        }
    };

    let filename = field.file_name().unwrap_or("unknown").to_string();
    let content_type = field.content_type().unwrap_or("application/octet-stream");

    tracing::debug!(filename = %filename, content_type = %content_type, "Processing media upload");

    let extension = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    let kind = match MediaKind::from_mime(content_type)
        .or_else(|| MediaKind::from_extension(&extension))
    {
        Some(kind) => kind,
        None => {
            tracing::warn!(content_type = %content_type, filename = %filename, "Unsupported media type");
            return error_response(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!("Unsupported media type: {}", content_type),
            );
        }
    };

    let data = match field.bytes().await {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read file bytes");
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Failed to read file: {}", e),
            );
        }
    };

    let max_bytes = state.settings.media.max_upload_mb * 1024 * 1024;
    if data.len() > max_bytes {
        tracing::warn!(bytes = data.len(), max_bytes, "Upload over size limit");
        return error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!(
                "File exceeds the {} MB upload limit",
                state.settings.media.max_upload_mb
            ),
        );
    }

    // Uploads land in their own directory so concurrent requests never
    // collide on a filename.
    let upload_dir = state
        .settings
        .media
        .root
        .join("uploads")
        .join(Uuid::new_v4().to_string());
    if let Err(e) = tokio::fs::create_dir_all(&upload_dir).await {
        tracing::error!(error = %e, "Failed to create upload directory");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to store upload".to_string(),
        );
    }

    let ext = if extension.is_empty() {
        "bin".to_string()
    } else {
        extension
    };
    let upload_path = upload_dir.join(format!("upload.{}", ext));
    if let Err(e) = tokio::fs::write(&upload_path, &data).await {
        tracing::error!(error = %e, "Failed to write upload to disk");
        let _ = tokio::fs::remove_dir_all(&upload_dir).await;
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to store upload".to_string(),
        );
    }

    tracing::info!(bytes = data.len(), kind = %kind, "Upload stored, starting transcription");

    let result = state.media_service.transcribe_file(&upload_path, kind).await;

    if let Err(e) = tokio::fs::remove_dir_all(&upload_dir).await {
        tracing::warn!(error = %e, dir = %upload_dir.display(), "Could not remove upload directory");
    }

    match result {
        Ok(transcript) => persist_and_respond(&state, transcript).await,
        Err(e) => media_error_response(&e),
    }
}

/// Generate metadata, open a conversation seeded with the transcript, and
/// store the transcription record. Shared by the upload and URL handlers.
pub(super) async fn persist_and_respond(
    state: &AppState,
    transcript: MediaTranscript,
) -> Response {
    let metadata = state.chat_service.generate_metadata(&transcript.text).await;

    let conversation = Conversation::new(Some(metadata.title.clone()));
    if let Err(e) = state
        .conversation_repository
        .create_conversation(&conversation)
        .await
    {
        tracing::error!(error = %e, "Failed to create conversation");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to persist conversation".to_string(),
        );
    }

    let record = TranscriptionRecord::new(
        conversation.id,
        transcript.text,
        metadata.title,
        metadata.summary,
        transcript.kind,
        transcript.duration_secs,
    );
    if let Err(e) = state.transcription_repository.create(&record).await {
        tracing::error!(error = %e, "Failed to store transcription");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to persist transcription".to_string(),
        );
    }

    let seed = Message::new(
        conversation.id,
        MessageRole::Assistant,
        format!("Transcription complete: {}", record.title),
    );
    if let Err(e) = state.conversation_repository.append_message(&seed).await {
        tracing::warn!(error = %e, "Could not seed conversation message");
    }

    tracing::info!(
        transcription_id = %record.id.as_uuid(),
        conversation_id = %conversation.id.as_uuid(),
        "Transcription persisted"
    );

    (
        StatusCode::OK,
        Json(TranscribeResponse {
            transcription_id: record.id.as_uuid().to_string(),
            conversation_id: conversation.id.as_uuid().to_string(),
            title: record.title,
            summary: record.summary,
            transcription: record.text,
            duration_seconds: record.duration_secs,
        }),
    )
        .into_response()
}

pub(super) fn media_error_response(error: &MediaError) -> Response {
    let status = match error {
        MediaError::Fetch(FetchError::UnsupportedUrl(_)) => StatusCode::BAD_REQUEST,
        MediaError::Fetch(_) => StatusCode::BAD_GATEWAY,
        MediaError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MediaError::Transcription(t) => match t {
            TranscriptionError::Remote(SpeechToTextError::PayloadTooLarge) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            TranscriptionError::SplitInfeasible { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            TranscriptionError::Remote(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
    };

    tracing::error!(error = %error, status = %status, "Transcription request failed");
    error_response(status, error.to_string())
}

pub(super) fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}
