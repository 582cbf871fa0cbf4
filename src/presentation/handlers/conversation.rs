use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::ConversationId;
use crate::presentation::state::AppState;

use super::transcribe::error_response;

#[derive(Serialize)]
pub struct ConversationResponse {
    pub id: String,
    pub title: Option<String>,
    pub created_at: String,
    pub messages: Vec<MessageView>,
    pub transcription: Option<TranscriptionView>,
}

#[derive(Serialize)]
pub struct MessageView {
    pub role: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct TranscriptionView {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub source_kind: String,
    pub duration_seconds: Option<f64>,
}

#[tracing::instrument(skip(state))]
pub async fn get_conversation_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let conversation_id = ConversationId::from_uuid(id);

    let conversation = match state
        .conversation_repository
        .get_conversation(conversation_id)
        .await
    {
        Ok(Some(c)) => c,
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, "Conversation not found".to_string());
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load conversation");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load conversation".to_string(),
            );
        }
    };

    let messages = match state
        .conversation_repository
        .get_messages(conversation.id, state.settings.chat.history_limit)
        .await
    {
        Ok(messages) => messages,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load messages");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load messages".to_string(),
            );
        }
    };

    let transcription = match state
        .transcription_repository
        .get_for_conversation(conversation.id)
        .await
    {
        Ok(record) => record.map(|r| TranscriptionView {
            id: r.id.as_uuid().to_string(),
            title: r.title,
            summary: r.summary,
            source_kind: r.source_kind.to_string(),
            duration_seconds: r.duration_secs,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Could not load transcription for conversation");
            None
        }
    };

    (
        StatusCode::OK,
        Json(ConversationResponse {
            id: conversation.id.as_uuid().to_string(),
            title: conversation.title,
            created_at: conversation.created_at.to_rfc3339(),
            messages: messages
                .into_iter()
                .map(|m| MessageView {
                    role: m.role.to_string(),
                    content: m.content,
                    created_at: m.created_at.to_rfc3339(),
                })
                .collect(),
            transcription,
        }),
    )
        .into_response()
}
