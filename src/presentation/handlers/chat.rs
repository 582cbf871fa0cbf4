use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ConversationId, Message, MessageRole};
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::state::AppState;

use super::transcribe::error_response;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub conversation_id: Uuid,
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub answer: String,
}

#[tracing::instrument(skip(state, request), fields(conversation_id = %request.conversation_id))]
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    if request.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Message is empty".to_string());
    }

    tracing::debug!(message = %sanitize_prompt(&request.message), "Processing chat message");

    let conversation_id = ConversationId::from_uuid(request.conversation_id);

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

    let history = match state
        .conversation_repository
        .get_messages(conversation.id, state.settings.chat.history_limit)
        .await
    {
        Ok(messages) => messages,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load conversation history");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load conversation history".to_string(),
            );
        }
    };

    let transcript = match state
        .transcription_repository
        .get_for_conversation(conversation.id)
        .await
    {
        Ok(record) => record.map(|r| r.text),
        Err(e) => {
            tracing::warn!(error = %e, "Could not load transcript, answering without grounding");
            None
        }
    };

    let answer = match state
        .chat_service
        .answer(&request.message, transcript.as_deref(), &history)
        .await
    {
        Ok(answer) => answer,
        Err(e) => {
            tracing::error!(error = %e, "Chat completion failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Chat failed: {}", e),
            );
        }
    };

    let user_msg = Message::new(conversation.id, MessageRole::User, request.message.clone());
    let assistant_msg = Message::new(conversation.id, MessageRole::Assistant, answer.clone());
    for message in [&user_msg, &assistant_msg] {
        if let Err(e) = state.conversation_repository.append_message(message).await {
            tracing::warn!(error = %e, "Could not store chat message");
        }
    }

    tracing::info!("Chat message answered");

    (
        StatusCode::OK,
        Json(ChatResponse {
            conversation_id: conversation.id.as_uuid().to_string(),
            answer,
        }),
    )
        .into_response()
}
