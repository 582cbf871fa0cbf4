use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use url::Url;

use crate::presentation::state::AppState;

use super::transcribe::{error_response, media_error_response, persist_and_respond};

#[derive(Deserialize)]
pub struct TranscribeUrlRequest {
    pub url: String,
}

#[tracing::instrument(skip(state, request), fields(url = %request.url))]
pub async fn transcribe_url_handler(
    State(state): State<AppState>,
    Json(request): Json<TranscribeUrlRequest>,
) -> impl IntoResponse {
    let url = match Url::parse(&request.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        Ok(url) => {
            tracing::warn!(scheme = %url.scheme(), "Rejecting non-http url");
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Unsupported url scheme: {}", url.scheme()),
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "Invalid url in transcription request");
            return error_response(StatusCode::BAD_REQUEST, format!("Invalid url: {}", e));
        }
    };

    tracing::info!("Starting url transcription");

    match state.media_service.transcribe_url(url).await {
        Ok(transcript) => persist_and_respond(&state, transcript).await,
        Err(e) => media_error_response(&e),
    }
}
