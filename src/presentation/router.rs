use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    chat_handler, get_conversation_handler, get_transcription_handler, health_handler,
    transcribe_handler, transcribe_url_handler,
};
use crate::presentation::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let body_limit = state.settings.media.max_upload_mb * 1024 * 1024 + 1024;

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/transcriptions", post(transcribe_handler))
        .route("/api/v1/transcriptions/url", post(transcribe_url_handler))
        .route(
            "/api/v1/transcriptions/{id}",
            get(get_transcription_handler),
        )
        .route("/api/v1/chat", post(chat_handler))
        .route("/api/v1/conversations/{id}", get(get_conversation_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
