use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use skald::application::services::{ChatService, ChunkingConfig, MediaService, TranscriptionService};
use skald::infrastructure::audio::{FfmpegAudio, FfprobeProbe};
use skald::infrastructure::fetch::{HttpMediaFetcher, YtDlpFetcher};
use skald::infrastructure::llm::OpenRouterClient;
use skald::infrastructure::observability::{TracingConfig, init_tracing};
use skald::infrastructure::persistence::{
    PgConversationRepository, PgTranscriptionRepository, create_pool,
};
use skald::presentation::{AppState, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    init_tracing(TracingConfig::default(), settings.server.port);

    tokio::fs::create_dir_all(&settings.media.root).await?;

    let pool = create_pool(&settings.database.url, settings.database.max_connections).await?;
    let conversation_repository = Arc::new(PgConversationRepository::new(pool.clone()));
    let transcription_repository = Arc::new(PgTranscriptionRepository::new(pool));

    let transcriber = Arc::new(match &settings.openrouter.base_url {
        Some(base) => OpenRouterClient::with_base_url(
            base.clone(),
            settings.openrouter.api_key.clone(),
            settings.openrouter.transcription_model.clone(),
        ),
        None => OpenRouterClient::new(
            settings.openrouter.api_key.clone(),
            settings.openrouter.transcription_model.clone(),
        ),
    });
    let chat_model = Arc::new(match &settings.openrouter.base_url {
        Some(base) => OpenRouterClient::with_base_url(
            base.clone(),
            settings.openrouter.api_key.clone(),
            settings.openrouter.chat_model.clone(),
        ),
        None => OpenRouterClient::new(
            settings.openrouter.api_key.clone(),
            settings.openrouter.chat_model.clone(),
        ),
    });

    let ffmpeg = Arc::new(FfmpegAudio::new());
    let probe = Arc::new(FfprobeProbe::new());

    let chunking = ChunkingConfig {
        max_direct_bytes: settings.transcription.max_direct_bytes,
        safety_margin: settings.transcription.safety_margin,
        min_chunk_secs: settings.transcription.min_chunk_secs,
        max_split_depth: settings.transcription.max_split_depth,
        max_concurrent: settings.transcription.max_concurrent,
        ..ChunkingConfig::default()
    };

    let transcription_service = Arc::new(TranscriptionService::new(
        transcriber,
        probe.clone(),
        ffmpeg.clone(),
        chunking,
        settings.media.root.join("tmp"),
    ));

    let media_service = Arc::new(MediaService::new(
        transcription_service,
        ffmpeg,
        probe,
        Arc::new(HttpMediaFetcher::new()),
        Arc::new(YtDlpFetcher::new()),
        settings.media.root.clone(),
    ));

    let chat_service = Arc::new(ChatService::new(chat_model));

    let state = AppState {
        media_service,
        chat_service,
        conversation_repository,
        transcription_repository,
        settings: settings.clone(),
    };

    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
