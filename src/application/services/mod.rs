mod chat_service;
mod chunking;
mod media_service;
mod transcription_service;

pub use chat_service::{ChatError, ChatService, MediaMetadata};
pub use chunking::{ChunkScheduler, ChunkingConfig, plan_chunk_duration};
pub use media_service::{MediaError, MediaService, MediaTranscript};
pub use transcription_service::{TranscriptionError, TranscriptionService};
