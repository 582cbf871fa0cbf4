mod pg_conversation_repository;
mod pg_pool;
mod pg_transcription_repository;

pub use pg_conversation_repository::PgConversationRepository;
pub use pg_pool::create_pool;
pub use pg_transcription_repository::PgTranscriptionRepository;
