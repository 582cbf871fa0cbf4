mod audio_extractor;
mod audio_splitter;
mod chat_model;
mod conversation_repository;
mod media_fetcher;
mod media_probe;
mod repository_error;
mod speech_to_text;
mod transcription_repository;

pub use audio_extractor::{AudioExtractor, ExtractError};
pub use audio_splitter::{AudioSplitter, SplitToolError};
pub use chat_model::{ChatModel, ChatModelError, ChatTurn, CompletionParams, TurnRole};
pub use conversation_repository::ConversationRepository;
pub use media_fetcher::{FetchError, MediaFetcher};
pub use media_probe::MediaProbe;
pub use repository_error::RepositoryError;
pub use speech_to_text::{SpeechToText, SpeechToTextError};
pub use transcription_repository::TranscriptionRepository;
