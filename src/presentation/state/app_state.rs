use std::sync::Arc;

use crate::application::ports::{ConversationRepository, TranscriptionRepository};
use crate::application::services::{ChatService, MediaService};
use crate::presentation::config::Settings;

pub struct AppState {
    pub media_service: Arc<MediaService>,
    pub chat_service: Arc<ChatService>,
    pub conversation_repository: Arc<dyn ConversationRepository>,
    pub transcription_repository: Arc<dyn TranscriptionRepository>,
    pub settings: Settings,
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            media_service: Arc::clone(&self.media_service),
            chat_service: Arc::clone(&self.chat_service),
            conversation_repository: Arc::clone(&self.conversation_repository),
            transcription_repository: Arc::clone(&self.transcription_repository),
            settings: self.settings.clone(),
        }
    }
}
