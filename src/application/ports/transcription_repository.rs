use async_trait::async_trait;

use crate::domain::{ConversationId, TranscriptionId, TranscriptionRecord};

use super::RepositoryError;

#[async_trait]
pub trait TranscriptionRepository: Send + Sync {
    async fn create(&self, record: &TranscriptionRecord) -> Result<(), RepositoryError>;

    async fn get_by_id(
        &self,
        id: TranscriptionId,
    ) -> Result<Option<TranscriptionRecord>, RepositoryError>;

    /// Most recent transcription attached to a conversation, if any.
    async fn get_for_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<TranscriptionRecord>, RepositoryError>;
}
