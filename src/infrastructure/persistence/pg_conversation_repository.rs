use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{ConversationRepository, RepositoryError};
use crate::domain::{Conversation, ConversationId, Message, MessageId, MessageRole};

pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    #[instrument(skip(self, conversation), fields(conversation_id = %conversation.id.as_uuid()))]
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, title, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(conversation.id.as_uuid())
        .bind(&conversation.title)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(conversation_id = %id.as_uuid()))]
    async fn get_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, created_at, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        match row {
            Some(row) => {
                let messages = self.get_messages(id, 1000).await?;
                Ok(Some(Conversation {
                    id: ConversationId::from_uuid(
                        row.try_get::<Uuid, _>("id")
                            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                    ),
                    title: row
                        .try_get::<Option<String>, _>("title")
                        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                    messages,
                    created_at: row
                        .try_get::<DateTime<Utc>, _>("created_at")
                        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                    updated_at: row
                        .try_get::<DateTime<Utc>, _>("updated_at")
                        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                }))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, message), fields(message_id = %message.id.as_uuid(), conversation_id = %message.conversation_id.as_uuid()))]
    async fn append_message(&self, message: &Message) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, role, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(message.conversation_id.as_uuid())
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        sqlx::query(
            r#"
            UPDATE conversations
            SET updated_at = $1
            WHERE id = $2
            "#,
        )
        .bind(Utc::now())
        .bind(message.conversation_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(conversation_id = %conversation_id.as_uuid(), limit = %limit))]
    async fn get_messages(
        &self,
        conversation_id: ConversationId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, role, content, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(conversation_id.as_uuid())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let mut messages: Vec<Message> = rows
            .into_iter()
            .map(|row| {
                let role: String = row
                    .try_get("role")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
                let role = role
                    .parse::<MessageRole>()
                    .map_err(RepositoryError::QueryFailed)?;

                Ok(Message {
                    id: MessageId::from_uuid(
                        row.try_get::<Uuid, _>("id")
                            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                    ),
                    conversation_id: ConversationId::from_uuid(
                        row.try_get::<Uuid, _>("conversation_id")
                            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                    ),
                    role,
                    content: row
                        .try_get("content")
                        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                    created_at: row
                        .try_get("created_at")
                        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        messages.reverse();
        Ok(messages)
    }
}
