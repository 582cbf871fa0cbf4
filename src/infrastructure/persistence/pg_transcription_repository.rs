use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{RepositoryError, TranscriptionRepository};
use crate::domain::{ConversationId, MediaKind, TranscriptionId, TranscriptionRecord};

pub struct PgTranscriptionRepository {
    pool: PgPool,
}

impl PgTranscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: PgRow) -> Result<TranscriptionRecord, RepositoryError> {
    let query_err = |e: sqlx::Error| RepositoryError::QueryFailed(e.to_string());

    let source_kind: String = row.try_get("source_kind").map_err(query_err)?;
    let source_kind = source_kind
        .parse::<MediaKind>()
        .map_err(RepositoryError::QueryFailed)?;

    Ok(TranscriptionRecord {
        id: TranscriptionId::from_uuid(row.try_get::<Uuid, _>("id").map_err(query_err)?),
        conversation_id: ConversationId::from_uuid(
            row.try_get::<Uuid, _>("conversation_id").map_err(query_err)?,
        ),
        text: row.try_get("text").map_err(query_err)?,
        title: row.try_get("title").map_err(query_err)?,
        summary: row.try_get("summary").map_err(query_err)?,
        source_kind,
        duration_secs: row
            .try_get::<Option<f64>, _>("duration_secs")
            .map_err(query_err)?,
        created_at: row.try_get("created_at").map_err(query_err)?,
    })
}

#[async_trait]
impl TranscriptionRepository for PgTranscriptionRepository {
    #[instrument(skip(self, record), fields(transcription_id = %record.id.as_uuid()))]
    async fn create(&self, record: &TranscriptionRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO transcriptions
                (id, conversation_id, text, title, summary, source_kind, duration_secs, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.conversation_id.as_uuid())
        .bind(&record.text)
        .bind(&record.title)
        .bind(&record.summary)
        .bind(record.source_kind.as_str())
        .bind(record.duration_secs)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(transcription_id = %id.as_uuid()))]
    async fn get_by_id(
        &self,
        id: TranscriptionId,
    ) -> Result<Option<TranscriptionRecord>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, conversation_id, text, title, summary, source_kind, duration_secs, created_at
            FROM transcriptions
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.map(record_from_row).transpose()
    }

    #[instrument(skip(self), fields(conversation_id = %conversation_id.as_uuid()))]
    async fn get_for_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<TranscriptionRecord>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, conversation_id, text, title, summary, source_kind, duration_secs, created_at
            FROM transcriptions
            WHERE conversation_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(conversation_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.map(record_from_row).transpose()
    }
}
