use std::sync::Arc;

use serde::Deserialize;

use crate::application::ports::{ChatModel, ChatModelError, ChatTurn, CompletionParams, TurnRole};
use crate::domain::{Message, MessageRole};

/// Max transcript characters fed into the metadata prompt.
const METADATA_EXCERPT_CHARS: usize = 1200;
const METADATA_TEMPERATURE: f32 = 0.1;
const TITLE_MAX_CHARS: usize = 35;
const SUMMARY_MAX_CHARS: usize = 80;

const TRANSCRIPT_REQUEST_KEYWORDS: [&str; 6] = [
    "full transcript",
    "full transcription",
    "show transcript",
    "view transcript",
    "show me the transcript",
    "give me transcript",
];

#[derive(Debug, Clone, Deserialize)]
pub struct MediaMetadata {
    pub title: String,
    pub summary: String,
}

/// Conversational Q&A grounded in a stored transcript, plus metadata
/// generation for freshly transcribed media.
pub struct ChatService {
    model: Arc<dyn ChatModel>,
}

impl ChatService {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Answer a question in the context of a transcript and prior turns.
    /// An explicit request for the full transcript is served verbatim from
    /// storage instead of round-tripping through the model.
    pub async fn answer(
        &self,
        question: &str,
        transcript: Option<&str>,
        history: &[Message],
    ) -> Result<String, ChatError> {
        if let Some(transcript) = transcript {
            if wants_full_transcript(question) {
                tracing::debug!("Returning stored transcript verbatim");
                return Ok(transcript.to_string());
            }
        }

        let mut turns = Vec::with_capacity(history.len() + 2);
        if let Some(transcript) = transcript.filter(|t| !t.trim().is_empty()) {
            turns.push(ChatTurn::system(grounding_prompt(transcript)));
        }
        for message in history {
            turns.push(ChatTurn {
                role: match message.role {
                    MessageRole::System => TurnRole::System,
                    MessageRole::User => TurnRole::User,
                    MessageRole::Assistant => TurnRole::Assistant,
                },
                content: message.content.clone(),
            });
        }
        turns.push(ChatTurn::user(question));

        self.model
            .complete(&turns, CompletionParams::default())
            .await
            .map_err(ChatError::Model)
    }

    /// Generate a title and summary for a transcript. Never fails: if the
    /// model response is missing or unparsable, a heuristic fallback is used.
    pub async fn generate_metadata(&self, transcript: &str) -> MediaMetadata {
        match self.request_metadata(transcript).await {
            Ok(metadata) => {
                tracing::info!(title = %metadata.title, "Generated media metadata");
                metadata
            }
            Err(e) => {
                tracing::warn!(error = %e, "Metadata generation failed, using fallback");
                fallback_metadata(transcript)
            }
        }
    }

    async fn request_metadata(&self, transcript: &str) -> Result<MediaMetadata, ChatError> {
        let excerpt = truncate_chars(transcript, METADATA_EXCERPT_CHARS);

        let system = format!(
            "You are a metadata generator for audio/video transcriptions.\n\
             You MUST return ONLY valid JSON with exactly two string fields: \
             \"title\" and \"summary\". No other text, no markdown, just pure JSON.\n\n\
             Guidelines:\n\
             - title: concise, descriptive (max {TITLE_MAX_CHARS} chars). Format: \"Topic\" or \"Speaker - Topic\"\n\
             - summary: keywords separated by commas (max {SUMMARY_MAX_CHARS} chars)"
        );
        let user = format!(
            "Analyze this transcript and generate metadata:\n\n{excerpt}...\n\nReturn JSON:"
        );

        let turns = [ChatTurn::system(system), ChatTurn::user(user)];
        let response = self
            .model
            .complete(
                &turns,
                CompletionParams {
                    temperature: METADATA_TEMPERATURE,
                },
            )
            .await
            .map_err(ChatError::Model)?;

        let clean = strip_code_fences(&response);
        serde_json::from_str(clean).map_err(|e| ChatError::InvalidMetadata(e.to_string()))
    }
}

fn wants_full_transcript(question: &str) -> bool {
    let lower = question.to_lowercase();
    TRANSCRIPT_REQUEST_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn grounding_prompt(transcript: &str) -> String {
    format!(
        "You are an AI assistant specialized in analyzing audio/video content.\n\n\
         IMPORTANT: The content of the audio/video has ALREADY BEEN TRANSCRIBED \
         and is provided below. Analyze directly based on the provided transcription.\n\n\
         === TRANSCRIPTION CONTENT ===\n{transcript}\n=== END OF TRANSCRIPTION ===\n\n\
         Instructions:\n\
         - Answer questions in the context of the transcription above.\n\
         - If the user asks about things outside this context, answer like a \
         normal assistant instead of forcing the transcription in.\n\
         - Answer in the user's language unless asked otherwise."
    )
}

/// Heuristic metadata when the model cannot produce valid JSON.
fn fallback_metadata(transcript: &str) -> MediaMetadata {
    let title: String = transcript
        .split_whitespace()
        .take(6)
        .collect::<Vec<_>>()
        .join(" ");
    let title = if title.is_empty() {
        format!(
            "Transcription {}",
            chrono::Utc::now().format("%d/%m %H:%M")
        )
    } else if title.chars().count() > TITLE_MAX_CHARS {
        format!("{}...", truncate_chars(&title, TITLE_MAX_CHARS - 3))
    } else {
        title
    };

    let summary_limit = SUMMARY_MAX_CHARS - 3;
    let summary = if transcript.chars().count() > summary_limit {
        format!("{}...", truncate_chars(transcript, summary_limit))
    } else {
        transcript.to_string()
    };

    MediaMetadata { title, summary }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Models often wrap JSON in markdown fences despite instructions.
fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("model: {0}")]
    Model(ChatModelError),
    #[error("invalid metadata response: {0}")]
    InvalidMetadata(String),
}
