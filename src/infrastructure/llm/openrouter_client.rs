use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::application::ports::{
    ChatModel, ChatModelError, ChatTurn, CompletionParams, SpeechToText, SpeechToTextError,
};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const CHAT_TIMEOUT: Duration = Duration::from_secs(30);
const TRANSCRIBE_TIMEOUT: Duration = Duration::from_secs(120);

/// OpenRouter chat-completions client, doubling as the speech-to-text
/// endpoint: audio goes out base64-encoded as an `input_audio` content part
/// of a single chat turn.
pub struct OpenRouterClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenRouterClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), api_key, model)
    }

    pub fn with_base_url(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn post_completion(
        &self,
        body: serde_json::Value,
        timeout: Duration,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(timeout)
            .send()
            .await
    }

    fn extract_content(response: CompletionResponse) -> Option<String> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
    }
}

#[async_trait]
impl SpeechToText for OpenRouterClient {
    async fn transcribe(&self, audio_data: &[u8]) -> Result<String, SpeechToTextError> {
        let encoded = BASE64.encode(audio_data);
        let body = json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": "Transcribe this audio accurately." },
                    { "type": "input_audio", "input_audio": { "data": encoded, "format": "mp3" } }
                ]
            }]
        });

        tracing::debug!(bytes = audio_data.len(), "Sending audio for transcription");

        let response = self
            .post_completion(body, TRANSCRIBE_TIMEOUT)
            .await
            .map_err(|e| SpeechToTextError::Unavailable(format!("request: {}", e)))?;

        let status = response.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            return Err(SpeechToTextError::PayloadTooLarge);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(SpeechToTextError::Unavailable(format!(
                "status {}: {}",
                status,
                body.chars().take(500).collect::<String>()
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| SpeechToTextError::Other(format!("parse response: {}", e)))?;

        let text = Self::extract_content(parsed)
            .ok_or_else(|| SpeechToTextError::Other("no completion content".to_string()))?;

        tracing::info!(chars = text.len(), "Transcription completed");
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl ChatModel for OpenRouterClient {
    async fn complete(
        &self,
        turns: &[ChatTurn],
        params: CompletionParams,
    ) -> Result<String, ChatModelError> {
        let messages: Vec<_> = turns
            .iter()
            .map(|turn| {
                json!({
                    "role": turn.role.as_str(),
                    "content": turn.content,
                })
            })
            .collect();
        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": params.temperature,
        });

        tracing::debug!(turns = turns.len(), "Requesting chat completion");

        let response = self
            .post_completion(body, CHAT_TIMEOUT)
            .await
            .map_err(|e| ChatModelError::Unavailable(format!("request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ChatModelError::Unavailable(format!(
                "status {}: {}",
                status,
                body.chars().take(500).collect::<String>()
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatModelError::Other(format!("parse response: {}", e)))?;

        let content =
            Self::extract_content(parsed).ok_or(ChatModelError::EmptyResponse)?;

        tracing::debug!(chars = content.len(), "Chat completion received");
        Ok(content)
    }
}
