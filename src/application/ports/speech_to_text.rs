use async_trait::async_trait;

/// One remote speech-to-text call. No retry policy lives here; splitting and
/// retries are the caller's concern.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio_data: &[u8]) -> Result<String, SpeechToTextError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SpeechToTextError {
    /// The endpoint rejected the payload size (HTTP 413). The only failure
    /// that justifies splitting upstream.
    #[error("payload too large for remote endpoint")]
    PayloadTooLarge,
    #[error("remote endpoint unavailable: {0}")]
    Unavailable(String),
    #[error("transcription failed: {0}")]
    Other(String),
}
