use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    System,
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::System => "system",
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CompletionParams {
    pub temperature: f32,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self { temperature: 1.0 }
    }
}

/// Generic chat completion against the remote model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        turns: &[ChatTurn],
        params: CompletionParams,
    ) -> Result<String, ChatModelError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ChatModelError {
    #[error("remote endpoint unavailable: {0}")]
    Unavailable(String),
    #[error("empty completion")]
    EmptyResponse,
    #[error("completion failed: {0}")]
    Other(String),
}
