use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Extracts the audio track of a video file into `out_path`.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    async fn extract(&self, video: &Path, out_path: &Path) -> Result<PathBuf, ExtractError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("extraction tool failed: {0}")]
    ToolFailed(String),
    #[error("no audio file produced")]
    NoOutput,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
