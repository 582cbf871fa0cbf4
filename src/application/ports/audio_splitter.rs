use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Physically splits a source file into sequential, zero-overlap segments of
/// roughly `chunk_duration_secs` each (the last one may be shorter), written
/// into `out_dir`. Returns the segment paths in chronological order.
#[async_trait]
pub trait AudioSplitter: Send + Sync {
    async fn split(
        &self,
        source: &Path,
        chunk_duration_secs: f64,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, SplitToolError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SplitToolError {
    #[error("split tool failed: {0}")]
    ToolFailed(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
