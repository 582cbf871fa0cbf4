use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::application::ports::{AudioSplitter, MediaProbe, SpeechToText, SpeechToTextError};
use crate::domain::AudioSource;

use super::chunking::{ChunkScheduler, ChunkingConfig};

/// Top-level transcription entry point.
///
/// Sources at or below the direct limit go out in a single remote call;
/// larger sources are split and fanned out by [`ChunkScheduler`]. Every
/// request gets a fresh, uniquely-named working directory under the temp
/// root, removed on every exit path.
pub struct TranscriptionService {
    speech: Arc<dyn SpeechToText>,
    probe: Arc<dyn MediaProbe>,
    splitter: Arc<dyn AudioSplitter>,
    config: ChunkingConfig,
    temp_root: PathBuf,
}

impl TranscriptionService {
    pub fn new(
        speech: Arc<dyn SpeechToText>,
        probe: Arc<dyn MediaProbe>,
        splitter: Arc<dyn AudioSplitter>,
        config: ChunkingConfig,
        temp_root: PathBuf,
    ) -> Self {
        Self {
            speech,
            probe,
            splitter,
            config,
            temp_root,
        }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    pub async fn transcribe(&self, path: &Path) -> Result<String, TranscriptionError> {
        let size_bytes = tokio::fs::metadata(path).await?.len();

        if size_bytes <= self.config.max_direct_bytes {
            tracing::info!(
                size_bytes,
                path = %path.display(),
                "Source within direct limit, single remote call"
            );
            let data = tokio::fs::read(path).await?;
            // A 413 here stays terminal: chunking is triggered by local file
            // size only, never reactively by a remote rejection.
            return self
                .speech
                .transcribe(&data)
                .await
                .map_err(TranscriptionError::Remote);
        }

        tracing::info!(
            size_bytes,
            limit = self.config.max_direct_bytes,
            path = %path.display(),
            "Source over direct limit, taking chunked path"
        );

        let duration_secs = self.probe.duration_secs(path).await;
        let source = AudioSource::new(path, size_bytes, duration_secs);

        let workdir = self.temp_root.join(format!("chunks-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&workdir).await?;

        let scheduler = ChunkScheduler::new(
            Arc::clone(&self.speech),
            Arc::clone(&self.probe),
            Arc::clone(&self.splitter),
            self.config,
        );
        let result = scheduler.split_and_run(&source, &workdir, 0).await;

        if let Err(e) = tokio::fs::remove_dir_all(&workdir).await {
            tracing::warn!(
                error = %e,
                dir = %workdir.display(),
                "Could not remove chunk working directory"
            );
        }

        result
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("remote transcription failed: {0}")]
    Remote(SpeechToTextError),
    #[error("could not determine duration of {}", path.display())]
    ProbeFailed { path: PathBuf },
    #[error("planned chunk duration {chunk_secs:.1}s is below the {floor:.0}s floor")]
    SplitInfeasible { chunk_secs: f64, floor: f64 },
    #[error("split failed: {0}")]
    SplitFailed(String),
    #[error("all {failed} chunks failed to transcribe")]
    AllChunksFailed { failed: usize },
    #[error("re-split depth ceiling reached at depth {depth}")]
    RecursionExhausted { depth: u32 },
}
