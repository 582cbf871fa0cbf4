use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::application::ports::{AudioSplitter, MediaProbe, SpeechToText};
use crate::domain::{AudioSource, ChunkPlan, PlannedChunk};

use super::transcription_service::TranscriptionError;

/// Knobs for the chunked transcription path. Defaults mirror the remote
/// endpoint's 10 MiB payload limit.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Files at or below this size take the direct path.
    pub max_direct_bytes: u64,
    /// Fraction of the size budget actually targeted per chunk, leaving
    /// margin for duration-estimation and splitting inaccuracy.
    pub safety_margin: f64,
    /// Planned chunk durations below this floor abort the split: the source
    /// bitrate is too high for the budget and retrying won't help.
    pub min_chunk_secs: f64,
    /// Produced chunks are re-checked against this fraction of
    /// `max_direct_bytes`; anything above it gets split again.
    pub recheck_factor: f64,
    /// Chunks below this size are treated as encoding artifacts and skipped.
    pub min_chunk_bytes: u64,
    /// Ceiling on nested re-split attempts for one oversized chunk.
    pub max_split_depth: u32,
    /// Simultaneous in-flight remote calls per scheduler run.
    pub max_concurrent: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_direct_bytes: 10 * 1024 * 1024,
            safety_margin: 0.85,
            min_chunk_secs: 30.0,
            recheck_factor: 0.95,
            min_chunk_bytes: 10 * 1024,
            max_split_depth: 3,
            max_concurrent: 5,
        }
    }
}

impl ChunkingConfig {
    /// Stricter size bound applied to produced chunks, absorbing the
    /// estimation error the planner may have made.
    pub fn recheck_bytes(&self) -> u64 {
        (self.max_direct_bytes as f64 * self.recheck_factor) as u64
    }
}

/// Seconds per segment so each lands near the margin-adjusted size budget,
/// assuming roughly constant bitrate across the file.
pub fn plan_chunk_duration(
    size_bytes: u64,
    duration_secs: f64,
    target_max_bytes: u64,
    safety_margin: f64,
) -> f64 {
    let target = target_max_bytes as f64 * safety_margin;
    (target / size_bytes as f64) * duration_secs
}

enum ChunkOutcome {
    Text(String),
    /// Near-zero chunk treated as an empty success.
    Skipped,
    Failed,
}

/// Bounded-concurrency fan-out over one chunk plan, with recursive
/// re-splitting of chunks that remain oversized.
///
/// Each `run` invocation, nested ones included, allocates its own semaphore
/// with `max_concurrent` permits. Peak concurrency across deep recursion can
/// therefore exceed the nominal cap; the cap is per plan, not per request.
pub struct ChunkScheduler {
    speech: Arc<dyn SpeechToText>,
    probe: Arc<dyn MediaProbe>,
    splitter: Arc<dyn AudioSplitter>,
    config: ChunkingConfig,
}

impl ChunkScheduler {
    pub fn new(
        speech: Arc<dyn SpeechToText>,
        probe: Arc<dyn MediaProbe>,
        splitter: Arc<dyn AudioSplitter>,
        config: ChunkingConfig,
    ) -> Self {
        Self {
            speech,
            probe,
            splitter,
            config,
        }
    }

    /// Split `source` into segments under `workdir` and transcribe them.
    /// `depth` counts nested re-split attempts; the caller owns `workdir`.
    pub fn split_and_run<'a>(
        &'a self,
        source: &'a AudioSource,
        workdir: &'a Path,
        depth: u32,
    ) -> Pin<Box<dyn Future<Output = Result<String, TranscriptionError>> + Send + 'a>> {
        Box::pin(async move {
            if depth >= self.config.max_split_depth {
                tracing::warn!(
                    depth,
                    path = %source.path().display(),
                    "Re-split depth ceiling reached, giving up on this chunk"
                );
                return Err(TranscriptionError::RecursionExhausted { depth });
            }

            let plan = self.plan(source, workdir, depth).await?;
            self.run(plan, workdir, depth).await
        })
    }

    /// Compute the split plan and physically produce the segment files.
    async fn plan(
        &self,
        source: &AudioSource,
        workdir: &Path,
        depth: u32,
    ) -> Result<ChunkPlan, TranscriptionError> {
        let duration_secs = match source.duration_secs.filter(|d| *d > 0.0) {
            Some(d) => d,
            None => self
                .probe
                .duration_secs(source.path())
                .await
                .filter(|d| *d > 0.0)
                .ok_or_else(|| TranscriptionError::ProbeFailed {
                    path: source.path.clone(),
                })?,
        };

        let chunk_secs = plan_chunk_duration(
            source.size_bytes,
            duration_secs,
            self.config.max_direct_bytes,
            self.config.safety_margin,
        );
        if chunk_secs < self.config.min_chunk_secs {
            return Err(TranscriptionError::SplitInfeasible {
                chunk_secs,
                floor: self.config.min_chunk_secs,
            });
        }

        tracing::info!(
            size_bytes = source.size_bytes,
            duration_secs,
            chunk_secs,
            depth,
            "Splitting source into segments"
        );

        let paths = self
            .splitter
            .split(source.path(), chunk_secs, workdir)
            .await
            .map_err(|e| TranscriptionError::SplitFailed(e.to_string()))?;
        if paths.is_empty() {
            return Err(TranscriptionError::SplitFailed(
                "no segments produced".to_string(),
            ));
        }

        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let size_bytes = tokio::fs::metadata(&path).await?.len();
            sources.push(AudioSource::new(path, size_bytes, None));
        }

        Ok(ChunkPlan::new(chunk_secs, sources))
    }

    /// Fan out all chunks of one plan under a fresh limiter, wait for every
    /// outcome (no fail-fast), and merge successful texts in index order.
    async fn run(
        &self,
        plan: ChunkPlan,
        workdir: &Path,
        depth: u32,
    ) -> Result<String, TranscriptionError> {
        let total = plan.len();
        let chunk_secs = plan.chunk_duration_secs;
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));

        let tasks = plan.chunks.into_iter().map(|chunk| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let index = chunk.index;
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return (index, ChunkOutcome::Failed),
                };

                let outcome = self.process_chunk(&chunk, workdir, depth, total).await;

                // The chunk file is deleted exactly once, on every path,
                // before the outcome is reported.
                if let Err(e) = tokio::fs::remove_file(chunk.source.path()).await {
                    tracing::warn!(
                        error = %e,
                        chunk = index,
                        path = %chunk.source.path().display(),
                        "Could not delete chunk file"
                    );
                }

                (index, outcome)
            }
        });

        let mut outcomes = join_all(tasks).await;
        outcomes.sort_by_key(|(index, _)| *index);

        let mut succeeded = 0usize;
        let mut failed = 0usize;
        let mut parts = Vec::new();
        for (_, outcome) in outcomes {
            match outcome {
                ChunkOutcome::Text(text) => {
                    succeeded += 1;
                    if !text.is_empty() {
                        parts.push(text);
                    }
                }
                ChunkOutcome::Skipped => succeeded += 1,
                ChunkOutcome::Failed => failed += 1,
            }
        }

        if succeeded == 0 && failed > 0 {
            return Err(TranscriptionError::AllChunksFailed { failed });
        }

        tracing::info!(
            total,
            succeeded,
            failed,
            depth,
            chunk_secs,
            "Merged chunk transcripts"
        );
        Ok(parts.join("\n\n"))
    }

    async fn process_chunk(
        &self,
        chunk: &PlannedChunk,
        workdir: &Path,
        depth: u32,
        total: usize,
    ) -> ChunkOutcome {
        let index = chunk.index;
        let size_bytes = chunk.source.size_bytes;

        if size_bytes < self.config.min_chunk_bytes {
            tracing::debug!(chunk = index, size_bytes, "Skipping near-empty chunk");
            return ChunkOutcome::Skipped;
        }

        if size_bytes > self.config.recheck_bytes() {
            tracing::warn!(
                chunk = index,
                size_bytes,
                recheck_bytes = self.config.recheck_bytes(),
                "Chunk still oversized after split, splitting again"
            );
            return self.resplit_chunk(chunk, workdir, depth).await;
        }

        tracing::debug!(chunk = index, total, size_bytes, "Transcribing chunk");
        let data = match tokio::fs::read(chunk.source.path()).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, chunk = index, "Could not read chunk file");
                return ChunkOutcome::Failed;
            }
        };

        match self.speech.transcribe(&data).await {
            Ok(text) => {
                tracing::debug!(chunk = index, chars = text.len(), "Chunk transcribed");
                ChunkOutcome::Text(text)
            }
            Err(e) => {
                tracing::warn!(error = %e, chunk = index, "Chunk transcription failed");
                ChunkOutcome::Failed
            }
        }
    }

    /// Recurse into one oversized chunk with its own working directory keyed
    /// by depth and index, so sibling recursions cannot collide.
    async fn resplit_chunk(
        &self,
        chunk: &PlannedChunk,
        workdir: &Path,
        depth: u32,
    ) -> ChunkOutcome {
        let subdir = workdir.join(format!("d{}-c{}", depth + 1, chunk.index));
        if let Err(e) = tokio::fs::create_dir_all(&subdir).await {
            tracing::warn!(error = %e, chunk = chunk.index, "Could not create re-split directory");
            return ChunkOutcome::Failed;
        }

        let result = self.split_and_run(&chunk.source, &subdir, depth + 1).await;

        if let Err(e) = tokio::fs::remove_dir_all(&subdir).await {
            tracing::warn!(error = %e, dir = %subdir.display(), "Could not remove re-split directory");
        }

        match result {
            Ok(text) => ChunkOutcome::Text(text),
            Err(e) => {
                tracing::warn!(error = %e, chunk = chunk.index, "Nested split failed");
                ChunkOutcome::Failed
            }
        }
    }
}
