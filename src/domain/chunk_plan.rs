use super::AudioSource;

/// One time-bounded segment of a split source, identified by its position
/// in chronological order.
#[derive(Debug, Clone)]
pub struct PlannedChunk {
    pub index: usize,
    pub source: AudioSource,
}

/// Ordered, gap-free cover of a source file. Indices are contiguous from 0
/// and fix the merge order of the final transcript.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    pub chunk_duration_secs: f64,
    pub chunks: Vec<PlannedChunk>,
}

impl ChunkPlan {
    pub fn new(chunk_duration_secs: f64, sources: Vec<AudioSource>) -> Self {
        let chunks = sources
            .into_iter()
            .enumerate()
            .map(|(index, source)| PlannedChunk { index, source })
            .collect();
        Self {
            chunk_duration_secs,
            chunks,
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
