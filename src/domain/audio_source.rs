use std::path::{Path, PathBuf};

/// Handle to a local audio file owned by the transcription pipeline.
///
/// Ownership transfers with the value; whoever holds it is responsible for
/// the file on disk. `duration_secs` is best-effort probe output and may be
/// absent without failing the pipeline.
#[derive(Debug, Clone)]
pub struct AudioSource {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub duration_secs: Option<f64>,
}

impl AudioSource {
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64, duration_secs: Option<f64>) -> Self {
        Self {
            path: path.into(),
            size_bytes,
            duration_secs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
