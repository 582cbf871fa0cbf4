use std::path::{Path, PathBuf};

use async_trait::async_trait;
use url::Url;

/// Downloads remote media into `dest_dir` and returns the local file path.
/// The caller owns the returned file and the directory.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, dest_dir: &Path) -> Result<PathBuf, FetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("unsupported url: {0}")]
    UnsupportedUrl(String),
    #[error("downloaded file missing: {0}")]
    MissingOutput(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
