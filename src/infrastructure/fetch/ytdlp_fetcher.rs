use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use url::Url;

use crate::application::ports::{FetchError, MediaFetcher};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Platform-URL audio download by shelling out to yt-dlp.
pub struct YtDlpFetcher {
    ytdlp_bin: String,
}

impl YtDlpFetcher {
    pub fn new() -> Self {
        Self {
            ytdlp_bin: "yt-dlp".to_string(),
        }
    }

    pub fn with_binary(ytdlp_bin: impl Into<String>) -> Self {
        Self {
            ytdlp_bin: ytdlp_bin.into(),
        }
    }
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &Url, dest_dir: &Path) -> Result<PathBuf, FetchError> {
        // yt-dlp picks the container, so the template leaves the extension
        // to the tool and the real name is discovered afterwards.
        let template = dest_dir.join("audio.%(ext)s");

        let output = tokio::time::timeout(
            DOWNLOAD_TIMEOUT,
            Command::new(&self.ytdlp_bin)
                .args(["-f", "m4a/bestaudio/best", "--no-playlist", "-o"])
                .arg(&template)
                .arg(url.as_str())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| {
            FetchError::DownloadFailed(format!(
                "yt-dlp timed out after {}s",
                DOWNLOAD_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| FetchError::DownloadFailed(format!("could not spawn yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::DownloadFailed(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.chars().take(300).collect::<String>()
            )));
        }

        let mut entries = tokio::fs::read_dir(dest_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with("audio.") {
                let path = entry.path();
                tracing::info!(path = %path.display(), "Platform media downloaded");
                return Ok(path);
            }
        }

        Err(FetchError::MissingOutput(
            "yt-dlp reported success but produced no file".to_string(),
        ))
    }
}
