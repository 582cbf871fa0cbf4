use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::application::ports::{FetchError, MediaFetcher};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_EXTENSION: &str = "m4a";

/// Streaming HTTP download for direct and storage-service media URLs.
pub struct HttpMediaFetcher {
    client: reqwest::Client,
}

impl HttpMediaFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpMediaFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension from the URL path (query params ignored), then Content-Type.
fn infer_extension(url: &Url, content_type: Option<&str>) -> String {
    if let Some(ext) = url.path().rsplit('.').next() {
        if !ext.contains('/') && ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return ext.to_lowercase();
        }
    }

    match content_type {
        Some(ct) if ct.contains("mp4") => "mp4".to_string(),
        Some(ct) if ct.contains("m4a") => "m4a".to_string(),
        Some(ct) if ct.contains("mpeg") || ct.contains("mp3") => "mp3".to_string(),
        Some(ct) if ct.contains("wav") => "wav".to_string(),
        Some(ct) if ct.contains("ogg") => "ogg".to_string(),
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, url: &Url, dest_dir: &Path) -> Result<PathBuf, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| FetchError::DownloadFailed(format!("request: {}", e)))?;

        if !response.status().is_success() {
            return Err(FetchError::DownloadFailed(format!(
                "status {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let extension = infer_extension(url, content_type.as_deref());
        let dest = dest_dir.join(format!("media.{}", extension));

        let mut file = tokio::fs::File::create(&dest).await?;
        let mut stream = response.bytes_stream();
        let mut total_bytes: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let bytes =
                chunk.map_err(|e| FetchError::DownloadFailed(format!("stream: {}", e)))?;
            total_bytes += bytes.len() as u64;
            file.write_all(&bytes).await?;
        }
        file.flush().await?;

        tracing::info!(bytes = total_bytes, path = %dest.display(), "Media downloaded");
        Ok(dest)
    }
}
