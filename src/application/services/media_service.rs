use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;
use uuid::Uuid;

use crate::application::ports::{
    AudioExtractor, ExtractError, FetchError, MediaFetcher, MediaProbe,
};
use crate::domain::{MediaKind, MediaSource};

use super::transcription_service::{TranscriptionError, TranscriptionService};

/// Resolves a media source (uploaded file or URL) to a local audio file and
/// runs it through the transcription pipeline. Everything this service
/// downloads or derives is deleted before it returns; the caller keeps
/// ownership only of files it handed in itself.
pub struct MediaService {
    transcription: Arc<TranscriptionService>,
    extractor: Arc<dyn AudioExtractor>,
    probe: Arc<dyn MediaProbe>,
    http_fetcher: Arc<dyn MediaFetcher>,
    platform_fetcher: Arc<dyn MediaFetcher>,
    media_root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct MediaTranscript {
    pub text: String,
    pub duration_secs: Option<f64>,
    pub kind: MediaKind,
}

impl MediaService {
    pub fn new(
        transcription: Arc<TranscriptionService>,
        extractor: Arc<dyn AudioExtractor>,
        probe: Arc<dyn MediaProbe>,
        http_fetcher: Arc<dyn MediaFetcher>,
        platform_fetcher: Arc<dyn MediaFetcher>,
        media_root: PathBuf,
    ) -> Self {
        Self {
            transcription,
            extractor,
            probe,
            http_fetcher,
            platform_fetcher,
            media_root,
        }
    }

    pub async fn transcribe_file(
        &self,
        path: &Path,
        kind: MediaKind,
    ) -> Result<MediaTranscript, MediaError> {
        match kind {
            MediaKind::Audio => self.transcribe_audio_file(path, kind).await,
            MediaKind::Video => {
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("extracted");
                let audio_path = path.with_file_name(format!("{}-audio.m4a", stem));

                tracing::debug!(
                    video = %path.display(),
                    audio = %audio_path.display(),
                    "Extracting audio track from video"
                );
                let audio = self
                    .extractor
                    .extract(path, &audio_path)
                    .await
                    .map_err(MediaError::Extraction)?;

                let result = self.transcribe_audio_file(&audio, kind).await;

                if let Err(e) = tokio::fs::remove_file(&audio).await {
                    tracing::warn!(error = %e, path = %audio.display(), "Could not delete extracted audio");
                }

                result
            }
        }
    }

    pub async fn transcribe_url(&self, url: Url) -> Result<MediaTranscript, MediaError> {
        let source = MediaSource::classify(url);
        let dest_dir = self
            .media_root
            .join("downloads")
            .join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&dest_dir)
            .await
            .map_err(|e| MediaError::Fetch(FetchError::Io(e)))?;

        let fetched = match &source {
            MediaSource::StorageUrl(url) | MediaSource::DirectUrl(url) => {
                tracing::info!(url = %url, "Downloading media over HTTP");
                self.http_fetcher.fetch(url, &dest_dir).await
            }
            MediaSource::PlatformUrl(url) => {
                tracing::info!(url = %url, "Downloading media via platform extractor");
                self.platform_fetcher.fetch(url, &dest_dir).await
            }
        };

        let result = match fetched {
            Ok(path) => {
                let kind = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .and_then(MediaKind::from_extension)
                    .unwrap_or(MediaKind::Audio);
                self.transcribe_file(&path, kind).await
            }
            Err(e) => Err(MediaError::Fetch(e)),
        };

        if let Err(e) = tokio::fs::remove_dir_all(&dest_dir).await {
            tracing::warn!(error = %e, dir = %dest_dir.display(), "Could not remove download directory");
        }

        result
    }

    async fn transcribe_audio_file(
        &self,
        path: &Path,
        kind: MediaKind,
    ) -> Result<MediaTranscript, MediaError> {
        let duration_secs = self.probe.duration_secs(path).await;
        let text = self
            .transcription
            .transcribe(path)
            .await
            .map_err(MediaError::Transcription)?;

        Ok(MediaTranscript {
            text,
            duration_secs,
            kind,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("fetch: {0}")]
    Fetch(FetchError),
    #[error("audio extraction: {0}")]
    Extraction(ExtractError),
    #[error("transcription: {0}")]
    Transcription(TranscriptionError),
}
