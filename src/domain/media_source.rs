use url::Url;

/// Where a piece of media comes from, deciding which fetcher handles it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// A plain file URL on a storage service (Supabase, S3, GCS, Azure blob).
    StorageUrl(Url),
    /// A direct link to an audio/video file.
    DirectUrl(Url),
    /// A platform page (YouTube, Vimeo, ...) that needs an extractor tool.
    PlatformUrl(Url),
}

const STORAGE_PATTERNS: [&str; 4] = [
    "supabase.co/storage/v1/object/public",
    "storage.googleapis.com",
    "s3.amazonaws.com",
    "blob.core.windows.net",
];

const MEDIA_EXTENSIONS: [&str; 11] = [
    "m4a", "mp3", "wav", "ogg", "oga", "opus", "flac", "aac", "mp4", "mov", "webm",
];

impl MediaSource {
    /// Classify a URL. Storage hosts win over everything, a recognizable file
    /// extension marks a direct link, anything else goes to the platform
    /// extractor.
    pub fn classify(url: Url) -> Self {
        let full = url.as_str();
        if STORAGE_PATTERNS.iter().any(|p| full.contains(p)) {
            return MediaSource::StorageUrl(url);
        }

        let has_media_ext = url
            .path()
            .rsplit('.')
            .next()
            .map(|ext| MEDIA_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false);
        if has_media_ext {
            return MediaSource::DirectUrl(url);
        }

        MediaSource::PlatformUrl(url)
    }

    pub fn url(&self) -> &Url {
        match self {
            MediaSource::StorageUrl(u) | MediaSource::DirectUrl(u) | MediaSource::PlatformUrl(u) => {
                u
            }
        }
    }
}
