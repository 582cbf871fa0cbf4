use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::ConversationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TranscriptionId(Uuid);

impl TranscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TranscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// What kind of media a transcription came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.to_lowercase();
        if mime.starts_with("audio/") {
            Some(MediaKind::Audio)
        } else if mime.starts_with("video/") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "m4a" | "mp3" | "wav" | "ogg" | "oga" | "opus" | "flac" | "aac" => {
                Some(MediaKind::Audio)
            }
            "mp4" | "mov" | "mkv" | "webm" | "avi" => Some(MediaKind::Video),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "AUDIO",
            MediaKind::Video => "VIDEO",
        }
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AUDIO" => Ok(MediaKind::Audio),
            "VIDEO" => Ok(MediaKind::Video),
            _ => Err(format!("Invalid media kind: {}", s)),
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A completed transcription with its generated metadata.
#[derive(Debug, Clone)]
pub struct TranscriptionRecord {
    pub id: TranscriptionId,
    pub conversation_id: ConversationId,
    pub text: String,
    pub title: String,
    pub summary: String,
    pub source_kind: MediaKind,
    pub duration_secs: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl TranscriptionRecord {
    pub fn new(
        conversation_id: ConversationId,
        text: String,
        title: String,
        summary: String,
        source_kind: MediaKind,
        duration_secs: Option<f64>,
    ) -> Self {
        Self {
            id: TranscriptionId::new(),
            conversation_id,
            text,
            title,
            summary,
            source_kind,
            duration_secs,
            created_at: Utc::now(),
        }
    }
}
