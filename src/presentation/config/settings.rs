use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub openrouter: OpenRouterSettings,
    pub media: MediaSettings,
    pub transcription: TranscriptionSettings,
    pub chat: ChatSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenRouterSettings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub transcription_model: String,
    pub chat_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    /// Root directory for uploads, downloads and chunk workspaces.
    pub root: PathBuf,
    pub max_upload_mb: usize,
}

/// Chunked-pipeline knobs. Defaults track the remote endpoint's payload
/// limit; override only when that limit changes.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionSettings {
    pub max_direct_bytes: u64,
    pub safety_margin: f64,
    pub min_chunk_secs: f64,
    pub max_split_depth: u32,
    pub max_concurrent: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSettings {
    pub history_limit: usize,
}

impl Settings {
    /// Build settings from environment variables. Only the database URL and
    /// the OpenRouter key are mandatory; everything else has a default.
    pub fn from_env() -> Result<Self, SettingsError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| SettingsError::Missing("DATABASE_URL"))?;
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| SettingsError::Missing("OPENROUTER_API_KEY"))?;

        Ok(Self {
            server: ServerSettings {
                host: env_or("SERVER_HOST", "0.0.0.0"),
                port: env_parsed("SERVER_PORT", 3000)?,
            },
            database: DatabaseSettings {
                url: database_url,
                max_connections: env_parsed("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            openrouter: OpenRouterSettings {
                api_key,
                base_url: std::env::var("OPENROUTER_BASE_URL").ok(),
                transcription_model: env_or(
                    "OPENROUTER_TRANSCRIPTION_MODEL",
                    "google/gemini-2.0-flash-001",
                ),
                chat_model: env_or("OPENROUTER_CHAT_MODEL", "google/gemini-2.0-flash-001"),
            },
            media: MediaSettings {
                root: PathBuf::from(env_or("MEDIA_ROOT", "./media")),
                max_upload_mb: env_parsed("MAX_UPLOAD_MB", 500)?,
            },
            transcription: TranscriptionSettings {
                max_direct_bytes: env_parsed("MAX_DIRECT_BYTES", 10 * 1024 * 1024)?,
                safety_margin: env_parsed("CHUNK_SAFETY_MARGIN", 0.85)?,
                min_chunk_secs: env_parsed("MIN_CHUNK_SECS", 30.0)?,
                max_split_depth: env_parsed("MAX_SPLIT_DEPTH", 3)?,
                max_concurrent: env_parsed("MAX_CONCURRENT_TRANSCRIPTIONS", 5)?,
            },
            chat: ChatSettings {
                history_limit: env_parsed("CHAT_HISTORY_LIMIT", 20)?,
            },
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, SettingsError> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| SettingsError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("environment variable {0} has an invalid value")]
    Invalid(&'static str),
}
