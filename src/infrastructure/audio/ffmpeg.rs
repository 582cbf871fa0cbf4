use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::application::ports::{AudioExtractor, AudioSplitter, ExtractError, SplitToolError};

const TOOL_TIMEOUT: Duration = Duration::from_secs(300);

/// ffmpeg-backed audio tooling: whole-file segmentation via the segment
/// muxer and audio-track extraction from video containers. Both operations
/// try a lossless stream copy first and fall back to re-encoding only when
/// the codec cannot be copied.
pub struct FfmpegAudio {
    ffmpeg_bin: String,
}

impl FfmpegAudio {
    pub fn new() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".to_string(),
        }
    }

    pub fn with_binary(ffmpeg_bin: impl Into<String>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
        }
    }

    async fn run_tool(&self, args: &[&str]) -> Result<Output, String> {
        let output = tokio::time::timeout(
            TOOL_TIMEOUT,
            Command::new(&self.ffmpeg_bin)
                .args(args)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| format!("ffmpeg timed out after {}s", TOOL_TIMEOUT.as_secs()))?
        .map_err(|e| format!("could not spawn ffmpeg: {}", e))?;
        Ok(output)
    }
}

impl Default for FfmpegAudio {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioSplitter for FfmpegAudio {
    async fn split(
        &self,
        source: &Path,
        chunk_duration_secs: f64,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, SplitToolError> {
        let src = source.to_string_lossy().to_string();
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("m4a")
            .to_string();
        let segment_time = format!("{:.3}", chunk_duration_secs);

        // Single segment-muxer pass over the whole file: far cheaper than
        // extracting N chunks one by one.
        let copy_pattern = out_dir.join(format!("chunk_%03d.{}", ext));
        let copy_pattern_str = copy_pattern.to_string_lossy().to_string();
        let copy_args = [
            "-i",
            src.as_str(),
            "-f",
            "segment",
            "-segment_time",
            segment_time.as_str(),
            "-c",
            "copy",
            "-reset_timestamps",
            "1",
            "-y",
            copy_pattern_str.as_str(),
        ];

        let output = self
            .run_tool(&copy_args)
            .await
            .map_err(SplitToolError::ToolFailed)?;

        let produced_ext = if output.status.success() {
            ext
        } else {
            tracing::warn!(
                source = %source.display(),
                "Stream-copy split failed, re-encoding segments"
            );
            // Non-segmentable codec: trade fidelity for robustness.
            let reencode_pattern = out_dir.join("chunk_%03d.mp3");
            let reencode_pattern_str = reencode_pattern.to_string_lossy().to_string();
            let reencode_args = [
                "-i",
                src.as_str(),
                "-f",
                "segment",
                "-segment_time",
                segment_time.as_str(),
                "-acodec",
                "libmp3lame",
                "-ar",
                "16000",
                "-ac",
                "1",
                "-b:a",
                "64k",
                "-reset_timestamps",
                "1",
                "-y",
                reencode_pattern_str.as_str(),
            ];
            let output = self
                .run_tool(&reencode_args)
                .await
                .map_err(SplitToolError::ToolFailed)?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(SplitToolError::ToolFailed(format!(
                    "segment pass failed: {}",
                    stderr.chars().take(500).collect::<String>()
                )));
            }
            "mp3".to_string()
        };

        let mut segments = Vec::new();
        let mut entries = tokio::fs::read_dir(out_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("chunk_") && name.ends_with(&format!(".{}", produced_ext)) {
                segments.push(path);
            }
        }
        segments.sort();

        Ok(segments)
    }
}

#[async_trait]
impl AudioExtractor for FfmpegAudio {
    async fn extract(&self, video: &Path, out_path: &Path) -> Result<PathBuf, ExtractError> {
        let src = video.to_string_lossy().to_string();
        let dst = out_path.to_string_lossy().to_string();

        let copy_args = ["-i", src.as_str(), "-vn", "-acodec", "copy", "-y", dst.as_str()];
        let output = self
            .run_tool(&copy_args)
            .await
            .map_err(ExtractError::ToolFailed)?;

        if !output.status.success() {
            tracing::warn!(
                video = %video.display(),
                "Audio stream copy failed, re-encoding to AAC"
            );
            let reencode_args = [
                "-i",
                src.as_str(),
                "-vn",
                "-acodec",
                "aac",
                "-b:a",
                "128k",
                "-y",
                dst.as_str(),
            ];
            let output = self
                .run_tool(&reencode_args)
                .await
                .map_err(ExtractError::ToolFailed)?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(ExtractError::ToolFailed(
                    stderr.chars().take(500).collect::<String>(),
                ));
            }
        }

        if !tokio::fs::try_exists(out_path).await? {
            return Err(ExtractError::NoOutput);
        }

        Ok(out_path.to_path_buf())
    }
}
