use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::application::ports::MediaProbe;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Container duration probe via ffprobe. Best-effort by contract: any
/// failure (missing binary, timeout, unparsable output) yields `None`.
pub struct FfprobeProbe {
    ffprobe_bin: String,
}

impl FfprobeProbe {
    pub fn new() -> Self {
        Self {
            ffprobe_bin: "ffprobe".to_string(),
        }
    }

    pub fn with_binary(ffprobe_bin: impl Into<String>) -> Self {
        Self {
            ffprobe_bin: ffprobe_bin.into(),
        }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn duration_secs(&self, path: &Path) -> Option<f64> {
        let result = tokio::time::timeout(
            PROBE_TIMEOUT,
            Command::new(&self.ffprobe_bin)
                .args([
                    "-v",
                    "error",
                    "-show_entries",
                    "format=duration",
                    "-of",
                    "default=noprint_wrappers=1:nokey=1",
                ])
                .arg(path)
                .kill_on_drop(true)
                .output(),
        )
        .await;

        let output = match result {
            Ok(Ok(output)) if output.status.success() => output,
            Ok(Ok(output)) => {
                tracing::debug!(
                    path = %path.display(),
                    status = %output.status,
                    "ffprobe exited with failure"
                );
                return None;
            }
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Could not spawn ffprobe");
                return None;
            }
            Err(_) => {
                tracing::debug!(path = %path.display(), "ffprobe timed out");
                return None;
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        match stdout.trim().parse::<f64>() {
            Ok(duration) if duration.is_finite() && duration > 0.0 => Some(duration),
            _ => {
                tracing::debug!(path = %path.display(), "ffprobe output not a usable duration");
                None
            }
        }
    }
}
