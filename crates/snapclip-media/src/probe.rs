//! Media duration probing via FFprobe.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Reports the total playback length of a media file.
#[async_trait]
pub trait DurationProber: Send + Sync {
    /// Duration of `path` in seconds.
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64>;
}

/// FFprobe JSON output format (only the fields we read).
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// [`DurationProber`] backed by the `ffprobe` binary.
#[derive(Debug, Clone, Default)]
pub struct FfprobeDurationProber;

impl FfprobeDurationProber {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DurationProber for FfprobeDurationProber {
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }

        let program = check_ffprobe()?;

        let output = Command::new(program)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "json",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(MediaError::ffprobe_failed(
                format!("FFprobe exited with status {:?}", output.status.code()),
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }

        let duration = parse_duration_output(&output.stdout)?;
        debug!(path = %path.display(), duration, "Probed media duration");
        Ok(duration)
    }
}

/// Extract `format.duration` from FFprobe JSON output.
pub fn parse_duration_output(stdout: &[u8]) -> MediaResult<f64> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let raw = probe
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| MediaError::ffprobe_failed("No duration in container metadata", None))?;

    let duration: f64 = raw
        .trim()
        .parse()
        .map_err(|_| MediaError::ffprobe_failed(format!("Non-numeric duration: {raw}"), None))?;

    if !duration.is_finite() || duration < 0.0 {
        return Err(MediaError::ffprobe_failed(
            format!("Invalid duration: {raw}"),
            None,
        ));
    }

    Ok(duration)
}
