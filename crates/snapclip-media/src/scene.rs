//! Scene change detection.
//!
//! FFmpeg's `select='gt(scene,T)'` filter keeps only frames whose difference
//! score against the previous frame exceeds `T`; `showinfo` then logs one
//! diagnostic line per kept frame. Turning that text into timestamps is the
//! job of a [`SceneOutputParser`], so the scraping strategy can be replaced
//! (e.g. by a structured metadata dump) without touching callers.
//!
//! Finding no scene change is a normal outcome and yields an empty list.

use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::process::Command;
use tracing::{debug, info};

use crate::command::{check_ffmpeg, display_args, FfmpegCommand};
use crate::error::{MediaError, MediaResult};

/// Default sensitivity: higher means fewer detections.
pub const DEFAULT_SCENE_THRESHOLD: f64 = 0.3;

/// Finds visual discontinuities in a media file.
#[async_trait]
pub trait SceneDetector: Send + Sync {
    /// Sorted, deduplicated scene change timestamps (seconds, millisecond precision).
    async fn detect_scenes(&self, path: &Path, threshold: f64) -> MediaResult<Vec<f64>>;
}

/// Turns detection engine diagnostics into raw timestamps.
pub trait SceneOutputParser: Send + Sync {
    fn parse(&self, output: &str) -> Vec<f64>;
}

static PTS_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"pts_time:\s*(-?\d+(?:\.\d+)?)").expect("valid pts_time pattern")
});

/// Scrapes `pts_time:` markers from `showinfo` log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShowinfoParser;

impl SceneOutputParser for ShowinfoParser {
    fn parse(&self, output: &str) -> Vec<f64> {
        output
            .lines()
            .filter(|line| line.contains("showinfo"))
            .filter_map(|line| PTS_TIME.captures(line))
            .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
            .collect()
    }
}

/// Round to milliseconds, drop negatives and non-finite values, sort, dedup.
pub fn normalize_timestamps(raw: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut millis: Vec<i64> = raw
        .into_iter()
        .filter(|t| t.is_finite() && *t >= 0.0)
        .map(|t| (t * 1000.0).round() as i64)
        .collect();
    millis.sort_unstable();
    millis.dedup();
    millis.into_iter().map(|ms| ms as f64 / 1000.0).collect()
}

/// Build the `select`+`showinfo` filter for a threshold.
pub fn scene_filter(threshold: f64) -> String {
    format!("select='gt(scene,{:.3})',showinfo", threshold)
}

/// [`SceneDetector`] running FFmpeg and parsing its diagnostics.
#[derive(Debug, Clone, Default)]
pub struct FfmpegSceneDetector<P = ShowinfoParser> {
    parser: P,
    program: Option<PathBuf>,
}

impl FfmpegSceneDetector<ShowinfoParser> {
    pub fn new() -> Self {
        Self {
            parser: ShowinfoParser,
            program: None,
        }
    }
}

impl<P: SceneOutputParser> FfmpegSceneDetector<P> {
    /// Use a different output parser.
    pub fn with_parser(parser: P) -> Self {
        Self {
            parser,
            program: None,
        }
    }

    /// Use a specific FFmpeg binary instead of the one on `PATH`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// The decode-only command used for detection.
    pub fn build_command(&self, path: &Path, threshold: f64) -> FfmpegCommand {
        // showinfo reports at info level
        FfmpegCommand::new(path, "-")
            .log_level("info")
            .video_filter(scene_filter(threshold))
            .output_args(["-an", "-f", "null"])
    }
}

#[async_trait]
impl<P: SceneOutputParser> SceneDetector for FfmpegSceneDetector<P> {
    async fn detect_scenes(&self, path: &Path, threshold: f64) -> MediaResult<Vec<f64>> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(MediaError::invalid_argument(format!(
                "Scene threshold must be within [0, 1], got {threshold}"
            )));
        }

        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }

        let program = match &self.program {
            Some(program) => program.clone(),
            None => check_ffmpeg()?,
        };
        let args = self.build_command(path, threshold).build_args();
        debug!("Running scene detection: {} {}", program.display(), display_args(&args));

        let output = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let message = match output.status.code() {
                Some(code) => format!("FFmpeg exited with status {code}"),
                None => "FFmpeg terminated by signal".to_string(),
            };
            return Err(MediaError::detection_failed(message, Some(stderr.into_owned())));
        }

        let scenes = normalize_timestamps(self.parser.parse(&stderr));
        info!(
            path = %path.display(),
            threshold,
            scenes = scenes.len(),
            "Scene detection complete"
        );
        Ok(scenes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOWINFO_SAMPLE: &str = "\
Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'in.mp4':
[Parsed_showinfo_1 @ 0x5581] config in time_base: 1/12800, frame_rate: 25/1
[Parsed_showinfo_1 @ 0x5581] n:   0 pts: 156160 pts_time:12.2     duration:    512 fmt:yuv420p
[Parsed_showinfo_1 @ 0x5581] n:   1 pts: 384000 pts_time:30.00049 duration:    512 fmt:yuv420p
[Parsed_showinfo_1 @ 0x5581] n:   2 pts: 384006 pts_time:30.0002  duration:    512 fmt:yuv420p
[Parsed_showinfo_1 @ 0x5581] n:   3 pts:  64000 pts_time:5       duration:    512 fmt:yuv420p
frame=    4 fps=0.0 q=-0.0 Lsize=N/A time=00:00:59.96 bitrate=N/A speed= 180x
progress=end
";

    #[test]
    fn test_showinfo_parser() {
        let raw = ShowinfoParser.parse(SHOWINFO_SAMPLE);
        assert_eq!(raw, vec![12.2, 30.00049, 30.0002, 5.0]);
    }

    #[test]
    fn test_normalize_sorts_and_dedups() {
        let scenes = normalize_timestamps(ShowinfoParser.parse(SHOWINFO_SAMPLE));
        assert_eq!(scenes, vec![5.0, 12.2, 30.0]);
    }

    #[test]
    fn test_normalize_drops_invalid() {
        let scenes = normalize_timestamps([-0.5, f64::NAN, 1.0004, 1.0]);
        assert_eq!(scenes, vec![1.0]);
    }

    #[test]
    fn test_empty_output_is_empty_result() {
        assert!(normalize_timestamps(ShowinfoParser.parse("")).is_empty());
    }

    #[test]
    fn test_scene_filter() {
        assert_eq!(scene_filter(0.3), "select='gt(scene,0.300)',showinfo");
    }

    #[test]
    fn test_build_command() {
        let cmd = FfmpegSceneDetector::new().build_command(Path::new("in.mp4"), 0.4);
        let args = cmd.build_args();
        let level = args.iter().position(|a| a == "-v").unwrap();
        assert_eq!(args[level + 1], "info");
        assert_eq!(cmd.arg_value("-f"), Some("null"));
        assert_eq!(args.last().and_then(|a| a.to_str()), Some("-"));
    }

    #[tokio::test]
    async fn test_unreadable_input_is_error() {
        let err = FfmpegSceneDetector::new()
            .detect_scenes(Path::new("/nonexistent/video.mp4"), 0.3)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_threshold_out_of_range() {
        let err = FfmpegSceneDetector::new()
            .detect_scenes(Path::new("in.mp4"), 1.5)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidArgument(_)));
    }

    #[test]
    fn test_custom_parser() {
        struct Fixed;
        impl SceneOutputParser for Fixed {
            fn parse(&self, _output: &str) -> Vec<f64> {
                vec![2.0, 1.0]
            }
        }
        let detector = FfmpegSceneDetector::with_parser(Fixed);
        assert_eq!(normalize_timestamps(detector.parser.parse("")), vec![1.0, 2.0]);
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        fn detector_running(dir: &TempDir, body: &str) -> FfmpegSceneDetector {
            let program = dir.path().join("ffmpeg");
            std::fs::write(&program, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
            FfmpegSceneDetector::new().with_program(program)
        }

        fn input(dir: &TempDir) -> PathBuf {
            let path = dir.path().join("in.mp4");
            std::fs::write(&path, b"fake").unwrap();
            path
        }

        #[tokio::test]
        async fn test_scenes_from_stderr() {
            let dir = TempDir::new().unwrap();
            let detector = detector_running(
                &dir,
                "echo '[Parsed_showinfo_1 @ 0x1] n:   0 pts: 1 pts_time:12.5 duration: 1' >&2",
            );
            let scenes = detector.detect_scenes(&input(&dir), 0.3).await.unwrap();
            assert_eq!(scenes, vec![12.5]);
        }

        #[tokio::test]
        async fn test_non_zero_exit_is_detection_failure() {
            let dir = TempDir::new().unwrap();
            let detector = detector_running(&dir, "echo 'moov atom not found' >&2\nexit 1");
            match detector.detect_scenes(&input(&dir), 0.3).await.unwrap_err() {
                MediaError::DetectionFailed { message, stderr } => {
                    assert!(message.contains("status 1"));
                    assert!(stderr.unwrap_or_default().contains("moov atom not found"));
                }
                other => panic!("expected DetectionFailed, got {other:?}"),
            }
        }
    }
}
