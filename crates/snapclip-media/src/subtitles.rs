//! Subtitle generation from an external transcription engine.
//!
//! The engine is any command that takes the media path as its last argument
//! and prints JSON segments on stdout, either as a bare array or wrapped in
//! `{"segments": [...]}` (the shape Whisper-style tools emit).

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

use snapclip_models::{to_srt, SubtitleSegment};

use crate::error::{MediaError, MediaResult};

/// Produces timed text for a media file.
#[async_trait]
pub trait SubtitleSource: Send + Sync {
    async fn transcribe(&self, input: &Path) -> MediaResult<Vec<SubtitleSegment>>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SegmentsOutput {
    Bare(Vec<SubtitleSegment>),
    Wrapped { segments: Vec<SubtitleSegment> },
}

/// Parse transcription JSON into segments, dropping empty or inverted cues.
pub fn parse_segments(stdout: &[u8]) -> MediaResult<Vec<SubtitleSegment>> {
    let segments = match serde_json::from_slice::<SegmentsOutput>(stdout)? {
        SegmentsOutput::Bare(segments) => segments,
        SegmentsOutput::Wrapped { segments } => segments,
    };
    Ok(segments
        .into_iter()
        .filter(|s| s.start.is_finite() && s.end.is_finite() && s.end > s.start)
        .filter(|s| !s.text.trim().is_empty())
        .collect())
}

/// [`SubtitleSource`] running an external transcription command.
#[derive(Debug, Clone)]
pub struct CommandSubtitleSource {
    program: String,
    args: Vec<String>,
}

impl CommandSubtitleSource {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Build from a whitespace-separated command line, e.g. `"transcribe --model base"`.
    pub fn from_command_line(line: &str) -> MediaResult<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| MediaError::invalid_argument("Empty transcription command"))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Append an argument passed before the media path.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl SubtitleSource for CommandSubtitleSource {
    async fn transcribe(&self, input: &Path) -> MediaResult<Vec<SubtitleSegment>> {
        if !input.exists() {
            return Err(MediaError::FileNotFound(input.to_path_buf()));
        }

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MediaError::SubtitlesFailed(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::SubtitlesFailed(format!(
                "{} exited with status {:?}: {}",
                self.program,
                output.status.code(),
                stderr.lines().last().unwrap_or_default()
            )));
        }

        parse_segments(&output.stdout)
    }
}

/// Write segments to `path` as SRT.
pub async fn write_srt_file(path: &Path, segments: &[SubtitleSegment]) -> MediaResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, to_srt(segments)).await?;
    Ok(())
}

/// Transcribe `input` into an SRT file at `srt_path`.
///
/// Failures are logged and yield `None`; clips are then rendered without
/// subtitles. An empty transcription also yields `None`.
pub async fn prepare_subtitles<S: SubtitleSource + ?Sized>(
    source: &S,
    input: &Path,
    srt_path: &Path,
) -> Option<PathBuf> {
    let segments = match source.transcribe(input).await {
        Ok(segments) => segments,
        Err(e) => {
            warn!(input = %input.display(), error = %e, "Transcription failed, continuing without subtitles");
            return None;
        }
    };

    if segments.is_empty() {
        info!(input = %input.display(), "Transcription produced no segments");
        return None;
    }

    match write_srt_file(srt_path, &segments).await {
        Ok(()) => {
            info!(path = %srt_path.display(), cues = segments.len(), "Subtitles written");
            Some(srt_path.to_path_buf())
        }
        Err(e) => {
            warn!(path = %srt_path.display(), error = %e, "Failed to write subtitles");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixed(MediaResult<Vec<SubtitleSegment>>);

    #[async_trait]
    impl SubtitleSource for Fixed {
        async fn transcribe(&self, _input: &Path) -> MediaResult<Vec<SubtitleSegment>> {
            match &self.0 {
                Ok(segments) => Ok(segments.clone()),
                Err(e) => Err(MediaError::SubtitlesFailed(e.to_string())),
            }
        }
    }

    #[test]
    fn test_parse_bare_and_wrapped() {
        let bare = br#"[{"start": 0.0, "end": 1.5, "text": " hello "}]"#;
        assert_eq!(parse_segments(bare).unwrap().len(), 1);

        let wrapped = br#"{"segments": [
            {"start": 0.0, "end": 1.5, "text": "hello"},
            {"start": 2.0, "end": 1.0, "text": "inverted"},
            {"start": 3.0, "end": 4.0, "text": "   "}
        ]}"#;
        let segments = parse_segments(wrapped).unwrap();
        assert_eq!(segments, vec![SubtitleSegment::new(0.0, 1.5, "hello")]);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(parse_segments(b"nope"), Err(MediaError::JsonParse(_))));
    }

    #[test]
    fn test_from_command_line() {
        let source = CommandSubtitleSource::from_command_line("whisper-json --model base").unwrap();
        assert_eq!(source.program(), "whisper-json");
        assert_eq!(source.args(), ["--model", "base"]);
        assert!(CommandSubtitleSource::from_command_line("   ").is_err());
    }

    #[tokio::test]
    async fn test_write_srt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("subs.srt");
        write_srt_file(&path, &[SubtitleSegment::new(1.0, 2.5, "hi")])
            .await
            .unwrap();
        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.starts_with("1\n00:00:01,000 --> 00:00:02,500\nhi\n"));
    }

    #[tokio::test]
    async fn test_prepare_subtitles_failure_yields_none() {
        let dir = TempDir::new().unwrap();
        let srt = dir.path().join("subs.srt");
        let source = Fixed(Err(MediaError::internal("model missing")));
        assert!(prepare_subtitles(&source, Path::new("in.mp4"), &srt).await.is_none());
        assert!(!srt.exists());
    }

    #[tokio::test]
    async fn test_prepare_subtitles_writes_file() {
        let dir = TempDir::new().unwrap();
        let srt = dir.path().join("subs.srt");
        let source = Fixed(Ok(vec![SubtitleSegment::new(0.0, 1.0, "one")]));
        let path = prepare_subtitles(&source, Path::new("in.mp4"), &srt).await;
        assert_eq!(path.as_deref(), Some(srt.as_path()));
        assert!(srt.is_file());
    }

    #[tokio::test]
    async fn test_command_source_missing_program() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"x").unwrap();
        let source = CommandSubtitleSource::new("snapclip-definitely-not-installed");
        let err = source.transcribe(&input).await.unwrap_err();
        assert!(matches!(err, MediaError::SubtitlesFailed(_)));
    }
}
