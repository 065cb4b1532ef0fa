//! Render requests and produced clip artifacts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{AspectProfile, Span};

/// Everything needed to produce one output clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RenderRequest {
    /// Source media file
    pub input: PathBuf,
    /// Source time range
    pub span: Span,
    /// Output framing
    pub aspect: AspectProfile,
    /// Directory the clip is written into
    pub output_dir: PathBuf,
    /// Optional SRT file burned into the frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<PathBuf>,
    /// Optional branding image composited bottom-right
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<PathBuf>,
}

impl RenderRequest {
    /// Create a request without subtitles or overlay.
    pub fn new(
        input: impl AsRef<Path>,
        span: Span,
        aspect: AspectProfile,
        output_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            span,
            aspect,
            output_dir: output_dir.as_ref().to_path_buf(),
            subtitles: None,
            overlay: None,
        }
    }

    /// Attach a subtitle track.
    pub fn with_subtitles(mut self, subtitles: Option<PathBuf>) -> Self {
        self.subtitles = subtitles;
        self
    }

    /// Attach an overlay image.
    pub fn with_overlay(mut self, overlay: Option<PathBuf>) -> Self {
        self.overlay = overlay;
        self
    }

    /// Output filename, derived from the span start and aspect name.
    pub fn output_filename(&self) -> String {
        format!("clip_{:08}_{}.mp4", self.span.start_millis(), self.aspect)
    }

    /// Full output path.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(self.output_filename())
    }
}

/// A produced output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipArtifact {
    /// Path of the written clip
    pub path: PathBuf,
    /// Source range the clip was cut from
    pub span: Span,
    /// Framing of the clip
    pub aspect: AspectProfile,
}

impl ClipArtifact {
    /// Filename component of the artifact path.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}
