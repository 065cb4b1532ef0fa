//! Per-aspect clip rendering.
//!
//! One [`RenderRequest`] maps to exactly one transcode. Subtitle and overlay
//! references that do not exist on disk are dropped from the filter graph
//! rather than failing the render.

use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use snapclip_models::{ClipArtifact, EncodingConfig, RenderRequest};

use crate::command::{FfmpegCommand, TranscodeEngine};
use crate::error::{MediaError, MediaResult};
use crate::filters::build_filter_graph;
use crate::overlay::OverlayConfig;

/// Renders one span in one aspect profile through a [`TranscodeEngine`].
#[derive(Debug, Clone)]
pub struct AspectRenderer<E> {
    engine: E,
    encoding: EncodingConfig,
    overlay_opacity: f32,
}

impl<E: TranscodeEngine> AspectRenderer<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            encoding: EncodingConfig::default(),
            overlay_opacity: 1.0,
        }
    }

    /// Override output encoding.
    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    /// Opacity applied to overlay images.
    pub fn with_overlay_opacity(mut self, opacity: f32) -> Self {
        self.overlay_opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Build the transcode command for a request.
    pub fn build_command(&self, request: &RenderRequest) -> FfmpegCommand {
        let subtitles = existing(request.subtitles.as_deref(), "subtitles");
        let overlay = existing(request.overlay.as_deref(), "overlay")
            .map(|path| OverlayConfig::new(path).with_opacity(self.overlay_opacity));

        // Input seek restarts timestamps at zero; subtitles are timed from span.start
        let graph = build_filter_graph(
            request.aspect,
            subtitles,
            request.span.start,
            overlay.as_ref(),
        );

        FfmpegCommand::new(&request.input, request.output_path())
            .seek(request.span.start)
            .duration(request.span.render_duration())
            .video_filter(graph)
            .encoding(&self.encoding)
    }

    /// Render a request into its output file.
    ///
    /// Partial output from a failed transcode is left in place.
    pub async fn render(&self, request: &RenderRequest) -> MediaResult<ClipArtifact> {
        if !request.input.exists() {
            return Err(MediaError::FileNotFound(request.input.clone()));
        }

        let cmd = self.build_command(request);
        let started = Instant::now();

        info!(
            span = %request.span,
            aspect = %request.aspect,
            output = %cmd.output().display(),
            "Rendering clip"
        );

        self.engine.transcode(&cmd).await?;

        debug!(
            output = %cmd.output().display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Clip rendered"
        );

        Ok(ClipArtifact {
            path: cmd.output().to_path_buf(),
            span: request.span,
            aspect: request.aspect,
        })
    }
}

/// Keep an optional asset reference only if it points at an existing file.
fn existing<'a>(path: Option<&'a Path>, kind: &str) -> Option<&'a Path> {
    let path = path?;
    if path.is_file() {
        Some(path)
    } else {
        match kind {
            "subtitles" => warn!(path = %path.display(), "Subtitle file missing, rendering without subtitles"),
            _ => debug!(path = %path.display(), kind, "Asset missing, skipping"),
        }
        None
    }
}
