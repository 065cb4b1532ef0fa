//! Clip generation pipeline.
//!
//! probe → detect → select → window → dedup → render each span in every
//! aspect profile. Artifacts come back in span order, then aspect order.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

use snapclip_media::{
    ensure_dir, remove_partial_output, AspectRenderer, DurationProber, FfmpegRunner,
    FfmpegSceneDetector, FfprobeDurationProber, SceneDetector, TranscodeEngine,
};
use snapclip_models::{AspectProfile, ClipArtifact, RenderRequest, Span};

use crate::config::{FailurePolicy, PipelineConfig};
use crate::dedup::dedup_spans;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::RunLogger;
use crate::metrics;
use crate::selection::select_candidates;
use crate::window::build_window;

/// Inputs of one `generate_clips` call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Source media file
    pub input: PathBuf,
    /// Directory clips are written into (created if missing)
    pub output_dir: PathBuf,
    /// Requested number of clips
    pub clip_count: usize,
    /// Target clip length in seconds
    pub clip_len: f64,
    /// Scene change sensitivity (0.0 - 1.0)
    pub scene_threshold: f64,
    /// SRT file burned into every clip
    pub subtitles: Option<PathBuf>,
    /// Branding image composited bottom-right
    pub overlay: Option<PathBuf>,
}

impl GenerateRequest {
    /// Request using the clip count, length and threshold from `config`.
    pub fn new(input: impl AsRef<Path>, output_dir: impl AsRef<Path>, config: &PipelineConfig) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            clip_count: config.clip_count,
            clip_len: config.clip_len,
            scene_threshold: config.scene_threshold,
            subtitles: None,
            overlay: None,
        }
    }

    pub fn with_subtitles(mut self, subtitles: Option<PathBuf>) -> Self {
        self.subtitles = subtitles;
        self
    }

    pub fn with_overlay(mut self, overlay: Option<PathBuf>) -> Self {
        self.overlay = overlay;
        self
    }

    fn validate(&self) -> PipelineResult<()> {
        if !(self.clip_len.is_finite() && self.clip_len > 0.0) {
            return Err(PipelineError::invalid_config(format!(
                "clip_len must be positive, got {}",
                self.clip_len
            )));
        }
        if !(0.0..=1.0).contains(&self.scene_threshold) {
            return Err(PipelineError::invalid_config(format!(
                "scene_threshold must be within [0, 1], got {}",
                self.scene_threshold
            )));
        }
        Ok(())
    }
}

/// Spans chosen for a run, before any rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanPlan {
    /// Media duration in seconds
    pub duration: f64,
    /// Number of detected scene changes
    pub scene_count: usize,
    /// Deduplicated spans, sorted by start
    pub spans: Vec<Span>,
}

/// A render that did not produce an artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFailure {
    pub span: Span,
    pub aspect: AspectProfile,
    pub error: String,
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: String,
    /// Media duration in seconds
    pub duration: f64,
    pub scene_count: usize,
    pub spans: Vec<Span>,
    pub artifacts: Vec<ClipArtifact>,
    /// Only populated under [`FailurePolicy::BestEffort`]
    pub failures: Vec<RenderFailure>,
}

impl RunReport {
    /// Whether every planned render produced an artifact.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The clip generation pipeline over injectable media capabilities.
#[derive(Debug, Clone)]
pub struct ClipPipeline<P, D, E> {
    prober: P,
    detector: D,
    renderer: AspectRenderer<E>,
    config: PipelineConfig,
}

impl ClipPipeline<FfprobeDurationProber, FfmpegSceneDetector, FfmpegRunner> {
    /// Pipeline backed by the FFmpeg binaries on `PATH`.
    pub fn ffmpeg(config: PipelineConfig) -> Self {
        let runner = FfmpegRunner::new().with_timeout(config.render_timeout);
        Self::new(FfprobeDurationProber::new(), FfmpegSceneDetector::new(), runner, config)
    }
}

impl<P, D, E> ClipPipeline<P, D, E>
where
    P: DurationProber,
    D: SceneDetector,
    E: TranscodeEngine,
{
    pub fn new(prober: P, detector: D, engine: E, config: PipelineConfig) -> Self {
        let renderer = AspectRenderer::new(engine)
            .with_encoding(config.encoding.clone())
            .with_overlay_opacity(config.overlay_opacity);
        Self {
            prober,
            detector,
            renderer,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Probe, detect, select, window and dedup. Nothing is rendered.
    pub async fn plan_spans(&self, request: &GenerateRequest) -> PipelineResult<SpanPlan> {
        request.validate()?;

        let duration = self
            .prober
            .probe_duration(&request.input)
            .await
            .map_err(|source| PipelineError::Probe {
                input: request.input.clone(),
                source,
            })?;

        let scenes = self
            .detector
            .detect_scenes(&request.input, request.scene_threshold)
            .await
            .map_err(|source| PipelineError::Detection {
                input: request.input.clone(),
                threshold: request.scene_threshold,
                source,
            })?;
        metrics::record_scenes_detected(scenes.len());

        if scenes.is_empty() {
            debug!(duration, "No scene changes detected, spacing anchors evenly");
        }

        let anchors = select_candidates(duration, request.clip_count, &scenes);
        let half = request.clip_len / 2.0;
        let windows: Vec<Span> = anchors
            .iter()
            .filter_map(|&t| build_window(t, half, duration, self.config.min_clip_len))
            .collect();
        let spans = dedup_spans(windows, self.config.min_gap);

        debug!(
            anchors = anchors.len(),
            spans = spans.len(),
            "Planned clip spans"
        );

        Ok(SpanPlan {
            duration,
            scene_count: scenes.len(),
            spans,
        })
    }

    /// Run the whole pipeline and report what was produced.
    pub async fn run(&self, request: &GenerateRequest) -> PipelineResult<RunReport> {
        let logger = RunLogger::new("generate_clips");
        let span = logger.create_span();

        let result = self.run_logged(request, &logger).instrument(span).await;

        match &result {
            Ok(report) if report.is_complete() => metrics::record_run("success"),
            Ok(_) => metrics::record_run("partial"),
            Err(e) => {
                logger.log_error(&format!("{} stage failed: {}", e.stage(), e));
                metrics::record_run("failed");
            }
        }
        result
    }

    /// Run the pipeline and return the produced artifacts.
    ///
    /// Under [`FailurePolicy::BestEffort`] failed renders are logged and
    /// omitted; use [`ClipPipeline::run`] to inspect them.
    pub async fn generate_clips(&self, request: &GenerateRequest) -> PipelineResult<Vec<ClipArtifact>> {
        Ok(self.run(request).await?.artifacts)
    }

    async fn run_logged(&self, request: &GenerateRequest, logger: &RunLogger) -> PipelineResult<RunReport> {
        logger.log_start(&request.input.display().to_string());

        let plan = self.plan_spans(request).await?;
        logger.log_progress(&format!(
            "duration {:.3}s, {} scene changes, {} spans",
            plan.duration,
            plan.scene_count,
            plan.spans.len()
        ));

        ensure_dir(&request.output_dir).await?;

        // Missing subtitle or overlay files are skipped by the renderer
        let requests: Vec<RenderRequest> = plan
            .spans
            .iter()
            .flat_map(|&span| {
                AspectProfile::ALL.into_iter().map(move |aspect| (span, aspect))
            })
            .map(|(span, aspect)| {
                RenderRequest::new(&request.input, span, aspect, &request.output_dir)
                    .with_subtitles(request.subtitles.clone())
                    .with_overlay(request.overlay.clone())
            })
            .collect();

        let (artifacts, failures) = self.render_all(requests).await?;

        let report = RunReport {
            run_id: logger.run_id().to_string(),
            duration: plan.duration,
            scene_count: plan.scene_count,
            spans: plan.spans,
            artifacts,
            failures,
        };

        if report.is_complete() {
            logger.log_completion(&format!("{} clips", report.artifacts.len()));
        } else {
            logger.log_warning(&format!(
                "{} clips, {} renders failed",
                report.artifacts.len(),
                report.failures.len()
            ));
        }
        Ok(report)
    }

    /// Render in order with at most `max_parallel_renders` in flight.
    async fn render_all(
        &self,
        requests: Vec<RenderRequest>,
    ) -> PipelineResult<(Vec<ClipArtifact>, Vec<RenderFailure>)> {
        let total = requests.len();
        let renderer = &self.renderer;
        let mut results = stream::iter(requests)
            .map(|request| async move {
                let started = Instant::now();
                let result = renderer.render(&request).await;
                (request, result, started.elapsed().as_secs_f64())
            })
            .buffered(self.config.max_parallel_renders.max(1));

        let mut artifacts = Vec::with_capacity(total);
        let mut failures = Vec::new();

        while let Some((request, result, elapsed)) = results.next().await {
            match result {
                Ok(artifact) => {
                    metrics::record_clip_rendered(request.aspect, elapsed);
                    info!(
                        clip = artifacts.len() + 1,
                        total,
                        path = %artifact.path.display(),
                        "Clip ready"
                    );
                    artifacts.push(artifact);
                }
                Err(source) => {
                    metrics::record_render_failure(request.aspect);
                    remove_partial_output(request.output_path()).await;
                    if let Some(tail) = source.stderr_tail(5) {
                        debug!(stderr = %tail, "Transcoder output");
                    }

                    let err = PipelineError::Render {
                        span: request.span,
                        aspect: request.aspect,
                        source,
                    };

                    // Cancellation stops the run under every policy
                    if err.is_cancelled() {
                        return Err(err);
                    }

                    match self.config.failure_policy {
                        FailurePolicy::Abort => return Err(err),
                        FailurePolicy::BestEffort => {
                            warn!(error = %err, "Render failed, continuing");
                            failures.push(RenderFailure {
                                span: request.span,
                                aspect: request.aspect,
                                error: err.to_string(),
                            });
                        }
                    }
                }
            }
        }

        Ok((artifacts, failures))
    }
}

/// Generate clips with the FFmpeg-backed defaults.
///
/// Equivalent to building a [`ClipPipeline::ffmpeg`] from
/// [`PipelineConfig::default`] and running a [`GenerateRequest`].
pub async fn generate_clips(
    input: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    clip_count: usize,
    clip_len: f64,
    scene_threshold: f64,
    subtitles: Option<PathBuf>,
    overlay: Option<PathBuf>,
) -> PipelineResult<Vec<ClipArtifact>> {
    let config = PipelineConfig::default();
    let request = GenerateRequest {
        input: input.as_ref().to_path_buf(),
        output_dir: output_dir.as_ref().to_path_buf(),
        clip_count,
        clip_len,
        scene_threshold,
        subtitles,
        overlay,
    };
    ClipPipeline::ffmpeg(config).generate_clips(&request).await
}
