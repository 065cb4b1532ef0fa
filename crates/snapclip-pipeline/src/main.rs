//! SnapClip command line entry point.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use snapclip_media::{
    check_ffmpeg, check_ffprobe, prepare_subtitles, CommandSubtitleSource, FfmpegRunner,
    FfmpegSceneDetector, FfprobeDurationProber,
};
use snapclip_pipeline::{
    init_tracing, metrics, ClipPipeline, FailurePolicy, GenerateRequest, PipelineConfig, RunReport,
};

/// Exit status for a run stopped by Ctrl-C.
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "snapclip")]
#[command(about = "Cut short multi-aspect clips around scene changes")]
#[command(version)]
struct Args {
    /// Input video file
    input: PathBuf,

    /// Output directory (created if missing)
    #[arg(short, long, default_value = "clips")]
    output_dir: PathBuf,

    /// Number of clips to cut
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Target clip length in seconds
    #[arg(short = 'l', long)]
    clip_len: Option<f64>,

    /// Scene change threshold (0.0 - 1.0, higher = fewer scenes)
    #[arg(short = 't', long)]
    threshold: Option<f64>,

    /// SRT file burned into every clip
    #[arg(long)]
    subtitles: Option<PathBuf>,

    /// Branding image composited bottom-right
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Transcription command printing JSON segments for the input (used when --subtitles is absent)
    #[arg(long, env = "SNAPCLIP_TRANSCRIBE_CMD")]
    transcribe_cmd: Option<String>,

    /// Keep rendering after a failed clip
    #[arg(long, default_value_t = false)]
    best_effort: bool,

    /// Maximum renders in flight
    #[arg(long)]
    parallel: Option<usize>,

    /// Print a JSON run report instead of one path per line
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Serve Prometheus metrics on this address
    #[arg(long, env = "SNAPCLIP_METRICS_ADDR")]
    metrics_addr: Option<SocketAddr>,
}

impl Args {
    /// Flags win over environment and defaults.
    fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(count) = self.count {
            config.clip_count = count;
        }
        if let Some(len) = self.clip_len {
            config.clip_len = len;
        }
        if let Some(threshold) = self.threshold {
            config.scene_threshold = threshold;
        }
        if let Some(parallel) = self.parallel {
            config.max_parallel_renders = parallel;
        }
        if self.best_effort {
            config.failure_policy = FailurePolicy::BestEffort;
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before clap reads its env fallbacks
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_tracing();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    if let Some(addr) = args.metrics_addr {
        metrics::init_prometheus(addr).context("Failed to install Prometheus recorder")?;
        info!("Serving metrics on {}", addr);
    }

    let config = args.apply(PipelineConfig::from_env());
    config.validate()?;
    info!("Pipeline config: {:?}", config);

    check_ffmpeg().context("FFmpeg is required")?;
    check_ffprobe().context("FFprobe is required")?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received interrupt, cancelling run");
            cancel_tx.send(true).ok();
        }
    });

    let runner = FfmpegRunner::new()
        .with_timeout(config.render_timeout)
        .with_cancel(cancel_rx.clone())
        .with_progress(Box::new(|progress| {
            debug!(
                out_time_ms = progress.out_time_ms,
                speed = progress.speed,
                done = progress.is_complete,
                "Render progress"
            );
        }));
    let pipeline = ClipPipeline::new(
        FfprobeDurationProber::new(),
        FfmpegSceneDetector::new(),
        runner,
        config.clone(),
    );

    let subtitles = match (&args.subtitles, &args.transcribe_cmd) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(cmd)) => {
            let source = CommandSubtitleSource::from_command_line(cmd)?;
            let srt_path = args.output_dir.join("subtitles.srt");
            prepare_subtitles(&source, &args.input, &srt_path).await
        }
        (None, None) => None,
    };

    let request = GenerateRequest::new(&args.input, &args.output_dir, &config)
        .with_subtitles(subtitles)
        .with_overlay(args.overlay.clone());

    let mut interrupted = cancel_rx;
    let result = tokio::select! {
        result = pipeline.run(&request) => result,
        Ok(_) = interrupted.wait_for(|cancelled| *cancelled) => {
            return Ok(ExitCode::from(EXIT_INTERRUPTED));
        }
    };

    let report = match result {
        Ok(report) => report,
        Err(e) if e.is_cancelled() => return Ok(ExitCode::from(EXIT_INTERRUPTED)),
        Err(e) => return Err(e.into()),
    };

    print_report(&report, args.json)?;

    if report.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!("{} renders failed", report.failures.len());
        Ok(ExitCode::FAILURE)
    }
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        for artifact in &report.artifacts {
            println!("{}", artifact.path.display());
        }
        for failure in &report.failures {
            eprintln!("failed: {} {}: {}", failure.span, failure.aspect, failure.error);
        }
    }
    Ok(())
}
