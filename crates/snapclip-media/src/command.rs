//! FFmpeg command builder and runner.
//!
//! [`FfmpegCommand`] is a declarative description of one transcode; the
//! [`TranscodeEngine`] trait is the seam through which it is executed, so
//! callers can substitute a fake engine that only records commands.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use snapclip_models::EncodingConfig;

use crate::error::{MediaError, MediaResult};
use crate::progress::{FfmpegProgress, ProgressCallback};

/// Number of diagnostic stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 40;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add an input argument (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add an output argument (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set seek position (before input, fast seek).
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    /// Limit the amount of input read.
    pub fn duration(self, seconds: f64) -> Self {
        self.input_arg("-t").input_arg(format!("{:.3}", seconds))
    }

    /// Set video filter graph.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Apply codec, pixel format and container settings.
    pub fn encoding(self, encoding: &EncodingConfig) -> Self {
        self.output_args(encoding.to_ffmpeg_args())
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Input file path.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Output file path.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Value following `flag` in the argument list, if present.
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.input_args
            .iter()
            .chain(self.output_args.iter())
            .skip_while(|a| a.as_str() != flag)
            .nth(1)
            .map(String::as_str)
    }

    /// Build the command arguments.
    ///
    /// Paths are passed through as-is, so non-UTF-8 file names survive.
    pub fn build_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        if self.overwrite {
            args.push("-y".into());
        }

        args.push("-hide_banner".into());
        args.push("-v".into());
        args.push(self.log_level.as_str().into());

        // Progress output to stderr
        args.push("-progress".into());
        args.push("pipe:2".into());

        args.extend(self.input_args.iter().map(OsString::from));

        args.push("-i".into());
        args.push(self.input.as_os_str().to_owned());

        args.extend(self.output_args.iter().map(OsString::from));

        args.push(self.output.as_os_str().to_owned());

        args
    }

    /// Seconds of media this command is expected to produce, from `-t`.
    pub fn expected_duration(&self) -> Option<f64> {
        self.arg_value("-t")?.parse().ok()
    }
}

/// Space-joined arguments for log output.
pub(crate) fn display_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// External transcoding capability.
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// Execute one transcode to completion.
    async fn transcode(&self, cmd: &FfmpegCommand) -> MediaResult<()>;
}

/// Runner for FFmpeg commands with progress tracking, timeout and cancellation.
///
/// Child processes are spawned with `kill_on_drop`, so dropping an in-flight
/// `run` future terminates the transcode.
#[derive(Clone, Default)]
pub struct FfmpegRunner {
    /// FFmpeg binary; resolved from `PATH` when unset
    program: Option<PathBuf>,
    /// Cancellation signal receiver
    cancel_rx: Option<watch::Receiver<bool>>,
    /// Hard limit per invocation
    timeout: Option<Duration>,
    /// Progress observer
    progress: Option<Arc<ProgressCallback>>,
}

impl std::fmt::Debug for FfmpegRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegRunner")
            .field("program", &self.program)
            .field("cancellable", &self.cancel_rx.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

enum WaitOutcome {
    Exited(std::io::Result<ExitStatus>),
    TimedOut(Duration),
    Cancelled,
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific FFmpeg binary instead of the one on `PATH`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set progress observer.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Run an FFmpeg command.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let program = match &self.program {
            Some(program) => program.clone(),
            None => check_ffmpeg()?,
        };

        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", program.display(), display_args(&args));

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stderr not captured"))?;
        let callback = self.progress.clone();
        let expected = cmd.expected_duration();

        // Progress lines and diagnostics share stderr. Read raw bytes so a
        // non-UTF-8 line never stops the drain and stalls FFmpeg on a full pipe.
        let reader = tokio::spawn(async move {
            let mut stderr = BufReader::new(stderr);
            let mut buf = Vec::new();
            let mut progress = FfmpegProgress::default();
            let mut diagnostics: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

            loop {
                buf.clear();
                match stderr.read_until(b'\n', &mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']);

                if is_progress_line(line) {
                    if let Some(snapshot) = progress.apply_line(line) {
                        trace!(
                            out_time_ms = snapshot.out_time_ms,
                            speed = snapshot.speed,
                            fraction = expected.map(|total| snapshot.fraction_of(total)),
                            "FFmpeg progress"
                        );
                        if let Some(cb) = &callback {
                            cb(snapshot);
                        }
                    }
                } else {
                    if diagnostics.len() == STDERR_TAIL_LINES {
                        diagnostics.pop_front();
                    }
                    diagnostics.push_back(line.to_string());
                }
            }

            Vec::from(diagnostics).join("\n")
        });

        let outcome = {
            let wait = child.wait();
            tokio::pin!(wait);
            tokio::select! {
                status = &mut wait => WaitOutcome::Exited(status),
                _ = deadline(self.timeout) => WaitOutcome::TimedOut(self.timeout.unwrap_or_default()),
                _ = cancelled(self.cancel_rx.clone()) => WaitOutcome::Cancelled,
            }
        };

        let status = match outcome {
            WaitOutcome::Exited(status) => status?,
            WaitOutcome::TimedOut(limit) => {
                warn!("FFmpeg timed out after {} seconds, killing process", limit.as_secs());
                let _ = child.kill().await;
                let _ = reader.await;
                return Err(MediaError::Timeout(limit.as_secs()));
            }
            WaitOutcome::Cancelled => {
                info!("FFmpeg cancelled, killing process");
                let _ = child.kill().await;
                let _ = reader.await;
                return Err(MediaError::Cancelled);
            }
        };

        let diagnostics = reader.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                (!diagnostics.is_empty()).then_some(diagnostics),
                status.code(),
            ))
        }
    }
}

#[async_trait]
impl TranscodeEngine for FfmpegRunner {
    async fn transcode(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run(cmd).await
    }
}

/// `-progress` lines are bare `key=value` pairs.
fn is_progress_line(line: &str) -> bool {
    match line.trim().split_once('=') {
        Some((key, _)) => !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'),
        None => false,
    }
}

async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(limit) => tokio::time::sleep(limit).await,
        None => std::future::pending().await,
    }
}

/// Resolves once the cancel flag flips to `true`; never if there is no sender.
async fn cancelled(rx: Option<watch::Receiver<bool>>) {
    let Some(mut rx) = rx else {
        return std::future::pending().await;
    };
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return std::future::pending().await;
        }
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}
