#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for the SnapClip pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Timeout and cancellation support via tokio
//! - Duration probing and scene change detection
//! - Per-aspect clip rendering with subtitle burn-in and branding overlay
//! - Subtitle generation from an external transcription command

pub mod command;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod overlay;
pub mod probe;
pub mod progress;
pub mod render;
pub mod scene;
pub mod subtitles;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner, TranscodeEngine};
pub use error::{MediaError, MediaResult};
pub use filters::{aspect_filter, build_filter_graph};
pub use fs_utils::{ensure_dir, remove_partial_output};
pub use overlay::{OverlayConfig, DEFAULT_OVERLAY_INSET};
pub use probe::{DurationProber, FfprobeDurationProber};
pub use progress::{FfmpegProgress, ProgressCallback};
pub use render::AspectRenderer;
pub use scene::{
    FfmpegSceneDetector, SceneDetector, SceneOutputParser, ShowinfoParser, DEFAULT_SCENE_THRESHOLD,
};
pub use subtitles::{prepare_subtitles, write_srt_file, CommandSubtitleSource, SubtitleSource};
