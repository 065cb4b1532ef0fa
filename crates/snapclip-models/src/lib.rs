//! Shared data models for the SnapClip pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Source time spans and their validation
//! - Aspect profiles (portrait, square, landscape)
//! - Render requests and produced clip artifacts
//! - Encoding configuration
//! - Timecode and SRT subtitle formatting

pub mod aspect;
pub mod clip;
pub mod encoding;
pub mod span;
pub mod subtitle;
pub mod timestamp;

// Re-export common types
pub use aspect::{AspectProfile, AspectProfileParseError};
pub use clip::{ClipArtifact, RenderRequest};
pub use encoding::EncodingConfig;
pub use span::{Span, SpanError, MIN_RENDER_DURATION_SECS};
pub use subtitle::{to_srt, SubtitleSegment};
pub use timestamp::{
    format_seconds, format_srt_time, parse_srt_time, parse_timestamp, sec_to_tc, TimestampError,
};
