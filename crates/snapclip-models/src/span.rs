//! Source time spans selected for export.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Shortest duration ever requested from the transcoder.
pub const MIN_RENDER_DURATION_SECS: f64 = 0.1;

/// A `(start, end)` time range in seconds within the source media.
///
/// Invariant: `0 <= start < end`, both finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Span {
    /// Start offset in seconds
    pub start: f64,
    /// End offset in seconds
    pub end: f64,
}

impl Span {
    /// Create a validated span.
    pub fn new(start: f64, end: f64) -> Result<Self, SpanError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(SpanError::NotFinite);
        }
        if start < 0.0 {
            return Err(SpanError::Negative(start));
        }
        if start >= end {
            return Err(SpanError::StartNotBeforeEnd { start, end });
        }
        Ok(Self { start, end })
    }

    /// Length of the span in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Duration handed to the transcoder, never below [`MIN_RENDER_DURATION_SECS`].
    pub fn render_duration(&self) -> f64 {
        self.duration().max(MIN_RENDER_DURATION_SECS)
    }

    /// Seconds between the end of `self` and the start of `next`.
    ///
    /// Negative when the spans overlap.
    pub fn gap_before(&self, next: &Span) -> f64 {
        next.start - self.end
    }

    /// Start offset in whole milliseconds.
    pub fn start_millis(&self) -> u64 {
        (self.start * 1000.0).round() as u64
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}s, {:.3}s]", self.start, self.end)
    }
}

/// Span construction error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpanError {
    #[error("Span bounds must be finite")]
    NotFinite,
    #[error("Span start cannot be negative: {0}")]
    Negative(f64),
    #[error("Span start ({start}) must be before end ({end})")]
    StartNotBeforeEnd { start: f64, end: f64 },
}
