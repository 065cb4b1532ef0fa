//! Pipeline error types.
//!
//! Every variant names the stage that failed so callers can log or report
//! without inspecting the underlying media error.

use std::path::PathBuf;
use thiserror::Error;

use snapclip_media::MediaError;
use snapclip_models::{AspectProfile, Span};

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to probe duration of {}: {source}", input.display())]
    Probe {
        input: PathBuf,
        #[source]
        source: MediaError,
    },

    #[error("Scene detection failed for {} at threshold {threshold}: {source}", input.display())]
    Detection {
        input: PathBuf,
        threshold: f64,
        #[source]
        source: MediaError,
    },

    #[error("Render failed for {span} ({aspect}): {source}")]
    Render {
        span: Span,
        aspect: AspectProfile,
        #[source]
        source: MediaError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Short stage name for logs and metric labels.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Probe { .. } => "probe",
            Self::Detection { .. } => "detection",
            Self::Render { .. } => "render",
            Self::InvalidConfig(_) => "config",
            Self::Io(_) => "io",
        }
    }

    /// Whether the run was stopped by cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Probe { source: MediaError::Cancelled, .. }
                | Self::Detection { source: MediaError::Cancelled, .. }
                | Self::Render { source: MediaError::Cancelled, .. }
        )
    }
}
