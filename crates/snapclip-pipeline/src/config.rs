//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use snapclip_models::EncodingConfig;

use crate::error::{PipelineError, PipelineResult};

/// What happens to the remaining renders after one render fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failure and return it.
    #[default]
    Abort,
    /// Keep rendering; report failures alongside the produced artifacts.
    BestEffort,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Abort => "abort",
            FailurePolicy::BestEffort => "best_effort",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "best_effort" => Ok(FailurePolicy::BestEffort),
            other => Err(PipelineError::invalid_config(format!(
                "Unknown failure policy: {other}"
            ))),
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Requested number of clips
    pub clip_count: usize,
    /// Target clip length in seconds
    pub clip_len: f64,
    /// Minimum clip length in seconds
    pub min_clip_len: f64,
    /// Minimum gap between exported clips in seconds
    pub min_gap: f64,
    /// Scene change sensitivity (0.0 - 1.0)
    pub scene_threshold: f64,
    /// Maximum renders in flight within one run
    pub max_parallel_renders: usize,
    /// Hard limit per transcode
    pub render_timeout: Duration,
    /// Behavior after a render failure
    pub failure_policy: FailurePolicy,
    /// Overlay opacity (0.0 - 1.0)
    pub overlay_opacity: f32,
    /// Output encoding
    pub encoding: EncodingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            clip_count: 3,
            clip_len: 20.0,
            min_clip_len: 3.0,
            min_gap: 2.0,
            scene_threshold: 0.3,
            max_parallel_renders: 1, // sequential
            render_timeout: Duration::from_secs(600),
            failure_policy: FailurePolicy::Abort,
            overlay_opacity: 1.0,
            encoding: EncodingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    ///
    /// Unset or unparsable variables fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let encoding = EncodingConfig::default()
            .with_preset(
                std::env::var("SNAPCLIP_PRESET").unwrap_or_else(|_| defaults.encoding.preset.clone()),
            )
            .with_crf(
                std::env::var("SNAPCLIP_CRF")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.encoding.crf),
            );

        Self {
            clip_count: std::env::var("SNAPCLIP_CLIP_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.clip_count),
            clip_len: std::env::var("SNAPCLIP_CLIP_LEN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.clip_len),
            min_clip_len: std::env::var("SNAPCLIP_MIN_CLIP_LEN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_clip_len),
            min_gap: std::env::var("SNAPCLIP_MIN_GAP")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_gap),
            scene_threshold: std::env::var("SNAPCLIP_SCENE_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.scene_threshold),
            max_parallel_renders: std::env::var("SNAPCLIP_MAX_PARALLEL_RENDERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_parallel_renders),
            render_timeout: Duration::from_secs(
                std::env::var("SNAPCLIP_RENDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            failure_policy: std::env::var("SNAPCLIP_FAILURE_POLICY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.failure_policy),
            overlay_opacity: std::env::var("SNAPCLIP_OVERLAY_OPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.overlay_opacity),
            encoding,
        }
    }

    /// Reject values the pipeline cannot honor.
    pub fn validate(&self) -> PipelineResult<()> {
        if !(self.clip_len.is_finite() && self.clip_len > 0.0) {
            return Err(PipelineError::invalid_config(format!(
                "clip_len must be positive, got {}",
                self.clip_len
            )));
        }
        if !(self.min_clip_len.is_finite() && self.min_clip_len > 0.0) {
            return Err(PipelineError::invalid_config(format!(
                "min_clip_len must be positive, got {}",
                self.min_clip_len
            )));
        }
        if !(self.min_gap.is_finite() && self.min_gap >= 0.0) {
            return Err(PipelineError::invalid_config(format!(
                "min_gap cannot be negative, got {}",
                self.min_gap
            )));
        }
        if !(0.0..=1.0).contains(&self.scene_threshold) {
            return Err(PipelineError::invalid_config(format!(
                "scene_threshold must be within [0, 1], got {}",
                self.scene_threshold
            )));
        }
        if self.max_parallel_renders == 0 {
            return Err(PipelineError::invalid_config(
                "max_parallel_renders must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.overlay_opacity) {
            return Err(PipelineError::invalid_config(format!(
                "overlay_opacity must be within [0, 1], got {}",
                self.overlay_opacity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.clip_count, 3);
        assert_eq!(config.clip_len, 20.0);
        assert_eq!(config.scene_threshold, 0.3);
        assert_eq!(config.max_parallel_renders, 1);
        assert_eq!(config.render_timeout, Duration::from_secs(600));
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_failure_policy_parse() {
        assert_eq!("abort".parse::<FailurePolicy>().unwrap(), FailurePolicy::Abort);
        assert_eq!("best-effort".parse::<FailurePolicy>().unwrap(), FailurePolicy::BestEffort);
        assert_eq!("BEST_EFFORT".parse::<FailurePolicy>().unwrap(), FailurePolicy::BestEffort);
        assert!("retry".parse::<FailurePolicy>().is_err());
    }

    #[test]
    fn test_validate_rejects() {
        let bad = [
            PipelineConfig { clip_len: 0.0, ..Default::default() },
            PipelineConfig { min_clip_len: -1.0, ..Default::default() },
            PipelineConfig { min_gap: -0.5, ..Default::default() },
            PipelineConfig { scene_threshold: 1.5, ..Default::default() },
            PipelineConfig { max_parallel_renders: 0, ..Default::default() },
            PipelineConfig { overlay_opacity: 2.0, ..Default::default() },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(PipelineError::InvalidConfig(_))));
        }
    }
}
