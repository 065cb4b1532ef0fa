//! Output encoding configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "fast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 18;
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";
/// Pixel format with the broadest player support
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";

/// Output encoding for rendered clips.
///
/// Missing fields fall back to [`EncodingConfig::default`] when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264", "h264_nvenc")
    pub codec: String,
    /// Encoding preset (e.g., "fast", "medium", "slow")
    pub preset: String,
    /// Constant Rate Factor (quality, 0-51, lower is better)
    pub crf: u8,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub pixel_format: String,
    /// Move the moov atom to the front of the file
    pub faststart: bool,
    /// Appended verbatim after the generated arguments
    pub extra_args: Vec<String>,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            pixel_format: DEFAULT_PIXEL_FORMAT.to_string(),
            faststart: true,
            extra_args: Vec::new(),
        }
    }
}

impl EncodingConfig {
    /// Create a new encoding configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new config with updated CRF.
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    /// Returns a new config with updated preset.
    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    /// FFmpeg output arguments for this configuration.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let crf = self.crf.to_string();
        let mut pairs: Vec<(&str, &str)> = vec![
            ("-c:v", self.codec.as_str()),
            ("-preset", self.preset.as_str()),
            ("-crf", crf.as_str()),
            ("-pix_fmt", self.pixel_format.as_str()),
            ("-c:a", self.audio_codec.as_str()),
            ("-b:a", self.audio_bitrate.as_str()),
        ];
        if self.faststart {
            pairs.push(("-movflags", "+faststart"));
        }

        pairs
            .into_iter()
            .flat_map(|(flag, value)| [flag.to_string(), value.to_string()])
            .chain(self.extra_args.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EncodingConfig::default();
        assert_eq!(config.codec, "libx264");
        assert_eq!(config.audio_codec, "aac");
        assert_eq!(config.pixel_format, "yuv420p");
        assert!(config.faststart);
    }

    #[test]
    fn test_ffmpeg_args() {
        let config = EncodingConfig::default();
        let args = config.to_ffmpeg_args();
        let joined = args.join(" ");
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("-c:a aac"));
        assert!(joined.contains("-pix_fmt yuv420p"));
        assert!(joined.contains("-movflags +faststart"));
        assert!(joined.contains("-crf 18"));
    }

    #[test]
    fn test_faststart_disabled() {
        let config = EncodingConfig {
            faststart: false,
            ..Default::default()
        };
        assert!(!config.to_ffmpeg_args().contains(&"-movflags".to_string()));
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: EncodingConfig = serde_json::from_str(r#"{"crf": 23}"#).unwrap();
        assert_eq!(config.crf, 23);
        assert_eq!(config.codec, DEFAULT_VIDEO_CODEC);
        assert!(config.faststart);
    }

    #[test]
    fn test_builders() {
        let config = EncodingConfig::new().with_crf(23).with_preset("veryfast");
        assert_eq!(config.crf, 23);
        assert_eq!(config.preset, "veryfast");
    }
}
