//! Output aspect profiles.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named output framing/resolution preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AspectProfile {
    /// 9:16 vertical, center-cropped (TikTok/Reels/Shorts)
    Portrait,
    /// 1:1, minimal centered square crop
    Square,
    /// 16:9, scaled to fit and letterboxed
    Landscape,
}

impl AspectProfile {
    /// All profiles in render order.
    pub const ALL: [AspectProfile; 3] = [
        AspectProfile::Portrait,
        AspectProfile::Square,
        AspectProfile::Landscape,
    ];

    /// Returns the profile name as used in filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectProfile::Portrait => "portrait",
            AspectProfile::Square => "square",
            AspectProfile::Landscape => "landscape",
        }
    }

    /// Ratio notation (e.g. `9:16`).
    pub fn ratio(&self) -> &'static str {
        match self {
            AspectProfile::Portrait => "9:16",
            AspectProfile::Square => "1:1",
            AspectProfile::Landscape => "16:9",
        }
    }

    /// Fixed output resolution `(width, height)` in pixels.
    pub fn resolution(&self) -> (u32, u32) {
        match self {
            AspectProfile::Portrait => (1080, 1920),
            AspectProfile::Square => (1080, 1080),
            AspectProfile::Landscape => (1920, 1080),
        }
    }
}

impl fmt::Display for AspectProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AspectProfile {
    type Err = AspectProfileParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "portrait" | "9:16" => Ok(AspectProfile::Portrait),
            "square" | "1:1" => Ok(AspectProfile::Square),
            "landscape" | "16:9" => Ok(AspectProfile::Landscape),
            _ => Err(AspectProfileParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown aspect profile: {0}")]
pub struct AspectProfileParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_order() {
        assert_eq!(
            AspectProfile::ALL,
            [
                AspectProfile::Portrait,
                AspectProfile::Square,
                AspectProfile::Landscape
            ]
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("portrait".parse::<AspectProfile>().unwrap(), AspectProfile::Portrait);
        assert_eq!("SQUARE".parse::<AspectProfile>().unwrap(), AspectProfile::Square);
        assert_eq!("16:9".parse::<AspectProfile>().unwrap(), AspectProfile::Landscape);
        assert!("4:5".parse::<AspectProfile>().is_err());
    }

    #[test]
    fn test_resolutions_match_ratio() {
        for profile in AspectProfile::ALL {
            let (w, h) = profile.resolution();
            let (rw, rh) = profile.ratio().split_once(':').unwrap();
            let rw: u32 = rw.parse().unwrap();
            let rh: u32 = rh.parse().unwrap();
            assert_eq!(w * rh, h * rw, "{profile} resolution does not match ratio");
        }
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&AspectProfile::Landscape).unwrap();
        assert_eq!(json, "\"landscape\"");
    }
}
