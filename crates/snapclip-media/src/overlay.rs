//! Branding overlay composited over rendered clips.
//!
//! The overlay image is pulled into the filter graph through the `movie`
//! source filter so each render keeps a single FFmpeg input.

use std::path::{Path, PathBuf};

use crate::filters::escape_filter_path;

/// Default inset from the bottom-right corner, in pixels.
pub const DEFAULT_OVERLAY_INSET: u32 = 40;

/// Configuration for the branding overlay.
///
/// ```ignore
/// let config = OverlayConfig::new("logo.png").with_opacity(0.8);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    /// Path to overlay image (PNG with transparency)
    pub image_path: PathBuf,
    /// Horizontal inset from right edge (pixels)
    pub inset_x: u32,
    /// Vertical inset from bottom edge (pixels)
    pub inset_y: u32,
    /// Opacity (0.0 to 1.0)
    pub opacity: f32,
}

impl OverlayConfig {
    pub fn new(image_path: impl AsRef<Path>) -> Self {
        Self {
            image_path: image_path.as_ref().to_path_buf(),
            inset_x: DEFAULT_OVERLAY_INSET,
            inset_y: DEFAULT_OVERLAY_INSET,
            opacity: 1.0,
        }
    }

    /// Set overlay opacity (0.0 = invisible, 1.0 = fully opaque).
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Filter chain compositing the overlay onto `[input_label]`, producing `[output_label]`.
    pub fn filter_chain(&self, input_label: &str, output_label: &str) -> String {
        let path = escape_filter_path(&self.image_path);
        // W-w-X / H-h-Y anchor the image X/Y pixels in from the bottom-right edge
        let source = if self.opacity < 1.0 {
            format!(
                "movie='{}',format=rgba,colorchannelmixer=aa={:.2}[logo]",
                path, self.opacity
            )
        } else {
            format!("movie='{}'[logo]", path)
        };
        format!(
            "{};[{}][logo]overlay=W-w-{}:H-h-{}:format=auto[{}]",
            source, input_label, self.inset_x, self.inset_y, output_label
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_inset() {
        let config = OverlayConfig::new("logo.png");
        assert_eq!(config.inset_x, 40);
        assert_eq!(config.inset_y, 40);
        assert!((config.opacity - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_opacity_clamping() {
        let config = OverlayConfig::new("logo.png").with_opacity(1.5);
        assert!((config.opacity - 1.0).abs() < 0.01);

        let config = OverlayConfig::new("logo.png").with_opacity(-0.5);
        assert!(config.opacity.abs() < 0.01);
    }

    #[test]
    fn test_filter_chain_full_opacity() {
        let chain = OverlayConfig::new("/assets/logo.png").filter_chain("base", "out");
        assert_eq!(
            chain,
            "movie='/assets/logo.png'[logo];[base][logo]overlay=W-w-40:H-h-40:format=auto[out]"
        );
    }

    #[test]
    fn test_filter_chain_with_opacity() {
        let chain = OverlayConfig::new("logo.png")
            .with_opacity(0.7)
            .filter_chain("in", "out");
        assert!(chain.contains("colorchannelmixer=aa=0.70"));
        assert!(chain.contains("[in][logo]overlay=W-w-40:H-h-40"));
    }
}
