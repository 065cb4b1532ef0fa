//! FFmpeg video filter definitions.
//!
//! The render chain is always: subtitle burn (on the original framing) →
//! aspect transform → optional overlay on the aspect-corrected frame.
//!
//! Input-side seeking restarts frame timestamps at zero, while the SRT file
//! is timed against the whole source. The subtitle burn therefore runs on a
//! timeline shifted back to the source position and reset afterwards.

use std::path::Path;

use snapclip_models::AspectProfile;

use crate::overlay::OverlayConfig;

/// Portrait: height-derived 9:16 center crop, then fixed 1080x1920.
pub const FILTER_PORTRAIT: &str = "crop=ih*9/16:ih,scale=1080:1920,setsar=1";

/// Square: minimal centered square, then fixed 1080x1080.
pub const FILTER_SQUARE: &str = "crop='min(iw,ih)':'min(iw,ih)',scale=1080:1080,setsar=1";

/// Landscape: fit inside 1920x1080 preserving aspect, pad symmetrically.
pub const FILTER_LANDSCAPE: &str = concat!(
    "scale=1920:1080:force_original_aspect_ratio=decrease,",
    "pad=1920:1080:(ow-iw)/2:(oh-ih)/2,",
    "setsar=1"
);

/// Crop/scale/pad transform for an aspect profile.
pub fn aspect_filter(aspect: AspectProfile) -> &'static str {
    match aspect {
        AspectProfile::Portrait => FILTER_PORTRAIT,
        AspectProfile::Square => FILTER_SQUARE,
        AspectProfile::Landscape => FILTER_LANDSCAPE,
    }
}

/// Escape a path for use inside a single-quoted filter argument.
///
/// A quote cannot appear inside a quoted argument, so it closes the quote,
/// is emitted escaped, and reopens it.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "\\\\")
        .replace('\'', "'\\''")
        .replace(':', "\\:")
}

/// Subtitle burn-in filter for an SRT file.
///
/// `source_offset` is the source position (seconds) of the first frame the
/// filter sees.
pub fn subtitle_filter(srt: &Path, source_offset: f64) -> String {
    let burn = format!("subtitles='{}'", escape_filter_path(srt));
    if source_offset < 0.0005 {
        return burn;
    }
    format!(
        "setpts=PTS+{:.3}/TB,{},setpts=PTS-STARTPTS",
        source_offset, burn
    )
}

/// Compose the full `-vf` graph for one render.
pub fn build_filter_graph(
    aspect: AspectProfile,
    subtitles: Option<&Path>,
    source_offset: f64,
    overlay: Option<&OverlayConfig>,
) -> String {
    let mut chain: Vec<String> = Vec::with_capacity(2);
    if let Some(srt) = subtitles {
        chain.push(subtitle_filter(srt, source_offset));
    }
    chain.push(aspect_filter(aspect).to_string());
    let base = chain.join(",");

    match overlay {
        None => base,
        Some(config) => {
            let graph = format!("[in]{}[base];{}", base, config.filter_chain("base", "out"));
            // Unlabeled final pad becomes the graph output
            graph
                .strip_suffix("[out]")
                .map(str::to_string)
                .unwrap_or(graph)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_filters_target_resolution() {
        for aspect in AspectProfile::ALL {
            let (w, h) = aspect.resolution();
            assert!(
                aspect_filter(aspect).contains(&format!("{}:{}", w, h)),
                "{aspect} filter does not target {w}x{h}"
            );
        }
    }

    #[test]
    fn test_landscape_pads() {
        assert!(aspect_filter(AspectProfile::Landscape).contains("pad=1920:1080"));
        assert!(!aspect_filter(AspectProfile::Portrait).contains("pad="));
    }

    #[test]
    fn test_escape_filter_path() {
        assert_eq!(
            escape_filter_path(Path::new("/data/it's:here.srt")),
            "/data/it'\\''s\\:here.srt"
        );
    }

    #[test]
    fn test_quoted_path_keeps_quotes_balanced() {
        let filter = subtitle_filter(Path::new("/data/it's.srt"), 0.0);
        assert_eq!(filter, "subtitles='/data/it'\\''s.srt'");
        // Every unescaped quote opens or closes a quoted section
        let bare_quotes = filter.replace("\\'", "").matches('\'').count();
        assert_eq!(bare_quotes % 2, 0);
    }

    #[test]
    fn test_subtitle_filter_shifts_to_source_time() {
        let filter = subtitle_filter(Path::new("/tmp/subs.srt"), 20.0);
        assert_eq!(
            filter,
            "setpts=PTS+20.000/TB,subtitles='/tmp/subs.srt',setpts=PTS-STARTPTS"
        );
        assert_eq!(
            subtitle_filter(Path::new("/tmp/subs.srt"), 0.0),
            "subtitles='/tmp/subs.srt'"
        );
    }

    #[test]
    fn test_graph_plain() {
        let graph = build_filter_graph(AspectProfile::Portrait, None, 0.0, None);
        assert_eq!(graph, FILTER_PORTRAIT);
    }

    #[test]
    fn test_graph_subtitles_precede_aspect() {
        let graph = build_filter_graph(AspectProfile::Square, Some(Path::new("/tmp/subs.srt")), 0.0, None);
        assert_eq!(graph, format!("subtitles='/tmp/subs.srt',{}", FILTER_SQUARE));
    }

    #[test]
    fn test_graph_overlay_is_last() {
        let overlay = OverlayConfig::new("/assets/logo.png");
        let graph = build_filter_graph(
            AspectProfile::Landscape,
            Some(Path::new("/tmp/subs.srt")),
            12.5,
            Some(&overlay),
        );
        let subs = graph.find("setpts=PTS+12.500/TB,subtitles=").unwrap();
        let aspect = graph.find("scale=1920:1080").unwrap();
        let logo = graph.find("overlay=W-w-40:H-h-40").unwrap();
        assert!(graph.starts_with("[in]"));
        assert!(subs < aspect && aspect < logo);
        assert!(!graph.ends_with("[out]"));
    }
}
