//! FFmpeg `-progress` output tracking.

use serde::{Deserialize, Serialize};

/// Progress snapshot from FFmpeg's `-progress pipe:2` key/value stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Current FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Feed one line of progress output.
    ///
    /// Returns a snapshot each time a `progress=` block terminator is seen.
    pub fn apply_line(&mut self, line: &str) -> Option<FfmpegProgress> {
        let (key, value) = line.trim().split_once('=')?;
        match key {
            // Both keys are reported in microseconds by modern FFmpeg builds
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.out_time_ms = us / 1000;
                }
            }
            "frame" => {
                if let Ok(frame) = value.parse() {
                    self.frame = frame;
                }
            }
            "fps" => {
                if let Ok(fps) = value.parse() {
                    self.fps = fps;
                }
            }
            "speed" => {
                if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                    self.speed = speed;
                }
            }
            "progress" => {
                self.is_complete = value == "end";
                return Some(self.clone());
            }
            _ => {}
        }
        None
    }

    /// Completed fraction (0.0 - 1.0) of an output of `total_secs` seconds.
    pub fn fraction_of(&self, total_secs: f64) -> f64 {
        if total_secs <= 0.0 {
            return 0.0;
        }
        (self.out_time_ms as f64 / 1000.0 / total_secs).clamp(0.0, 1.0)
    }
}

/// Callback type for progress updates.
pub type ProgressCallback = Box<dyn Fn(FfmpegProgress) + Send + Sync + 'static>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_lines() {
        let mut progress = FfmpegProgress::default();

        assert!(progress.apply_line("frame=120").is_none());
        assert!(progress.apply_line("out_time_us=5000000").is_none());
        assert!(progress.apply_line("speed=1.5x").is_none());
        assert_eq!(progress.out_time_ms, 5000);
        assert_eq!(progress.frame, 120);

        let snapshot = progress.apply_line("progress=continue").unwrap();
        assert!(!snapshot.is_complete);

        let snapshot = progress.apply_line("progress=end").unwrap();
        assert!(snapshot.is_complete);
        assert!((snapshot.speed - 1.5).abs() < 0.01);
    }

    #[test]
    fn test_ignores_noise() {
        let mut progress = FfmpegProgress::default();
        assert!(progress.apply_line("speed=N/A").is_none());
        assert!(progress.apply_line("not a key value line").is_none());
        assert_eq!(progress, FfmpegProgress::default());
    }

    #[test]
    fn test_fraction_of() {
        let progress = FfmpegProgress {
            out_time_ms: 5000,
            ..Default::default()
        };
        assert!((progress.fraction_of(10.0) - 0.5).abs() < 1e-9);
        assert!((progress.fraction_of(2.0) - 1.0).abs() < 1e-9);
        assert_eq!(progress.fraction_of(0.0), 0.0);
    }
}
