//! Candidate anchor selection.
//!
//! Anchors are the timestamps clips are centered on. Detected scene changes
//! are preferred; without any, anchors are spread evenly over the timeline.

/// Pick up to `count` anchor timestamps for a media of `duration` seconds.
///
/// - no scenes: `k * duration / (count + 1)` for `k = 1..=count`, so never
///   at the very start or end
/// - more scenes than `count`: every `floor(len / count)`-th scene in order,
///   truncated to `count`
/// - otherwise: all scenes, in order
///
/// `count == 0` or a non-positive duration yields no anchors.
pub fn select_candidates(duration: f64, count: usize, scenes: &[f64]) -> Vec<f64> {
    if count == 0 || !duration.is_finite() || duration <= 0.0 {
        return Vec::new();
    }

    if scenes.is_empty() {
        let step = duration / (count as f64 + 1.0);
        return (1..=count).map(|k| step * k as f64).collect();
    }

    if scenes.len() > count {
        // Deterministic subsampling, not a quality ranking
        let stride = (scenes.len() / count).max(1);
        return scenes.iter().step_by(stride).take(count).copied().collect();
    }

    scenes.to_vec()
}
