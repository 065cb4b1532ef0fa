//! Window construction around anchor timestamps.

use snapclip_models::Span;

/// Expand `anchor` into a span of `2 * half_width` seconds inside `[0, duration]`.
///
/// Spans shorter than `min_len` are widened symmetrically; whatever cannot be
/// added on a clamped side goes to the other side. Media shorter than
/// `min_len` yields the whole `[0, duration]`. Returns `None` only when there
/// is no media to cover.
pub fn build_window(anchor: f64, half_width: f64, duration: f64, min_len: f64) -> Option<Span> {
    if !duration.is_finite() || duration <= 0.0 {
        return None;
    }
    if duration <= min_len {
        return Span::new(0.0, duration).ok();
    }

    let t = if anchor.is_finite() { anchor.clamp(0.0, duration) } else { 0.0 };
    let half = half_width.max(0.0);
    let mut start = (t - half).max(0.0);
    let mut end = (t + half).min(duration);

    let len = end - start;
    if len < min_len {
        let pad = (min_len - len) / 2.0;
        start -= pad;
        end += pad;
        if start < 0.0 {
            end -= start;
            start = 0.0;
        }
        if end > duration {
            start -= end - duration;
            end = duration;
        }
        start = start.max(0.0);
    }

    Span::new(start, end).ok()
}
