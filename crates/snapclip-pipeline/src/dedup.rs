//! Span deduplication.

use snapclip_models::Span;

/// Merge spans closer than `min_gap` seconds.
///
/// Spans are sorted by start. A span is kept only if it starts at least
/// `min_gap` after the previous kept span ends; otherwise the previous kept
/// span's end is extended to cover it. Starts never move and content is never
/// dropped, so the result is idempotent and non-empty for non-empty input.
pub fn dedup_spans(mut spans: Vec<Span>, min_gap: f64) -> Vec<Span> {
    spans.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.end.total_cmp(&b.end)));

    let mut kept: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match kept.last_mut() {
            Some(prev) if prev.gap_before(&span) < min_gap => {
                prev.end = prev.end.max(span.end);
            }
            _ => kept.push(span),
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: f64, end: f64) -> Span {
        Span::new(start, end).unwrap()
    }

    #[test]
    fn test_close_spans_merge() {
        let out = dedup_spans(vec![span(10.0, 15.0), span(16.0, 20.0)], 2.0);
        assert_eq!(out, vec![span(10.0, 20.0)]);
    }

    #[test]
    fn test_distant_spans_kept() {
        let out = dedup_spans(vec![span(30.0, 40.0), span(0.0, 10.0)], 2.0);
        assert_eq!(out, vec![span(0.0, 10.0), span(30.0, 40.0)]);
    }

    #[test]
    fn test_exact_gap_is_kept() {
        let out = dedup_spans(vec![span(0.0, 10.0), span(12.0, 20.0)], 2.0);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_contained_span_never_shrinks() {
        let out = dedup_spans(vec![span(0.0, 30.0), span(5.0, 10.0)], 2.0);
        assert_eq!(out, vec![span(0.0, 30.0)]);
    }

    #[test]
    fn test_chain_merges_into_first() {
        let out = dedup_spans(
            vec![span(0.0, 5.0), span(6.0, 11.0), span(12.0, 17.0), span(40.0, 45.0)],
            2.0,
        );
        assert_eq!(out, vec![span(0.0, 17.0), span(40.0, 45.0)]);
    }

    #[test]
    fn test_idempotent() {
        let inputs = vec![
            vec![span(10.0, 15.0), span(16.0, 20.0)],
            vec![span(5.0, 25.0), span(20.0, 40.0), span(35.0, 55.0)],
            vec![span(0.0, 3.0), span(50.0, 53.0), span(4.0, 9.0), span(10.5, 12.0)],
        ];
        for input in inputs {
            let once = dedup_spans(input, 2.0);
            let twice = dedup_spans(once.clone(), 2.0);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_count_bounds() {
        assert!(dedup_spans(Vec::new(), 2.0).is_empty());
        let input = vec![span(0.0, 1.0), span(0.5, 1.5), span(1.0, 2.0)];
        let out = dedup_spans(input.clone(), 100.0);
        assert!(!out.is_empty() && out.len() <= input.len());
    }
}
