//! Timestamp parsing and formatting utilities.
//!
//! Supports the general `HH:MM:SS(.mmm)`, `MM:SS` and `SS` forms, the
//! truncated `HH:MM:SS` timecode, and the SRT `HH:MM:SS,mmm` form.

use thiserror::Error;

/// Parse a timestamp string to total seconds.
///
/// Supports formats:
/// - `HH:MM:SS` or `HH:MM:SS.mmm`
/// - `MM:SS` or `MM:SS.mmm`
/// - `SS` or `SS.mmm`
///
/// # Examples
/// ```
/// use snapclip_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("01:30:00").unwrap(), 5400.0);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp("90").unwrap(), 90.0);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let mut fields = ts.rsplit(':');
    let mut total = 0.0;
    for (idx, unit) in [1.0, 60.0, 3600.0].into_iter().enumerate() {
        let Some(field) = fields.next() else { break };
        let name = ["seconds", "minutes", "hours"][idx];
        total += parse_component(name, field)? * unit;
    }
    if fields.next().is_some() {
        return Err(TimestampError::InvalidFormat(ts.to_string()));
    }

    Ok(total)
}

fn parse_component(name: &'static str, value: &str) -> Result<f64, TimestampError> {
    let parsed: f64 = value
        .parse()
        .map_err(|_| TimestampError::InvalidValue(name, value.to_string()))?;
    if parsed < 0.0 {
        return Err(TimestampError::Negative);
    }
    Ok(parsed)
}

/// Format seconds as `HH:MM:SS`, or `HH:MM:SS.mmm` when there is a fraction.
pub fn format_seconds(total_secs: f64) -> String {
    let total_ms = (total_secs.max(0.0) * 1000.0).round() as u64;
    let whole = total_ms / 1000;
    let (h, m, s) = (whole / 3600, (whole % 3600) / 60, whole % 60);
    match total_ms % 1000 {
        0 => format!("{:02}:{:02}:{:02}", h, m, s),
        ms => format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms),
    }
}

/// Convert seconds to a whole-second `HH:MM:SS` timecode (fraction truncated).
///
/// ```
/// use snapclip_models::timestamp::sec_to_tc;
/// assert_eq!(sec_to_tc(3725.9), "01:02:05");
/// ```
pub fn sec_to_tc(secs: f64) -> String {
    let total = secs.max(0.0).floor() as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`).
///
/// ```
/// use snapclip_models::timestamp::format_srt_time;
/// assert_eq!(format_srt_time(61.25), "00:01:01,250");
/// ```
pub fn format_srt_time(secs: f64) -> String {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    format!(
        "{:02}:{:02}:{:02},{:03}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60,
        ms
    )
}

/// Parse an SRT timestamp (`HH:MM:SS,mmm`) to seconds.
pub fn parse_srt_time(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let (clock, millis) = ts
        .split_once(',')
        .ok_or_else(|| TimestampError::InvalidFormat(ts.to_string()))?;
    if clock.split(':').count() != 3 || millis.len() != 3 {
        return Err(TimestampError::InvalidFormat(ts.to_string()));
    }

    let base = parse_timestamp(clock)?;
    let millis: u32 = millis
        .parse()
        .map_err(|_| TimestampError::InvalidValue("milliseconds", millis.to_string()))?;

    Ok(base + millis as f64 / 1000.0)
}

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("Timestamp cannot be empty")]
    Empty,
    #[error("Timestamp cannot be negative")]
    Negative,
    #[error("Invalid {0} value: {1}")]
    InvalidValue(&'static str, String),
    #[error("Invalid timestamp format '{0}'")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_forms() {
        assert_eq!(parse_timestamp("00:00:00").unwrap(), 0.0);
        assert_eq!(parse_timestamp("01:30:45").unwrap(), 5445.0);
        assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
        assert_eq!(parse_timestamp("90").unwrap(), 90.0);
        assert!((parse_timestamp("00:00:30.500").unwrap() - 30.5).abs() < 0.001);
    }

    #[test]
    fn test_parse_timestamp_errors() {
        assert!(matches!(parse_timestamp(""), Err(TimestampError::Empty)));
        assert!(matches!(parse_timestamp("abc"), Err(TimestampError::InvalidValue(_, _))));
        assert!(matches!(parse_timestamp("1:2:3:4"), Err(TimestampError::InvalidFormat(_))));
        assert!(matches!(parse_timestamp("-5"), Err(TimestampError::Negative)));
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "00:00:00");
        assert_eq!(format_seconds(3661.0), "01:01:01");
        assert_eq!(format_seconds(30.5), "00:00:30.500");
    }

    #[test]
    fn test_sec_to_tc() {
        assert_eq!(sec_to_tc(0.0), "00:00:00");
        assert_eq!(sec_to_tc(59.999), "00:00:59");
        assert_eq!(sec_to_tc(3600.0), "01:00:00");
        assert_eq!(sec_to_tc(-3.0), "00:00:00");
    }

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(1.001), "00:00:01,001");
        assert_eq!(format_srt_time(3725.5), "01:02:05,500");
    }

    #[test]
    fn test_srt_time_round_trip() {
        for value in [0.0, 0.001, 1.5, 59.999, 61.25, 3599.999, 7322.042, 12.3456] {
            let parsed = parse_srt_time(&format_srt_time(value)).unwrap();
            assert!(
                (parsed - value).abs() <= 0.0005 + 1e-9,
                "{value} -> {parsed}"
            );
        }
    }

    #[test]
    fn test_tc_round_trip_whole_seconds() {
        for value in [0.0, 1.0, 59.0, 3600.0, 5445.0] {
            assert_eq!(parse_timestamp(&sec_to_tc(value)).unwrap(), value);
        }
    }

    #[test]
    fn test_parse_srt_time_errors() {
        assert!(matches!(parse_srt_time("00:00:01.000"), Err(TimestampError::InvalidFormat(_))));
        assert!(matches!(parse_srt_time("00:01,000"), Err(TimestampError::InvalidFormat(_))));
        assert!(matches!(parse_srt_time("00:00:01,abc"), Err(TimestampError::InvalidValue(_, _))));
    }
}
