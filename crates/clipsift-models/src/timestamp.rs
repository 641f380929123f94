//! Timestamp parsing and formatting utilities.
//!
//! Transcript lines and inference-service responses may carry time as
//! either a bare seconds value or a clock string. This module converts
//! between the two, supporting HH:MM:SS, HH:MM:SS.mmm, MM:SS, and SS.

use thiserror::Error;

/// Maximum reasonable video duration (24 hours in seconds).
pub const MAX_VIDEO_DURATION_SECS: f64 = 86400.0;

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("timestamp cannot be empty")]
    Empty,

    #[error("timestamp cannot be negative")]
    Negative,

    #[error("invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("invalid timestamp format '{0}'; use HH:MM:SS, MM:SS, or SS")]
    InvalidFormat(String),

    #[error("timestamp exceeds maximum allowed duration")]
    ExceedsMaxDuration,
}

/// Parse a timestamp string to total seconds.
///
/// # Examples
/// ```
/// use clipsift_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("01:30:00").unwrap(), 5400.0);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp("90").unwrap(), 90.0);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = ts.split(':').collect();
    let secs = match parts.as_slice() {
        [s] => parse_component(s, "seconds")?,
        [m, s] => parse_component(m, "minutes")? * 60.0 + parse_component(s, "seconds")?,
        [h, m, s] => {
            parse_component(h, "hours")? * 3600.0
                + parse_component(m, "minutes")? * 60.0
                + parse_component(s, "seconds")?
        }
        _ => return Err(TimestampError::InvalidFormat(ts.to_string())),
    };

    if secs > MAX_VIDEO_DURATION_SECS {
        return Err(TimestampError::ExceedsMaxDuration);
    }

    Ok(secs)
}

fn parse_component(raw: &str, name: &'static str) -> Result<f64, TimestampError> {
    let value: f64 = raw
        .parse()
        .map_err(|_| TimestampError::InvalidValue(name, raw.to_string()))?;
    if value < 0.0 {
        return Err(TimestampError::Negative);
    }
    Ok(value)
}

/// Format seconds into an HH:MM:SS or HH:MM:SS.mmm string.
pub fn format_seconds(total_secs: f64) -> String {
    let total_secs = total_secs.max(0.0);
    let hours = (total_secs / 3600.0).floor() as u32;
    let mins = ((total_secs % 3600.0) / 60.0).floor() as u32;
    let secs = total_secs % 60.0;

    // Include milliseconds only when present
    if (secs - secs.floor()).abs() > 0.0001 {
        format!("{:02}:{:02}:{:06.3}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, mins, secs.floor() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clock_forms() {
        assert_eq!(parse_timestamp("00:00:00").unwrap(), 0.0);
        assert_eq!(parse_timestamp("00:01:00").unwrap(), 60.0);
        assert_eq!(parse_timestamp("01:00:00").unwrap(), 3600.0);
        assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
        assert_eq!(parse_timestamp("90").unwrap(), 90.0);
        assert!((parse_timestamp("00:00:30.500").unwrap() - 30.5).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(parse_timestamp(""), Err(TimestampError::Empty));
        assert_eq!(parse_timestamp("-5"), Err(TimestampError::Negative));
        assert!(matches!(
            parse_timestamp("1:2:3:4"),
            Err(TimestampError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_timestamp("ab:cd"),
            Err(TimestampError::InvalidValue("minutes", _))
        ));
        assert_eq!(
            parse_timestamp("99:00:00"),
            Err(TimestampError::ExceedsMaxDuration)
        );
    }

    #[test]
    fn formats_round_values() {
        assert_eq!(format_seconds(0.0), "00:00:00");
        assert_eq!(format_seconds(90.0), "00:01:30");
        assert_eq!(format_seconds(3661.0), "01:01:01");
    }

    #[test]
    fn formats_millis() {
        assert_eq!(format_seconds(30.5), "00:00:30.500");
    }

    #[test]
    fn format_parse_agree() {
        for secs in [0.0, 1.5, 59.999, 61.0, 3725.25] {
            let parsed = parse_timestamp(&format_seconds(secs)).unwrap();
            assert!((parsed - secs).abs() < 0.01, "mismatch for {}", secs);
        }
    }
}
