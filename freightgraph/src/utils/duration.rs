//! Go-style duration strings, as carried by soak-time fields.
//!
//! Accepts a sequence of decimal numbers, each with an optional fraction and a
//! unit suffix, such as "30m", "1h30m", "1.5h" or "90s". The bare string "0"
//! is also accepted. Negative durations are rejected.

use chrono::Duration;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

#[allow(clippy::expect_used)]
static DURATION_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+(?:\.\d*)?(?:ns|us|µs|ms|s|m|h))+$").expect("static regex")
});

#[allow(clippy::expect_used)]
static DURATION_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d*)?)(ns|us|µs|ms|s|m|h)").expect("static regex")
});

/// Errors that can occur while parsing a duration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    /// The duration string is empty.
    #[error("Empty duration string")]
    EmptyString,

    /// The duration string does not match the expected format.
    #[error("Invalid duration: {0}")]
    InvalidFormat(String),

    /// The duration does not fit in the supported range.
    #[error("Duration out of range: {0}")]
    OutOfRange(String),
}

/// Parses a Go-style duration string.
///
/// # Examples
///
/// ```
/// use freightgraph::utils::parse_duration;
///
/// let soak = parse_duration("1h30m").unwrap();
/// assert_eq!(soak.num_minutes(), 90);
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(DurationError::EmptyString);
    }
    if trimmed == "0" {
        return Ok(Duration::zero());
    }
    if !DURATION_FORMAT.is_match(trimmed) {
        return Err(DurationError::InvalidFormat(trimmed.to_string()));
    }

    let mut total_nanos: f64 = 0.0;
    for caps in DURATION_PART.captures_iter(trimmed) {
        let value: f64 = caps[1]
            .parse()
            .map_err(|_| DurationError::InvalidFormat(trimmed.to_string()))?;
        let unit_nanos = match &caps[2] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60.0 * 1e9,
            "h" => 3600.0 * 1e9,
            _ => return Err(DurationError::InvalidFormat(trimmed.to_string())),
        };
        total_nanos += value * unit_nanos;
    }

    if !total_nanos.is_finite() || total_nanos > i64::MAX as f64 {
        return Err(DurationError::OutOfRange(trimmed.to_string()));
    }

    #[allow(clippy::cast_possible_truncation)]
    let nanos = total_nanos.round() as i64;
    Ok(Duration::nanoseconds(nanos))
}

/// Formats a duration the way Go prints it, e.g. "1h30m0s".
///
/// Sub-second precision is dropped; zero formats as "0s".
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_units() {
        assert_eq!(parse_duration("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_duration("2h").unwrap(), Duration::hours(2));
        assert_eq!(parse_duration("45s").unwrap(), Duration::seconds(45));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::milliseconds(250));
    }

    #[test]
    fn test_parse_compound() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration("1h0m0s").unwrap(), Duration::hours(1));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::minutes(90));
    }

    #[test]
    fn test_parse_zero() {
        assert_eq!(parse_duration("0").unwrap(), Duration::zero());
        assert_eq!(parse_duration("0s").unwrap(), Duration::zero());
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(parse_duration(""), Err(DurationError::EmptyString));
        assert!(matches!(parse_duration("30"), Err(DurationError::InvalidFormat(_))));
        assert!(matches!(parse_duration("-5m"), Err(DurationError::InvalidFormat(_))));
        assert!(matches!(parse_duration("5 minutes"), Err(DurationError::InvalidFormat(_))));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::minutes(90)), "1h30m0s");
        assert_eq!(format_duration(Duration::seconds(75)), "1m15s");
        assert_eq!(format_duration(Duration::zero()), "0s");
        assert_eq!(format_duration(Duration::seconds(-3)), "0s");
    }
}
