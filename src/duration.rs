//! Duration Parsing
//!
//! Turns human duration expressions like `"3 seconds"`, `"250ms"` or `"1.5h"`
//! into [`Duration`]s. Used by the `max_age` / `max_idle` string setters, the
//! environment config and the shell.

use std::time::Duration;

use crate::error::{CacheError, Result};

lazy_static::lazy_static! {
    static ref NUMBER_AND_UNIT: regex::Regex = regex::Regex::new(
        r"(?i)^\s*(\d+(?:\.\d+)?)\s*(ms|msecs?|millis|milliseconds?|s|secs?|seconds?|m|mins?|minutes?|h|hrs?|hours?|d|days?)?\s*$"
    )
    .expect("duration pattern is valid");
}

/// Parses a duration expression.
///
/// A bare number is read as milliseconds. Units may be abbreviated or spelled
/// out, singular or plural, and are case-insensitive.
///
/// # Examples
///
/// ```
/// # use std::time::Duration;
/// use mini_cache::parse_duration;
///
/// assert_eq!(parse_duration("3 seconds").unwrap(), Duration::from_secs(3));
/// assert_eq!(parse_duration("250").unwrap(), Duration::from_millis(250));
/// assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(90 * 60));
/// assert!(parse_duration("soon").is_err());
/// ```
pub fn parse_duration(input: impl AsRef<str>) -> Result<Duration> {
    let input = input.as_ref();
    let captures = NUMBER_AND_UNIT.captures(input).ok_or_else(|| {
        CacheError::InvalidDuration(format!(
            "Cannot parse '{}' into a duration. Expected a number optionally followed by ms, s, m, h or d.",
            input
        ))
    })?;

    let number: f64 = captures[1]
        .parse()
        .map_err(|_| CacheError::InvalidDuration(input.to_string()))?;

    let unit = captures
        .get(2)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default();

    let millis_per_unit = match unit.chars().next() {
        None => 1.0,
        Some('s') => 1_000.0,
        // "ms", "msec", "millis"... all start with 'm' but so do minutes
        Some('m') if unit.starts_with("ms") || unit.starts_with("mil") => 1.0,
        Some('m') => 60_000.0,
        Some('h') => 3_600_000.0,
        Some('d') => 86_400_000.0,
        Some(_) => return Err(CacheError::InvalidDuration(input.to_string())),
    };

    Ok(Duration::from_millis((number * millis_per_unit).round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_number_is_millis() {
        assert_eq!(parse_duration("40").unwrap(), Duration::from_millis(40));
        assert_eq!(parse_duration(" 0 ").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_short_units() {
        assert_eq!(parse_duration("15ms").unwrap(), Duration::from_millis(15));
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("1d").unwrap(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_long_units() {
        assert_eq!(parse_duration("3 seconds").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("1 second").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("10 minutes").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_duration("2 Hours").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("7 days").unwrap(), Duration::from_secs(7 * 86_400));
        assert_eq!(
            parse_duration("500 milliseconds").unwrap(),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_fractional() {
        assert_eq!(parse_duration("0.5s").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("1.5 m").unwrap(), Duration::from_secs(90));
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(
            parse_duration("soon"),
            Err(CacheError::InvalidDuration(_))
        ));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("-3s").is_err());
        assert!(parse_duration("3 weeks").is_err());
    }
}
