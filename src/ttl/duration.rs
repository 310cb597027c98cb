//! Duration tags and countdown formatting.
//!
//! A duration tag is the compact form the composer menu offers: a positive
//! integer followed by `m`, `h` or `d` ("5m", "1h", "1d"). Anything else is
//! invalid and callers treat it the same as "no selection".

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// Milliseconds in one minute.
pub const MINUTE_MS: u64 = 60 * 1000;

/// Milliseconds in one hour.
pub const HOUR_MS: u64 = 60 * MINUTE_MS;

/// Milliseconds in one day.
pub const DAY_MS: u64 = 24 * HOUR_MS;

/// Lifetime used by [`calculate_expires_at`] when the tag cannot be parsed.
pub const FALLBACK_TTL_MS: u64 = 5 * MINUTE_MS;

static DURATION_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)([mhd])$").expect("duration tag pattern is valid"));

/// Why a duration tag was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    #[error("invalid duration format: {0:?}")]
    Format(String),

    #[error("duration must be at least 1: {0:?}")]
    Zero(String),

    #[error("duration out of range: {0:?}")]
    Overflow(String),
}

/// Parse a duration tag into milliseconds.
///
/// Returns `None` for anything that is not `<n><m|h|d>` with `n >= 1`.
/// Malformed input is a normal outcome here, never a panic.
///
/// # Examples
/// ```
/// use expiring_messages::ttl::duration::parse_duration;
///
/// assert_eq!(parse_duration("15m"), Some(900_000));
/// assert_eq!(parse_duration("1d"), Some(86_400_000));
/// assert_eq!(parse_duration("0m"), None);
/// assert_eq!(parse_duration("5M"), None);
/// ```
pub fn parse_duration(tag: &str) -> Option<u64> {
    DurationTag::parse(tag).ok().map(|tag| tag.millis())
}

/// A validated duration tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DurationTag {
    raw: String,
    millis: u64,
}

impl DurationTag {
    /// Validate `tag`, keeping the original spelling for display.
    pub fn parse(tag: &str) -> Result<Self, DurationError> {
        let captures = DURATION_TAG
            .captures(tag)
            .ok_or_else(|| DurationError::Format(tag.to_string()))?;

        // The pattern only admits ASCII digits, so the only failure left is
        // a value too large for u64.
        let value: u64 = captures[1]
            .parse()
            .map_err(|_| DurationError::Overflow(tag.to_string()))?;
        if value == 0 {
            return Err(DurationError::Zero(tag.to_string()));
        }

        let multiplier = match &captures[2] {
            "m" => MINUTE_MS,
            "h" => HOUR_MS,
            "d" => DAY_MS,
            _ => return Err(DurationError::Format(tag.to_string())),
        };

        let millis = value
            .checked_mul(multiplier)
            .ok_or_else(|| DurationError::Overflow(tag.to_string()))?;

        Ok(Self {
            raw: tag.to_string(),
            millis,
        })
    }

    /// Length of the duration in milliseconds.
    pub fn millis(&self) -> u64 {
        self.millis
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for DurationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for DurationTag {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Format a remaining time as a countdown label.
///
/// Negative input is clamped to zero. Below one hour the label is `MM:SS`;
/// from one hour on it is `H:MM:SS` with an unpadded hour count. Sub-second
/// remainders are truncated.
///
/// # Examples
/// ```
/// use expiring_messages::ttl::duration::format_time_remaining;
///
/// assert_eq!(format_time_remaining(65_000), "01:05");
/// assert_eq!(format_time_remaining(3_600_000), "1:00:00");
/// assert_eq!(format_time_remaining(-5_000), "00:00");
/// ```
pub fn format_time_remaining(milliseconds: i64) -> String {
    let total_seconds = milliseconds.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Coarse countdown used in the expiring post header ("2d 3h", "4m 10s").
pub fn format_compact(milliseconds: i64) -> String {
    if milliseconds <= 0 {
        return "Expiring...".to_string();
    }

    let seconds = milliseconds / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{}d {}h", days, hours % 24)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}

/// Absolute expiry for a message stamped at `now_ms` with `duration`.
///
/// An unparseable tag gets [`FALLBACK_TTL_MS`] rather than an error so a
/// message never lives forever because of a bad tag.
pub fn calculate_expires_at(duration: &str, now_ms: i64) -> i64 {
    let ttl = parse_duration(duration).unwrap_or(FALLBACK_TTL_MS);
    now_ms.saturating_add(i64::try_from(ttl).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minutes_hours_days() {
        assert_eq!(parse_duration("5m"), Some(300_000));
        assert_eq!(parse_duration("15m"), Some(900_000));
        assert_eq!(parse_duration("1h"), Some(3_600_000));
        assert_eq!(parse_duration("24h"), Some(86_400_000));
        assert_eq!(parse_duration("1d"), Some(86_400_000));
        assert_eq!(parse_duration("7d"), Some(604_800_000));
    }

    #[test]
    fn test_parse_rejects_zero() {
        assert_eq!(parse_duration("0m"), None);
        assert_eq!(parse_duration("0h"), None);
        assert_eq!(parse_duration("000d"), None);
        assert_eq!(
            DurationTag::parse("0m"),
            Err(DurationError::Zero("0m".to_string()))
        );
    }

    #[test]
    fn test_parse_invalid() {
        for tag in [
            "", "m", "5", "5M", "5H", "5s", "5w", "1.5h", "-5m", " 5m", "5m ", "5 m", "1h30m",
            "5mm", "abc",
        ] {
            assert_eq!(parse_duration(tag), None, "{tag:?} should be rejected");
        }
    }

    #[test]
    fn test_non_ascii_digits_are_a_format_error() {
        for tag in ["\u{0665}m", "1\u{0662}h", "\u{FF15}d"] {
            assert_eq!(
                DurationTag::parse(tag),
                Err(DurationError::Format(tag.to_string()))
            );
            assert_eq!(parse_duration(tag), None);
        }
    }

    #[test]
    fn test_parse_overflow_is_invalid() {
        assert_eq!(parse_duration("99999999999999999999999m"), None);
        assert!(matches!(
            DurationTag::parse("999999999999999999d"),
            Err(DurationError::Overflow(_))
        ));
    }

    #[test]
    fn test_duration_tag_keeps_spelling() {
        let tag: DurationTag = "15m".parse().unwrap();
        assert_eq!(tag.as_str(), "15m");
        assert_eq!(tag.to_string(), "15m");
        assert_eq!(tag.millis(), 900_000);
    }

    #[test]
    fn test_format_scenarios() {
        assert_eq!(format_time_remaining(0), "00:00");
        assert_eq!(format_time_remaining(999), "00:00");
        assert_eq!(format_time_remaining(65_000), "01:05");
        assert_eq!(format_time_remaining(3_599_999), "59:59");
        assert_eq!(format_time_remaining(3_600_000), "1:00:00");
        assert_eq!(format_time_remaining(90_015_000), "25:00:15");
    }

    #[test]
    fn test_format_clamps_negative() {
        assert_eq!(format_time_remaining(-1), "00:00");
        assert_eq!(format_time_remaining(-7_200_000), "00:00");
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(0), "Expiring...");
        assert_eq!(format_compact(-10), "Expiring...");
        assert_eq!(format_compact(45_000), "45s");
        assert_eq!(format_compact(250_000), "4m 10s");
        assert_eq!(format_compact(2 * HOUR_MS as i64 + 5 * MINUTE_MS as i64), "2h 5m");
        assert_eq!(format_compact(2 * DAY_MS as i64 + 3 * HOUR_MS as i64), "2d 3h");
    }

    #[test]
    fn test_calculate_expires_at() {
        let now = 1_700_000_000_000;
        assert_eq!(calculate_expires_at("1h", now), now + 3_600_000);
        assert_eq!(calculate_expires_at("bogus", now), now + 300_000);
        assert_eq!(calculate_expires_at("0m", now), now + 300_000);
    }
}
