//! Offline helpers for checking duration tags and countdown labels.

use expiring_messages::ttl::duration::{format_compact, format_time_remaining, DurationTag};

/// Print the length of a duration tag, or fail if it is invalid.
pub fn parse(tag: &str) -> Result<(), Box<dyn std::error::Error>> {
    let tag = DurationTag::parse(tag)?;
    println!("{}: {} ms ({})", tag, tag.millis(), describe(&tag));
    Ok(())
}

/// Print both countdown renderings of `ms`.
pub fn format(ms: i64) {
    println!("countdown: {}", format_time_remaining(ms));
    println!("compact:   {}", format_compact(ms));
}

fn describe(tag: &DurationTag) -> String {
    let millis = i64::try_from(tag.millis()).unwrap_or(i64::MAX);
    format_compact(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_tags() {
        for tag in ["5m", "15m", "1h", "1d"] {
            assert!(parse(tag).is_ok(), "{tag} should parse");
        }
    }

    #[test]
    fn test_parse_invalid_tags() {
        for tag in ["", "0m", "5M", "10s", "1.5h", " 5m"] {
            assert!(parse(tag).is_err(), "{tag:?} should be rejected");
        }
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&DurationTag::parse("90m").unwrap()), "1h 30m");
        assert_eq!(describe(&DurationTag::parse("2d").unwrap()), "2d 0h");
    }
}
