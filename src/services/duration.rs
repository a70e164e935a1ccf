//! Free-form duration parsing for `/ban` and `/mute`.
//!
//! Grammar: an integer magnitude, optional whitespace, optional unit.
//! Units are matched on their first letter (`s`, `m`, `h`, `d`) after the
//! whole token has been accepted by the pattern; no unit means seconds.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d+)\s*(s|sec|secs|second|seconds|m|min|mins|minute|minutes|h|hr|hrs|hour|hours|d|day|days)?$",
    )
    .expect("duration pattern is valid")
});

/// Parse strings like `"10m"`, `"2 hours"`, `"45"` into a [`Duration`].
///
/// Returns `None` for empty input, a non-numeric magnitude, an unknown unit,
/// or a magnitude too large to represent. Never panics.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let normalized = input.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    let caps = DURATION_RE.captures(&normalized)?;
    let value: u64 = caps.get(1)?.as_str().parse().ok()?;

    let multiplier = match caps.get(2).and_then(|u| u.as_str().chars().next()) {
        None | Some('s') => 1,
        Some('m') => 60,
        Some('h') => 3_600,
        Some('d') => 86_400,
        // Accepted by the pattern but not by first letter: seconds.
        Some(_) => 1,
    };

    value.checked_mul(multiplier).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_examples() {
        assert_eq!(parse_duration("10m"), Some(Duration::from_secs(600)));
        assert_eq!(parse_duration("2h"), Some(Duration::from_secs(7_200)));
        assert_eq!(parse_duration("5"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("abc"), None);
    }

    #[test]
    fn test_every_unit_spelling() {
        let cases: &[(&str, u64)] = &[
            ("s", 1),
            ("sec", 1),
            ("secs", 1),
            ("second", 1),
            ("seconds", 1),
            ("m", 60),
            ("min", 60),
            ("mins", 60),
            ("minute", 60),
            ("minutes", 60),
            ("h", 3_600),
            ("hr", 3_600),
            ("hrs", 3_600),
            ("hour", 3_600),
            ("hours", 3_600),
            ("d", 86_400),
            ("day", 86_400),
            ("days", 86_400),
        ];
        for (unit, secs) in cases {
            for magnitude in [0_u64, 1, 7, 90] {
                let input = format!("{magnitude}{unit}");
                assert_eq!(
                    parse_duration(&input),
                    Some(Duration::from_secs(magnitude * secs)),
                    "input {input}"
                );
            }
        }
    }

    #[test]
    fn test_case_and_whitespace() {
        assert_eq!(parse_duration("  3 HOURS "), Some(Duration::from_secs(10_800)));
        assert_eq!(parse_duration("1D"), Some(Duration::from_secs(86_400)));
    }

    #[test]
    fn test_malformed_input() {
        for input in ["", "   ", "m", "10x", "10 mo", "-5m", "1.5h", "10m extra", "ten"] {
            assert_eq!(parse_duration(input), None, "input {input:?}");
        }
    }

    #[test]
    fn test_overflow_is_rejected() {
        assert_eq!(parse_duration("99999999999999999999"), None);
        assert_eq!(parse_duration(&format!("{}d", u64::MAX / 10)), None);
    }
}
