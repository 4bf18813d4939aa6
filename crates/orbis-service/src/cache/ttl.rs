//! Time-to-live values and human-readable duration expressions.
//!
//! A TTL is either a plain number of seconds or an expression such as
//! `"2 days"` or `"1 month"`. Months count as 30 days and years as 365.

use super::{CacheError, CacheResult};
use std::fmt;
use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const MONTH: u64 = 30 * DAY;
const YEAR: u64 = 365 * DAY;

/// Longest accepted TTL. Well inside Redis's `EX` range and `Instant`
/// arithmetic on every platform.
pub const MAX_TTL_SECS: u64 = 100 * YEAR;

/// A cache entry lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ttl {
    /// Whole seconds.
    Seconds(u64),
    /// `<integer> <unit>` expression, resolved on use.
    Expression(String),
}

impl Ttl {
    /// Resolves the TTL to whole seconds.
    ///
    /// Fails with [`CacheError::DurationParse`] for malformed expressions,
    /// arithmetic overflow, zero (the store cannot express a zero expiry) and
    /// anything above [`MAX_TTL_SECS`].
    pub fn resolve(&self) -> CacheResult<u64> {
        let seconds = match self {
            Self::Seconds(seconds) => *seconds,
            Self::Expression(expression) => parse_duration(expression)?,
        };

        if seconds == 0 {
            return Err(CacheError::duration_parse(self.to_string(), "TTL must be positive"));
        }
        if seconds > MAX_TTL_SECS {
            return Err(CacheError::duration_parse(
                self.to_string(),
                format!("TTL exceeds the maximum of {} seconds", MAX_TTL_SECS),
            ));
        }
        Ok(seconds)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds(seconds) => write!(f, "{}s", seconds),
            Self::Expression(expression) => f.write_str(expression),
        }
    }
}

impl From<u64> for Ttl {
    fn from(seconds: u64) -> Self {
        Self::Seconds(seconds)
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Self::Seconds(duration.as_secs())
    }
}

impl From<&str> for Ttl {
    fn from(expression: &str) -> Self {
        Self::Expression(expression.to_string())
    }
}

impl From<String> for Ttl {
    fn from(expression: String) -> Self {
        Self::Expression(expression)
    }
}

impl From<&Ttl> for Ttl {
    fn from(ttl: &Ttl) -> Self {
        ttl.clone()
    }
}

/// Parses `<integer> <unit>` into seconds.
///
/// Surrounding whitespace and case are ignored, and any amount of whitespace
/// (including none) may separate the number from the unit. Units are
/// `second`, `minute`, `hour`, `day`, `month` and `year`, each optionally
/// plural.
pub fn parse_duration(input: &str) -> CacheResult<u64> {
    let normalized = input.trim().to_lowercase();

    let digits_end = normalized
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(normalized.len());
    if digits_end == 0 {
        return Err(CacheError::duration_parse(input, "expected a leading integer"));
    }

    let quantity: u64 = normalized[..digits_end]
        .parse()
        .map_err(|_| CacheError::duration_parse(input, "quantity out of range"))?;

    let unit = normalized[digits_end..].trim_start();
    let multiplier = match unit {
        "second" | "seconds" => 1,
        "minute" | "minutes" => MINUTE,
        "hour" | "hours" => HOUR,
        "day" | "days" => DAY,
        "month" | "months" => MONTH,
        "year" | "years" => YEAR,
        "" => return Err(CacheError::duration_parse(input, "missing unit")),
        other => {
            return Err(CacheError::duration_parse(
                input,
                format!("unknown unit '{}'", other),
            ))
        }
    };

    quantity
        .checked_mul(multiplier)
        .ok_or_else(|| CacheError::duration_parse(input, "duration overflows"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_conversions() {
        assert_eq!(parse_duration("2 days").unwrap(), 172_800);
        assert_eq!(parse_duration("1 month").unwrap(), 2_592_000);
        assert_eq!(parse_duration("10 minutes").unwrap(), 600);
    }

    #[test]
    fn test_every_unit_singular_and_plural() {
        assert_eq!(parse_duration("1 second").unwrap(), 1);
        assert_eq!(parse_duration("45 seconds").unwrap(), 45);
        assert_eq!(parse_duration("1 minute").unwrap(), 60);
        assert_eq!(parse_duration("3 hours").unwrap(), 10_800);
        assert_eq!(parse_duration("1 day").unwrap(), 86_400);
        assert_eq!(parse_duration("2 months").unwrap(), 5_184_000);
        assert_eq!(parse_duration("1 year").unwrap(), 31_536_000);
    }

    #[test]
    fn test_whitespace_and_case_are_ignored() {
        assert_eq!(parse_duration("  5 Minutes ").unwrap(), 300);
        assert_eq!(parse_duration("5minutes").unwrap(), 300);
        assert_eq!(parse_duration("5 \t HOUR").unwrap(), 18_000);
    }

    #[test]
    fn test_malformed_expressions() {
        for input in ["abc", "", "days", "1", "1 fortnight", "-1 day", "1.5 days", "1 day ago"] {
            let err = parse_duration(input).unwrap_err();
            assert!(
                matches!(err, CacheError::DurationParse { .. }),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_overflow_is_a_parse_error() {
        assert!(parse_duration("99999999999999999999 seconds").is_err());
        assert!(parse_duration("18446744073709551615 years").is_err());
    }

    #[test]
    fn test_ttl_resolution() {
        assert_eq!(Ttl::from(600u64).resolve().unwrap(), 600);
        assert_eq!(Ttl::from("1 hour").resolve().unwrap(), 3600);
        assert_eq!(Ttl::from(Duration::from_secs(90)).resolve().unwrap(), 90);
    }

    #[test]
    fn test_zero_ttl_is_rejected() {
        assert!(matches!(
            Ttl::from(0u64).resolve(),
            Err(CacheError::DurationParse { .. })
        ));
        assert!(Ttl::from("0 days").resolve().is_err());
        assert!(Ttl::from(Duration::from_millis(500)).resolve().is_err());
    }

    #[test]
    fn test_ttl_above_maximum_is_rejected() {
        assert_eq!(parse_duration("300000000000 years").unwrap(), 9_460_800_000_000_000_000);
        assert!(matches!(
            Ttl::from("300000000000 years").resolve(),
            Err(CacheError::DurationParse { .. })
        ));
        assert!(Ttl::from(u64::MAX).resolve().is_err());
        assert!(Ttl::from("101 years").resolve().is_err());
        assert_eq!(Ttl::from("100 years").resolve().unwrap(), MAX_TTL_SECS);
    }
}
