use crate::clock::MAX_INTERVAL_MS;
use crate::error::Error;

/// Time unit for bare numeric intervals in task registrations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl std::str::FromStr for TimeUnit {
    type Err = Error;

    /// Parse TimeUnit from its full lowercase name: "milliseconds", "seconds",
    /// "minutes", "hours", "days". Shorthand like "5s" goes through
    /// [`TimeUnit::parse_duration`] instead.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "milliseconds" => Ok(TimeUnit::Milliseconds),
            "seconds" => Ok(TimeUnit::Seconds),
            "minutes" => Ok(TimeUnit::Minutes),
            "hours" => Ok(TimeUnit::Hours),
            "days" => Ok(TimeUnit::Days),
            _ => Err(Error::InvalidInterval(format!("unknown time unit '{}'", s))),
        }
    }
}

impl TimeUnit {
    /// Full lowercase name, the inverse of `from_str`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Milliseconds => "milliseconds",
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
        }
    }

    pub fn to_millis(&self, value: u64) -> u64 {
        match self {
            TimeUnit::Milliseconds => value,
            TimeUnit::Seconds => value.saturating_mul(1000),
            TimeUnit::Minutes => value.saturating_mul(60_000),
            TimeUnit::Hours => value.saturating_mul(3_600_000),
            TimeUnit::Days => value.saturating_mul(86_400_000),
        }
    }

    /// Parse a duration string like "5s", "10m", "2h", "500ms".
    ///
    /// Only lowercase suffixes are accepted and there must be no space
    /// between the number and the suffix.
    pub fn parse_duration(s: &str) -> Option<(u64, TimeUnit)> {
        let s = s.trim();
        let split_pos = s.find(|c: char| !c.is_ascii_digit())?;
        if split_pos == 0 {
            return None;
        }

        let (num_str, unit_str) = s.split_at(split_pos);
        let value = num_str.parse::<u64>().ok()?;

        let time_unit = match unit_str {
            "ms" => TimeUnit::Milliseconds,
            "s" => TimeUnit::Seconds,
            "m" => TimeUnit::Minutes,
            "h" => TimeUnit::Hours,
            "d" => TimeUnit::Days,
            _ => return None,
        };

        Some((value, time_unit))
    }
}

/// Resolve an interval string to milliseconds.
///
/// Shorthand ("250ms", "2s") carries its own unit; a bare number is read in
/// `default_unit`. Results above [`MAX_INTERVAL_MS`] are rejected.
pub fn parse_interval(value: &str, default_unit: TimeUnit) -> Result<u32, Error> {
    let millis = if let Some((amount, unit)) = TimeUnit::parse_duration(value) {
        unit.to_millis(amount)
    } else {
        let amount = value
            .trim()
            .parse::<u64>()
            .map_err(|_| Error::InvalidInterval(value.to_string()))?;
        default_unit.to_millis(amount)
    };

    if millis > u64::from(MAX_INTERVAL_MS) {
        return Err(Error::InvalidInterval(format!(
            "{} ({}ms exceeds {}ms)",
            value, millis, MAX_INTERVAL_MS
        )));
    }
    Ok(millis as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorthand_carries_its_own_unit() {
        assert_eq!(parse_interval("500ms", TimeUnit::Seconds).unwrap(), 500);
        assert_eq!(parse_interval("2s", TimeUnit::Milliseconds).unwrap(), 2000);
        assert_eq!(parse_interval("1m", TimeUnit::Milliseconds).unwrap(), 60_000);
    }

    #[test]
    fn bare_numbers_use_the_default_unit() {
        assert_eq!(parse_interval("100", TimeUnit::Milliseconds).unwrap(), 100);
        assert_eq!(parse_interval("3", TimeUnit::Seconds).unwrap(), 3000);
    }

    #[test]
    fn rejects_garbage_and_uppercase_suffixes() {
        assert!(parse_interval("fast", TimeUnit::Milliseconds).is_err());
        assert!(parse_interval("5S", TimeUnit::Milliseconds).is_err());
        assert!(parse_interval("", TimeUnit::Milliseconds).is_err());
    }

    #[test]
    fn rejects_intervals_past_half_the_clock_range() {
        assert!(parse_interval("30d", TimeUnit::Milliseconds).is_err());
        assert!(parse_interval("24d", TimeUnit::Milliseconds).is_ok());
    }

    #[test]
    fn time_unit_from_full_name() {
        assert_eq!("Seconds".parse::<TimeUnit>().unwrap(), TimeUnit::Seconds);
        assert!("sec".parse::<TimeUnit>().is_err());
    }
}
