//! Human-readable duration formatting for poll error messages.

/// Format a millisecond count as a human-readable duration, e.g.
/// "2 minutes, 1 second" or "1 second, 500 milliseconds".
#[must_use]
pub fn humanize_ms(ms: u64) -> String {
    if ms == 0 {
        return "less than a millisecond".to_string();
    }

    const UNITS: [(u64, &str); 5] = [
        (86_400_000, "day"),
        (3_600_000, "hour"),
        (60_000, "minute"),
        (1_000, "second"),
        (1, "millisecond"),
    ];

    let mut remaining = ms;
    let mut parts = Vec::new();
    for (unit_ms, name) in UNITS {
        let count = remaining / unit_ms;
        remaining %= unit_ms;
        if count > 0 {
            let plural = if count == 1 { "" } else { "s" };
            parts.push(format!("{count} {name}{plural}"));
        }
    }

    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_sub_millisecond() {
        assert_eq!(humanize_ms(0), "less than a millisecond");
    }

    #[test]
    fn single_units() {
        assert_eq!(humanize_ms(1), "1 millisecond");
        assert_eq!(humanize_ms(1_000), "1 second");
        assert_eq!(humanize_ms(60_000), "1 minute");
        assert_eq!(humanize_ms(3_600_000), "1 hour");
    }

    #[test]
    fn compound_durations() {
        assert_eq!(humanize_ms(121_000), "2 minutes, 1 second");
        assert_eq!(humanize_ms(1_500), "1 second, 500 milliseconds");
        assert_eq!(humanize_ms(90_061_000), "1 day, 1 hour, 1 minute, 1 second");
    }

    #[test]
    fn skips_zero_components() {
        assert_eq!(humanize_ms(3_600_500), "1 hour, 500 milliseconds");
    }
}
