//! Duration formatting for log lines.

/// Render a span of seconds with its two most significant units.
pub fn format_duration(secs: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    match secs {
        s if s < MINUTE => format!("{s}s"),
        s if s < HOUR => format!("{}m {}s", s / MINUTE, s % MINUTE),
        s if s < DAY => format!("{}h {}m", s / HOUR, (s % HOUR) / MINUTE),
        s => format!("{}d {}h", s / DAY, (s % DAY) / HOUR),
    }
}

/// Render the time left until `deadline_secs`, or `"closed"` once it has passed.
pub fn format_remaining(deadline_secs: u64, now_secs: u64) -> String {
    if now_secs >= deadline_secs {
        "closed".to_string()
    } else {
        format_duration(deadline_secs - now_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_ranges() {
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(3_660), "1h 1m");
        assert_eq!(format_duration(7 * 24 * 3600), "7d 0h");
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(100, 40), "1m 0s");
        assert_eq!(format_remaining(100, 100), "closed");
        assert_eq!(format_remaining(100, 500), "closed");
    }
}
