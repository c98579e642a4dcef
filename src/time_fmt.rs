//! Timestamp formatting for display collaborators

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::types::Timestamp;

fn to_local(timestamp: Timestamp) -> Option<DateTime<Local>> {
    let millis = i64::try_from(timestamp).ok()?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|t| t.with_timezone(&Local))
}

/// Date and time with milliseconds, e.g. `2024-05-01 14:30:45.123`
pub fn format_date(timestamp: Timestamp) -> String {
    to_local(timestamp)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Wall-clock time as `HH:MM:SS`
pub fn format_time(timestamp: Timestamp) -> String {
    to_local(timestamp)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Seconds between two timestamps, negative if `end` precedes `start`
pub fn elapsed_seconds(start: Timestamp, end: Timestamp) -> f64 {
    (end as f64 - start as f64) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time_shape() {
        let s = format_time(1_714_573_845_123);
        assert_eq!(s.len(), 8);
        assert_eq!(s.matches(':').count(), 2);
    }

    #[test]
    fn test_format_date_keeps_millis() {
        assert!(format_date(1_714_573_845_123).ends_with(".123"));
    }

    #[test]
    fn test_out_of_range_falls_back_to_raw() {
        assert_eq!(format_time(u64::MAX), u64::MAX.to_string());
    }

    #[test]
    fn test_elapsed_seconds() {
        assert_eq!(elapsed_seconds(1000, 3500), 2.5);
        assert_eq!(elapsed_seconds(3500, 1000), -2.5);
    }
}
