//! Time utilities: timezone-aware deadline parsing and display.

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

const LOCAL_FORMAT: &str = "%Y-%m-%d %H:%M";

fn parse_tz(tz: &str) -> Result<Tz> {
    tz.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

/// Parse a deadline like "2026-02-20 23:59" in an IANA tz like "America/Chicago",
/// returning UTC.
pub fn parse_local_deadline_to_utc(local: &str, tz: &str) -> Result<DateTime<Utc>> {
    let tz = parse_tz(tz)?;

    let ndt = NaiveDateTime::parse_from_str(local, LOCAL_FORMAT)
        .map_err(|e| anyhow::anyhow!("invalid local datetime '{local}': {e}"))?;

    let local_dt = tz
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| anyhow::anyhow!("ambiguous or invalid local time (DST?): {local} {tz}"))?;

    Ok(local_dt.with_timezone(&Utc))
}

/// RFC 3339 with an explicit offset, else local wall time in `tz`.
pub fn parse_deadline(input: &str, tz: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    parse_local_deadline_to_utc(input, tz)
}

/// Helper: format a UTC time into RFC3339.
pub fn to_rfc3339_utc(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Local wall time in `tz`, same layout `parse_local_deadline_to_utc` reads.
pub fn format_in_tz(dt: DateTime<Utc>, tz: &str) -> Result<String> {
    let tz = parse_tz(tz)?;
    Ok(dt.with_timezone(&tz).format(LOCAL_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chicago_deadline() {
        // Feb is CST (UTC-6)
        let utc = parse_local_deadline_to_utc("2026-02-20 23:59", "America/Chicago").unwrap();
        assert_eq!(utc.to_rfc3339(), "2026-02-21T05:59:00+00:00");
    }

    #[test]
    fn rfc3339_wins_over_local() {
        let utc = parse_deadline("2026-07-01T12:00:00+02:00", "America/Chicago").unwrap();
        assert_eq!(to_rfc3339_utc(utc), "2026-07-01T10:00:00+00:00");
    }

    #[test]
    fn nonexistent_local_time_is_rejected() {
        // 2026-03-08 02:30 does not exist in Chicago (spring forward)
        assert!(parse_deadline("2026-03-08 02:30", "America/Chicago").is_err());
        assert!(parse_deadline("tomorrow", "America/Chicago").is_err());
        assert!(parse_deadline("2026-03-09 10:00", "Mars/Olympus").is_err());
    }

    #[test]
    fn format_round_trips_local_layout() {
        let utc = parse_deadline("2026-02-20 23:59", "America/Chicago").unwrap();
        assert_eq!(format_in_tz(utc, "America/Chicago").unwrap(), "2026-02-20 23:59");
    }
}
